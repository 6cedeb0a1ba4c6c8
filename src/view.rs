//! Cameras: what part of the world is shown, and where on the target.

use glam::{Mat4, Vec2, Vec3};

use crate::types::FloatRect;

/// How a [`View`] projects the world.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Projection {
    /// 2D camera looking at a rectangle of the XY plane, Y pointing down.
    Orthographic {
        /// Center of the visible area.
        center: Vec2,
        /// Size of the visible area.
        size: Vec2,
        /// Rotation in degrees, clockwise.
        rotation: f32,
    },
    /// 3D camera.
    Perspective {
        /// Eye position.
        position: Vec3,
        /// Viewing direction.
        direction: Vec3,
        /// Up vector.
        up: Vec3,
        /// Vertical field of view in degrees.
        fov_y: f32,
        /// Near clipping distance.
        near: f32,
        /// Far clipping distance.
        far: f32,
        /// Width over height.
        aspect: f32,
    },
}

/// A camera plus the portion of the render target it draws into.
///
/// The viewport is a ratio of the target size, so `{0, 0, 1, 1}` covers the
/// whole target whatever its size.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct View {
    projection: Projection,
    viewport: FloatRect,
}

impl Default for View {
    fn default() -> Self {
        Self::from_rect(FloatRect::new(0.0, 0.0, 1000.0, 1000.0))
    }
}

impl View {
    /// An orthographic view of `size` centered on `center`.
    #[must_use]
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self {
            projection: Projection::Orthographic {
                center,
                size,
                rotation: 0.0,
            },
            viewport: FloatRect::FULL,
        }
    }

    /// An orthographic view showing exactly `rect`.
    #[must_use]
    pub fn from_rect(rect: FloatRect) -> Self {
        Self::new(
            Vec2::new(rect.left + rect.width / 2.0, rect.top + rect.height / 2.0),
            Vec2::new(rect.width, rect.height),
        )
    }

    /// A perspective view at the origin looking down -Z.
    #[must_use]
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            projection: Projection::Perspective {
                position: Vec3::ZERO,
                direction: Vec3::NEG_Z,
                up: Vec3::Y,
                fov_y,
                near,
                far,
                aspect,
            },
            viewport: FloatRect::FULL,
        }
    }

    /// The projection parameters.
    #[must_use]
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Center of an orthographic view, or the eye position projected on XY.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        match self.projection {
            Projection::Orthographic { center, .. } => center,
            Projection::Perspective { position, .. } => position.truncate(),
        }
    }

    /// Move the view so it is centered on `center`.
    pub fn set_center(&mut self, new_center: Vec2) {
        match &mut self.projection {
            Projection::Orthographic { center, .. } => *center = new_center,
            Projection::Perspective { position, .. } => {
                position.x = new_center.x;
                position.y = new_center.y;
            }
        }
    }

    /// Size of the visible area. Perspective views report their aspect ratio
    /// as `(aspect, 1)`.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        match self.projection {
            Projection::Orthographic { size, .. } => size,
            Projection::Perspective { aspect, .. } => Vec2::new(aspect, 1.0),
        }
    }

    /// Resize an orthographic view; sets the aspect ratio of a perspective one.
    pub fn set_size(&mut self, new_size: Vec2) {
        match &mut self.projection {
            Projection::Orthographic { size, .. } => *size = new_size,
            Projection::Perspective { aspect, .. } => {
                if new_size.y != 0.0 {
                    *aspect = new_size.x / new_size.y;
                }
            }
        }
    }

    /// Rotation of an orthographic view, in degrees.
    #[must_use]
    pub fn rotation(&self) -> f32 {
        match self.projection {
            Projection::Orthographic { rotation, .. } => rotation,
            Projection::Perspective { .. } => 0.0,
        }
    }

    /// Set the rotation of an orthographic view, wrapped to `0..360`.
    pub fn set_rotation(&mut self, degrees: f32) {
        if let Projection::Orthographic { rotation, .. } = &mut self.projection {
            *rotation = degrees.rem_euclid(360.0);
        }
    }

    /// Rotate relative to the current rotation.
    pub fn rotate(&mut self, degrees: f32) {
        self.set_rotation(self.rotation() + degrees);
    }

    /// Move relative to the current position.
    pub fn move_by(&mut self, offset: Vec2) {
        self.set_center(self.center() + offset);
    }

    /// Scale the visible area; `factor > 1` zooms out.
    pub fn zoom(&mut self, factor: f32) {
        match &mut self.projection {
            Projection::Orthographic { size, .. } => *size *= factor,
            Projection::Perspective { fov_y, .. } => *fov_y = (*fov_y * factor).clamp(1.0, 179.0),
        }
    }

    /// Point a perspective view from `eye` at `target`.
    pub fn look_at(&mut self, eye: Vec3, target: Vec3, new_up: Vec3) {
        if let Projection::Perspective {
            position,
            direction,
            up,
            ..
        } = &mut self.projection
        {
            *position = eye;
            *direction = (target - eye).normalize_or(Vec3::NEG_Z);
            *up = new_up;
        }
    }

    /// The target area this view draws into, as a ratio of the target size.
    #[must_use]
    pub fn viewport(&self) -> FloatRect {
        self.viewport
    }

    /// Set the viewport ratio rectangle.
    pub fn set_viewport(&mut self, viewport: FloatRect) {
        self.viewport = viewport;
    }

    /// World to normalized device coordinates.
    #[must_use]
    pub fn transform(&self) -> Mat4 {
        match self.projection {
            Projection::Orthographic {
                center,
                size,
                rotation,
            } => {
                Mat4::from_scale(Vec3::new(2.0 / size.x, -2.0 / size.y, 1.0))
                    * Mat4::from_rotation_z(-rotation.to_radians())
                    * Mat4::from_translation(-center.extend(0.0))
            }
            Projection::Perspective {
                position,
                direction,
                up,
                fov_y,
                near,
                far,
                aspect,
            } => {
                Mat4::perspective_rh_gl(fov_y.to_radians(), aspect, near, far)
                    * Mat4::look_to_rh(position, direction, up)
            }
        }
    }

    /// Normalized device coordinates to world.
    #[must_use]
    pub fn inverse_transform(&self) -> Mat4 {
        self.transform().inverse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-4
    }

    #[test]
    fn orthographic_maps_visible_rect_to_ndc() {
        let view = View::from_rect(FloatRect::new(0.0, 0.0, 800.0, 600.0));
        let transform = view.transform();
        assert!(close(transform.project_point3(Vec3::ZERO), Vec3::new(-1.0, 1.0, 0.0)));
        assert!(close(
            transform.project_point3(Vec3::new(800.0, 600.0, 0.0)),
            Vec3::new(1.0, -1.0, 0.0)
        ));
        assert!(close(
            transform.project_point3(Vec3::new(400.0, 300.0, 0.0)),
            Vec3::ZERO
        ));
    }

    #[test]
    fn rotation_wraps_and_turns_clockwise() {
        let mut view = View::new(Vec2::ZERO, Vec2::new(2.0, 2.0));
        view.set_rotation(-90.0);
        assert!((view.rotation() - 270.0).abs() < 1e-4);
        view.set_rotation(90.0);
        let ndc = view.transform().project_point3(Vec3::new(1.0, 0.0, 0.0));
        // Rotating the camera clockwise moves world +X towards screen top.
        assert!(close(ndc, Vec3::new(0.0, 1.0, 0.0)), "{ndc:?}");
    }

    #[test]
    fn inverse_undoes_transform() {
        let mut view = View::new(Vec2::new(10.0, -4.0), Vec2::new(320.0, 240.0));
        view.rotate(33.0);
        view.zoom(1.5);
        let point = Vec3::new(17.0, 23.0, 0.0);
        let back = view
            .inverse_transform()
            .project_point3(view.transform().project_point3(point));
        assert!(close(back, point));
    }

    #[test]
    fn perspective_looks_down_negative_z() {
        let view = View::perspective(90.0, 1.0, 0.1, 100.0);
        let ndc = view.transform().project_point3(Vec3::new(0.0, 0.0, -10.0));
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!(ndc.z > -1.0 && ndc.z < 1.0);
    }

    #[test]
    fn move_and_resize() {
        let mut view = View::new(Vec2::new(5.0, 5.0), Vec2::new(10.0, 10.0));
        view.move_by(Vec2::new(1.0, -1.0));
        view.set_size(Vec2::new(20.0, 30.0));
        assert_eq!(view.center(), Vec2::new(6.0, 4.0));
        assert_eq!(view.size(), Vec2::new(20.0, 30.0));
    }
}
