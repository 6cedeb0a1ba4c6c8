use std::sync::Arc;

use glam::{IVec2, UVec2, Vec2, Vec3};
use log::{debug, info, warn};

use super::{
    BackendHint, BackendKind, BufferObjectBackend, Drawable, Frame, LegacyBackend, RenderStates, RenderSurface,
    StatesCache,
};
use crate::{
    device::GlDevice,
    error::StateStackError,
    types::{Color, FloatRect, IntRect, PrimitiveType, Vertex},
    view::View,
};

enum Backend<D: GlDevice> {
    Default(LegacyBackend<D>),
    BufferObject(BufferObjectBackend<D>),
}

macro_rules! with_backend {
    ($backend:expr, $b:ident => $body:expr) => {
        match $backend {
            Backend::Default($b) => $body,
            Backend::BufferObject($b) => $body,
        }
    };
}

/// Round `value` to the nearest pixel.
#[expect(clippy::cast_possible_truncation)]
fn round_pixel(value: f32) -> i32 {
    (0.5 + value).floor() as i32
}

/// Pixel bounds of `view`'s viewport on a target of `size`, top-left origin.
pub(crate) fn viewport_rect(size: UVec2, view: &View) -> IntRect {
    let size = size.as_vec2();
    let ratio = view.viewport();
    IntRect::new(
        round_pixel(size.x * ratio.left),
        round_pixel(size.y * ratio.top),
        round_pixel(size.x * ratio.width),
        round_pixel(size.y * ratio.height),
    )
}

/// The viewport as `glViewport` expects it, bottom-left origin.
pub(crate) fn gl_viewport(frame: Frame<'_>) -> IntRect {
    let viewport = viewport_rect(frame.size, frame.view);
    let height = i32::try_from(frame.size.y).unwrap_or(i32::MAX);
    IntRect::new(
        viewport.left,
        height - (viewport.top + viewport.height),
        viewport.width,
        viewport.height,
    )
}

fn full_view(size: UVec2) -> View {
    let size = size.as_vec2();
    View::from_rect(FloatRect::new(0.0, 0.0, size.x, size.y))
}

fn select_backend<D: GlDevice>(device: &Arc<D>, hint: BackendHint) -> Backend<D> {
    if hint == BackendHint::BufferObject {
        match BufferObjectBackend::new(Arc::clone(device)) {
            Ok(backend) => {
                info!("drawing with buffer objects and shaders");
                return Backend::BufferObject(backend);
            }
            Err(e) => warn!("{e}, falling back to the fixed-function pipeline"),
        }
    }
    info!("drawing with the fixed-function pipeline");
    Backend::Default(LegacyBackend::new(Arc::clone(device)))
}

/// A surface that can be drawn on.
///
/// Owns one backend, picked when the target is created, and the views
/// used to map between pixels and world coordinates. Every GL operation
/// first makes the surface current and is skipped if that fails.
pub struct RenderTarget<D: GlDevice, S: RenderSurface> {
    device: Arc<D>,
    surface: S,
    default_view: View,
    view: View,
    backend: Backend<D>,
}

impl<D: GlDevice, S: RenderSurface> RenderTarget<D, S> {
    /// Create a target for `surface`, using the buffer-object backend when
    /// `hint` asks for it and the device supports it.
    pub fn new(device: Arc<D>, mut surface: S, hint: BackendHint) -> Self {
        if !surface.set_active(true) {
            warn!("failed to activate the surface of a new render target");
        }
        let backend = select_backend(&device, hint);
        let view = full_view(surface.size());
        let mut target = Self {
            device,
            surface,
            default_view: view,
            view,
            backend,
        };
        target.initialize();
        target
    }

    fn activate(&mut self) -> bool {
        let active = self.surface.set_active(true);
        if !active {
            debug!("render target could not be activated, operation skipped");
        }
        active
    }

    /// Reset both views to cover the whole surface and recreate the
    /// backend's GL objects. Call after the surface's context was
    /// (re)created; persistent states are set again on the next draw.
    pub fn initialize(&mut self) {
        self.default_view = full_view(self.surface.size());
        self.view = self.default_view;
        if self.activate() {
            with_backend!(&mut self.backend, b => b.initialize());
        } else {
            with_backend!(&mut self.backend, b => b.invalidate());
        }
        with_backend!(&mut self.backend, b => b.set_view_changed());
    }

    /// Free the backend's GL objects before the context goes away.
    pub fn deinitialize(&mut self) {
        if self.activate() {
            with_backend!(&mut self.backend, b => b.deinitialize());
        }
    }

    /// Clear the whole target with `color`.
    pub fn clear(&mut self, color: Color) {
        if self.activate() {
            with_backend!(&mut self.backend, b => b.clear(color));
        }
    }

    /// Draw with `view` from now on.
    pub fn set_view(&mut self, view: View) {
        self.view = view;
        with_backend!(&mut self.backend, b => b.set_view_changed());
    }

    /// The current view.
    #[must_use]
    pub fn view(&self) -> &View {
        &self.view
    }

    /// The view covering the whole target with one unit per pixel.
    #[must_use]
    pub fn default_view(&self) -> &View {
        &self.default_view
    }

    /// Pixel bounds of `view`'s viewport on this target.
    #[must_use]
    pub fn viewport(&self, view: &View) -> IntRect {
        viewport_rect(self.size(), view)
    }

    /// World coordinates under `pixel`, through the current view.
    #[must_use]
    pub fn map_pixel_to_coords(&self, pixel: IVec2) -> Vec3 {
        self.map_pixel_to_coords_with(pixel, &self.view)
    }

    /// World coordinates under `pixel`, through `view`.
    #[must_use]
    pub fn map_pixel_to_coords_with(&self, pixel: IVec2, view: &View) -> Vec3 {
        let viewport = self.viewport(view);
        let origin = IVec2::new(viewport.left, viewport.top).as_vec2();
        let extent = IVec2::new(viewport.width, viewport.height).as_vec2();
        let ratio = (pixel.as_vec2() - origin) / extent;
        let normalized = Vec3::new(-1.0 + 2.0 * ratio.x, 1.0 - 2.0 * ratio.y, 0.0);
        view.inverse_transform().project_point3(normalized)
    }

    /// Pixel showing `point`, through the current view.
    #[must_use]
    pub fn map_coords_to_pixel(&self, point: Vec3) -> IVec2 {
        self.map_coords_to_pixel_with(point, &self.view)
    }

    /// Pixel showing `point`, through `view`. Fractions are truncated.
    #[must_use]
    pub fn map_coords_to_pixel_with(&self, point: Vec3, view: &View) -> IVec2 {
        let normalized = view.transform().project_point3(point);
        let viewport = self.viewport(view);
        let origin = IVec2::new(viewport.left, viewport.top).as_vec2();
        let extent = IVec2::new(viewport.width, viewport.height).as_vec2();
        let ratio = Vec2::new((normalized.x + 1.0) / 2.0, (1.0 - normalized.y) / 2.0);
        (ratio * extent + origin).as_ivec2()
    }

    /// Let `drawable` draw itself with `states`.
    pub fn draw<T: Drawable<D> + ?Sized>(&mut self, drawable: &T, states: &RenderStates<'_, D>) {
        drawable.draw(self, states);
    }

    /// Draw `vertices` as `primitive`.
    pub fn draw_vertices(&mut self, vertices: &[Vertex], primitive: PrimitiveType, states: &RenderStates<'_, D>) {
        if vertices.is_empty() || !self.activate() {
            return;
        }
        let frame = Frame {
            size: self.surface.size(),
            view: &self.view,
        };
        with_backend!(&mut self.backend, b => b.draw(frame, vertices, primitive, states));
    }

    /// Save the GL states this target touches and set its own, so it can
    /// draw in the middle of foreign GL code. Only one level is supported.
    ///
    /// # Errors
    ///
    /// Fails if states are already pushed; the first snapshot is kept.
    pub fn push_gl_states(&mut self) -> Result<(), StateStackError> {
        if !self.activate() {
            return Ok(());
        }
        let result = with_backend!(&mut self.backend, b => b.push_gl_states());
        if let Err(e) = &result {
            warn!("{e}");
        }
        result
    }

    /// Restore the states saved by [`push_gl_states`](Self::push_gl_states).
    ///
    /// # Errors
    ///
    /// Fails if nothing was pushed.
    pub fn pop_gl_states(&mut self) -> Result<(), StateStackError> {
        if !self.activate() {
            return Ok(());
        }
        let result = with_backend!(&mut self.backend, b => b.pop_gl_states());
        if let Err(e) = &result {
            warn!("{e}");
        }
        result
    }

    /// Set every GL state this target relies on, after foreign GL code
    /// changed them without a push.
    pub fn reset_gl_states(&mut self) {
        if self.activate() {
            with_backend!(&mut self.backend, b => b.reset());
        }
    }

    /// Size of the surface in pixels.
    #[must_use]
    pub fn size(&self) -> UVec2 {
        self.surface.size()
    }

    /// The surface drawn on.
    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// The surface drawn on.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// The device drawn with.
    #[must_use]
    pub fn device(&self) -> &Arc<D> {
        &self.device
    }

    /// Which backend was picked.
    #[must_use]
    pub fn backend_kind(&self) -> BackendKind {
        match self.backend {
            Backend::Default(_) => BackendKind::Default,
            Backend::BufferObject(_) => BackendKind::BufferObject,
        }
    }

    /// The backend's state cache.
    #[must_use]
    pub fn states_cache(&self) -> &StatesCache {
        with_backend!(&self.backend, b => b.cache())
    }
}
