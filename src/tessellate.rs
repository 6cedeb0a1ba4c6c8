//! Filled and stroked outlines, tessellated into triangle geometry with
//! lyon.

use glam::Vec2;
use lyon::{
    math::{point, Point},
    path::Path as LyonPath,
    tessellation::{
        BuffersBuilder, FillOptions, FillRule, FillTessellator, FillVertex, StrokeOptions, StrokeTessellator,
        StrokeVertex, VertexBuffers,
    },
};

use crate::{
    error::ShapeError,
    geometry::GeometryBuffer,
    types::{Color, PrimitiveType, Vertex},
};

const TOLERANCE: f32 = 0.01;

fn to_point(v: Vec2) -> Point {
    point(v.x, v.y)
}

/// Builds an outline out of lines and Bézier curves.
pub struct ShapeBuilder {
    builder: lyon::path::path::Builder,
    open: bool,
    segments: usize,
}

impl Default for ShapeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapeBuilder {
    /// An empty outline.
    #[must_use]
    pub fn new() -> Self {
        Self {
            builder: LyonPath::builder(),
            open: false,
            segments: 0,
        }
    }

    /// Start a new sub-path at `to`, leaving the current one open.
    pub fn move_to(&mut self, to: Vec2) {
        if self.open {
            self.builder.end(false);
        }
        self.builder.begin(to_point(to));
        self.open = true;
    }

    fn ensure_open(&mut self, at: Vec2) -> bool {
        if self.open {
            return true;
        }
        self.move_to(at);
        false
    }

    /// Straight segment to `to`.
    pub fn line_to(&mut self, to: Vec2) {
        if self.ensure_open(to) {
            self.builder.line_to(to_point(to));
            self.segments += 1;
        }
    }

    /// Quadratic Bézier segment through `ctrl` to `to`.
    pub fn quad_to(&mut self, ctrl: Vec2, to: Vec2) {
        if self.ensure_open(to) {
            self.builder.quadratic_bezier_to(to_point(ctrl), to_point(to));
            self.segments += 1;
        }
    }

    /// Cubic Bézier segment through `ctrl1` and `ctrl2` to `to`.
    pub fn curve_to(&mut self, ctrl1: Vec2, ctrl2: Vec2, to: Vec2) {
        if self.ensure_open(to) {
            self.builder
                .cubic_bezier_to(to_point(ctrl1), to_point(ctrl2), to_point(to));
            self.segments += 1;
        }
    }

    /// Close the current sub-path back to its start.
    pub fn close(&mut self) {
        if self.open {
            self.builder.close();
            self.open = false;
        }
    }

    /// Finish the outline.
    #[must_use]
    pub fn build(mut self) -> Shape {
        if self.open {
            self.builder.end(false);
        }
        Shape {
            path: self.builder.build(),
            segments: self.segments,
        }
    }
}

/// A finished outline.
#[derive(Clone, Debug)]
pub struct Shape {
    path: LyonPath,
    segments: usize,
}

impl Shape {
    /// Triangles covering the inside of the outline, non-zero winding.
    ///
    /// # Errors
    ///
    /// [`ShapeError::Empty`] if nothing would be drawn, or the tessellator's
    /// error.
    pub fn fill(&self, color: Color) -> Result<GeometryBuffer, ShapeError> {
        if self.segments == 0 {
            return Err(ShapeError::Empty);
        }
        let mut geometry: VertexBuffers<Vertex, u32> = VertexBuffers::new();
        FillTessellator::new()
            .tessellate_path(
                &self.path,
                &FillOptions::tolerance(TOLERANCE).with_fill_rule(FillRule::NonZero),
                &mut BuffersBuilder::new(&mut geometry, |vertex: FillVertex| {
                    Vertex::new(Vec2::from(vertex.position().to_array()), color)
                }),
            )
            .map_err(ShapeError::Tessellation)?;
        triangles(&geometry)
    }

    /// Triangles covering a `width` wide line along the outline.
    ///
    /// # Errors
    ///
    /// As [`fill`](Self::fill).
    pub fn stroke(&self, width: f32, color: Color) -> Result<GeometryBuffer, ShapeError> {
        if self.segments == 0 {
            return Err(ShapeError::Empty);
        }
        let mut geometry: VertexBuffers<Vertex, u32> = VertexBuffers::new();
        StrokeTessellator::new()
            .tessellate_path(
                &self.path,
                &StrokeOptions::tolerance(TOLERANCE).with_line_width(width),
                &mut BuffersBuilder::new(&mut geometry, |vertex: StrokeVertex| {
                    Vertex::new(Vec2::from(vertex.position().to_array()), color)
                }),
            )
            .map_err(ShapeError::Tessellation)?;
        triangles(&geometry)
    }
}

/// Expand an indexed mesh into a plain triangle list.
fn triangles(mesh: &VertexBuffers<Vertex, u32>) -> Result<GeometryBuffer, ShapeError> {
    if mesh.indices.is_empty() {
        return Err(ShapeError::Empty);
    }
    let vertices = mesh.indices.iter().map(|&i| mesh.vertices[i as usize]).collect();
    Ok(GeometryBuffer::from_vertices(PrimitiveType::Triangles, vertices))
}

fn polyline(points: &[Vec2], closed: bool) -> Shape {
    let mut builder = ShapeBuilder::new();
    if let Some((&first, rest)) = points.split_first() {
        builder.move_to(first);
        for &p in rest {
            builder.line_to(p);
        }
        if closed {
            builder.close();
        }
    }
    builder.build()
}

/// Fill the polygon through `points`.
///
/// # Errors
///
/// [`ShapeError::Empty`] for fewer than two points.
pub fn fill_polygon(points: &[Vec2], color: Color) -> Result<GeometryBuffer, ShapeError> {
    polyline(points, true).fill(color)
}

/// Stroke the line through `points`, joining the last point back to the
/// first when `closed`.
///
/// # Errors
///
/// [`ShapeError::Empty`] for fewer than two points.
pub fn stroke_polyline(points: &[Vec2], width: f32, color: Color, closed: bool) -> Result<GeometryBuffer, ShapeError> {
    polyline(points, closed).stroke(width, color)
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    fn close_to(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-3
    }

    #[test]
    fn squares_fill_with_two_triangles() {
        let square = [Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0), Vec2::new(0.0, 10.0)];
        let geometry = fill_polygon(&square, Color::GREEN).unwrap();
        assert_eq!(geometry.primitive_type(), PrimitiveType::Triangles);
        assert_eq!(geometry.len(), 6);
        assert!(geometry.vertices().iter().all(|v| v.color == Color::GREEN));
        let bounds = geometry.bounds();
        assert!(close_to(bounds.min, Vec3::ZERO));
        assert!(close_to(bounds.max, Vec3::new(10.0, 10.0, 0.0)));
    }

    #[test]
    fn strokes_are_as_wide_as_requested() {
        let line = [Vec2::ZERO, Vec2::new(10.0, 0.0)];
        let geometry = stroke_polyline(&line, 2.0, Color::WHITE, false).unwrap();
        assert_eq!(geometry.len() % 3, 0);
        let bounds = geometry.bounds();
        assert!(close_to(bounds.min, Vec3::new(0.0, -1.0, 0.0)));
        assert!(close_to(bounds.max, Vec3::new(10.0, 1.0, 0.0)));
    }

    #[test]
    fn curves_stay_inside_their_hull() {
        let mut builder = ShapeBuilder::new();
        builder.move_to(Vec2::ZERO);
        builder.quad_to(Vec2::new(5.0, 10.0), Vec2::new(10.0, 0.0));
        builder.close();
        let geometry = builder.build().fill(Color::BLUE).unwrap();
        assert!(!geometry.is_empty());
        let bounds = geometry.bounds();
        assert!(bounds.max.y <= 5.0 + 1e-3);
        assert!(bounds.min.y >= -1e-3);
    }

    #[test]
    fn degenerate_outlines_are_empty() {
        assert!(matches!(ShapeBuilder::new().build().fill(Color::WHITE), Err(ShapeError::Empty)));
        assert!(matches!(fill_polygon(&[Vec2::ONE], Color::WHITE), Err(ShapeError::Empty)));
        assert!(matches!(stroke_polyline(&[Vec2::ONE], 1.0, Color::WHITE, false), Err(ShapeError::Empty)));

        let mut builder = ShapeBuilder::new();
        builder.line_to(Vec2::ZERO);
        builder.line_to(Vec2::new(0.0, 4.0));
        let geometry = builder.build().stroke(1.0, Color::WHITE).unwrap();
        assert!(close_to(geometry.bounds().max, Vec3::new(0.5, 4.0, 0.0)));
    }
}
