//! Owned vertex sequences.

use std::ops::{Index, IndexMut};

use glam::Vec3;

use crate::{
    device::GlDevice,
    render::{Drawable, RenderStates, RenderSurface, RenderTarget},
    types::{PrimitiveType, Vertex},
};

/// Axis-aligned box enclosing a set of positions.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Bounds {
    /// Smallest coordinates.
    pub min: Vec3,
    /// Largest coordinates.
    pub max: Vec3,
}

impl Bounds {
    /// Extent along each axis.
    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Whether `point` lies inside the box, borders included.
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

/// A resizable vertex sequence drawn as one primitive type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeometryBuffer {
    vertices: Vec<Vertex>,
    primitive: PrimitiveType,
}

impl GeometryBuffer {
    /// An empty buffer of `primitive`.
    #[must_use]
    pub fn new(primitive: PrimitiveType) -> Self {
        Self {
            vertices: Vec::new(),
            primitive,
        }
    }

    /// A buffer of `primitive` holding `vertices`.
    #[must_use]
    pub fn from_vertices(primitive: PrimitiveType, vertices: Vec<Vertex>) -> Self {
        Self { vertices, primitive }
    }

    /// Number of vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the buffer holds no vertex.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Remove every vertex.
    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    /// Grow with default vertices or truncate to `len`.
    pub fn resize(&mut self, len: usize) {
        self.vertices.resize(len, Vertex::default());
    }

    /// Add a vertex at the end.
    pub fn append(&mut self, vertex: Vertex) {
        self.vertices.push(vertex);
    }

    /// The vertices, in drawing order.
    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Mutable access to the vertices.
    pub fn vertices_mut(&mut self) -> &mut [Vertex] {
        &mut self.vertices
    }

    /// How the vertices are assembled.
    #[must_use]
    pub fn primitive_type(&self) -> PrimitiveType {
        self.primitive
    }

    /// Change how the vertices are assembled.
    pub fn set_primitive_type(&mut self, primitive: PrimitiveType) {
        self.primitive = primitive;
    }

    /// Box enclosing every vertex position. Empty buffers have zero-sized
    /// bounds at the origin.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        let mut positions = self.vertices.iter().map(|v| Vec3::from_array(v.position));
        let Some(first) = positions.next() else {
            return Bounds::default();
        };
        positions.fold(Bounds { min: first, max: first }, |bounds, p| Bounds {
            min: bounds.min.min(p),
            max: bounds.max.max(p),
        })
    }
}

impl Index<usize> for GeometryBuffer {
    type Output = Vertex;

    fn index(&self, index: usize) -> &Vertex {
        &self.vertices[index]
    }
}

impl IndexMut<usize> for GeometryBuffer {
    fn index_mut(&mut self, index: usize) -> &mut Vertex {
        &mut self.vertices[index]
    }
}

impl Extend<Vertex> for GeometryBuffer {
    fn extend<I: IntoIterator<Item = Vertex>>(&mut self, iter: I) {
        self.vertices.extend(iter);
    }
}

impl<D: GlDevice> Drawable<D> for GeometryBuffer {
    fn draw<S: RenderSurface>(&self, target: &mut RenderTarget<D, S>, states: &RenderStates<'_, D>) {
        target.draw_vertices(&self.vertices, self.primitive, states);
    }
}
