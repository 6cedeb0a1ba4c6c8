//! Closed solids built from triangular faces, each face lit with its own
//! normal.

use glam::Vec3;

use crate::{
    geometry::GeometryBuffer,
    types::{Color, PrimitiveType, Vertex},
};

/// A polyhedron described face by face.
///
/// Faces are wound counter-clockwise when seen from outside, which makes
/// their generated normals point outward.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvexPolyhedron {
    faces: Vec<[Vec3; 3]>,
    color: Color,
}

impl ConvexPolyhedron {
    /// A polyhedron without faces.
    #[must_use]
    pub fn new(color: Color) -> Self {
        Self {
            faces: Vec::new(),
            color,
        }
    }

    /// Number of faces.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Grow with degenerate faces at the origin or truncate to `count`.
    pub fn set_face_count(&mut self, count: usize) {
        self.faces.resize(count, [Vec3::ZERO; 3]);
    }

    /// Replace face `index`. Out of range indices are ignored with a warning.
    pub fn set_face(&mut self, index: usize, v0: Vec3, v1: Vec3, v2: Vec3) {
        if let Some(face) = self.faces.get_mut(index) {
            *face = [v0, v1, v2];
        } else {
            log::warn!("face {index} is out of range for a polyhedron of {} faces", self.faces.len());
        }
    }

    /// Add a face at the end.
    pub fn push_face(&mut self, v0: Vec3, v1: Vec3, v2: Vec3) {
        self.faces.push([v0, v1, v2]);
    }

    /// The corners of face `index`.
    #[must_use]
    pub fn face(&self, index: usize) -> Option<[Vec3; 3]> {
        self.faces.get(index).copied()
    }

    /// Color of every vertex.
    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }

    /// Change the color of every vertex.
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Triangle list with one normal per face, shared by its three corners.
    /// Degenerate faces get a zero normal.
    #[must_use]
    pub fn geometry(&self) -> GeometryBuffer {
        let mut geometry = GeometryBuffer::new(PrimitiveType::Triangles);
        geometry.extend(self.faces.iter().flat_map(|&[v0, v1, v2]| {
            let normal = face_normal(v0, v1, v2);
            [v0, v1, v2].map(|corner| Vertex::with_normal(corner, self.color, normal))
        }));
        geometry
    }
}

fn face_normal(v0: Vec3, v1: Vec3, v2: Vec3) -> Vec3 {
    (v1 - v0).cross(v2 - v0).normalize_or_zero()
}

/// A box of `size` centered on the origin, two faces per side.
#[must_use]
pub fn cuboid(size: Vec3, color: Color) -> ConvexPolyhedron {
    let h = size * 0.5;
    let corner = |x: f32, y: f32, z: f32| Vec3::new(x * h.x, y * h.y, z * h.z);
    // Each side as a quad, counter-clockwise from outside.
    let sides = [
        [corner(-1., -1., 1.), corner(1., -1., 1.), corner(1., 1., 1.), corner(-1., 1., 1.)],
        [corner(1., -1., -1.), corner(-1., -1., -1.), corner(-1., 1., -1.), corner(1., 1., -1.)],
        [corner(1., -1., 1.), corner(1., -1., -1.), corner(1., 1., -1.), corner(1., 1., 1.)],
        [corner(-1., -1., -1.), corner(-1., -1., 1.), corner(-1., 1., 1.), corner(-1., 1., -1.)],
        [corner(-1., 1., 1.), corner(1., 1., 1.), corner(1., 1., -1.), corner(-1., 1., -1.)],
        [corner(-1., -1., -1.), corner(1., -1., -1.), corner(1., -1., 1.), corner(-1., -1., 1.)],
    ];
    let mut polyhedron = ConvexPolyhedron::new(color);
    for [a, b, c, d] in sides {
        polyhedron.push_face(a, b, c);
        polyhedron.push_face(a, c, d);
    }
    polyhedron
}

/// An octahedron of `radius` whose faces are split in four `subdivisions`
/// times, new corners pushed out onto the sphere.
#[must_use]
pub fn sphere(radius: f32, subdivisions: u32, color: Color) -> ConvexPolyhedron {
    let (x, y, z) = (Vec3::X * radius, Vec3::Y * radius, Vec3::Z * radius);
    let octahedron = [
        [z, x, y],
        [z, y, -x],
        [z, -x, -y],
        [z, -y, x],
        [-z, y, x],
        [-z, -x, y],
        [-z, -y, -x],
        [-z, x, -y],
    ];
    let mut polyhedron = ConvexPolyhedron::new(color);
    for [a, b, c] in octahedron {
        subdivide(&mut polyhedron, radius, [a, b, c], subdivisions);
    }
    polyhedron
}

fn subdivide(polyhedron: &mut ConvexPolyhedron, radius: f32, [a, b, c]: [Vec3; 3], depth: u32) {
    if depth == 0 {
        polyhedron.push_face(a, b, c);
        return;
    }
    let mid = |p: Vec3, q: Vec3| ((p + q) * 0.5).normalize_or_zero() * radius;
    let (ab, bc, ca) = (mid(a, b), mid(b, c), mid(c, a));
    for face in [[a, ab, ca], [ab, b, bc], [ca, bc, c], [ab, bc, ca]] {
        subdivide(polyhedron, radius, face, depth - 1);
    }
}
