//! Plain value types shared by every part of the pipeline.
//!
//! [`Vertex`] is the wire format uploaded to the GPU, so it is `#[repr(C)]`
//! and [`Pod`].

use bytemuck::{Pod, Zeroable};
use glam::{IVec2, Vec2, Vec3};

/// An RGBA color with 8 bits per channel.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Opaque red.
    pub const RED: Self = Self::rgb(255, 0, 0);
    /// Opaque green.
    pub const GREEN: Self = Self::rgb(0, 255, 0);
    /// Opaque blue.
    pub const BLUE: Self = Self::rgb(0, 0, 255);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    /// Build a color from its four channels.
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Build an opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Channels normalized from `0..=255` to `0.0..=1.0`.
    #[must_use]
    pub fn to_f32(self) -> [f32; 4] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
            f32::from(self.a) / 255.0,
        ]
    }
}

/// A single vertex: position, color, texture coordinates and normal.
///
/// Texture coordinates are in pixels of the bound texture; the pipeline
/// normalizes them with a texture matrix. The normal is only read by
/// lighting; flat 2D geometry leaves it zero.
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vertex {
    /// Position in world space.
    pub position: [f32; 3],
    /// Vertex color, normalized on upload.
    pub color: Color,
    /// Texture coordinates, in texels.
    pub tex_coords: [f32; 2],
    /// Surface normal, zero when unused.
    pub normal: [f32; 3],
}

impl Vertex {
    /// Byte offset of [`Vertex::position`].
    pub const POSITION_OFFSET: i32 = 0;
    /// Byte offset of [`Vertex::color`].
    pub const COLOR_OFFSET: i32 = 12;
    /// Byte offset of [`Vertex::tex_coords`].
    pub const TEX_COORDS_OFFSET: i32 = 16;
    /// Byte offset of [`Vertex::normal`].
    pub const NORMAL_OFFSET: i32 = 24;
    /// Size of one vertex in bytes, as GL expects it for strides.
    #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub const STRIDE: i32 = std::mem::size_of::<Self>() as i32;

    /// A vertex at a 2D position with a color and no texture coordinates.
    #[must_use]
    pub fn new(position: Vec2, color: Color) -> Self {
        Self {
            position: [position.x, position.y, 0.0],
            color,
            tex_coords: [0.0, 0.0],
            normal: [0.0; 3],
        }
    }

    /// A vertex in space with a color and a normal.
    #[must_use]
    pub fn with_normal(position: Vec3, color: Color, normal: Vec3) -> Self {
        Self {
            position: position.to_array(),
            color,
            tex_coords: [0.0, 0.0],
            normal: normal.to_array(),
        }
    }

    /// A white vertex with texture coordinates.
    #[must_use]
    pub fn textured(position: Vec2, tex_coords: Vec2) -> Self {
        Self {
            position: [position.x, position.y, 0.0],
            color: Color::WHITE,
            tex_coords: tex_coords.to_array(),
            normal: [0.0; 3],
        }
    }
}

/// The kind of primitive a vertex sequence describes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// Individual points.
    #[default]
    Points,
    /// Independent line segments.
    Lines,
    /// Connected line segments.
    LineStrip,
    /// Independent triangles.
    Triangles,
    /// Triangles sharing an edge with the previous one.
    TriangleStrip,
    /// Triangles sharing the first vertex.
    TriangleFan,
    /// Independent quads. Not available on OpenGL ES.
    Quads,
}

/// GL drawing mode for quads, missing from core and ES constant tables.
pub const GL_QUADS: u32 = 0x0007;

impl PrimitiveType {
    /// The native drawing mode for this primitive type.
    #[must_use]
    pub fn gl_mode(self) -> u32 {
        const MODES: [u32; 7] = [
            glow::POINTS,
            glow::LINES,
            glow::LINE_STRIP,
            glow::TRIANGLES,
            glow::TRIANGLE_STRIP,
            glow::TRIANGLE_FAN,
            GL_QUADS,
        ];
        MODES[self as usize]
    }
}

/// A blending factor applied to source or destination color.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    /// `(0, 0, 0, 0)`
    Zero,
    /// `(1, 1, 1, 1)`
    One,
    /// `(src.r, src.g, src.b, src.a)`
    SrcColor,
    /// `(1, 1, 1, 1) - src`
    OneMinusSrcColor,
    /// `(dst.r, dst.g, dst.b, dst.a)`
    DstColor,
    /// `(1, 1, 1, 1) - dst`
    OneMinusDstColor,
    /// `(src.a, src.a, src.a, src.a)`
    SrcAlpha,
    /// `(1, 1, 1, 1) - src.a`
    OneMinusSrcAlpha,
    /// `(dst.a, dst.a, dst.a, dst.a)`
    DstAlpha,
    /// `(1, 1, 1, 1) - dst.a`
    OneMinusDstAlpha,
}

impl BlendFactor {
    /// The corresponding GL constant.
    #[must_use]
    pub fn gl_constant(self) -> u32 {
        match self {
            Self::Zero => glow::ZERO,
            Self::One => glow::ONE,
            Self::SrcColor => glow::SRC_COLOR,
            Self::OneMinusSrcColor => glow::ONE_MINUS_SRC_COLOR,
            Self::DstColor => glow::DST_COLOR,
            Self::OneMinusDstColor => glow::ONE_MINUS_DST_COLOR,
            Self::SrcAlpha => glow::SRC_ALPHA,
            Self::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
            Self::DstAlpha => glow::DST_ALPHA,
            Self::OneMinusDstAlpha => glow::ONE_MINUS_DST_ALPHA,
        }
    }
}

/// How the weighted source and destination colors are combined.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BlendEquation {
    /// `src * src_factor + dst * dst_factor`
    Add,
    /// `src * src_factor - dst * dst_factor`
    Subtract,
}

impl BlendEquation {
    /// The corresponding GL constant.
    #[must_use]
    pub fn gl_constant(self) -> u32 {
        match self {
            Self::Add => glow::FUNC_ADD,
            Self::Subtract => glow::FUNC_SUBTRACT,
        }
    }
}

/// Six-component blend mode: factors and equation for color and alpha.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlendMode {
    /// Source factor for the color channels.
    pub color_src_factor: BlendFactor,
    /// Destination factor for the color channels.
    pub color_dst_factor: BlendFactor,
    /// Equation for the color channels.
    pub color_equation: BlendEquation,
    /// Source factor for the alpha channel.
    pub alpha_src_factor: BlendFactor,
    /// Destination factor for the alpha channel.
    pub alpha_dst_factor: BlendFactor,
    /// Equation for the alpha channel.
    pub alpha_equation: BlendEquation,
}

impl BlendMode {
    /// Classic alpha blending.
    pub const ALPHA: Self = Self::separate(
        BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha,
        BlendEquation::Add,
        BlendFactor::One,
        BlendFactor::OneMinusSrcAlpha,
        BlendEquation::Add,
    );
    /// Additive blending.
    pub const ADD: Self = Self::separate(
        BlendFactor::SrcAlpha,
        BlendFactor::One,
        BlendEquation::Add,
        BlendFactor::One,
        BlendFactor::One,
        BlendEquation::Add,
    );
    /// Multiplicative blending.
    pub const MULTIPLY: Self = Self::uniform(BlendFactor::DstColor, BlendFactor::Zero, BlendEquation::Add);
    /// Overwrite, no blending.
    pub const NONE: Self = Self::uniform(BlendFactor::One, BlendFactor::Zero, BlendEquation::Add);

    /// The same factors and equation for color and alpha.
    #[must_use]
    pub const fn uniform(src: BlendFactor, dst: BlendFactor, equation: BlendEquation) -> Self {
        Self::separate(src, dst, equation, src, dst, equation)
    }

    /// Distinct factors and equations for color and alpha.
    #[must_use]
    pub const fn separate(
        color_src_factor: BlendFactor,
        color_dst_factor: BlendFactor,
        color_equation: BlendEquation,
        alpha_src_factor: BlendFactor,
        alpha_dst_factor: BlendFactor,
        alpha_equation: BlendEquation,
    ) -> Self {
        Self {
            color_src_factor,
            color_dst_factor,
            color_equation,
            alpha_src_factor,
            alpha_dst_factor,
            alpha_equation,
        }
    }
}

impl Default for BlendMode {
    fn default() -> Self {
        Self::ALPHA
    }
}

/// An integer rectangle (left, top, width, height), e.g. a viewport in pixels.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct IntRect {
    /// Left coordinate.
    pub left: i32,
    /// Top coordinate.
    pub top: i32,
    /// Width.
    pub width: i32,
    /// Height.
    pub height: i32,
}

impl IntRect {
    /// Build a rectangle from its components.
    #[must_use]
    pub const fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Whether `point` lies inside the rectangle (right/bottom edges excluded).
    #[must_use]
    pub fn contains(&self, point: IVec2) -> bool {
        point.x >= self.left
            && point.x < self.left + self.width
            && point.y >= self.top
            && point.y < self.top + self.height
    }
}

/// A floating-point rectangle (left, top, width, height).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct FloatRect {
    /// Left coordinate.
    pub left: f32,
    /// Top coordinate.
    pub top: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl FloatRect {
    /// The whole target, as a viewport ratio.
    pub const FULL: Self = Self::new(0.0, 0.0, 1.0, 1.0);

    /// Build a rectangle from its components.
    #[must_use]
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}
