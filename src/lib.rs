//! OpenGL render targets with a state-caching draw pipeline, built on
//! [glow].
//!
//! A [`RenderTarget`] draws batches of [`Vertex`]es into a window or
//! off-screen surface. It picks one of two backends when it is created:
//!
//! - the **buffer-object** backend streams vertices through a vertex buffer
//!   and draws them with a built-in (or user-supplied) GLSL program;
//! - the **default** backend uses the fixed-function pipeline, for contexts
//!   without shaders.
//!
//! Both backends cache the GL state they last set and only send what a draw
//! changes. [`Shader`], [`Texture`] and [`UniformBuffer`] wrap the
//! corresponding GL objects, and [`Light`]s share a [`LightRegistry`] of
//! slots usable from shaders and the fixed-function pipeline alike.
//!
//! # GPU access
//!
//! All GL calls go through the [`GlDevice`] trait. [`GlowDevice`] implements
//! it on top of a [`glow::Context`]; creating one requires a current OpenGL
//! context, which is why its constructors are `unsafe`.
//!
//! # Logging
//!
//! Problems that do not abort an operation (a skipped draw, a missing
//! uniform, a failed backend that falls back) are reported through the
//! [`log`] facade. The crate never installs a logger.
//!
//! [glow]: https://docs.rs/glow

mod cache_id;
mod device;
mod error;
mod geometry;
mod glow_device;
mod light;
mod polyhedron;
mod render;
mod shader;
pub mod shaders;
mod tessellate;
mod texture;
mod types;
mod uniform_buffer;
mod view;

#[cfg(test)]
mod test_support;

pub use cache_id::CacheId;
pub use device::{legacy, Capabilities, GlDevice, UniformValue};
pub use error::{BackendError, DeviceError, ShaderError, ShapeError, StateStackError, TextureError};
pub use geometry::{Bounds, GeometryBuffer};
pub use glow_device::GlowDevice;
pub use light::{Light, LightRegistry};
pub use polyhedron::{cuboid, sphere, ConvexPolyhedron};
pub use render::{
    BackendHint, BackendKind, BufferObjectBackend, Drawable, LegacyBackend, RenderStates, RenderSurface,
    RenderTarget, StatesCache, VERTEX_CACHE_SIZE,
};
pub use shader::{ParameterBlock, Shader, ShaderStage};
pub use tessellate::{fill_polygon, stroke_polyline, Shape, ShapeBuilder};
pub use texture::{CoordinateType, Texture};
pub use types::{BlendEquation, BlendFactor, BlendMode, Color, FloatRect, IntRect, PrimitiveType, Vertex, GL_QUADS};
pub use uniform_buffer::UniformBuffer;
pub use view::{Projection, View};
