//! Render targets and the two drawing backends behind them.
//!
//! A [`RenderTarget`] owns exactly one backend, chosen when it is created:
//!
//! - the **buffer-object** backend streams vertices through a vertex buffer
//!   and draws them with the built-in shader (or a compatible user shader);
//! - the **default** backend drives the fixed-function pipeline with
//!   client-side vertex arrays and the GL matrix stacks.
//!
//! Both backends remember the GL state they last applied in a
//! [`StatesCache`] and skip redundant state changes.

mod buffer_object;
mod cache;
mod legacy;
mod states;
mod target;

use glam::UVec2;

use crate::device::GlDevice;

pub use buffer_object::BufferObjectBackend;
pub use cache::{StatesCache, VERTEX_CACHE_SIZE};
pub use legacy::LegacyBackend;
pub use states::RenderStates;
pub use target::RenderTarget;

/// The window or off-screen surface a [`RenderTarget`] draws into.
///
/// Implemented by the windowing layer.
pub trait RenderSurface {
    /// Size of the surface in pixels.
    fn size(&self) -> UVec2;

    /// Make (or stop making) the surface's GL context current on this
    /// thread. Returns `false` if that failed, in which case the operation
    /// that needed the context is skipped.
    fn set_active(&mut self, active: bool) -> bool;
}

/// Something that knows how to draw itself on a render target.
pub trait Drawable<D: GlDevice> {
    /// Issue the draw calls for `self`.
    fn draw<S: RenderSurface>(&self, target: &mut RenderTarget<D, S>, states: &RenderStates<'_, D>);
}

/// Which backend a [`RenderTarget`] should prefer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum BackendHint {
    /// Always use the fixed-function backend.
    Default,
    /// Use buffer objects and shaders when the context supports them.
    #[default]
    BufferObject,
}

/// The backend a [`RenderTarget`] ended up with.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// Fixed-function pipeline with client-side arrays.
    Default,
    /// Vertex buffer plus shader pipeline.
    BufferObject,
}

/// What a backend needs to know about the target for one operation.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Frame<'a> {
    pub size: UVec2,
    pub view: &'a crate::view::View,
}
