use crate::{
    cache_id::CacheId,
    device::GlDevice,
    types::{BlendMode, Color, Vertex},
};

/// Largest vertex batch the default backend pre-transforms on the CPU.
pub const VERTEX_CACHE_SIZE: usize = 4;

/// The render state a backend last applied to the GPU.
///
/// Textures and shaders are remembered by [`CacheId`], never by GL handle:
/// handles are recycled after deletion, cache ids are not.
#[derive(Clone, Debug)]
pub struct StatesCache {
    /// Whether the persistent GL states have been set since the last
    /// (re)initialization or state pop.
    pub gl_states_set: bool,
    /// Whether the view changed since it was last applied.
    pub view_changed: bool,
    /// Blend mode currently set.
    pub last_blend_mode: BlendMode,
    /// Texture currently bound.
    pub last_texture_id: CacheId,
    /// Shader currently bound.
    pub last_shader_id: CacheId,
    /// Clear color currently set.
    pub last_clear_color: Option<Color>,
    /// Whether the previous draw went through the vertex cache.
    pub use_vertex_cache: bool,
    /// Pre-transformed vertices of the current small batch.
    pub vertex_cache: [Vertex; VERTEX_CACHE_SIZE],
}

impl Default for StatesCache {
    fn default() -> Self {
        Self {
            gl_states_set: false,
            view_changed: true,
            last_blend_mode: BlendMode::ALPHA,
            last_texture_id: CacheId::NONE,
            last_shader_id: CacheId::NONE,
            last_clear_color: None,
            use_vertex_cache: false,
            vertex_cache: [Vertex::default(); VERTEX_CACHE_SIZE],
        }
    }
}

impl StatesCache {
    /// Forget the persistent states so the next draw sets them again.
    pub fn invalidate(&mut self) {
        self.gl_states_set = false;
        self.last_clear_color = None;
    }

    /// Set the blend function and equation of `mode`.
    pub(crate) fn apply_blend_mode<D: GlDevice>(&mut self, device: &D, mode: BlendMode) {
        device.blend_func_separate(
            mode.color_src_factor.gl_constant(),
            mode.color_dst_factor.gl_constant(),
            mode.alpha_src_factor.gl_constant(),
            mode.alpha_dst_factor.gl_constant(),
        );
        device.blend_equation_separate(mode.color_equation.gl_constant(), mode.alpha_equation.gl_constant());
        self.last_blend_mode = mode;
    }

    /// Whether `color` has to be sent before clearing, recording it if so.
    pub fn needs_clear_color(&mut self, color: Color) -> bool {
        if self.last_clear_color == Some(color) {
            return false;
        }
        self.last_clear_color = Some(color);
        true
    }
}
