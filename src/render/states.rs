use glam::Mat4;

use crate::{device::GlDevice, shader::Shader, texture::Texture, types::BlendMode};

/// Everything that configures one draw call besides its vertices.
///
/// Built per draw and never retained; the texture and shader are borrowed.
pub struct RenderStates<'a, D: GlDevice> {
    /// How drawn pixels combine with the target.
    pub blend_mode: BlendMode,
    /// Model transform applied to every vertex.
    pub transform: Mat4,
    /// Texture sampled with the vertices' texture coordinates.
    pub texture: Option<&'a Texture<D>>,
    /// Shader replacing the built-in one.
    pub shader: Option<&'a Shader<D>>,
}

impl<D: GlDevice> RenderStates<'_, D> {
    /// Alpha blending, identity transform, no texture and no shader.
    pub const DEFAULT: Self = Self {
        blend_mode: BlendMode::ALPHA,
        transform: Mat4::IDENTITY,
        texture: None,
        shader: None,
    };
}

impl<'a, D: GlDevice> RenderStates<'a, D> {
    /// Default states with a texture.
    #[must_use]
    pub fn with_texture(texture: &'a Texture<D>) -> Self {
        Self {
            texture: Some(texture),
            ..Self::DEFAULT
        }
    }

    /// Default states with a shader.
    #[must_use]
    pub fn with_shader(shader: &'a Shader<D>) -> Self {
        Self {
            shader: Some(shader),
            ..Self::DEFAULT
        }
    }

    /// Default states with a transform.
    #[must_use]
    pub fn with_transform(transform: Mat4) -> Self {
        Self {
            transform,
            ..Self::DEFAULT
        }
    }

    /// Default states with a blend mode.
    #[must_use]
    pub fn with_blend_mode(blend_mode: BlendMode) -> Self {
        Self {
            blend_mode,
            ..Self::DEFAULT
        }
    }

    /// These states with `transform` applied after the current transform.
    #[must_use]
    pub fn transformed(&self, transform: Mat4) -> Self {
        Self {
            transform: self.transform * transform,
            ..*self
        }
    }
}

impl<D: GlDevice> Default for RenderStates<'_, D> {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl<D: GlDevice> Clone for RenderStates<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: GlDevice> Copy for RenderStates<'_, D> {}

impl<D: GlDevice> std::fmt::Debug for RenderStates<'_, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderStates")
            .field("blend_mode", &self.blend_mode)
            .field("transform", &self.transform)
            .field("texture", &self.texture.map(Texture::cache_id))
            .field("shader", &self.shader.map(Shader::cache_id))
            .finish()
    }
}
