//! The default backend: fixed-function pipeline, client-side vertex arrays
//! and the GL matrix stacks.

use std::sync::Arc;

use glam::{Mat3, Mat4, Vec3};
use log::warn;

use super::{
    cache::{StatesCache, VERTEX_CACHE_SIZE},
    target, Frame, RenderStates,
};
use crate::{
    cache_id::CacheId,
    device::{legacy, GlDevice},
    error::StateStackError,
    shader::Shader,
    texture::{CoordinateType, Texture},
    types::{BlendMode, Color, PrimitiveType, Vertex},
};

/// Draws with the fixed-function pipeline.
pub struct LegacyBackend<D: GlDevice> {
    device: Arc<D>,
    cache: StatesCache,
    pushed: bool,
}

impl<D: GlDevice> LegacyBackend<D> {
    pub(crate) fn new(device: Arc<D>) -> Self {
        Self {
            device,
            cache: StatesCache::default(),
            pushed: false,
        }
    }

    /// The state cache, as left by the last operation.
    #[must_use]
    pub fn cache(&self) -> &StatesCache {
        &self.cache
    }

    pub(crate) fn initialize(&mut self) {
        self.cache.invalidate();
    }

    /// Client-side arrays own no GL objects.
    pub(crate) fn deinitialize(&mut self) {}

    pub(crate) fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    pub(crate) fn set_view_changed(&mut self) {
        self.cache.view_changed = true;
    }

    pub(crate) fn clear(&mut self, color: Color) {
        if self.cache.needs_clear_color(color) {
            self.device.clear_color(color.to_f32());
        }
        self.device.clear(glow::COLOR_BUFFER_BIT);
    }

    pub(crate) fn draw(
        &mut self,
        frame: Frame<'_>,
        vertices: &[Vertex],
        primitive: PrimitiveType,
        states: &RenderStates<'_, D>,
    ) {
        if vertices.is_empty() {
            return;
        }
        if primitive == PrimitiveType::Quads && !self.device.capabilities().native_quads {
            warn!("the quads primitive type is not supported by this context, draw skipped");
            return;
        }
        if !self.cache.gl_states_set {
            self.reset();
        }

        let device = &*self.device;
        let use_vertex_cache = vertices.len() <= VERTEX_CACHE_SIZE;
        if use_vertex_cache {
            // Pre-transformed, drawn with an identity model-view.
            let normal_matrix = Mat3::from_mat4(states.transform).inverse().transpose();
            for (cached, vertex) in self.cache.vertex_cache.iter_mut().zip(vertices) {
                let position = states.transform.transform_point3(Vec3::from_array(vertex.position));
                let normal = (normal_matrix * Vec3::from_array(vertex.normal)).normalize_or_zero();
                *cached = Vertex {
                    position: position.to_array(),
                    normal: normal.to_array(),
                    ..*vertex
                };
            }
            if !self.cache.use_vertex_cache {
                load_model_view(device, &Mat4::IDENTITY);
            }
        } else {
            load_model_view(device, &states.transform);
        }

        if self.cache.view_changed {
            apply_current_view(device, &mut self.cache, frame);
        }
        if self.cache.last_blend_mode != states.blend_mode {
            self.cache.apply_blend_mode(device, states.blend_mode);
        }
        let texture_id = states.texture.map_or(CacheId::NONE, Texture::cache_id);
        if texture_id != self.cache.last_texture_id {
            apply_texture(device, &mut self.cache, states.texture);
        }
        if let Some(shader) = states.shader {
            Shader::bind(device, Some(shader));
        }

        let batch = if use_vertex_cache {
            &self.cache.vertex_cache[..vertices.len()]
        } else {
            vertices
        };
        device.draw_client_vertices(primitive.gl_mode(), batch);

        if states.shader.is_some() {
            Shader::bind(device, None);
        }
        self.cache.use_vertex_cache = use_vertex_cache;
    }

    /// Set every persistent state this backend relies on.
    pub(crate) fn reset(&mut self) {
        let device = &*self.device;
        device.disable(glow::CULL_FACE);
        device.disable(legacy::LIGHTING);
        device.disable(glow::DEPTH_TEST);
        device.disable(legacy::ALPHA_TEST);
        device.enable(glow::TEXTURE_2D);
        device.enable(glow::BLEND);
        device.matrix_mode(legacy::MODELVIEW);
        for array in [
            legacy::VERTEX_ARRAY,
            legacy::COLOR_ARRAY,
            legacy::TEXTURE_COORD_ARRAY,
            legacy::NORMAL_ARRAY,
        ] {
            device.enable_client_state(array);
        }

        let cache = &mut self.cache;
        cache.gl_states_set = true;
        cache.apply_blend_mode(device, BlendMode::ALPHA);
        load_model_view(device, &Mat4::IDENTITY);
        apply_texture(device, cache, None);
        if device.capabilities().shaders {
            Shader::bind(device, None);
        }
        cache.use_vertex_cache = false;
        cache.view_changed = true;
    }

    pub(crate) fn push_gl_states(&mut self) -> Result<(), StateStackError> {
        if self.pushed {
            return Err(StateStackError::AlreadyPushed);
        }
        let device = &*self.device;
        device.push_client_attrib(legacy::CLIENT_ALL_ATTRIB_BITS);
        device.push_attrib(legacy::ALL_ATTRIB_BITS);
        for mode in [legacy::MODELVIEW, legacy::PROJECTION, legacy::TEXTURE] {
            device.matrix_mode(mode);
            device.push_matrix();
        }
        self.pushed = true;
        self.reset();
        Ok(())
    }

    pub(crate) fn pop_gl_states(&mut self) -> Result<(), StateStackError> {
        if !self.pushed {
            return Err(StateStackError::NothingPushed);
        }
        let device = &*self.device;
        for mode in [legacy::PROJECTION, legacy::MODELVIEW, legacy::TEXTURE] {
            device.matrix_mode(mode);
            device.pop_matrix();
        }
        device.pop_client_attrib();
        // Restores the matrix mode as well.
        device.pop_attrib();
        self.pushed = false;
        self.cache.invalidate();
        Ok(())
    }
}

fn load_model_view<D: GlDevice>(device: &D, transform: &Mat4) {
    device.load_matrix(&transform.to_cols_array());
}

fn apply_current_view<D: GlDevice>(device: &D, cache: &mut StatesCache, frame: Frame<'_>) {
    device.viewport(target::gl_viewport(frame));
    device.matrix_mode(legacy::PROJECTION);
    device.load_matrix(&frame.view.transform().to_cols_array());
    device.matrix_mode(legacy::MODELVIEW);
    cache.view_changed = false;
}

fn apply_texture<D: GlDevice>(device: &D, cache: &mut StatesCache, texture: Option<&Texture<D>>) {
    Texture::bind(device, texture, CoordinateType::Pixels);
    cache.last_texture_id = texture.map_or(CacheId::NONE, Texture::cache_id);
}
