//! The buffer-object backend: vertices are streamed through one vertex
//! buffer and drawn with a shader.
//!
//! # Caching
//!
//! - The blend mode is only sent when it differs from the last one.
//! - Without a user shader, the texture is only rebound when its cache id
//!   changes and the projection only when the view changed.
//! - User shaders can hold parameters we cannot track, so transform,
//!   texture and view are applied on every draw that uses one. The default
//!   shader is rebound after such a draw.

use std::sync::Arc;

use glam::Mat4;
use log::{debug, warn};

use super::{cache::StatesCache, target, Frame, RenderStates};
use crate::{
    cache_id::CacheId,
    device::{Capabilities, GlDevice},
    error::{BackendError, DeviceError, StateStackError},
    shader::Shader,
    shaders,
    texture::Texture,
    types::{BlendMode, Color, PrimitiveType, Vertex},
};

/// Attribute locations of position, color, texture coordinates and normal.
const ATTRIBUTE_COUNT: u32 = 4;

fn gl_enum(value: i32) -> u32 {
    u32::try_from(value).unwrap_or_default()
}

fn set_enabled<D: GlDevice>(device: &D, capability: u32, enabled: bool) {
    if enabled {
        device.enable(capability);
    } else {
        device.disable(capability);
    }
}

/// GL state captured by `push_gl_states`.
struct SavedGlStates<D: GlDevice> {
    program: Option<D::Program>,
    array_buffer: Option<D::Buffer>,
    vertex_array: Option<Option<D::VertexArray>>,
    blend_factors: [u32; 4],
    blend_equations: [u32; 2],
    cull_face: bool,
    depth_test: bool,
    blend: bool,
    attribute_arrays: [bool; ATTRIBUTE_COUNT as usize],
}

impl<D: GlDevice> SavedGlStates<D> {
    fn capture(device: &D) -> Self {
        let caps = device.capabilities();
        Self {
            program: device.current_program(),
            array_buffer: device.bound_buffer(glow::ARRAY_BUFFER_BINDING),
            vertex_array: caps.vertex_arrays.then(|| device.bound_vertex_array()),
            blend_factors: [
                glow::BLEND_SRC_RGB,
                glow::BLEND_DST_RGB,
                glow::BLEND_SRC_ALPHA,
                glow::BLEND_DST_ALPHA,
            ]
            .map(|parameter| gl_enum(device.get_integer(parameter))),
            blend_equations: [glow::BLEND_EQUATION_RGB, glow::BLEND_EQUATION_ALPHA]
                .map(|parameter| gl_enum(device.get_integer(parameter))),
            cull_face: device.is_enabled(glow::CULL_FACE),
            depth_test: device.is_enabled(glow::DEPTH_TEST),
            blend: device.is_enabled(glow::BLEND),
            attribute_arrays: [0, 1, 2, 3].map(|index| device.is_vertex_attrib_array_enabled(index)),
        }
    }

    fn restore(self, device: &D) {
        device.use_program(self.program);
        if let Some(vertex_array) = self.vertex_array {
            device.bind_vertex_array(vertex_array);
        }
        device.bind_buffer(glow::ARRAY_BUFFER, self.array_buffer);
        let [src_rgb, dst_rgb, src_alpha, dst_alpha] = self.blend_factors;
        device.blend_func_separate(src_rgb, dst_rgb, src_alpha, dst_alpha);
        let [rgb, alpha] = self.blend_equations;
        device.blend_equation_separate(rgb, alpha);
        set_enabled(device, glow::CULL_FACE, self.cull_face);
        set_enabled(device, glow::DEPTH_TEST, self.depth_test);
        set_enabled(device, glow::BLEND, self.blend);
        for (index, enabled) in (0..).zip(self.attribute_arrays) {
            if enabled {
                device.enable_vertex_attrib_array(index);
            } else {
                device.disable_vertex_attrib_array(index);
            }
        }
    }
}

/// Draws through a streamed vertex buffer and the built-in shader.
pub struct BufferObjectBackend<D: GlDevice> {
    device: Arc<D>,
    default_shader: Shader<D>,
    default_texture: Texture<D>,
    buffer: Option<D::Buffer>,
    vertex_array: Option<D::VertexArray>,
    capacity: usize,
    attributes_stale: bool,
    cache: StatesCache,
    saved: Option<SavedGlStates<D>>,
}

impl<D: GlDevice> BufferObjectBackend<D> {
    /// Whether the context can run this backend: it needs both shaders and
    /// buffer objects.
    #[must_use]
    pub fn is_available(caps: &Capabilities) -> bool {
        caps.shaders && caps.buffer_objects
    }

    /// Build the default shader and the 1×1 white fallback texture. The
    /// vertex buffer is created by [`initialize`](Self::initialize).
    ///
    /// # Errors
    ///
    /// Fails if the context cannot run this backend or a resource cannot
    /// be created.
    pub(crate) fn new(device: Arc<D>) -> Result<Self, BackendError> {
        if !Self::is_available(device.capabilities()) {
            return Err(BackendError::Unavailable);
        }
        let default_shader = Shader::builtin(Arc::clone(&device))?;
        let mut default_texture = Texture::new(Arc::clone(&device));
        default_texture.create(1, 1)?;
        default_texture.update(&[u8::MAX; 4])?;
        let vertex_array = if device.capabilities().vertex_arrays {
            Some(
                device
                    .create_vertex_array()
                    .map_err(DeviceError::creating("vertex array"))?,
            )
        } else {
            None
        };
        Ok(Self {
            device,
            default_shader,
            default_texture,
            buffer: None,
            vertex_array,
            capacity: 0,
            attributes_stale: true,
            cache: StatesCache::default(),
            saved: None,
        })
    }

    /// The state cache, as left by the last operation.
    #[must_use]
    pub fn cache(&self) -> &StatesCache {
        &self.cache
    }

    /// The built-in shader.
    #[must_use]
    pub fn default_shader(&self) -> &Shader<D> {
        &self.default_shader
    }

    /// Recreate the vertex buffer and defer the persistent states to the
    /// next draw.
    pub(crate) fn initialize(&mut self) {
        self.cache.invalidate();
        if let Some(buffer) = self.buffer.take() {
            self.device.delete_buffer(buffer);
        }
        match self.device.create_buffer() {
            Ok(buffer) => self.buffer = Some(buffer),
            Err(e) => warn!("{}", DeviceError::creating("vertex buffer")(e)),
        }
        self.capacity = 0;
        self.attributes_stale = true;
    }

    /// Free the vertex buffer.
    pub(crate) fn deinitialize(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            self.device.delete_buffer(buffer);
        }
        self.capacity = 0;
    }

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
        let Ok(count) = i32::try_from(vertices.len()) else {
            warn!("cannot draw {} vertices in one call, draw skipped", vertices.len());
            return;
        };
        if self.buffer.is_none() {
            warn!("no vertex buffer, draw skipped");
            return;
        }

        if !self.cache.gl_states_set {
            self.reset();
        }
        if self.cache.last_blend_mode != states.blend_mode {
            self.cache.apply_blend_mode(&*self.device, states.blend_mode);
        }

        let Self {
            device,
            default_shader,
            default_texture,
            cache,
            ..
        } = self;
        let device = &**device;

        if let Some(shader) = states.shader {
            if !shader.is_compatible() {
                warn!("shader is not compatible with the buffer-object pipeline, draw skipped");
                return;
            }
            apply_transform(shader, &states.transform);
            apply_texture(device, cache, shader, states.texture, default_texture);
            apply_current_view(device, cache, shader, frame);
            if shader.cache_id() != cache.last_shader_id {
                apply_shader(device, cache, shader);
            }
        } else if cache.last_shader_id != default_shader.cache_id() {
            apply_transform(default_shader, &states.transform);
            apply_texture(device, cache, default_shader, states.texture, default_texture);
            apply_current_view(device, cache, default_shader, frame);
            apply_shader(device, cache, default_shader);
        } else {
            apply_transform(default_shader, &states.transform);
            let texture_id = drawn_texture(states.texture, default_texture).cache_id();
            if texture_id != cache.last_texture_id {
                apply_texture(device, cache, default_shader, states.texture, default_texture);
            }
            if cache.view_changed {
                apply_current_view(device, cache, default_shader, frame);
            }
        }

        self.upload(bytemuck::cast_slice(vertices));
        self.device.draw_arrays(primitive.gl_mode(), 0, count);

        if states.shader.is_some() {
            let Self {
                device,
                default_shader,
                cache,
                ..
            } = self;
            apply_shader(&**device, cache, default_shader);
            // The user shader's texture and view never reached the default
            // shader's uniforms.
            cache.last_texture_id = CacheId::NONE;
            cache.view_changed = true;
        }
    }

    /// Stream `data` into the vertex buffer, orphaning the old storage
    /// first so the driver does not wait for pending draws.
    fn upload(&mut self, data: &[u8]) {
        let capacity = self.capacity.max(data.len());
        let size = i32::try_from(capacity).unwrap_or(i32::MAX);
        self.device.buffer_data_size(glow::ARRAY_BUFFER, size, glow::STREAM_DRAW);
        self.device.buffer_data(glow::ARRAY_BUFFER, data, glow::STREAM_DRAW);

        if capacity != self.capacity || self.attributes_stale {
            if capacity != self.capacity {
                debug!("vertex buffer grown to {capacity} bytes");
            }
            self.capacity = capacity;
            self.attributes_stale = false;
            let device = &*self.device;
            device.vertex_attrib_pointer(0, 3, glow::FLOAT, false, Vertex::STRIDE, Vertex::POSITION_OFFSET);
            device.vertex_attrib_pointer(1, 4, glow::UNSIGNED_BYTE, true, Vertex::STRIDE, Vertex::COLOR_OFFSET);
            device.vertex_attrib_pointer(2, 2, glow::FLOAT, false, Vertex::STRIDE, Vertex::TEX_COORDS_OFFSET);
            device.vertex_attrib_pointer(3, 3, glow::FLOAT, false, Vertex::STRIDE, Vertex::NORMAL_OFFSET);
        }
    }

    /// Set every persistent state this backend relies on.
    pub(crate) fn reset(&mut self) {
        let device = &*self.device;
        device.disable(glow::CULL_FACE);
        device.disable(glow::DEPTH_TEST);
        device.enable(glow::BLEND);
        if let Some(vertex_array) = self.vertex_array {
            device.bind_vertex_array(Some(vertex_array));
        }
        for index in 0..ATTRIBUTE_COUNT {
            device.enable_vertex_attrib_array(index);
        }
        device.bind_buffer(glow::ARRAY_BUFFER, self.buffer);
        self.attributes_stale = true;

        let cache = &mut self.cache;
        cache.gl_states_set = true;
        cache.apply_blend_mode(device, BlendMode::ALPHA);
        apply_transform(&self.default_shader, &Mat4::IDENTITY);
        apply_texture(device, cache, &self.default_shader, None, &self.default_texture);
        apply_shader(device, cache, &self.default_shader);
        cache.view_changed = true;
    }

    pub(crate) fn push_gl_states(&mut self) -> Result<(), StateStackError> {
        if self.saved.is_some() {
            return Err(StateStackError::AlreadyPushed);
        }
        self.saved = Some(SavedGlStates::capture(&*self.device));
        self.reset();
        Ok(())
    }

    pub(crate) fn pop_gl_states(&mut self) -> Result<(), StateStackError> {
        let saved = self.saved.take().ok_or(StateStackError::NothingPushed)?;
        saved.restore(&*self.device);
        // The restored states are foreign; ours are set again on the next draw.
        self.cache.invalidate();
        Ok(())
    }
}

impl<D: GlDevice> Drop for BufferObjectBackend<D> {
    fn drop(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            self.device.delete_buffer(buffer);
        }
        if let Some(vertex_array) = self.vertex_array.take() {
            self.device.delete_vertex_array(vertex_array);
        }
    }
}

/// The texture a draw samples: the given one if it has storage, the white
/// fallback otherwise.
fn drawn_texture<'a, D: GlDevice>(texture: Option<&'a Texture<D>>, fallback: &'a Texture<D>) -> &'a Texture<D> {
    texture.filter(|texture| texture.handle().is_some()).unwrap_or(fallback)
}

fn apply_transform<D: GlDevice>(shader: &Shader<D>, transform: &Mat4) {
    shader.set_mat4(shaders::MODEL_VIEW, transform);
}

fn apply_texture<D: GlDevice>(
    device: &D,
    cache: &mut StatesCache,
    shader: &Shader<D>,
    texture: Option<&Texture<D>>,
    fallback: &Texture<D>,
) {
    let drawn = drawn_texture(texture, fallback);
    shader.set_texture(shaders::TEXTURE, drawn);
    // The sampler only reaches the program when it is bound.
    Shader::bind(device, Some(shader));
    let matrix = if std::ptr::eq(drawn, fallback) {
        Mat4::IDENTITY
    } else {
        drawn.pixel_matrix()
    };
    shader.set_mat4(shaders::TEXTURE_MATRIX, &matrix);
    device.active_texture(0);
    device.bind_texture(drawn.target(), drawn.handle());
    cache.last_texture_id = drawn.cache_id();
}

fn apply_current_view<D: GlDevice>(device: &D, cache: &mut StatesCache, shader: &Shader<D>, frame: Frame<'_>) {
    device.viewport(target::gl_viewport(frame));
    shader.set_mat4(shaders::PROJECTION, &frame.view.transform());
    cache.view_changed = false;
}

fn apply_shader<D: GlDevice>(device: &D, cache: &mut StatesCache, shader: &Shader<D>) {
    Shader::bind(device, Some(shader));
    cache.last_shader_id = shader.cache_id();
}
