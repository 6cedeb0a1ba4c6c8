//! GLSL shader programs.
//!
//! A [`Shader`] owns one linked program plus lazy name → location caches for
//! uniforms, attributes and uniform-block bindings. The caches are filled on
//! first lookup (including negative results) and replaced wholesale when the
//! shader is recompiled.
//!
//! Setters make the program current for the duration of the write and then
//! restore whatever program was current before. Inside a
//! [`ParameterBlock`] the program stays current and setters skip that dance.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    fs,
    path::Path,
    sync::Arc,
};

use glam::{IVec2, IVec3, IVec4, Mat4, Vec2, Vec3, Vec4};
use log::{debug, error, warn};

use crate::{
    cache_id::{self, CacheId, Category},
    device::{GlDevice, UniformValue},
    error::{DeviceError, ShaderError},
    shaders,
    texture::Texture,
    types::Color,
    uniform_buffer::UniformBuffer,
};

/// A programmable pipeline stage.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Runs once per vertex.
    Vertex,
    /// Runs once per primitive.
    Geometry,
    /// Runs once per fragment.
    Fragment,
}

impl ShaderStage {
    /// The corresponding GL constant.
    #[must_use]
    pub fn gl_constant(self) -> u32 {
        match self {
            Self::Vertex => glow::VERTEX_SHADER,
            Self::Geometry => glow::GEOMETRY_SHADER,
            Self::Fragment => glow::FRAGMENT_SHADER,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Geometry => "geometry",
            Self::Fragment => "fragment",
        }
    }
}

/// A sampler uniform and the texture it samples.
struct TextureEntry<D: GlDevice> {
    name: String,
    location: D::UniformLocation,
    handle: D::Texture,
    target: u32,
}

/// A linked GLSL program with cached locations.
pub struct Shader<D: GlDevice> {
    device: Arc<D>,
    program: Option<D::Program>,
    cache_id: CacheId,
    compatible: bool,
    uniforms: RefCell<HashMap<String, Option<D::UniformLocation>>>,
    attributes: RefCell<HashMap<String, Option<u32>>>,
    blocks: RefCell<HashMap<String, Option<u32>>>,
    next_binding: Cell<u32>,
    bound_buffers: RefCell<HashMap<String, CacheId>>,
    textures: RefCell<Vec<TextureEntry<D>>>,
    current_texture: RefCell<Option<D::UniformLocation>>,
    warn_missing: Cell<bool>,
    in_block: Cell<bool>,
}

impl<D: GlDevice> Shader<D> {
    /// An empty shader; load sources with one of the `load_*` methods.
    #[must_use]
    pub fn new(device: Arc<D>) -> Self {
        Self {
            device,
            program: None,
            cache_id: CacheId::NONE,
            compatible: false,
            uniforms: RefCell::default(),
            attributes: RefCell::default(),
            blocks: RefCell::default(),
            next_binding: Cell::new(0),
            bound_buffers: RefCell::default(),
            textures: RefCell::default(),
            current_texture: RefCell::default(),
            warn_missing: Cell::new(true),
            in_block: Cell::new(false),
        }
    }

    /// A shader built from the given sources in one go.
    ///
    /// # Errors
    ///
    /// As [`load_from_memory`](Self::load_from_memory).
    pub fn from_sources(
        device: Arc<D>,
        vertex: Option<&str>,
        fragment: Option<&str>,
        geometry: Option<&str>,
    ) -> Result<Self, ShaderError> {
        let mut shader = Self::new(device);
        shader.load_from_memory(vertex, fragment, geometry)?;
        Ok(shader)
    }

    /// The built-in shader of the buffer-object pipeline for this device.
    ///
    /// # Errors
    ///
    /// Fails if the device has no shader support or the driver rejects the
    /// built-in sources.
    pub fn builtin(device: Arc<D>) -> Result<Self, ShaderError> {
        let (vertex, fragment) = shaders::default_sources(device.capabilities());
        Self::from_sources(device, Some(vertex), Some(fragment), None)
    }

    /// Compile and link the given stages, replacing any previous program.
    ///
    /// On failure the driver log is reported, every created GL object is
    /// deleted and the shader is left without a program.
    ///
    /// # Errors
    ///
    /// Fails if shaders (or geometry shaders) are unsupported, no stage is
    /// given, or a stage fails to compile or link.
    pub fn load_from_memory(
        &mut self,
        vertex: Option<&str>,
        fragment: Option<&str>,
        geometry: Option<&str>,
    ) -> Result<(), ShaderError> {
        let result = self.compile(vertex, fragment, geometry);
        if let Err(e) = &result {
            error!("{e}");
        }
        result
    }

    /// Read the given stage files and compile them.
    ///
    /// # Errors
    ///
    /// Fails if a file cannot be read, or as
    /// [`load_from_memory`](Self::load_from_memory).
    pub fn load_from_file(
        &mut self,
        vertex: Option<&Path>,
        fragment: Option<&Path>,
        geometry: Option<&Path>,
    ) -> Result<(), ShaderError> {
        let read = |path: Option<&Path>| -> Result<Option<String>, ShaderError> {
            path.map(|path| {
                fs::read_to_string(path).map_err(|source| ShaderError::Io {
                    path: path.to_owned(),
                    source,
                })
            })
            .transpose()
        };
        let sources = read(vertex).and_then(|v| Ok((v, read(fragment)?, read(geometry)?)));
        let (vertex, fragment, geometry) = match sources {
            Ok(sources) => sources,
            Err(e) => {
                error!("{e}");
                return Err(e);
            }
        };
        self.load_from_memory(vertex.as_deref(), fragment.as_deref(), geometry.as_deref())
    }

    /// Build a program from a single stage.
    ///
    /// # Errors
    ///
    /// As [`load_from_memory`](Self::load_from_memory).
    pub fn load_stage(&mut self, source: &str, stage: ShaderStage) -> Result<(), ShaderError> {
        match stage {
            ShaderStage::Vertex => self.load_from_memory(Some(source), None, None),
            ShaderStage::Geometry => self.load_from_memory(None, None, Some(source)),
            ShaderStage::Fragment => self.load_from_memory(None, Some(source), None),
        }
    }

    fn compile(
        &mut self,
        vertex: Option<&str>,
        fragment: Option<&str>,
        geometry: Option<&str>,
    ) -> Result<(), ShaderError> {
        let caps = self.device.capabilities();
        if !caps.shaders {
            return Err(ShaderError::Unavailable);
        }
        if geometry.is_some() && !caps.geometry_shaders {
            return Err(ShaderError::GeometryUnavailable);
        }
        if vertex.is_none() && fragment.is_none() && geometry.is_none() {
            return Err(ShaderError::NoStages);
        }

        self.release();
        self.reset_caches();

        let device = &*self.device;
        let program = device
            .create_program()
            .map_err(DeviceError::creating("shader program"))?;

        let mut stages = Vec::with_capacity(3);
        for (stage, source) in [
            (ShaderStage::Vertex, vertex),
            (ShaderStage::Geometry, geometry),
            (ShaderStage::Fragment, fragment),
        ] {
            let Some(source) = source else {
                continue;
            };
            match compile_stage(device, program, stage, source) {
                Ok(shader) => stages.push(shader),
                Err(e) => {
                    for shader in stages {
                        device.delete_shader(shader);
                    }
                    device.delete_program(program);
                    return Err(e);
                }
            }
        }

        if vertex.is_some() {
            for (index, name) in (0..).zip(shaders::ATTRIBUTES) {
                device.bind_attrib_location(program, index, name);
            }
        }

        let linked = device.link_program(program);
        // Attached stages live until the program is deleted.
        for shader in stages {
            device.delete_shader(shader);
        }
        if let Err(log) = linked {
            device.delete_program(program);
            return Err(ShaderError::Link(log));
        }

        // Make the program visible to every context sharing this one.
        device.flush();

        self.compatible = vertex.is_some() && device.attrib_location(program, shaders::ATTRIBUTES[0]) == Some(0);
        self.program = Some(program);
        self.cache_id = cache_id::next(Category::Shader);
        debug!(
            "linked shader program {program:?} (compatible with the buffer-object pipeline: {})",
            self.compatible
        );
        Ok(())
    }

    fn release(&mut self) {
        if let Some(program) = self.program.take() {
            self.device.delete_program(program);
        }
        self.compatible = false;
    }

    fn reset_caches(&mut self) {
        self.uniforms.get_mut().clear();
        self.attributes.get_mut().clear();
        self.blocks.get_mut().clear();
        self.bound_buffers.get_mut().clear();
        self.textures.get_mut().clear();
        *self.current_texture.get_mut() = None;
        self.next_binding.set(0);
    }

    /// Location of a uniform, cached after the first lookup.
    pub fn uniform_location(&self, name: &str) -> Option<D::UniformLocation> {
        let program = self.program?;
        if let Some(cached) = self.uniforms.borrow().get(name) {
            return cached.clone();
        }
        let location = self.device.uniform_location(program, name);
        if location.is_none() && self.warn_missing.get() {
            warn!("uniform \"{name}\" not found in shader");
        }
        self.uniforms
            .borrow_mut()
            .insert(name.to_owned(), location.clone());
        location
    }

    /// Location of a vertex attribute, cached after the first lookup.
    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        let program = self.program?;
        if let Some(cached) = self.attributes.borrow().get(name) {
            return *cached;
        }
        let location = self.device.attrib_location(program, name);
        if location.is_none() && self.warn_missing.get() {
            warn!("attribute \"{name}\" not found in shader");
        }
        self.attributes.borrow_mut().insert(name.to_owned(), location);
        location
    }

    /// Binding point of a uniform block, allocated on first lookup.
    ///
    /// Returns `None` if the block does not exist or every binding point
    /// is taken.
    pub fn block_binding(&self, name: &str) -> Option<u32> {
        let program = self.program?;
        if let Some(cached) = self.blocks.borrow().get(name) {
            return *cached;
        }
        let binding = self.allocate_block_binding(program, name);
        self.blocks.borrow_mut().insert(name.to_owned(), binding);
        binding
    }

    fn allocate_block_binding(&self, program: D::Program, name: &str) -> Option<u32> {
        let Some(index) = self.device.uniform_block_index(program, name) else {
            if self.warn_missing.get() {
                warn!("uniform block \"{name}\" not found in shader");
            }
            return None;
        };
        let max = self.device.capabilities().max_uniform_buffer_bindings;
        let next = self.next_binding.get();
        if next >= max.saturating_sub(1) {
            warn!("cannot create uniform block binding for \"{name}\", out of bindings (max {max})");
            return None;
        }
        self.device.uniform_block_binding(program, index, next);
        self.next_binding.set(next + 1);
        Some(next)
    }

    /// Whether lookups of missing names are reported.
    #[must_use]
    pub fn warn_missing(&self) -> bool {
        self.warn_missing.get()
    }

    /// Enable or disable reporting of missing names.
    pub fn set_warn_missing(&self, warn: bool) {
        self.warn_missing.set(warn);
    }

    /// Run `write` with the program current, restoring the previous program
    /// afterwards unless a parameter block is open.
    fn with_program(&self, write: impl FnOnce(&D)) {
        let Some(program) = self.program else {
            return;
        };
        if self.in_block.get() {
            write(&self.device);
            return;
        }
        let previous = self.device.current_program();
        if previous != Some(program) {
            self.device.use_program(Some(program));
        }
        write(&self.device);
        if previous != Some(program) {
            self.device.use_program(previous);
        }
    }

    fn set(&self, name: &str, value: UniformValue) {
        if self.program.is_none() {
            return;
        }
        if let Some(location) = self.uniform_location(name) {
            self.with_program(|device| device.set_uniform(&location, value));
        }
    }

    /// Set an `int` uniform.
    pub fn set_int(&self, name: &str, value: i32) {
        self.set(name, UniformValue::Int(value));
    }

    /// Set an `ivec2` uniform.
    pub fn set_ivec2(&self, name: &str, value: IVec2) {
        self.set(name, UniformValue::Int2(value.to_array()));
    }

    /// Set an `ivec3` uniform.
    pub fn set_ivec3(&self, name: &str, value: IVec3) {
        self.set(name, UniformValue::Int3(value.to_array()));
    }

    /// Set an `ivec4` uniform.
    pub fn set_ivec4(&self, name: &str, value: IVec4) {
        self.set(name, UniformValue::Int4(value.to_array()));
    }

    /// Set a `float` uniform.
    pub fn set_float(&self, name: &str, value: f32) {
        self.set(name, UniformValue::Float(value));
    }

    /// Set a `vec2` uniform.
    pub fn set_vec2(&self, name: &str, value: Vec2) {
        self.set(name, UniformValue::Float2(value.to_array()));
    }

    /// Set a `vec3` uniform.
    pub fn set_vec3(&self, name: &str, value: Vec3) {
        self.set(name, UniformValue::Float3(value.to_array()));
    }

    /// Set a `vec4` uniform.
    pub fn set_vec4(&self, name: &str, value: Vec4) {
        self.set(name, UniformValue::Float4(value.to_array()));
    }

    /// Set a `mat4` uniform.
    pub fn set_mat4(&self, name: &str, value: &Mat4) {
        self.set(name, UniformValue::Mat4(value.to_cols_array()));
    }

    /// Set a `vec4` uniform from a color, normalized to `0.0..=1.0`.
    pub fn set_color(&self, name: &str, color: Color) {
        self.set(name, UniformValue::Float4(color.to_f32()));
    }

    /// Make the sampler `name` sample `texture` whenever the shader is bound.
    ///
    /// Each sampler takes one texture unit; unit 0 is reserved for the
    /// texture being drawn. When every unit is taken, new samplers are
    /// refused, but already registered ones can still change texture.
    ///
    /// Only the GL handle `texture` has now is kept. `texture` must stay
    /// alive while the shader is bound, and has to be set again after it
    /// is re-created or replaced.
    pub fn set_texture(&self, name: &str, texture: &Texture<D>) {
        if self.program.is_none() {
            return;
        }
        let Some(location) = self.uniform_location(name) else {
            return;
        };
        let Some(handle) = texture.handle() else {
            warn!("texture for \"{name}\" has not been created");
            return;
        };
        let mut textures = self.textures.borrow_mut();
        if let Some(entry) = textures.iter_mut().find(|entry| entry.name == name) {
            entry.handle = handle;
            entry.target = texture.target();
            return;
        }
        let max_units = self.device.capabilities().max_texture_units as usize;
        if textures.len() + 1 >= max_units {
            warn!("cannot use texture \"{name}\" in shader: all available texture units are used");
            return;
        }
        textures.push(TextureEntry {
            name: name.to_owned(),
            location,
            handle,
            target: texture.target(),
        });
    }

    /// Make the sampler `name` sample the texture of the current draw call.
    pub fn set_current_texture(&self, name: &str) {
        if self.program.is_none() {
            return;
        }
        *self.current_texture.borrow_mut() = self.uniform_location(name);
    }

    /// Number of samplers registered with [`set_texture`](Self::set_texture).
    #[must_use]
    pub fn texture_count(&self) -> usize {
        self.textures.borrow().len()
    }

    /// Attach `buffer` to the uniform block `name`. The buffer is only
    /// rebound when a different buffer was attached to the block before.
    pub fn set_block(&self, name: &str, buffer: &UniformBuffer<D>) {
        if !Self::is_uniform_buffer_available(&self.device) {
            return;
        }
        self.with_program(|device| {
            let unchanged = self.bound_buffers.borrow().get(name) == Some(&buffer.cache_id());
            if unchanged {
                return;
            }
            if let Some(binding) = self.block_binding(name) {
                device.bind_buffer_base(glow::UNIFORM_BUFFER, binding, Some(buffer.handle()));
                self.bound_buffers
                    .borrow_mut()
                    .insert(name.to_owned(), buffer.cache_id());
            }
        });
    }

    /// Keep the program current until the returned guard is dropped, so a
    /// batch of setters does not switch programs for every write.
    pub fn begin_parameter_block(&self) -> ParameterBlock<'_, D> {
        let Some(program) = self.program else {
            return ParameterBlock {
                shader: self,
                restore: None,
            };
        };
        if self.in_block.get() {
            return ParameterBlock {
                shader: self,
                restore: None,
            };
        }
        let previous = self.device.current_program();
        if previous != Some(program) {
            self.device.use_program(Some(program));
        }
        self.in_block.set(true);
        ParameterBlock {
            shader: self,
            restore: Some(previous),
        }
    }

    /// Make `shader` current with its textures bound, or unbind any program.
    pub fn bind(device: &D, shader: Option<&Self>) {
        match shader.and_then(|s| s.program.map(|program| (s, program))) {
            Some((shader, program)) => {
                device.use_program(Some(program));
                shader.bind_textures();
                if let Some(location) = shader.current_texture.borrow().as_ref() {
                    device.set_uniform(location, UniformValue::Int(0));
                }
            }
            None => device.use_program(None),
        }
    }

    fn bind_textures(&self) {
        let textures = self.textures.borrow();
        for (unit, entry) in (1..).zip(textures.iter()) {
            self.device
                .set_uniform(&entry.location, UniformValue::Int(unit.try_into().unwrap_or(i32::MAX)));
            self.device.active_texture(unit);
            self.device.bind_texture(entry.target, Some(entry.handle));
        }
        if !textures.is_empty() {
            self.device.active_texture(0);
        }
    }

    /// The linked program, if any.
    #[must_use]
    pub fn program(&self) -> Option<D::Program> {
        self.program
    }

    /// Identity of the current program.
    #[must_use]
    pub fn cache_id(&self) -> CacheId {
        self.cache_id
    }

    /// Whether the program can be used by the buffer-object pipeline:
    /// it has a vertex stage reading `a_position` at location 0.
    #[must_use]
    pub fn is_compatible(&self) -> bool {
        self.compatible
    }

    /// Whether the device supports shaders.
    #[must_use]
    pub fn is_available(device: &D) -> bool {
        device.capabilities().shaders
    }

    /// Whether the device supports geometry shaders.
    #[must_use]
    pub fn is_geometry_available(device: &D) -> bool {
        let caps = device.capabilities();
        caps.shaders && caps.geometry_shaders
    }

    /// Whether the device supports uniform blocks backed by buffers.
    #[must_use]
    pub fn is_uniform_buffer_available(device: &D) -> bool {
        let caps = device.capabilities();
        caps.shaders && caps.uniform_buffers
    }

    /// The GLSL version the device supports, e.g. `"1.40"`.
    #[must_use]
    pub fn supported_version(device: &D) -> &str {
        &device.capabilities().shading_language_version
    }

    /// Uniform components available to the vertex stage.
    #[must_use]
    pub fn maximum_uniform_components(device: &D) -> u32 {
        device.capabilities().max_vertex_uniform_components
    }

    /// The device this shader lives on.
    #[must_use]
    pub fn device(&self) -> &Arc<D> {
        &self.device
    }
}

impl<D: GlDevice> Drop for Shader<D> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Compile one stage and attach it to `program`.
fn compile_stage<D: GlDevice>(
    device: &D,
    program: D::Program,
    stage: ShaderStage,
    source: &str,
) -> Result<D::Shader, ShaderError> {
    let shader = device
        .create_shader(stage.gl_constant())
        .map_err(DeviceError::creating("shader stage"))?;
    if let Err(log) = device.compile_shader(shader, source) {
        device.delete_shader(shader);
        return Err(ShaderError::Compile {
            stage: stage.name(),
            log,
        });
    }
    device.attach_shader(program, shader);
    Ok(shader)
}

/// Scope during which a shader's program stays current.
///
/// Dropping the guard makes the previously current program current again.
#[must_use = "the parameter block ends when the guard is dropped"]
pub struct ParameterBlock<'a, D: GlDevice> {
    shader: &'a Shader<D>,
    restore: Option<Option<D::Program>>,
}

impl<D: GlDevice> ParameterBlock<'_, D> {
    /// End the block now.
    pub fn end(self) {}
}

impl<D: GlDevice> Drop for ParameterBlock<'_, D> {
    fn drop(&mut self) {
        if let Some(previous) = self.restore.take() {
            self.shader.in_block.set(false);
            if previous != self.shader.program {
                self.shader.device.use_program(previous);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        device::Capabilities,
        test_support::{capture_logs, diagnostics, RecordingDevice},
    };

    const VERTEX: &str = "#version 140
in vec3 a_position;
in vec2 a_tex_coord;
uniform mat4 u_model_view;
uniform float u_time;
uniform vec2 u_offset;
void main() {}
";

    const FRAGMENT: &str = "#version 140
uniform vec4 u_tint;
uniform int u_mode;
uniform sampler2D u_texture;
void main() {}
";

    fn device() -> Arc<RecordingDevice> {
        Arc::new(RecordingDevice::desktop())
    }

    fn shader(device: &Arc<RecordingDevice>) -> Shader<RecordingDevice> {
        Shader::from_sources(Arc::clone(device), Some(VERTEX), Some(FRAGMENT), None).unwrap()
    }

    #[test]
    fn compile_failure_deletes_everything() {
        let device = device();
        let mut shader = Shader::new(Arc::clone(&device));
        let (result, logs) = capture_logs(|| shader.load_from_memory(Some(VERTEX), Some("#error nope"), None));
        assert!(matches!(result, Err(ShaderError::Compile { stage: "fragment", .. })));
        assert!(shader.program().is_none());
        assert_eq!(diagnostics(&logs), 1);
        assert_eq!(device.count("create_shader"), device.count("delete_shader"));
        assert_eq!(device.count("delete_program"), 1);
    }

    #[test]
    fn unsupported_contexts_refuse_to_compile() {
        let device = Arc::new(RecordingDevice::legacy());
        let mut shader = Shader::new(Arc::clone(&device));
        let (result, _) = capture_logs(|| shader.load_from_memory(Some(VERTEX), None, None));
        assert!(matches!(result, Err(ShaderError::Unavailable)));
        assert!(!Shader::is_available(&*device));

        let device = Arc::new(RecordingDevice::embedded());
        let mut shader = Shader::new(device);
        let (result, _) = capture_logs(|| shader.load_from_memory(Some(VERTEX), Some(FRAGMENT), Some("void main() {}")));
        assert!(matches!(result, Err(ShaderError::GeometryUnavailable)));
    }

    #[test]
    fn builtin_attributes_are_bound_before_linking() {
        let device = device();
        let shader = Shader::builtin(Arc::clone(&device)).unwrap();
        assert!(shader.is_compatible());
        assert_eq!(shader.attribute_location("a_color"), Some(1));
        assert_eq!(shader.attribute_location("a_tex_coord"), Some(2));
        assert_ne!(shader.cache_id(), CacheId::NONE);
    }

    #[test]
    fn fragment_only_shaders_are_not_compatible() {
        let device = device();
        let mut shader = Shader::new(device);
        shader.load_stage(FRAGMENT, ShaderStage::Fragment).unwrap();
        assert!(shader.program().is_some());
        assert!(!shader.is_compatible());
    }

    #[test]
    fn recompiling_draws_a_new_id_and_fresh_caches() {
        let device = device();
        let mut shader = shader(&device);
        let first = shader.cache_id();
        let _ = shader.uniform_location("u_time");
        shader.load_from_memory(Some(VERTEX), Some(FRAGMENT), None).unwrap();
        assert!(shader.cache_id() > first);
        assert!(shader.uniforms.borrow().is_empty());
    }

    #[test]
    fn lookups_are_cached_and_missing_names_warn_once() {
        let device = device();
        let shader = shader(&device);
        device.reset_counts();
        let (_, logs) = capture_logs(|| {
            assert!(shader.uniform_location("u_time").is_some());
            assert!(shader.uniform_location("u_time").is_some());
            assert!(shader.uniform_location("u_missing").is_none());
            assert!(shader.uniform_location("u_missing").is_none());
        });
        assert_eq!(device.count("uniform_location"), 2);
        assert_eq!(diagnostics(&logs), 1);

        shader.set_warn_missing(false);
        let (_, logs) = capture_logs(|| shader.uniform_location("u_other"));
        assert!(logs.is_empty());
    }

    #[test]
    fn setters_restore_the_previous_program() {
        let device = device();
        let shader = shader(&device);
        let other = Shader::builtin(Arc::clone(&device)).unwrap();
        device.use_program(other.program());

        shader.set_float("u_time", 2.5);
        shader.set_color("u_tint", Color::RED);

        let program = shader.program().unwrap();
        assert_eq!(device.uniform_value(program, "u_time"), Some(UniformValue::Float(2.5)));
        assert_eq!(
            device.uniform_value(program, "u_tint"),
            Some(UniformValue::Float4([1.0, 0.0, 0.0, 1.0]))
        );
        assert_eq!(device.current_program(), other.program());
        assert_eq!(device.misdirected_uniforms(), 0);
    }

    #[test]
    fn parameter_block_batches_program_switches() {
        let set_all = |shader: &Shader<RecordingDevice>| {
            shader.set_float("u_time", 1.0);
            shader.set_vec2("u_offset", Vec2::new(3.0, 4.0));
            shader.set_vec4("u_tint", Vec4::ONE);
            shader.set_int("u_mode", 2);
            shader.set_mat4("u_model_view", &Mat4::from_scale(Vec3::splat(2.0)));
        };

        let plain = device();
        let plain_shader = shader(&plain);
        plain.reset_counts();
        set_all(&plain_shader);

        let batched = device();
        let batched_shader = shader(&batched);
        batched.reset_counts();
        {
            let _block = batched_shader.begin_parameter_block();
            set_all(&batched_shader);
        }

        for name in ["u_time", "u_offset", "u_tint", "u_mode", "u_model_view"] {
            assert_eq!(
                plain.uniform_value(plain_shader.program().unwrap(), name),
                batched.uniform_value(batched_shader.program().unwrap(), name),
                "{name}"
            );
        }
        assert!(batched.count("use_program") < plain.count("use_program"));
        assert_eq!(batched.count("use_program"), 2);
        assert_eq!(batched.current_program(), None);
    }

    #[test]
    fn nested_parameter_blocks_are_harmless() {
        let device = device();
        let shader = shader(&device);
        let outer = shader.begin_parameter_block();
        let inner = shader.begin_parameter_block();
        inner.end();
        assert_eq!(device.current_program(), shader.program());
        outer.end();
        assert_eq!(device.current_program(), None);
    }

    #[test]
    fn texture_units_run_out_gracefully() {
        let device = device();
        let samplers: String = (0..9).map(|i| format!("uniform sampler2D u_tex{i};\n")).collect();
        let fragment = format!("#version 140\n{samplers}void main() {{}}\n");
        let shader = Shader::from_sources(Arc::clone(&device), Some(VERTEX), Some(&fragment), None).unwrap();
        let textures: Vec<_> = (0..9)
            .map(|_| {
                let mut texture = Texture::new(Arc::clone(&device));
                texture.create(1, 1).unwrap();
                texture
            })
            .collect();

        let (_, logs) = capture_logs(|| {
            for (i, texture) in textures.iter().enumerate() {
                shader.set_texture(&format!("u_tex{i}"), texture);
            }
        });
        // 8 units: unit 0 is reserved and the table stops one short of it.
        assert_eq!(shader.texture_count(), 7);
        assert_eq!(diagnostics(&logs), 2);

        let (_, logs) = capture_logs(|| shader.set_texture("u_tex0", &textures[8]));
        assert!(logs.is_empty());
        assert_eq!(shader.texture_count(), 7);

        Shader::bind(&*device, Some(&shader));
        let program = shader.program().unwrap();
        assert_eq!(device.uniform_value(program, "u_tex0"), Some(UniformValue::Int(1)));
        assert_eq!(device.uniform_value(program, "u_tex6"), Some(UniformValue::Int(7)));
        assert_eq!(device.uniform_value(program, "u_tex7"), None);
    }

    #[test]
    fn current_texture_is_unit_zero() {
        let device = device();
        let shader = shader(&device);
        shader.set_current_texture("u_texture");
        Shader::bind(&*device, Some(&shader));
        let program = shader.program().unwrap();
        assert_eq!(device.uniform_value(program, "u_texture"), Some(UniformValue::Int(0)));
        Shader::bind(&*device, None);
        assert_eq!(device.current_program(), None);
    }

    #[test]
    fn block_bindings_are_allocated_until_exhausted() {
        let device = device();
        let fragment = "#version 140
uniform Lights { vec4 a; };
uniform Material { vec4 b; };
uniform Camera { vec4 c; };
uniform Extra { vec4 d; };
void main() {}
";
        let shader = Shader::from_sources(Arc::clone(&device), Some(VERTEX), Some(fragment), None).unwrap();
        let (bindings, logs) = capture_logs(|| {
            ["Lights", "Material", "Camera", "Extra"].map(|name| shader.block_binding(name))
        });
        assert_eq!(bindings, [Some(0), Some(1), Some(2), None]);
        assert_eq!(diagnostics(&logs), 1);
        assert_eq!(shader.block_binding("Lights"), Some(0));
    }

    #[test]
    fn refused_block_lookups_are_cached() {
        let device = device();
        let fragment = "#version 140
uniform Lights { vec4 a; };
uniform Material { vec4 b; };
uniform Camera { vec4 c; };
uniform Extra { vec4 d; };
void main() {}
";
        let shader = Shader::from_sources(Arc::clone(&device), Some(VERTEX), Some(fragment), None).unwrap();
        let (missing, logs) = capture_logs(|| [shader.block_binding("Shadows"), shader.block_binding("Shadows")]);
        assert_eq!(missing, [None, None]);
        assert_eq!(diagnostics(&logs), 1);
        assert_eq!(shader.block_binding("Lights"), Some(0));

        shader.block_binding("Material");
        shader.block_binding("Camera");
        device.reset_counts();
        let (refused, logs) = capture_logs(|| [shader.block_binding("Extra"), shader.block_binding("Extra")]);
        assert_eq!(refused, [None, None]);
        assert_eq!(diagnostics(&logs), 1);
        assert_eq!(device.count("uniform_block_index"), 1);
        assert_eq!(device.count("uniform_block_binding"), 0);
    }

    #[test]
    fn textures_set_again_bind_their_new_handle() {
        let device = device();
        let shader = shader(&device);
        let mut first = Texture::new(Arc::clone(&device));
        first.create(2, 2).unwrap();
        shader.set_texture("u_texture", &first);

        let mut second = Texture::new(Arc::clone(&device));
        second.create(2, 2).unwrap();
        assert_ne!(first.handle(), second.handle());
        shader.set_texture("u_texture", &second);
        assert_eq!(shader.texture_count(), 1);

        Shader::bind(&*device, Some(&shader));
        device.active_texture(1);
        assert_eq!(device.bound_texture(glow::TEXTURE_BINDING_2D), second.handle());
    }

    #[test]
    fn set_block_skips_redundant_binds() {
        let device = device();
        let fragment = "#version 140\nuniform Lights { vec4 a; };\nvoid main() {}\n";
        let shader = Shader::from_sources(Arc::clone(&device), Some(VERTEX), Some(fragment), None).unwrap();
        let first = UniformBuffer::new(Arc::clone(&device)).unwrap();
        let second = UniformBuffer::new(Arc::clone(&device)).unwrap();

        shader.set_block("Lights", &first);
        shader.set_block("Lights", &first);
        assert_eq!(device.count("bind_buffer_base"), 1);
        shader.set_block("Lights", &second);
        assert_eq!(device.count("bind_buffer_base"), 2);
        assert_eq!(device.buffer_base(glow::UNIFORM_BUFFER, 0), Some(second.handle()));
    }

    #[test]
    fn capability_queries() {
        let device = RecordingDevice::new(Capabilities {
            shaders: true,
            max_vertex_uniform_components: 256,
            shading_language_version: "1.20".to_owned(),
            ..Capabilities::default()
        });
        assert!(Shader::is_available(&device));
        assert!(!Shader::is_geometry_available(&device));
        assert!(!Shader::is_uniform_buffer_available(&device));
        assert_eq!(Shader::supported_version(&device), "1.20");
        assert_eq!(Shader::maximum_uniform_components(&device), 256);
    }
}
