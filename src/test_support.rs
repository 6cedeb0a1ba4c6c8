//! In-memory GL device and log capture for unit tests.
//!
//! [`RecordingDevice`] tracks just enough GL state to answer the queries the
//! pipeline makes (bindings, enables, blend factors, uniform values, texture
//! storage) and counts every call by name.

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    sync::{Mutex, MutexGuard, Once, PoisonError},
};

use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::{
    device::{Capabilities, GlDevice, UniformValue},
    types::{IntRect, Vertex},
};

/// Uniform location handed out by [`RecordingDevice`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct MockUniform {
    program: u32,
    name: String,
}

#[derive(Default)]
struct MockProgram {
    shaders: Vec<u32>,
    bound_attributes: HashMap<String, u32>,
    linked: bool,
    uniforms: Vec<String>,
    attributes: HashMap<String, u32>,
    blocks: Vec<String>,
    values: HashMap<String, UniformValue>,
}

#[derive(Default)]
struct MockTexture {
    width: i32,
    height: i32,
    depth: i32,
    pixels: Vec<u8>,
}

#[derive(Default)]
struct MockState {
    calls: HashMap<&'static str, usize>,
    next_handle: u32,
    enabled: HashSet<u32>,
    client_states: HashSet<u32>,
    integers: HashMap<u32, i32>,
    clear_color: [f32; 4],
    viewport: IntRect,
    bound_buffers: HashMap<u32, Option<u32>>,
    buffer_sizes: HashMap<u32, usize>,
    buffer_bases: HashMap<(u32, u32), Option<u32>>,
    bound_vertex_array: Option<u32>,
    attribute_arrays: HashSet<u32>,
    draws: Vec<(u32, i32)>,
    last_upload: Vec<u8>,
    client_draws: Vec<(u32, Vec<Vertex>)>,
    shader_sources: HashMap<u32, (u32, String)>,
    programs: HashMap<u32, MockProgram>,
    current_program: Option<u32>,
    active_unit: u32,
    bound_textures: HashMap<(u32, u32), Option<u32>>,
    textures: HashMap<u32, MockTexture>,
    texture_parameters: HashMap<(u32, u32), i32>,
    matrix_mode: u32,
    matrices: HashMap<u32, [f32; 16]>,
    matrix_depth: i32,
    attrib_depth: i32,
    client_attrib_depth: i32,
    lights: HashMap<(u32, u32), Vec<f32>>,
    misdirected_uniforms: usize,
}

/// A GL "device" that records calls instead of rendering.
pub(crate) struct RecordingDevice {
    capabilities: Capabilities,
    state: Mutex<MockState>,
}

impl RecordingDevice {
    pub(crate) fn new(capabilities: Capabilities) -> Self {
        let mut state = MockState {
            next_handle: 1,
            matrix_mode: crate::device::legacy::MODELVIEW,
            ..MockState::default()
        };
        for (parameter, value) in [
            (glow::BLEND_SRC_RGB, glow::ONE),
            (glow::BLEND_SRC_ALPHA, glow::ONE),
            (glow::BLEND_DST_RGB, glow::ZERO),
            (glow::BLEND_DST_ALPHA, glow::ZERO),
            (glow::BLEND_EQUATION_RGB, glow::FUNC_ADD),
            (glow::BLEND_EQUATION_ALPHA, glow::FUNC_ADD),
        ] {
            state
                .integers
                .insert(parameter, i32::try_from(value).unwrap_or_default());
        }
        Self {
            capabilities,
            state: Mutex::new(state),
        }
    }

    /// Desktop compatibility context: everything available.
    pub(crate) fn desktop() -> Self {
        Self::new(Capabilities {
            embedded: false,
            shaders: true,
            buffer_objects: true,
            vertex_arrays: true,
            geometry_shaders: true,
            uniform_buffers: true,
            npot_textures: true,
            fixed_function: true,
            native_quads: true,
            max_texture_size: 4096,
            max_texture_units: 8,
            max_uniform_buffer_bindings: 4,
            max_vertex_uniform_components: 1024,
            max_lights: 8,
            shading_language_version: "1.40".to_owned(),
        })
    }

    /// OpenGL ES 2 class context: no quads, no fixed function.
    pub(crate) fn embedded() -> Self {
        Self::new(Capabilities {
            embedded: true,
            shaders: true,
            buffer_objects: true,
            vertex_arrays: false,
            geometry_shaders: false,
            uniform_buffers: false,
            npot_textures: false,
            fixed_function: false,
            native_quads: false,
            max_texture_size: 2048,
            max_texture_units: 8,
            max_uniform_buffer_bindings: 0,
            max_vertex_uniform_components: 512,
            max_lights: 0,
            shading_language_version: "1.00".to_owned(),
        })
    }

    /// OpenGL 1.x class context: fixed function only.
    pub(crate) fn legacy() -> Self {
        Self::new(Capabilities {
            fixed_function: true,
            native_quads: true,
            max_texture_size: 1024,
            max_texture_units: 4,
            max_lights: 8,
            ..Capabilities::default()
        })
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, name: &'static str) -> MutexGuard<'_, MockState> {
        let mut state = self.state();
        *state.calls.entry(name).or_default() += 1;
        state
    }

    fn handle(state: &mut MockState) -> u32 {
        let handle = state.next_handle;
        state.next_handle += 1;
        handle
    }

    /// How many times the named method was called.
    pub(crate) fn count(&self, name: &str) -> usize {
        self.state().calls.get(name).copied().unwrap_or(0)
    }

    pub(crate) fn reset_counts(&self) {
        self.state().calls.clear();
    }

    /// `(mode, count)` of every `draw_arrays` call.
    pub(crate) fn draws(&self) -> Vec<(u32, i32)> {
        self.state().draws.clone()
    }

    /// Every fixed-function client-array draw.
    pub(crate) fn client_draws(&self) -> Vec<(u32, Vec<Vertex>)> {
        self.state().client_draws.clone()
    }

    pub(crate) fn last_upload(&self) -> Vec<u8> {
        self.state().last_upload.clone()
    }

    pub(crate) fn clear_color_value(&self) -> [f32; 4] {
        self.state().clear_color
    }

    pub(crate) fn viewport_value(&self) -> IntRect {
        self.state().viewport
    }

    pub(crate) fn matrix(&self, mode: u32) -> Option<[f32; 16]> {
        self.state().matrices.get(&mode).copied()
    }

    pub(crate) fn stack_depths(&self) -> (i32, i32, i32) {
        let state = self.state();
        (state.matrix_depth, state.attrib_depth, state.client_attrib_depth)
    }

    pub(crate) fn client_state_enabled(&self, array: u32) -> bool {
        self.state().client_states.contains(&array)
    }

    /// Last value written to `name` while `program` was current.
    pub(crate) fn uniform_value(&self, program: u32, name: &str) -> Option<UniformValue> {
        self.state().programs.get(&program)?.values.get(name).copied()
    }

    /// Uniform writes issued while their program was not current.
    pub(crate) fn misdirected_uniforms(&self) -> usize {
        self.state().misdirected_uniforms
    }

    pub(crate) fn texture_parameter(&self, texture: u32, parameter: u32) -> Option<i32> {
        self.state().texture_parameters.get(&(texture, parameter)).copied()
    }

    pub(crate) fn texture_size(&self, texture: u32) -> Option<(i32, i32, i32)> {
        self.state()
            .textures
            .get(&texture)
            .map(|t| (t.width, t.height, t.depth))
    }

    pub(crate) fn buffer_base(&self, target: u32, index: u32) -> Option<u32> {
        self.state().buffer_bases.get(&(target, index)).copied().flatten()
    }

    pub(crate) fn buffer_size(&self, buffer: u32) -> Option<usize> {
        self.state().buffer_sizes.get(&buffer).copied()
    }

    pub(crate) fn light_parameter(&self, light: u32, parameter: u32) -> Option<Vec<f32>> {
        self.state().lights.get(&(light, parameter)).cloned()
    }

    /// Simulate foreign GL code changing the blend function.
    pub(crate) fn set_integer(&self, parameter: u32, value: i32) {
        self.state().integers.insert(parameter, value);
    }
}

/// Declared names of one GLSL source, as `(uniforms, attributes, blocks)`.
fn parse_declarations(stage: u32, source: &str) -> (Vec<String>, Vec<String>, Vec<String>) {
    let mut uniforms = Vec::new();
    let mut attributes = Vec::new();
    let mut blocks = Vec::new();
    for line in source.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&first, rest)) = tokens.split_first() else {
            continue;
        };
        match first {
            "uniform" if line.contains('{') || rest.len() == 1 => {
                if let Some(name) = rest.first() {
                    blocks.push(name.trim_end_matches('{').to_owned());
                }
            }
            "uniform" => {
                if let Some(name) = rest.last() {
                    uniforms.push(base_name(name));
                }
            }
            "in" | "attribute" if stage == glow::VERTEX_SHADER => {
                if let Some(name) = rest.last() {
                    attributes.push(base_name(name));
                }
            }
            _ => {}
        }
    }
    (uniforms, attributes, blocks)
}

fn base_name(token: &str) -> String {
    let token = token.trim_end_matches(';');
    token.split('[').next().unwrap_or(token).to_owned()
}

fn declares(uniforms: &[String], query: &str) -> bool {
    uniforms.iter().any(|declared| {
        query == declared
            || query
                .strip_prefix(declared.as_str())
                .is_some_and(|rest| rest.starts_with('[') || rest.starts_with('.'))
    })
}

fn target_of_binding(binding: u32) -> u32 {
    match binding {
        glow::TEXTURE_BINDING_2D => glow::TEXTURE_2D,
        glow::TEXTURE_BINDING_3D => glow::TEXTURE_3D,
        glow::ARRAY_BUFFER_BINDING => glow::ARRAY_BUFFER,
        glow::UNIFORM_BUFFER_BINDING => glow::UNIFORM_BUFFER,
        other => other,
    }
}

fn to_index(value: i32) -> usize {
    usize::try_from(value).unwrap_or(0)
}

impl GlDevice for RecordingDevice {
    type Program = u32;
    type Shader = u32;
    type Buffer = u32;
    type Texture = u32;
    type VertexArray = u32;
    type UniformLocation = MockUniform;

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn enable(&self, capability: u32) {
        self.record("enable").enabled.insert(capability);
    }

    fn disable(&self, capability: u32) {
        self.record("disable").enabled.remove(&capability);
    }

    fn is_enabled(&self, capability: u32) -> bool {
        self.record("is_enabled").enabled.contains(&capability)
    }

    fn get_integer(&self, parameter: u32) -> i32 {
        let state = self.record("get_integer");
        state.integers.get(&parameter).copied().unwrap_or(0)
    }

    fn clear_color(&self, color: [f32; 4]) {
        self.record("clear_color").clear_color = color;
    }

    fn clear(&self, _mask: u32) {
        self.record("clear");
    }

    fn viewport(&self, rect: IntRect) {
        self.record("viewport").viewport = rect;
    }

    #[expect(clippy::cast_possible_wrap)]
    fn blend_func_separate(&self, src_rgb: u32, dst_rgb: u32, src_alpha: u32, dst_alpha: u32) {
        let mut state = self.record("blend_func_separate");
        state.integers.insert(glow::BLEND_SRC_RGB, src_rgb as i32);
        state.integers.insert(glow::BLEND_DST_RGB, dst_rgb as i32);
        state.integers.insert(glow::BLEND_SRC_ALPHA, src_alpha as i32);
        state.integers.insert(glow::BLEND_DST_ALPHA, dst_alpha as i32);
    }

    #[expect(clippy::cast_possible_wrap)]
    fn blend_equation_separate(&self, rgb: u32, alpha: u32) {
        let mut state = self.record("blend_equation_separate");
        state.integers.insert(glow::BLEND_EQUATION_RGB, rgb as i32);
        state.integers.insert(glow::BLEND_EQUATION_ALPHA, alpha as i32);
    }

    fn flush(&self) {
        self.record("flush");
    }

    fn create_buffer(&self) -> Result<u32, String> {
        let mut state = self.record("create_buffer");
        let handle = Self::handle(&mut state);
        state.buffer_sizes.insert(handle, 0);
        Ok(handle)
    }

    fn delete_buffer(&self, buffer: u32) {
        let mut state = self.record("delete_buffer");
        state.buffer_sizes.remove(&buffer);
        for bound in state.bound_buffers.values_mut() {
            if *bound == Some(buffer) {
                *bound = None;
            }
        }
    }

    fn bind_buffer(&self, target: u32, buffer: Option<u32>) {
        self.record("bind_buffer").bound_buffers.insert(target, buffer);
    }

    fn bound_buffer(&self, binding: u32) -> Option<u32> {
        let state = self.record("bound_buffer");
        state.bound_buffers.get(&target_of_binding(binding)).copied().flatten()
    }

    fn buffer_data_size(&self, target: u32, size: i32, _usage: u32) {
        let mut state = self.record("buffer_data_size");
        if let Some(Some(buffer)) = state.bound_buffers.get(&target).copied() {
            state.buffer_sizes.insert(buffer, to_index(size));
        }
    }

    fn buffer_data(&self, target: u32, data: &[u8], _usage: u32) {
        let mut state = self.record("buffer_data");
        if let Some(Some(buffer)) = state.bound_buffers.get(&target).copied() {
            state.buffer_sizes.insert(buffer, data.len());
        }
        state.last_upload = data.to_vec();
    }

    fn bind_buffer_base(&self, target: u32, index: u32, buffer: Option<u32>) {
        self.record("bind_buffer_base")
            .buffer_bases
            .insert((target, index), buffer);
    }

    fn create_vertex_array(&self) -> Result<u32, String> {
        let mut state = self.record("create_vertex_array");
        Ok(Self::handle(&mut state))
    }

    fn delete_vertex_array(&self, vertex_array: u32) {
        let mut state = self.record("delete_vertex_array");
        if state.bound_vertex_array == Some(vertex_array) {
            state.bound_vertex_array = None;
        }
    }

    fn bind_vertex_array(&self, vertex_array: Option<u32>) {
        self.record("bind_vertex_array").bound_vertex_array = vertex_array;
    }

    fn bound_vertex_array(&self) -> Option<u32> {
        self.record("bound_vertex_array").bound_vertex_array
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        self.record("enable_vertex_attrib_array")
            .attribute_arrays
            .insert(index);
    }

    fn disable_vertex_attrib_array(&self, index: u32) {
        self.record("disable_vertex_attrib_array")
            .attribute_arrays
            .remove(&index);
    }

    fn is_vertex_attrib_array_enabled(&self, index: u32) -> bool {
        self.record("is_vertex_attrib_array_enabled")
            .attribute_arrays
            .contains(&index)
    }

    fn vertex_attrib_pointer(
        &self,
        _index: u32,
        _size: i32,
        _data_type: u32,
        _normalized: bool,
        _stride: i32,
        _offset: i32,
    ) {
        self.record("vertex_attrib_pointer");
    }

    fn draw_arrays(&self, mode: u32, _first: i32, count: i32) {
        self.record("draw_arrays").draws.push((mode, count));
    }

    fn create_program(&self) -> Result<u32, String> {
        let mut state = self.record("create_program");
        let handle = Self::handle(&mut state);
        state.programs.insert(handle, MockProgram::default());
        Ok(handle)
    }

    fn delete_program(&self, program: u32) {
        let mut state = self.record("delete_program");
        state.programs.remove(&program);
        if state.current_program == Some(program) {
            state.current_program = None;
        }
    }

    fn create_shader(&self, stage: u32) -> Result<u32, String> {
        let mut state = self.record("create_shader");
        let handle = Self::handle(&mut state);
        state.shader_sources.insert(handle, (stage, String::new()));
        Ok(handle)
    }

    fn delete_shader(&self, shader: u32) {
        self.record("delete_shader").shader_sources.remove(&shader);
    }

    fn compile_shader(&self, shader: u32, source: &str) -> Result<(), String> {
        let mut state = self.record("compile_shader");
        if let Some(entry) = state.shader_sources.get_mut(&shader) {
            entry.1 = source.to_owned();
        }
        if source.contains("#error") {
            Err("0:1(1): error: #error directive".to_owned())
        } else {
            Ok(())
        }
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        let mut state = self.record("attach_shader");
        if let Some(p) = state.programs.get_mut(&program) {
            p.shaders.push(shader);
        }
    }

    fn bind_attrib_location(&self, program: u32, index: u32, name: &str) {
        let mut state = self.record("bind_attrib_location");
        if let Some(p) = state.programs.get_mut(&program) {
            p.bound_attributes.insert(name.to_owned(), index);
        }
    }

    fn link_program(&self, program: u32) -> Result<(), String> {
        let mut state = self.record("link_program");
        let shaders = match state.programs.get(&program) {
            Some(p) => p.shaders.clone(),
            None => return Err("invalid program".to_owned()),
        };
        let mut uniforms = Vec::new();
        let mut attribute_names = Vec::new();
        let mut blocks = Vec::new();
        for shader in shaders {
            if let Some((stage, source)) = state.shader_sources.get(&shader) {
                let (u, a, b) = parse_declarations(*stage, source);
                uniforms.extend(u);
                attribute_names.extend(a);
                blocks.extend(b);
            }
        }
        let Some(p) = state.programs.get_mut(&program) else {
            return Err("invalid program".to_owned());
        };
        let mut attributes = HashMap::new();
        for name in &attribute_names {
            if let Some(&index) = p.bound_attributes.get(name) {
                attributes.insert(name.clone(), index);
            }
        }
        let mut next = 0;
        for name in attribute_names {
            if attributes.contains_key(&name) {
                continue;
            }
            while attributes.values().any(|&index| index == next) {
                next += 1;
            }
            attributes.insert(name, next);
        }
        p.uniforms = uniforms;
        p.attributes = attributes;
        p.blocks = blocks;
        p.values.clear();
        p.linked = true;
        Ok(())
    }

    fn use_program(&self, program: Option<u32>) {
        self.record("use_program").current_program = program;
    }

    fn current_program(&self) -> Option<u32> {
        self.record("current_program").current_program
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<MockUniform> {
        let state = self.record("uniform_location");
        let p = state.programs.get(&program)?;
        (p.linked && declares(&p.uniforms, name)).then(|| MockUniform {
            program,
            name: name.to_owned(),
        })
    }

    fn attrib_location(&self, program: u32, name: &str) -> Option<u32> {
        let state = self.record("attrib_location");
        state.programs.get(&program)?.attributes.get(name).copied()
    }

    fn uniform_block_index(&self, program: u32, name: &str) -> Option<u32> {
        let state = self.record("uniform_block_index");
        let p = state.programs.get(&program)?;
        let index = p.blocks.iter().position(|block| block == name)?;
        u32::try_from(index).ok()
    }

    fn uniform_block_binding(&self, _program: u32, _index: u32, _binding: u32) {
        self.record("uniform_block_binding");
    }

    fn set_uniform(&self, location: &MockUniform, value: UniformValue) {
        let mut state = self.record("set_uniform");
        if state.current_program != Some(location.program) {
            state.misdirected_uniforms += 1;
            return;
        }
        if let Some(p) = state.programs.get_mut(&location.program) {
            p.values.insert(location.name.clone(), value);
        }
    }

    fn create_texture(&self) -> Result<u32, String> {
        let mut state = self.record("create_texture");
        let handle = Self::handle(&mut state);
        state.textures.insert(handle, MockTexture::default());
        Ok(handle)
    }

    fn delete_texture(&self, texture: u32) {
        let mut state = self.record("delete_texture");
        state.textures.remove(&texture);
        for bound in state.bound_textures.values_mut() {
            if *bound == Some(texture) {
                *bound = None;
            }
        }
    }

    fn active_texture(&self, unit: u32) {
        self.record("active_texture").active_unit = unit;
    }

    fn bind_texture(&self, target: u32, texture: Option<u32>) {
        let mut state = self.record("bind_texture");
        let unit = state.active_unit;
        state.bound_textures.insert((unit, target), texture);
    }

    fn bound_texture(&self, binding: u32) -> Option<u32> {
        let state = self.record("bound_texture");
        let key = (state.active_unit, target_of_binding(binding));
        state.bound_textures.get(&key).copied().flatten()
    }

    fn tex_parameter(&self, target: u32, parameter: u32, value: i32) {
        let mut state = self.record("tex_parameter");
        let unit = state.active_unit;
        if let Some(Some(texture)) = state.bound_textures.get(&(unit, target)).copied() {
            state.texture_parameters.insert((texture, parameter), value);
        }
    }

    fn tex_image_2d(&self, target: u32, width: i32, height: i32, pixels: Option<&[u8]>) {
        let mut state = self.record("tex_image_2d");
        let unit = state.active_unit;
        if let Some(Some(texture)) = state.bound_textures.get(&(unit, target)).copied() {
            let len = to_index(width) * to_index(height) * 4;
            state.textures.insert(
                texture,
                MockTexture {
                    width,
                    height,
                    depth: 1,
                    pixels: pixels.map_or_else(|| vec![0; len], <[u8]>::to_vec),
                },
            );
        }
    }

    fn tex_sub_image_2d(&self, target: u32, x: i32, y: i32, width: i32, height: i32, pixels: &[u8]) {
        let mut state = self.record("tex_sub_image_2d");
        let unit = state.active_unit;
        let Some(Some(handle)) = state.bound_textures.get(&(unit, target)).copied() else {
            return;
        };
        let Some(texture) = state.textures.get_mut(&handle) else {
            return;
        };
        let stride = to_index(texture.width) * 4;
        let row_len = to_index(width) * 4;
        for row in 0..to_index(height) {
            let dst = (to_index(y) + row) * stride + to_index(x) * 4;
            let src = row * row_len;
            if let (Some(dst), Some(src)) = (
                texture.pixels.get_mut(dst..dst + row_len),
                pixels.get(src..src + row_len),
            ) {
                dst.copy_from_slice(src);
            }
        }
    }

    fn tex_image_3d(&self, width: i32, height: i32, depth: i32, pixels: Option<&[u8]>) {
        let mut state = self.record("tex_image_3d");
        let unit = state.active_unit;
        if let Some(Some(texture)) = state.bound_textures.get(&(unit, glow::TEXTURE_3D)).copied() {
            let len = to_index(width) * to_index(height) * to_index(depth) * 4;
            state.textures.insert(
                texture,
                MockTexture {
                    width,
                    height,
                    depth,
                    pixels: pixels.map_or_else(|| vec![0; len], <[u8]>::to_vec),
                },
            );
        }
    }

    fn tex_sub_image_3d(
        &self,
        _x: i32,
        _y: i32,
        _z: i32,
        _width: i32,
        _height: i32,
        _depth: i32,
        _pixels: &[u8],
    ) {
        self.record("tex_sub_image_3d");
    }

    fn copy_tex_sub_image_2d(&self, _x_offset: i32, _y_offset: i32, _x: i32, _y: i32, _width: i32, _height: i32) {
        self.record("copy_tex_sub_image_2d");
    }

    fn get_tex_image(&self, target: u32, pixels: &mut [u8]) {
        let state = self.record("get_tex_image");
        let Some(Some(handle)) = state.bound_textures.get(&(state.active_unit, target)).copied() else {
            return;
        };
        if let Some(texture) = state.textures.get(&handle) {
            let len = pixels.len().min(texture.pixels.len());
            pixels[..len].copy_from_slice(&texture.pixels[..len]);
        }
    }

    fn matrix_mode(&self, mode: u32) {
        self.record("matrix_mode").matrix_mode = mode;
    }

    fn load_matrix(&self, matrix: &[f32; 16]) {
        let mut state = self.record("load_matrix");
        let mode = state.matrix_mode;
        state.matrices.insert(mode, *matrix);
    }

    fn push_matrix(&self) {
        self.record("push_matrix").matrix_depth += 1;
    }

    fn pop_matrix(&self) {
        self.record("pop_matrix").matrix_depth -= 1;
    }

    fn push_attrib(&self, _mask: u32) {
        self.record("push_attrib").attrib_depth += 1;
    }

    fn pop_attrib(&self) {
        self.record("pop_attrib").attrib_depth -= 1;
    }

    fn push_client_attrib(&self, _mask: u32) {
        self.record("push_client_attrib").client_attrib_depth += 1;
    }

    fn pop_client_attrib(&self) {
        self.record("pop_client_attrib").client_attrib_depth -= 1;
    }

    fn enable_client_state(&self, array: u32) {
        self.record("enable_client_state").client_states.insert(array);
    }

    fn draw_client_vertices(&self, mode: u32, vertices: &[Vertex]) {
        self.record("draw_client_vertices")
            .client_draws
            .push((mode, vertices.to_vec()));
    }

    fn light_fv(&self, light: u32, parameter: u32, values: &[f32]) {
        self.record("light_fv")
            .lights
            .insert((light, parameter), values.to_vec());
    }

    fn light_f(&self, light: u32, parameter: u32, value: f32) {
        self.record("light_f")
            .lights
            .insert((light, parameter), vec![value]);
    }
}

struct CaptureLogger;

thread_local! {
    static CAPTURED: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
}

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        CAPTURED.with(|captured| {
            captured
                .borrow_mut()
                .push((record.level(), record.args().to_string()));
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;

/// Run `f` and collect everything it logged on this thread.
pub(crate) fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, Vec<(Level, String)>) {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(LevelFilter::Trace);
    });
    CAPTURED.with(|captured| captured.borrow_mut().clear());
    let result = f();
    let logs = CAPTURED.with(|captured| std::mem::take(&mut *captured.borrow_mut()));
    (result, logs)
}

/// Number of warnings and errors in `logs`.
pub(crate) fn diagnostics(logs: &[(Level, String)]) -> usize {
    logs.iter().filter(|(level, _)| *level <= Level::Warn).count()
}
