//! [`GlDevice`] implementation on top of a [`glow::Context`].
//!
//! `glow` only exposes the programmable pipeline, so the handful of
//! fixed-function entry points the legacy backend needs are resolved through
//! the same loader into a [`FixedFunction`] table. The table is only loaded on
//! contexts that actually have a compatibility profile.

use std::ffi::c_void;

use glow::{HasContext, PixelPackData, PixelUnpackData};
use log::{debug, info};

use crate::{
    device::{legacy, Capabilities, GlDevice, UniformValue},
    types::{IntRect, Vertex},
};

/// `GL_CONTEXT_PROFILE_MASK`
const CONTEXT_PROFILE_MASK: u32 = 0x9126;
/// `GL_CONTEXT_COMPATIBILITY_PROFILE_BIT`
const CONTEXT_COMPATIBILITY_PROFILE_BIT: i32 = 0x2;
/// `GL_MAX_TEXTURE_COORDS`
const MAX_TEXTURE_COORDS: u32 = 0x8871;

/// GL internal format for RGBA8 textures, pre-cast to the `i32` that
/// `tex_image_2d` expects.
#[expect(clippy::cast_possible_wrap)]
const RGBA8_INTERNAL_FORMAT: i32 = glow::RGBA8 as i32;

type MatrixModeFn = unsafe extern "system" fn(u32);
type LoadMatrixFn = unsafe extern "system" fn(*const f32);
type VoidFn = unsafe extern "system" fn();
type MaskFn = unsafe extern "system" fn(u32);
type PointerFn = unsafe extern "system" fn(i32, u32, i32, *const c_void);
type NormalPointerFn = unsafe extern "system" fn(u32, i32, *const c_void);
type LightFvFn = unsafe extern "system" fn(u32, u32, *const f32);
type LightFFn = unsafe extern "system" fn(u32, u32, f32);

/// Fixed-function entry points missing from `glow`.
struct FixedFunction {
    matrix_mode: MatrixModeFn,
    load_matrix: LoadMatrixFn,
    push_matrix: VoidFn,
    pop_matrix: VoidFn,
    push_attrib: MaskFn,
    pop_attrib: VoidFn,
    push_client_attrib: MaskFn,
    pop_client_attrib: VoidFn,
    enable_client_state: MaskFn,
    vertex_pointer: PointerFn,
    color_pointer: PointerFn,
    tex_coord_pointer: PointerFn,
    normal_pointer: NormalPointerFn,
    light_fv: LightFvFn,
    light_f: LightFFn,
}

impl FixedFunction {
    /// Resolve every entry point, or `None` if any is missing.
    ///
    /// # Safety
    ///
    /// `loader` must return either null or the address of the named GL
    /// function for the current context.
    unsafe fn load(loader: &mut dyn FnMut(&str) -> *const c_void) -> Option<Self> {
        unsafe {
            Some(Self {
                matrix_mode: load_fn(loader, "glMatrixMode")?,
                load_matrix: load_fn(loader, "glLoadMatrixf")?,
                push_matrix: load_fn(loader, "glPushMatrix")?,
                pop_matrix: load_fn(loader, "glPopMatrix")?,
                push_attrib: load_fn(loader, "glPushAttrib")?,
                pop_attrib: load_fn(loader, "glPopAttrib")?,
                push_client_attrib: load_fn(loader, "glPushClientAttrib")?,
                pop_client_attrib: load_fn(loader, "glPopClientAttrib")?,
                enable_client_state: load_fn(loader, "glEnableClientState")?,
                vertex_pointer: load_fn(loader, "glVertexPointer")?,
                color_pointer: load_fn(loader, "glColorPointer")?,
                tex_coord_pointer: load_fn(loader, "glTexCoordPointer")?,
                normal_pointer: load_fn(loader, "glNormalPointer")?,
                light_fv: load_fn(loader, "glLightfv")?,
                light_f: load_fn(loader, "glLightf")?,
            })
        }
    }
}

/// Look up one entry point and reinterpret it as the function pointer `F`.
///
/// # Safety
///
/// `F` must be an `extern "system"` function pointer type matching the C
/// signature of `name`.
unsafe fn load_fn<F: Copy>(loader: &mut dyn FnMut(&str) -> *const c_void, name: &str) -> Option<F> {
    let address = loader(name);
    if address.is_null() {
        debug!("fixed-function entry point {name} is unavailable");
        return None;
    }
    debug_assert_eq!(size_of::<F>(), size_of::<*const c_void>());
    Some(unsafe { std::mem::transmute_copy::<*const c_void, F>(&address) })
}

/// The production GL device.
pub struct GlowDevice {
    gl: glow::Context,
    capabilities: Capabilities,
    fixed: Option<FixedFunction>,
}

impl GlowDevice {
    /// Load GL through `loader` and probe the context.
    ///
    /// Fixed-function entry points are resolved too when the context is a
    /// desktop compatibility context.
    ///
    /// # Safety
    ///
    /// The context the loader belongs to must be current on this thread, and
    /// `loader` must return null or valid GL function addresses.
    pub unsafe fn from_loader_function<F>(mut loader: F) -> Self
    where
        F: FnMut(&str) -> *const c_void,
    {
        let gl = unsafe { glow::Context::from_loader_function(&mut loader) };
        let fixed = if unsafe { has_compatibility_profile(&gl) } {
            unsafe { FixedFunction::load(&mut loader) }
        } else {
            None
        };
        let capabilities = unsafe { probe(&gl, fixed.is_some()) };
        info!(
            "GL device ready: GLSL {}, shaders {}, buffer objects {}, fixed function {}",
            capabilities.shading_language_version,
            capabilities.shaders,
            capabilities.buffer_objects,
            capabilities.fixed_function,
        );
        Self {
            gl,
            capabilities,
            fixed,
        }
    }

    /// Wrap an existing context. Only the programmable pipeline is available.
    ///
    /// # Safety
    ///
    /// `gl` must be current on this thread.
    pub unsafe fn from_context(gl: glow::Context) -> Self {
        let capabilities = unsafe { probe(&gl, false) };
        Self {
            gl,
            capabilities,
            fixed: None,
        }
    }

    /// The wrapped context, for raw GL calls between
    /// `push_gl_states`/`pop_gl_states`.
    #[must_use]
    pub fn context(&self) -> &glow::Context {
        &self.gl
    }

    /// Adjust the probed capabilities, e.g. to force the legacy pipeline on a
    /// driver with broken buffer objects.
    pub fn override_capabilities(&mut self, f: impl FnOnce(&mut Capabilities)) {
        f(&mut self.capabilities);
    }
}

/// Whether the context is desktop GL with the fixed-function pipeline.
unsafe fn has_compatibility_profile(gl: &glow::Context) -> bool {
    let version = gl.version();
    if version.is_embedded {
        return false;
    }
    if (version.major, version.minor) < (3, 2) {
        return true;
    }
    let mask = unsafe { gl.get_parameter_i32(CONTEXT_PROFILE_MASK) };
    mask & CONTEXT_COMPATIBILITY_PROFILE_BIT != 0
}

fn to_u32(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

/// Probe everything the pipeline branches on.
unsafe fn probe(gl: &glow::Context, fixed_function: bool) -> Capabilities {
    let version = gl.version();
    let extensions = gl.supported_extensions();
    let at_least = |major: u32, minor: u32| (version.major, version.minor) >= (major, minor);
    let has = |name: &str| extensions.contains(name);
    let embedded = version.is_embedded;

    let shaders = at_least(2, 0)
        || (has("GL_ARB_shader_objects") && has("GL_ARB_vertex_shader") && has("GL_ARB_fragment_shader"));
    let buffer_objects = at_least(1, 5) || has("GL_ARB_vertex_buffer_object");
    let vertex_arrays = if embedded {
        at_least(3, 0) || has("GL_OES_vertex_array_object")
    } else {
        at_least(3, 0) || has("GL_ARB_vertex_array_object")
    };
    let geometry_shaders = at_least(3, 2) || (!embedded && has("GL_ARB_geometry_shader4"));
    let uniform_buffers = if embedded {
        at_least(3, 0)
    } else {
        at_least(3, 1) || has("GL_ARB_uniform_buffer_object")
    };
    let npot_textures = if embedded {
        at_least(3, 0) || has("GL_OES_texture_npot")
    } else {
        at_least(2, 0) || has("GL_ARB_texture_non_power_of_two")
    };

    unsafe {
        let max_texture_units = if shaders {
            gl.get_parameter_i32(glow::MAX_TEXTURE_IMAGE_UNITS)
        } else if fixed_function {
            gl.get_parameter_i32(MAX_TEXTURE_COORDS)
        } else {
            1
        };
        let max_vertex_uniform_components = match (shaders, embedded) {
            (false, _) => 0,
            (true, true) => gl.get_parameter_i32(glow::MAX_VERTEX_UNIFORM_VECTORS) * 4,
            (true, false) => gl.get_parameter_i32(glow::MAX_VERTEX_UNIFORM_COMPONENTS),
        };
        let shading_language_version = if shaders {
            let raw = gl.get_parameter_string(glow::SHADING_LANGUAGE_VERSION);
            raw.trim_start_matches("OpenGL ES GLSL ES ")
                .trim_start_matches("OpenGL ES GLSL ")
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_owned()
        } else {
            String::new()
        };

        Capabilities {
            embedded,
            shaders,
            buffer_objects,
            vertex_arrays,
            geometry_shaders,
            uniform_buffers,
            npot_textures,
            fixed_function,
            native_quads: fixed_function,
            max_texture_size: to_u32(gl.get_parameter_i32(glow::MAX_TEXTURE_SIZE)),
            max_texture_units: to_u32(max_texture_units),
            max_uniform_buffer_bindings: if uniform_buffers {
                to_u32(gl.get_parameter_i32(glow::MAX_UNIFORM_BUFFER_BINDINGS))
            } else {
                0
            },
            max_vertex_uniform_components: to_u32(max_vertex_uniform_components),
            max_lights: if fixed_function {
                to_u32(gl.get_parameter_i32(legacy::MAX_LIGHTS))
            } else {
                0
            },
            shading_language_version,
        }
    }
}

// Every method below issues a GL call on the context this device was created
// with; `GlDevice` requires that context to be current.
impl GlDevice for GlowDevice {
    type Program = glow::Program;
    type Shader = glow::Shader;
    type Buffer = glow::Buffer;
    type Texture = glow::Texture;
    type VertexArray = glow::VertexArray;
    type UniformLocation = glow::UniformLocation;

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn enable(&self, capability: u32) {
        unsafe { self.gl.enable(capability) }
    }

    fn disable(&self, capability: u32) {
        unsafe { self.gl.disable(capability) }
    }

    fn is_enabled(&self, capability: u32) -> bool {
        unsafe { self.gl.is_enabled(capability) }
    }

    fn get_integer(&self, parameter: u32) -> i32 {
        unsafe { self.gl.get_parameter_i32(parameter) }
    }

    fn clear_color(&self, [r, g, b, a]: [f32; 4]) {
        unsafe { self.gl.clear_color(r, g, b, a) }
    }

    fn clear(&self, mask: u32) {
        unsafe { self.gl.clear(mask) }
    }

    fn viewport(&self, rect: IntRect) {
        unsafe { self.gl.viewport(rect.left, rect.top, rect.width, rect.height) }
    }

    fn blend_func_separate(&self, src_rgb: u32, dst_rgb: u32, src_alpha: u32, dst_alpha: u32) {
        unsafe { self.gl.blend_func_separate(src_rgb, dst_rgb, src_alpha, dst_alpha) }
    }

    fn blend_equation_separate(&self, rgb: u32, alpha: u32) {
        unsafe { self.gl.blend_equation_separate(rgb, alpha) }
    }

    fn flush(&self) {
        unsafe { self.gl.flush() }
    }

    fn create_buffer(&self) -> Result<Self::Buffer, String> {
        unsafe { self.gl.create_buffer() }
    }

    fn delete_buffer(&self, buffer: Self::Buffer) {
        unsafe { self.gl.delete_buffer(buffer) }
    }

    fn bind_buffer(&self, target: u32, buffer: Option<Self::Buffer>) {
        unsafe { self.gl.bind_buffer(target, buffer) }
    }

    fn bound_buffer(&self, binding: u32) -> Option<Self::Buffer> {
        unsafe { self.gl.get_parameter_buffer(binding) }
    }

    fn buffer_data_size(&self, target: u32, size: i32, usage: u32) {
        unsafe { self.gl.buffer_data_size(target, size, usage) }
    }

    fn buffer_data(&self, target: u32, data: &[u8], usage: u32) {
        unsafe { self.gl.buffer_data_u8_slice(target, data, usage) }
    }

    fn bind_buffer_base(&self, target: u32, index: u32, buffer: Option<Self::Buffer>) {
        unsafe { self.gl.bind_buffer_base(target, index, buffer) }
    }

    fn create_vertex_array(&self) -> Result<Self::VertexArray, String> {
        unsafe { self.gl.create_vertex_array() }
    }

    fn delete_vertex_array(&self, vertex_array: Self::VertexArray) {
        unsafe { self.gl.delete_vertex_array(vertex_array) }
    }

    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>) {
        unsafe { self.gl.bind_vertex_array(vertex_array) }
    }

    fn bound_vertex_array(&self) -> Option<Self::VertexArray> {
        unsafe { self.gl.get_parameter_vertex_array(glow::VERTEX_ARRAY_BINDING) }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) }
    }

    fn disable_vertex_attrib_array(&self, index: u32) {
        unsafe { self.gl.disable_vertex_attrib_array(index) }
    }

    fn is_vertex_attrib_array_enabled(&self, index: u32) -> bool {
        let mut value = [0.0_f32; 4];
        unsafe {
            self.gl
                .get_vertex_attrib_parameter_f32_slice(index, glow::VERTEX_ATTRIB_ARRAY_ENABLED, &mut value);
        }
        value[0] != 0.0
    }

    fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        unsafe {
            self.gl
                .vertex_attrib_pointer_f32(index, size, data_type, normalized, stride, offset);
        }
    }

    fn draw_arrays(&self, mode: u32, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(mode, first, count) }
    }

    fn create_program(&self) -> Result<Self::Program, String> {
        unsafe { self.gl.create_program() }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { self.gl.delete_program(program) }
    }

    fn create_shader(&self, stage: u32) -> Result<Self::Shader, String> {
        unsafe { self.gl.create_shader(stage) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { self.gl.delete_shader(shader) }
    }

    fn compile_shader(&self, shader: Self::Shader, source: &str) -> Result<(), String> {
        unsafe {
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if self.gl.get_shader_compile_status(shader) {
                Ok(())
            } else {
                Err(self.gl.get_shader_info_log(shader))
            }
        }
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.attach_shader(program, shader) }
    }

    fn bind_attrib_location(&self, program: Self::Program, index: u32, name: &str) {
        unsafe { self.gl.bind_attrib_location(program, index, name) }
    }

    fn link_program(&self, program: Self::Program) -> Result<(), String> {
        unsafe {
            self.gl.link_program(program);
            if self.gl.get_program_link_status(program) {
                Ok(())
            } else {
                Err(self.gl.get_program_info_log(program))
            }
        }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { self.gl.use_program(program) }
    }

    fn current_program(&self) -> Option<Self::Program> {
        unsafe { self.gl.get_parameter_program(glow::CURRENT_PROGRAM) }
    }

    fn uniform_location(&self, program: Self::Program, name: &str) -> Option<Self::UniformLocation> {
        unsafe { self.gl.get_uniform_location(program, name) }
    }

    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32> {
        unsafe { self.gl.get_attrib_location(program, name) }
    }

    fn uniform_block_index(&self, program: Self::Program, name: &str) -> Option<u32> {
        unsafe { self.gl.get_uniform_block_index(program, name) }
    }

    fn uniform_block_binding(&self, program: Self::Program, index: u32, binding: u32) {
        unsafe { self.gl.uniform_block_binding(program, index, binding) }
    }

    fn set_uniform(&self, location: &Self::UniformLocation, value: UniformValue) {
        let location = Some(location);
        unsafe {
            match value {
                UniformValue::Int(x) => self.gl.uniform_1_i32(location, x),
                UniformValue::Int2([x, y]) => self.gl.uniform_2_i32(location, x, y),
                UniformValue::Int3([x, y, z]) => self.gl.uniform_3_i32(location, x, y, z),
                UniformValue::Int4([x, y, z, w]) => self.gl.uniform_4_i32(location, x, y, z, w),
                UniformValue::Float(x) => self.gl.uniform_1_f32(location, x),
                UniformValue::Float2([x, y]) => self.gl.uniform_2_f32(location, x, y),
                UniformValue::Float3([x, y, z]) => self.gl.uniform_3_f32(location, x, y, z),
                UniformValue::Float4([x, y, z, w]) => self.gl.uniform_4_f32(location, x, y, z, w),
                UniformValue::Mat4(matrix) => self.gl.uniform_matrix_4_f32_slice(location, false, &matrix),
            }
        }
    }

    fn create_texture(&self) -> Result<Self::Texture, String> {
        unsafe { self.gl.create_texture() }
    }

    fn delete_texture(&self, texture: Self::Texture) {
        unsafe { self.gl.delete_texture(texture) }
    }

    fn active_texture(&self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) }
    }

    fn bind_texture(&self, target: u32, texture: Option<Self::Texture>) {
        unsafe { self.gl.bind_texture(target, texture) }
    }

    fn bound_texture(&self, binding: u32) -> Option<Self::Texture> {
        unsafe { self.gl.get_parameter_texture(binding) }
    }

    fn tex_parameter(&self, target: u32, parameter: u32, value: i32) {
        unsafe { self.gl.tex_parameter_i32(target, parameter, value) }
    }

    fn tex_image_2d(&self, target: u32, width: i32, height: i32, pixels: Option<&[u8]>) {
        unsafe {
            self.gl.tex_image_2d(
                target,
                0,
                RGBA8_INTERNAL_FORMAT,
                width,
                height,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                PixelUnpackData::Slice(pixels),
            );
        }
    }

    fn tex_sub_image_2d(&self, target: u32, x: i32, y: i32, width: i32, height: i32, pixels: &[u8]) {
        unsafe {
            self.gl.tex_sub_image_2d(
                target,
                0,
                x,
                y,
                width,
                height,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                PixelUnpackData::Slice(Some(pixels)),
            );
        }
    }

    fn tex_image_3d(&self, width: i32, height: i32, depth: i32, pixels: Option<&[u8]>) {
        unsafe {
            self.gl.tex_image_3d(
                glow::TEXTURE_3D,
                0,
                RGBA8_INTERNAL_FORMAT,
                width,
                height,
                depth,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                PixelUnpackData::Slice(pixels),
            );
        }
    }

    fn tex_sub_image_3d(
        &self,
        x: i32,
        y: i32,
        z: i32,
        width: i32,
        height: i32,
        depth: i32,
        pixels: &[u8],
    ) {
        unsafe {
            self.gl.tex_sub_image_3d(
                glow::TEXTURE_3D,
                0,
                x,
                y,
                z,
                width,
                height,
                depth,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                PixelUnpackData::Slice(Some(pixels)),
            );
        }
    }

    fn copy_tex_sub_image_2d(&self, x_offset: i32, y_offset: i32, x: i32, y: i32, width: i32, height: i32) {
        unsafe {
            self.gl
                .copy_tex_sub_image_2d(glow::TEXTURE_2D, 0, x_offset, y_offset, x, y, width, height);
        }
    }

    fn get_tex_image(&self, target: u32, pixels: &mut [u8]) {
        unsafe {
            self.gl.get_tex_image(
                target,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                PixelPackData::Slice(Some(pixels)),
            );
        }
    }

    fn matrix_mode(&self, mode: u32) {
        if let Some(fixed) = &self.fixed {
            unsafe { (fixed.matrix_mode)(mode) }
        }
    }

    fn load_matrix(&self, matrix: &[f32; 16]) {
        if let Some(fixed) = &self.fixed {
            unsafe { (fixed.load_matrix)(matrix.as_ptr()) }
        }
    }

    fn push_matrix(&self) {
        if let Some(fixed) = &self.fixed {
            unsafe { (fixed.push_matrix)() }
        }
    }

    fn pop_matrix(&self) {
        if let Some(fixed) = &self.fixed {
            unsafe { (fixed.pop_matrix)() }
        }
    }

    fn push_attrib(&self, mask: u32) {
        if let Some(fixed) = &self.fixed {
            unsafe { (fixed.push_attrib)(mask) }
        }
    }

    fn pop_attrib(&self) {
        if let Some(fixed) = &self.fixed {
            unsafe { (fixed.pop_attrib)() }
        }
    }

    fn push_client_attrib(&self, mask: u32) {
        if let Some(fixed) = &self.fixed {
            unsafe { (fixed.push_client_attrib)(mask) }
        }
    }

    fn pop_client_attrib(&self) {
        if let Some(fixed) = &self.fixed {
            unsafe { (fixed.pop_client_attrib)() }
        }
    }

    fn enable_client_state(&self, array: u32) {
        if let Some(fixed) = &self.fixed {
            unsafe { (fixed.enable_client_state)(array) }
        }
    }

    fn draw_client_vertices(&self, mode: u32, vertices: &[Vertex]) {
        let Some(fixed) = &self.fixed else {
            return;
        };
        let Ok(count) = i32::try_from(vertices.len()) else {
            return;
        };
        let base = vertices.as_ptr().cast::<u8>();
        // The arrays are only read during draw_arrays, while `vertices` is
        // still borrowed.
        unsafe {
            (fixed.vertex_pointer)(3, glow::FLOAT, Vertex::STRIDE, base.cast());
            (fixed.color_pointer)(
                4,
                glow::UNSIGNED_BYTE,
                Vertex::STRIDE,
                base.add(Vertex::COLOR_OFFSET.unsigned_abs() as usize).cast(),
            );
            (fixed.tex_coord_pointer)(
                2,
                glow::FLOAT,
                Vertex::STRIDE,
                base.add(Vertex::TEX_COORDS_OFFSET.unsigned_abs() as usize).cast(),
            );
            (fixed.normal_pointer)(
                glow::FLOAT,
                Vertex::STRIDE,
                base.add(Vertex::NORMAL_OFFSET.unsigned_abs() as usize).cast(),
            );
            self.gl.draw_arrays(mode, 0, count);
        }
    }

    fn light_fv(&self, light: u32, parameter: u32, values: &[f32]) {
        if let Some(fixed) = &self.fixed {
            unsafe { (fixed.light_fv)(light, parameter, values.as_ptr()) }
        }
    }

    fn light_f(&self, light: u32, parameter: u32, value: f32) {
        if let Some(fixed) = &self.fixed {
            unsafe { (fixed.light_f)(light, parameter, value) }
        }
    }
}
