//! The narrow GL surface the pipeline is written against.
//!
//! [`GlDevice`] mirrors the subset of [`glow::HasContext`] the render targets,
//! shaders and textures need, plus the handful of fixed-function entry points
//! the legacy backend uses. The production implementation is
//! [`GlowDevice`](crate::GlowDevice); tests run against an in-memory recorder.
//!
//! Every method assumes the device's context is current on the calling
//! thread. Enum arguments are raw GL constants, as with `glow`.

use std::fmt;

use crate::types::{IntRect, Vertex};

/// Fixed-function constants that core and ES constant tables do not carry.
pub mod legacy {
    /// `GL_MODELVIEW`
    pub const MODELVIEW: u32 = 0x1700;
    /// `GL_PROJECTION`
    pub const PROJECTION: u32 = 0x1701;
    /// `GL_TEXTURE` (matrix mode)
    pub const TEXTURE: u32 = 0x1702;
    /// `GL_LIGHTING`
    pub const LIGHTING: u32 = 0x0B50;
    /// `GL_LIGHT0`; light `n` is `LIGHT0 + n`.
    pub const LIGHT0: u32 = 0x4000;
    /// `GL_MAX_LIGHTS`
    pub const MAX_LIGHTS: u32 = 0x0D31;
    /// `GL_AMBIENT`
    pub const AMBIENT: u32 = 0x1200;
    /// `GL_DIFFUSE`
    pub const DIFFUSE: u32 = 0x1201;
    /// `GL_SPECULAR`
    pub const SPECULAR: u32 = 0x1202;
    /// `GL_POSITION`
    pub const POSITION: u32 = 0x1203;
    /// `GL_CONSTANT_ATTENUATION`
    pub const CONSTANT_ATTENUATION: u32 = 0x1207;
    /// `GL_LINEAR_ATTENUATION`
    pub const LINEAR_ATTENUATION: u32 = 0x1208;
    /// `GL_QUADRATIC_ATTENUATION`
    pub const QUADRATIC_ATTENUATION: u32 = 0x1209;
    /// `GL_ALPHA_TEST`
    pub const ALPHA_TEST: u32 = 0x0BC0;
    /// `GL_VERTEX_ARRAY`
    pub const VERTEX_ARRAY: u32 = 0x8074;
    /// `GL_COLOR_ARRAY`
    pub const COLOR_ARRAY: u32 = 0x8076;
    /// `GL_TEXTURE_COORD_ARRAY`
    pub const TEXTURE_COORD_ARRAY: u32 = 0x8078;
    /// `GL_NORMAL_ARRAY`
    pub const NORMAL_ARRAY: u32 = 0x8075;
    /// `GL_ALL_ATTRIB_BITS`
    pub const ALL_ATTRIB_BITS: u32 = 0x000F_FFFF;
    /// `GL_CLIENT_ALL_ATTRIB_BITS`
    pub const CLIENT_ALL_ATTRIB_BITS: u32 = 0xFFFF_FFFF;
}

/// What the current context supports, probed once per device.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// OpenGL ES / WebGL context.
    pub embedded: bool,
    /// GLSL vertex and fragment shaders.
    pub shaders: bool,
    /// Vertex buffer objects.
    pub buffer_objects: bool,
    /// Vertex array objects (required by core profiles).
    pub vertex_arrays: bool,
    /// Geometry shader stage.
    pub geometry_shaders: bool,
    /// Uniform buffer objects.
    pub uniform_buffers: bool,
    /// Non-power-of-two texture sizes.
    pub npot_textures: bool,
    /// Fixed-function pipeline (matrix stacks, client arrays, `glLight`).
    pub fixed_function: bool,
    /// `GL_QUADS` is a valid drawing mode.
    pub native_quads: bool,
    /// Largest texture dimension.
    pub max_texture_size: u32,
    /// Texture units usable from a shader.
    pub max_texture_units: u32,
    /// Uniform buffer binding points.
    pub max_uniform_buffer_bindings: u32,
    /// Uniform components available to the vertex stage.
    pub max_vertex_uniform_components: u32,
    /// Fixed-function lights.
    pub max_lights: u32,
    /// Supported GLSL version, without any `OpenGL ES GLSL` prefix.
    pub shading_language_version: String,
}

/// A typed uniform value, one variant per `glUniform*` entry point used.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum UniformValue {
    /// `int` / `sampler*`
    Int(i32),
    /// `ivec2`
    Int2([i32; 2]),
    /// `ivec3`
    Int3([i32; 3]),
    /// `ivec4`
    Int4([i32; 4]),
    /// `float`
    Float(f32),
    /// `vec2`
    Float2([f32; 2]),
    /// `vec3`
    Float3([f32; 3]),
    /// `vec4`
    Float4([f32; 4]),
    /// `mat4`, column-major.
    Mat4([f32; 16]),
}

/// The GL operations the rendering core issues.
///
/// Handles are associated types so the same pipeline runs on native GL,
/// WebGL and the test recorder.
pub trait GlDevice {
    /// Linked program handle.
    type Program: Copy + PartialEq + fmt::Debug;
    /// Shader stage handle.
    type Shader: Copy + fmt::Debug;
    /// Buffer object handle.
    type Buffer: Copy + PartialEq + fmt::Debug;
    /// Texture handle.
    type Texture: Copy + PartialEq + fmt::Debug;
    /// Vertex array object handle.
    type VertexArray: Copy + PartialEq + fmt::Debug;
    /// Uniform location.
    type UniformLocation: Clone + fmt::Debug;

    /// Capabilities probed when the device was created.
    fn capabilities(&self) -> &Capabilities;

    /// `glEnable`
    fn enable(&self, capability: u32);
    /// `glDisable`
    fn disable(&self, capability: u32);
    /// `glIsEnabled`
    fn is_enabled(&self, capability: u32) -> bool;
    /// `glGetIntegerv` for a single value.
    fn get_integer(&self, parameter: u32) -> i32;
    /// `glClearColor`
    fn clear_color(&self, color: [f32; 4]);
    /// `glClear`
    fn clear(&self, mask: u32);
    /// `glViewport`
    fn viewport(&self, rect: IntRect);
    /// `glBlendFuncSeparate`
    fn blend_func_separate(&self, src_rgb: u32, dst_rgb: u32, src_alpha: u32, dst_alpha: u32);
    /// `glBlendEquationSeparate`
    fn blend_equation_separate(&self, rgb: u32, alpha: u32);
    /// `glFlush`
    fn flush(&self);

    /// `glGenBuffers`
    ///
    /// # Errors
    ///
    /// Returns the driver's message if no buffer could be created.
    fn create_buffer(&self) -> Result<Self::Buffer, String>;
    /// `glDeleteBuffers`
    fn delete_buffer(&self, buffer: Self::Buffer);
    /// `glBindBuffer`
    fn bind_buffer(&self, target: u32, buffer: Option<Self::Buffer>);
    /// The buffer bound to a binding point such as `GL_ARRAY_BUFFER_BINDING`.
    fn bound_buffer(&self, binding: u32) -> Option<Self::Buffer>;
    /// `glBufferData` with no data (storage orphaning).
    fn buffer_data_size(&self, target: u32, size: i32, usage: u32);
    /// `glBufferData`
    fn buffer_data(&self, target: u32, data: &[u8], usage: u32);
    /// `glBindBufferBase`
    fn bind_buffer_base(&self, target: u32, index: u32, buffer: Option<Self::Buffer>);

    /// `glGenVertexArrays`
    ///
    /// # Errors
    ///
    /// Returns the driver's message if no vertex array could be created.
    fn create_vertex_array(&self) -> Result<Self::VertexArray, String>;
    /// `glDeleteVertexArrays`
    fn delete_vertex_array(&self, vertex_array: Self::VertexArray);
    /// `glBindVertexArray`
    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>);
    /// The currently bound vertex array object.
    fn bound_vertex_array(&self) -> Option<Self::VertexArray>;
    /// `glEnableVertexAttribArray`
    fn enable_vertex_attrib_array(&self, index: u32);
    /// `glDisableVertexAttribArray`
    fn disable_vertex_attrib_array(&self, index: u32);
    /// `GL_VERTEX_ATTRIB_ARRAY_ENABLED` for one attribute.
    fn is_vertex_attrib_array_enabled(&self, index: u32) -> bool;
    /// `glVertexAttribPointer` with a byte offset into the bound buffer.
    fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    );
    /// `glDrawArrays`
    fn draw_arrays(&self, mode: u32, first: i32, count: i32);

    /// `glCreateProgram`
    ///
    /// # Errors
    ///
    /// Returns the driver's message if no program could be created.
    fn create_program(&self) -> Result<Self::Program, String>;
    /// `glDeleteProgram`
    fn delete_program(&self, program: Self::Program);
    /// `glCreateShader`
    ///
    /// # Errors
    ///
    /// Returns the driver's message if no shader could be created.
    fn create_shader(&self, stage: u32) -> Result<Self::Shader, String>;
    /// `glDeleteShader`
    fn delete_shader(&self, shader: Self::Shader);
    /// Upload source and compile one stage.
    ///
    /// # Errors
    ///
    /// Returns the driver's info log when compilation fails.
    fn compile_shader(&self, shader: Self::Shader, source: &str) -> Result<(), String>;
    /// `glAttachShader`
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    /// `glBindAttribLocation`, effective at the next link.
    fn bind_attrib_location(&self, program: Self::Program, index: u32, name: &str);
    /// Link a program.
    ///
    /// # Errors
    ///
    /// Returns the driver's info log when linking fails.
    fn link_program(&self, program: Self::Program) -> Result<(), String>;
    /// `glUseProgram`
    fn use_program(&self, program: Option<Self::Program>);
    /// The program currently in use.
    fn current_program(&self) -> Option<Self::Program>;
    /// `glGetUniformLocation`
    fn uniform_location(&self, program: Self::Program, name: &str) -> Option<Self::UniformLocation>;
    /// `glGetAttribLocation`
    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32>;
    /// `glGetUniformBlockIndex`
    fn uniform_block_index(&self, program: Self::Program, name: &str) -> Option<u32>;
    /// `glUniformBlockBinding`
    fn uniform_block_binding(&self, program: Self::Program, index: u32, binding: u32);
    /// `glUniform*` on the program currently in use.
    fn set_uniform(&self, location: &Self::UniformLocation, value: UniformValue);

    /// `glGenTextures`
    ///
    /// # Errors
    ///
    /// Returns the driver's message if no texture could be created.
    fn create_texture(&self) -> Result<Self::Texture, String>;
    /// `glDeleteTextures`
    fn delete_texture(&self, texture: Self::Texture);
    /// `glActiveTexture(GL_TEXTURE0 + unit)`
    fn active_texture(&self, unit: u32);
    /// `glBindTexture`
    fn bind_texture(&self, target: u32, texture: Option<Self::Texture>);
    /// The texture bound to a binding point such as `GL_TEXTURE_BINDING_2D`.
    fn bound_texture(&self, binding: u32) -> Option<Self::Texture>;
    /// `glTexParameteri`
    fn tex_parameter(&self, target: u32, parameter: u32, value: i32);
    /// `glTexImage2D`, RGBA8 storage.
    fn tex_image_2d(&self, target: u32, width: i32, height: i32, pixels: Option<&[u8]>);
    /// `glTexSubImage2D`, RGBA bytes.
    fn tex_sub_image_2d(&self, target: u32, x: i32, y: i32, width: i32, height: i32, pixels: &[u8]);
    /// `glTexImage3D`, RGBA8 storage.
    fn tex_image_3d(&self, width: i32, height: i32, depth: i32, pixels: Option<&[u8]>);
    /// `glTexSubImage3D`, RGBA bytes.
    #[expect(clippy::too_many_arguments)]
    fn tex_sub_image_3d(
        &self,
        x: i32,
        y: i32,
        z: i32,
        width: i32,
        height: i32,
        depth: i32,
        pixels: &[u8],
    );
    /// `glCopyTexSubImage2D` from the bound read framebuffer.
    fn copy_tex_sub_image_2d(&self, x_offset: i32, y_offset: i32, x: i32, y: i32, width: i32, height: i32);
    /// `glGetTexImage` of level 0 as RGBA bytes.
    fn get_tex_image(&self, target: u32, pixels: &mut [u8]);

    /// `glMatrixMode`
    fn matrix_mode(&self, mode: u32);
    /// `glLoadMatrixf`, column-major.
    fn load_matrix(&self, matrix: &[f32; 16]);
    /// `glPushMatrix`
    fn push_matrix(&self);
    /// `glPopMatrix`
    fn pop_matrix(&self);
    /// `glPushAttrib`
    fn push_attrib(&self, mask: u32);
    /// `glPopAttrib`
    fn pop_attrib(&self);
    /// `glPushClientAttrib`
    fn push_client_attrib(&self, mask: u32);
    /// `glPopClientAttrib`
    fn pop_client_attrib(&self);
    /// `glEnableClientState`
    fn enable_client_state(&self, array: u32);
    /// Point the client vertex/color/texcoord arrays at `vertices` and draw them.
    fn draw_client_vertices(&self, mode: u32, vertices: &[Vertex]);
    /// `glLightfv`
    fn light_fv(&self, light: u32, parameter: u32, values: &[f32]);
    /// `glLightf`
    fn light_f(&self, light: u32, parameter: u32, value: f32);
}
