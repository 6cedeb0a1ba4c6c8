//! Error types for the fallible parts of the API.
//!
//! Drawing never fails loudly: problems during a draw are reported through
//! `log` and the draw is skipped. Resource creation and the GL state stack
//! return these errors instead.

use thiserror::Error;

/// The GL driver refused to create an object.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("failed to create {resource}: {message}")]
pub struct DeviceError {
    /// What was being created, e.g. `"texture"`.
    pub resource: &'static str,
    /// The driver's message.
    pub message: String,
}

impl DeviceError {
    pub(crate) fn creating(resource: &'static str) -> impl FnOnce(String) -> Self {
        move |message| Self { resource, message }
    }
}

/// Failures while building a shader program.
#[derive(Debug, Error)]
pub enum ShaderError {
    /// The context has no GLSL support.
    #[error("shaders are not supported by this context")]
    Unavailable,
    /// A geometry stage was given but the context has no geometry shaders.
    #[error("geometry shaders are not supported by this context")]
    GeometryUnavailable,
    /// Neither a vertex nor a fragment stage was given.
    #[error("a shader program needs at least one stage")]
    NoStages,
    /// One stage did not compile.
    #[error("failed to compile {stage} shader:\n{log}")]
    Compile {
        /// `"vertex"`, `"geometry"` or `"fragment"`.
        stage: &'static str,
        /// The driver's info log.
        log: String,
    },
    /// The stages compiled but did not link.
    #[error("failed to link shader program:\n{0}")]
    Link(String),
    /// A source file could not be read.
    #[error("failed to read shader source {path}: {source}")]
    Io {
        /// The path that was read.
        path: std::path::PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },
    /// A GL object could not be created.
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Failures while creating or updating a texture.
#[derive(Debug, Error)]
pub enum TextureError {
    /// A dimension was zero.
    #[error("invalid texture size {width}x{height}x{depth}, every dimension must be non-zero")]
    InvalidSize {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
        /// Requested depth (1 for 2D textures).
        depth: u32,
    },
    /// The padded size exceeds what the driver accepts.
    #[error("texture dimension {requested} exceeds the maximum size {maximum}")]
    TooLarge {
        /// Largest padded dimension that was requested.
        requested: u32,
        /// `GL_MAX_TEXTURE_SIZE`.
        maximum: u32,
    },
    /// The texture has no GPU storage yet.
    #[error("the texture has not been created")]
    NotCreated,
    /// An update region does not fit inside the texture.
    #[error("region at ({x}, {y}) of size {width}x{height} does not fit in a {texture_width}x{texture_height} texture")]
    OutOfBounds {
        /// Region left.
        x: u32,
        /// Region top.
        y: u32,
        /// Region width.
        width: u32,
        /// Region height.
        height: u32,
        /// Texture width.
        texture_width: u32,
        /// Texture height.
        texture_height: u32,
    },
    /// The pixel slice has the wrong length for the region.
    #[error("expected {expected} bytes of RGBA pixels, got {actual}")]
    PixelLength {
        /// `width * height * depth * 4`.
        expected: usize,
        /// Length of the slice given.
        actual: usize,
    },
    /// The operation needs something this context lacks.
    #[error("{0} is not supported by this context")]
    Unsupported(&'static str),
    /// Decoding the image failed.
    #[error("failed to load image: {0}")]
    Image(#[from] image::ImageError),
    /// A GL object could not be created.
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Misuse of `push_gl_states` / `pop_gl_states`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StateStackError {
    /// `push_gl_states` was called twice without a `pop_gl_states`.
    #[error("GL states are already pushed, nested pushes are not supported")]
    AlreadyPushed,
    /// `pop_gl_states` was called without a matching push.
    #[error("no GL states were pushed")]
    NothingPushed,
}

/// Failures while setting up the buffer-object backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The context lacks shaders or buffer objects.
    #[error("buffer objects and shaders are not supported by this context")]
    Unavailable,
    /// The built-in shader did not build.
    #[error("failed to build the default shader: {0}")]
    Shader(#[from] ShaderError),
    /// The fallback texture could not be created.
    #[error("failed to create the fallback texture: {0}")]
    Texture(#[from] TextureError),
    /// A GL object could not be created.
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Failures while turning a shape into triangles.
#[derive(Debug, Error)]
pub enum ShapeError {
    /// The outline has no segment to fill or stroke.
    #[error("the shape is empty")]
    Empty,
    /// The tessellator rejected the outline.
    #[error("tessellation failed: {0:?}")]
    Tessellation(lyon::tessellation::TessellationError),
}
