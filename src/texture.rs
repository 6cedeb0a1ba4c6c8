//! GPU-resident RGBA8 images.
//!
//! A [`Texture`] knows its logical size and the padded size the driver
//! actually stores (power-of-two padding on contexts without NPOT support).
//! Every content change draws a fresh [`CacheId`], which is what the render
//! state cache compares.

use std::{path::Path, sync::Arc};

use glam::{Mat4, UVec2, Vec3};
use image::RgbaImage;
use log::{debug, warn};

use crate::{
    cache_id::{self, CacheId, Category},
    device::{legacy, Capabilities, GlDevice},
    error::{DeviceError, TextureError},
    types::IntRect,
};

/// How texture coordinates given to the pipeline are interpreted.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CoordinateType {
    /// `0.0..=1.0` across the texture.
    Normalized,
    /// Texels, `0..size`.
    #[default]
    Pixels,
}

/// Pre-cast GL enum for `glTexParameteri`.
#[expect(clippy::cast_possible_wrap)]
const fn param(value: u32) -> i32 {
    value as i32
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn binding_of(target: u32) -> u32 {
    if target == glow::TEXTURE_3D {
        glow::TEXTURE_BINDING_3D
    } else {
        glow::TEXTURE_BINDING_2D
    }
}

/// Restores the texture binding of a target when dropped.
pub(crate) struct TextureSaver<'a, D: GlDevice> {
    device: &'a D,
    target: u32,
    previous: Option<D::Texture>,
}

impl<'a, D: GlDevice> TextureSaver<'a, D> {
    pub(crate) fn new(device: &'a D, target: u32) -> Self {
        Self {
            device,
            target,
            previous: device.bound_texture(binding_of(target)),
        }
    }
}

impl<D: GlDevice> Drop for TextureSaver<'_, D> {
    fn drop(&mut self) {
        self.device.bind_texture(self.target, self.previous);
    }
}

/// A 2D or 3D texture.
pub struct Texture<D: GlDevice> {
    device: Arc<D>,
    handle: Option<D::Texture>,
    target: u32,
    size: UVec2,
    actual_size: UVec2,
    depth: u32,
    smooth: bool,
    repeated: bool,
    pixels_flipped: bool,
    cache_id: CacheId,
}

impl<D: GlDevice> Texture<D> {
    /// An empty texture; call [`create`](Self::create) or one of the loaders.
    #[must_use]
    pub fn new(device: Arc<D>) -> Self {
        Self {
            device,
            handle: None,
            target: glow::TEXTURE_2D,
            size: UVec2::ZERO,
            actual_size: UVec2::ZERO,
            depth: 1,
            smooth: false,
            repeated: false,
            pixels_flipped: false,
            cache_id: CacheId::NONE,
        }
    }

    /// Allocate uninitialized 2D storage.
    ///
    /// # Errors
    ///
    /// Fails if a dimension is zero, if the padded size exceeds
    /// [`maximum_size`](Self::maximum_size), or if the driver cannot create
    /// the texture.
    pub fn create(&mut self, width: u32, height: u32) -> Result<(), TextureError> {
        self.allocate(glow::TEXTURE_2D, width, height, 1)
    }

    /// Allocate uninitialized 3D storage.
    ///
    /// # Errors
    ///
    /// As [`create`](Self::create); also fails on contexts without 3D textures.
    pub fn create_3d(&mut self, width: u32, height: u32, depth: u32) -> Result<(), TextureError> {
        let caps = self.device.capabilities();
        if caps.embedded && caps.shading_language_version.starts_with('1') {
            return Err(TextureError::Unsupported("3D textures"));
        }
        self.allocate(glow::TEXTURE_3D, width, height, depth)
    }

    fn allocate(&mut self, target: u32, width: u32, height: u32, depth: u32) -> Result<(), TextureError> {
        if width == 0 || height == 0 || depth == 0 {
            return Err(TextureError::InvalidSize { width, height, depth });
        }
        let caps = self.device.capabilities();
        let actual = UVec2::new(Self::valid_size(caps, width), Self::valid_size(caps, height));
        let actual_depth = if target == glow::TEXTURE_3D {
            Self::valid_size(caps, depth)
        } else {
            1
        };
        let maximum = Self::maximum_size(&*self.device);
        let largest = actual.max_element().max(actual_depth);
        if largest > maximum {
            return Err(TextureError::TooLarge {
                requested: largest,
                maximum,
            });
        }

        if self.target != target {
            if let Some(handle) = self.handle.take() {
                self.device.delete_texture(handle);
            }
        }
        let handle = match self.handle {
            Some(handle) => handle,
            None => {
                let handle = self
                    .device
                    .create_texture()
                    .map_err(DeviceError::creating("texture"))?;
                self.handle = Some(handle);
                handle
            }
        };

        self.target = target;
        self.size = UVec2::new(width, height);
        self.actual_size = actual;
        self.depth = depth;
        self.pixels_flipped = false;

        {
            let _saver = TextureSaver::new(&*self.device, target);
            self.device.bind_texture(target, Some(handle));
            if target == glow::TEXTURE_3D {
                self.device
                    .tex_image_3d(to_i32(actual.x), to_i32(actual.y), to_i32(actual_depth), None);
            } else {
                self.device
                    .tex_image_2d(target, to_i32(actual.x), to_i32(actual.y), None);
            }
            self.apply_parameters();
        }

        self.cache_id = cache_id::next(Category::Texture);
        debug!(
            "created {width}x{height}x{depth} texture (storage {}x{}x{actual_depth})",
            actual.x, actual.y
        );
        Ok(())
    }

    fn apply_parameters(&self) {
        let wrap = if self.repeated {
            param(glow::REPEAT)
        } else {
            param(glow::CLAMP_TO_EDGE)
        };
        let filter = if self.smooth {
            param(glow::LINEAR)
        } else {
            param(glow::NEAREST)
        };
        let device = &*self.device;
        device.tex_parameter(self.target, glow::TEXTURE_WRAP_S, wrap);
        device.tex_parameter(self.target, glow::TEXTURE_WRAP_T, wrap);
        if self.target == glow::TEXTURE_3D {
            device.tex_parameter(self.target, glow::TEXTURE_WRAP_R, wrap);
        }
        device.tex_parameter(self.target, glow::TEXTURE_MIN_FILTER, filter);
        device.tex_parameter(self.target, glow::TEXTURE_MAG_FILTER, filter);
    }

    /// Create the texture from an image, optionally from a sub-area of it.
    ///
    /// The area is clamped to the image bounds. An area of zero width or
    /// height loads the whole image.
    ///
    /// # Errors
    ///
    /// As [`create`](Self::create).
    pub fn load_from_image(&mut self, image: &RgbaImage, area: Option<IntRect>) -> Result<(), TextureError> {
        let (width, height) = image.dimensions();
        let whole = IntRect::new(0, 0, to_i32(width), to_i32(height));
        let Some(area) = area.filter(|a| a.width != 0 && a.height != 0 && *a != whole) else {
            self.create(width, height)?;
            return self.update(image.as_raw());
        };

        let clamp = |value: i32, limit: u32| u32::try_from(value).unwrap_or(0).min(limit);
        let left = clamp(area.left, width);
        let top = clamp(area.top, height);
        let right = clamp(area.left.saturating_add(area.width), width);
        let bottom = clamp(area.top.saturating_add(area.height), height);
        let area_width = right.saturating_sub(left);
        let area_height = bottom.saturating_sub(top);

        self.create(area_width, area_height)?;
        let cropped = image::imageops::crop_imm(image, left, top, area_width, area_height).to_image();
        self.update(cropped.as_raw())
    }

    /// Decode an encoded image (PNG, JPEG) and create the texture from it.
    ///
    /// # Errors
    ///
    /// Fails if decoding fails, or as [`load_from_image`](Self::load_from_image).
    pub fn load_from_memory(&mut self, bytes: &[u8], area: Option<IntRect>) -> Result<(), TextureError> {
        let image = image::load_from_memory(bytes)?.to_rgba8();
        self.load_from_image(&image, area)
    }

    /// Read and decode an image file and create the texture from it.
    ///
    /// # Errors
    ///
    /// Fails if reading or decoding fails, or as
    /// [`load_from_image`](Self::load_from_image).
    pub fn load_from_file(&mut self, path: impl AsRef<Path>, area: Option<IntRect>) -> Result<(), TextureError> {
        let image = image::open(path)?.to_rgba8();
        self.load_from_image(&image, area)
    }

    /// Replace the whole content. `pixels` is tightly packed RGBA.
    ///
    /// # Errors
    ///
    /// Fails if the texture was never created or `pixels` has the wrong length.
    pub fn update(&mut self, pixels: &[u8]) -> Result<(), TextureError> {
        if self.target == glow::TEXTURE_3D {
            return self.update_3d(pixels);
        }
        self.update_region(pixels, 0, 0, self.size.x, self.size.y)
    }

    /// Replace a rectangle of a 2D texture.
    ///
    /// # Errors
    ///
    /// Fails if the texture was never created, the region does not fit, or
    /// `pixels` is not `width * height * 4` bytes long.
    pub fn update_region(
        &mut self,
        pixels: &[u8],
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Result<(), TextureError> {
        let handle = self.handle.ok_or(TextureError::NotCreated)?;
        if x.saturating_add(width) > self.size.x || y.saturating_add(height) > self.size.y {
            return Err(TextureError::OutOfBounds {
                x,
                y,
                width,
                height,
                texture_width: self.size.x,
                texture_height: self.size.y,
            });
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(TextureError::PixelLength {
                expected,
                actual: pixels.len(),
            });
        }
        if width == 0 || height == 0 {
            return Ok(());
        }

        {
            let _saver = TextureSaver::new(&*self.device, self.target);
            self.device.bind_texture(self.target, Some(handle));
            self.device.tex_sub_image_2d(
                self.target,
                to_i32(x),
                to_i32(y),
                to_i32(width),
                to_i32(height),
                pixels,
            );
        }
        self.pixels_flipped = false;
        self.cache_id = cache_id::next(Category::Texture);
        Ok(())
    }

    /// Replace the whole content of a 3D texture, slice after slice.
    ///
    /// # Errors
    ///
    /// Fails if the texture was never created or `pixels` has the wrong length.
    pub fn update_3d(&mut self, pixels: &[u8]) -> Result<(), TextureError> {
        let handle = self.handle.ok_or(TextureError::NotCreated)?;
        let expected = self.size.x as usize * self.size.y as usize * self.depth as usize * 4;
        if pixels.len() != expected {
            return Err(TextureError::PixelLength {
                expected,
                actual: pixels.len(),
            });
        }
        {
            let _saver = TextureSaver::new(&*self.device, glow::TEXTURE_3D);
            self.device.bind_texture(glow::TEXTURE_3D, Some(handle));
            self.device.tex_sub_image_3d(
                0,
                0,
                0,
                to_i32(self.size.x),
                to_i32(self.size.y),
                to_i32(self.depth),
                pixels,
            );
        }
        self.cache_id = cache_id::next(Category::Texture);
        Ok(())
    }

    /// Copy the bound framebuffer (of size `source`) into the texture at
    /// `dest`. The copied rows are bottom-up, so the texture is marked as
    /// flipped until its next regular update.
    ///
    /// # Errors
    ///
    /// Fails if the texture was never created or the source does not fit.
    pub fn update_from_framebuffer(&mut self, source: UVec2, dest: UVec2) -> Result<(), TextureError> {
        let handle = self.handle.ok_or(TextureError::NotCreated)?;
        if self.target == glow::TEXTURE_3D {
            return Err(TextureError::Unsupported("copying a framebuffer into a 3D texture"));
        }
        if dest.x.saturating_add(source.x) > self.size.x || dest.y.saturating_add(source.y) > self.size.y {
            return Err(TextureError::OutOfBounds {
                x: dest.x,
                y: dest.y,
                width: source.x,
                height: source.y,
                texture_width: self.size.x,
                texture_height: self.size.y,
            });
        }
        {
            let _saver = TextureSaver::new(&*self.device, self.target);
            self.device.bind_texture(self.target, Some(handle));
            self.device.copy_tex_sub_image_2d(
                to_i32(dest.x),
                to_i32(dest.y),
                0,
                0,
                to_i32(source.x),
                to_i32(source.y),
            );
        }
        self.pixels_flipped = true;
        self.cache_id = cache_id::next(Category::Texture);
        Ok(())
    }

    /// Read the texture back, without padding and right side up.
    ///
    /// # Errors
    ///
    /// Fails if the texture was never created, is 3D, or the context cannot
    /// read textures back (OpenGL ES).
    pub fn copy_to_image(&self) -> Result<RgbaImage, TextureError> {
        let handle = self.handle.ok_or(TextureError::NotCreated)?;
        if self.target == glow::TEXTURE_3D {
            return Err(TextureError::Unsupported("reading back 3D textures"));
        }
        if self.device.capabilities().embedded {
            return Err(TextureError::Unsupported("reading back textures"));
        }

        let actual_row = self.actual_size.x as usize * 4;
        let mut storage = vec![0; actual_row * self.actual_size.y as usize];
        {
            let _saver = TextureSaver::new(&*self.device, self.target);
            self.device.bind_texture(self.target, Some(handle));
            self.device.get_tex_image(self.target, &mut storage);
        }

        let row = self.size.x as usize * 4;
        let rows = self.size.y as usize;
        let mut pixels = Vec::with_capacity(row * rows);
        for y in 0..rows {
            let source_row = if self.pixels_flipped { rows - 1 - y } else { y };
            let start = source_row * actual_row;
            pixels.extend_from_slice(&storage[start..start + row]);
        }
        RgbaImage::from_raw(self.size.x, self.size.y, pixels).ok_or(TextureError::PixelLength {
            expected: row * rows,
            actual: storage.len(),
        })
    }

    /// Enable or disable linear filtering.
    pub fn set_smooth(&mut self, smooth: bool) {
        if self.smooth != smooth {
            self.smooth = smooth;
            self.reapply_parameters();
        }
    }

    /// Whether linear filtering is enabled.
    #[must_use]
    pub fn is_smooth(&self) -> bool {
        self.smooth
    }

    /// Enable or disable repeating outside `0..size`.
    pub fn set_repeated(&mut self, repeated: bool) {
        if self.repeated != repeated {
            self.repeated = repeated;
            if repeated && !self.device.capabilities().npot_textures && self.size != self.actual_size {
                warn!("a padded texture cannot repeat correctly, its storage is larger than its content");
            }
            self.reapply_parameters();
        }
    }

    /// Whether the texture repeats.
    #[must_use]
    pub fn is_repeated(&self) -> bool {
        self.repeated
    }

    fn reapply_parameters(&self) {
        if let Some(handle) = self.handle {
            let _saver = TextureSaver::new(&*self.device, self.target);
            self.device.bind_texture(self.target, Some(handle));
            self.apply_parameters();
        }
    }

    /// Logical size in texels.
    #[must_use]
    pub fn size(&self) -> UVec2 {
        self.size
    }

    /// Padded storage size.
    #[must_use]
    pub fn actual_size(&self) -> UVec2 {
        self.actual_size
    }

    /// Number of slices; 1 for 2D textures.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Whether this is a 3D texture.
    #[must_use]
    pub fn is_3d(&self) -> bool {
        self.target == glow::TEXTURE_3D
    }

    /// Whether rows are stored bottom-up (after a framebuffer copy).
    #[must_use]
    pub fn pixels_flipped(&self) -> bool {
        self.pixels_flipped
    }

    /// Identity of the current content.
    #[must_use]
    pub fn cache_id(&self) -> CacheId {
        self.cache_id
    }

    /// The GL texture, if created.
    #[must_use]
    pub fn handle(&self) -> Option<D::Texture> {
        self.handle
    }

    /// `GL_TEXTURE_2D` or `GL_TEXTURE_3D`.
    #[must_use]
    pub fn target(&self) -> u32 {
        self.target
    }

    /// Largest dimension the device accepts.
    #[must_use]
    pub fn maximum_size(device: &D) -> u32 {
        device.capabilities().max_texture_size
    }

    /// The storage size needed for `size` texels: `size` itself with NPOT
    /// support, the next power of two otherwise.
    #[must_use]
    pub fn valid_size(caps: &Capabilities, size: u32) -> u32 {
        if caps.npot_textures {
            size
        } else {
            size.next_power_of_two()
        }
    }

    /// Matrix taking pixel texture coordinates to normalized ones, including
    /// the flip for framebuffer copies.
    #[must_use]
    pub fn pixel_matrix(&self) -> Mat4 {
        if self.actual_size.x == 0 || self.actual_size.y == 0 {
            return Mat4::IDENTITY;
        }
        #[expect(clippy::cast_precision_loss)]
        let (actual, size_y) = (self.actual_size.as_vec2(), self.size.y as f32);
        let mut scale = Vec3::new(1.0 / actual.x, 1.0 / actual.y, 1.0);
        let mut offset = Vec3::ZERO;
        if self.pixels_flipped {
            scale.y = -scale.y;
            offset.y = size_y / actual.y;
        }
        Mat4::from_translation(offset) * Mat4::from_scale(scale)
    }

    /// Bind `texture` (or unbind) for fixed-function drawing, loading the
    /// texture matrix that maps `coordinates` to what GL samples.
    pub fn bind(device: &D, texture: Option<&Self>, coordinates: CoordinateType) {
        let fixed_function = device.capabilities().fixed_function;
        match texture.and_then(|t| t.handle.map(|handle| (t, handle))) {
            Some((texture, handle)) => {
                device.bind_texture(texture.target, Some(handle));
                if fixed_function && (coordinates == CoordinateType::Pixels || texture.pixels_flipped) {
                    let matrix = if coordinates == CoordinateType::Pixels {
                        texture.pixel_matrix()
                    } else {
                        Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)) * Mat4::from_scale(Vec3::new(1.0, -1.0, 1.0))
                    };
                    device.matrix_mode(legacy::TEXTURE);
                    device.load_matrix(&matrix.to_cols_array());
                    device.matrix_mode(legacy::MODELVIEW);
                }
            }
            None => {
                device.bind_texture(glow::TEXTURE_2D, None);
                if fixed_function {
                    device.matrix_mode(legacy::TEXTURE);
                    device.load_matrix(&Mat4::IDENTITY.to_cols_array());
                    device.matrix_mode(legacy::MODELVIEW);
                }
            }
        }
    }
}

impl<D: GlDevice> Drop for Texture<D> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.device.delete_texture(handle);
        }
    }
}
