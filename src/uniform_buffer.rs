//! Buffer objects backing GLSL uniform blocks.

use std::sync::Arc;

use log::debug;

use crate::{
    cache_id::{self, CacheId, Category},
    device::GlDevice,
    error::DeviceError,
};

/// Storage for one uniform block, bound to a shader with
/// [`Shader::set_block`](crate::Shader::set_block).
pub struct UniformBuffer<D: GlDevice> {
    device: Arc<D>,
    handle: D::Buffer,
    size: usize,
    cache_id: CacheId,
}

impl<D: GlDevice> UniformBuffer<D> {
    /// Whether the device supports uniform buffers.
    #[must_use]
    pub fn is_available(device: &D) -> bool {
        device.capabilities().uniform_buffers
    }

    /// Create an empty buffer.
    ///
    /// # Errors
    ///
    /// Fails if the driver cannot create a buffer object.
    pub fn new(device: Arc<D>) -> Result<Self, DeviceError> {
        let handle = device
            .create_buffer()
            .map_err(DeviceError::creating("uniform buffer"))?;
        Ok(Self {
            device,
            handle,
            size: 0,
            cache_id: cache_id::next(Category::Buffer),
        })
    }

    /// Replace the content with `data`, laid out as the block declares it
    /// (usually std140).
    pub fn update(&mut self, data: &[u8]) {
        let previous = self.device.bound_buffer(glow::UNIFORM_BUFFER_BINDING);
        self.device.bind_buffer(glow::UNIFORM_BUFFER, Some(self.handle));
        self.device.buffer_data(glow::UNIFORM_BUFFER, data, glow::DYNAMIC_DRAW);
        self.device.bind_buffer(glow::UNIFORM_BUFFER, previous);
        if data.len() != self.size {
            debug!("uniform buffer resized to {} bytes", data.len());
        }
        self.size = data.len();
    }

    /// Size of the last upload in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Identity of this buffer.
    #[must_use]
    pub fn cache_id(&self) -> CacheId {
        self.cache_id
    }

    /// The GL buffer.
    #[must_use]
    pub fn handle(&self) -> D::Buffer {
        self.handle
    }
}

impl<D: GlDevice> Drop for UniformBuffer<D> {
    fn drop(&mut self) {
        self.device.delete_buffer(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingDevice;

    #[test]
    fn update_preserves_binding() {
        let device = Arc::new(RecordingDevice::desktop());
        let mut first = UniformBuffer::new(Arc::clone(&device)).unwrap();
        let second = UniformBuffer::new(Arc::clone(&device)).unwrap();
        assert!(first.cache_id() < second.cache_id());

        device.bind_buffer(glow::UNIFORM_BUFFER, Some(second.handle()));
        first.update(&[0; 64]);
        assert_eq!(first.size(), 64);
        assert_eq!(device.buffer_size(first.handle()), Some(64));
        assert_eq!(
            device.bound_buffer(glow::UNIFORM_BUFFER_BINDING),
            Some(second.handle())
        );
    }
}
