// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! WGPU device memory (Metal/Vulkan/DirectX)
//!
//! Allocations are storage buffers usable by compute shaders. Sizes are padded
//! to `wgpu::COPY_BUFFER_ALIGNMENT`; the logical length is kept in the handle.
//! Downloads go through a mapped staging buffer and block until the copy
//! finished. Validation errors raised asynchronously by WGPU are collected and
//! reported by `last_error`.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use super::DeviceMemory;
use crate::error::DeviceStatus;

/// Storage buffer allocation
#[derive(Debug)]
pub struct WgpuHandle {
    buffer: wgpu::Buffer,
    byte_len: usize,
}

impl WgpuHandle {
    /// The underlying storage buffer, for binding in compute passes
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len
    }
}

/// WGPU device and queue
#[derive(Clone)]
pub struct WgpuDevice {
    name: Arc<str>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    uncaptured: Arc<Mutex<Option<String>>>,
}

fn padded_size(byte_len: usize) -> u64 {
    let align = wgpu::COPY_BUFFER_ALIGNMENT;
    let len = (byte_len as u64).max(align);
    len.div_ceil(align) * align
}

impl WgpuDevice {
    /// Open adapter `adapter_index` (in enumeration order) and create a device
    pub fn new(adapter_index: usize) -> Result<Self, DeviceStatus> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = if adapter_index == 0 {
            pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            }))
        } else {
            instance
                .enumerate_adapters(wgpu::Backends::all())
                .into_iter()
                .nth(adapter_index)
        };
        let adapter = adapter.ok_or_else(|| {
            DeviceStatus::Unavailable(format!("no WGPU adapter at index {}", adapter_index))
        })?;

        let adapter_info = adapter.get_info();
        let name = format!("WGPU ({} - {:?})", adapter_info.name, adapter_info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("synmat device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
            },
            None,
        ))
        .map_err(|e| DeviceStatus::Unavailable(format!("failed to create device: {}", e)))?;

        let uncaptured = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&uncaptured);
        device.on_uncaptured_error(Box::new(move |error| {
            sink.lock().get_or_insert_with(|| error.to_string());
        }));

        info!(device = %name, "opened WGPU device");
        Ok(Self {
            name: name.into(),
            device: Arc::new(device),
            queue: Arc::new(queue),
            uncaptured,
        })
    }
}

impl DeviceMemory for WgpuDevice {
    type Handle = WgpuHandle;

    fn name(&self) -> &str {
        &self.name
    }

    fn allocate(&self, byte_count: usize) -> Result<WgpuHandle, DeviceStatus> {
        let size = padded_size(byte_count);
        let max = self.device.limits().max_buffer_size;
        if size > max {
            return Err(DeviceStatus::OutOfMemory {
                requested: byte_count,
                available: max as usize,
            });
        }

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("synmat array"),
            size,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        debug!(bytes = byte_count, padded = size, "allocated WGPU buffer");

        Ok(WgpuHandle {
            buffer,
            byte_len: byte_count,
        })
    }

    fn copy_host_to_device(&self, dst: &mut WgpuHandle, src: &[u8]) -> Result<(), DeviceStatus> {
        if src.len() != dst.byte_len {
            return Err(DeviceStatus::SizeMismatch {
                expected: dst.byte_len,
                actual: src.len(),
            });
        }

        // write_buffer needs an aligned length; the tail stays zero
        let padded = padded_size(src.len()) as usize;
        if padded == src.len() {
            self.queue.write_buffer(&dst.buffer, 0, src);
        } else {
            let mut staged = vec![0u8; padded];
            staged[..src.len()].copy_from_slice(src);
            self.queue.write_buffer(&dst.buffer, 0, &staged);
        }
        self.queue.submit(None);
        Ok(())
    }

    fn copy_device_to_host(&self, dst: &mut [u8], src: &WgpuHandle) -> Result<(), DeviceStatus> {
        if dst.len() != src.byte_len {
            return Err(DeviceStatus::SizeMismatch {
                expected: src.byte_len,
                actual: dst.len(),
            });
        }

        let size = src.buffer.size();
        let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("synmat staging"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("synmat download"),
            });
        encoder.copy_buffer_to_buffer(&src.buffer, 0, &staging_buffer, 0, size);
        self.queue.submit(Some(encoder.finish()));

        // Map staging buffer (blocking)
        let buffer_slice = staging_buffer.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);

        receiver
            .recv()
            .map_err(|_| DeviceStatus::Backend("staging map callback dropped".to_string()))?
            .map_err(|e| DeviceStatus::Backend(format!("failed to map staging buffer: {:?}", e)))?;

        {
            let data = buffer_slice.get_mapped_range();
            dst.copy_from_slice(&data[..dst.len()]);
        }
        staging_buffer.unmap();
        staging_buffer.destroy();
        Ok(())
    }

    fn free(&self, handle: WgpuHandle) -> Result<(), DeviceStatus> {
        handle.buffer.destroy();
        Ok(())
    }

    fn last_error(&self) -> DeviceStatus {
        match self.uncaptured.lock().take() {
            Some(message) => DeviceStatus::Backend(message),
            None => DeviceStatus::Success,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_size() {
        assert_eq!(padded_size(0), 4);
        assert_eq!(padded_size(1), 4);
        assert_eq!(padded_size(4), 4);
        assert_eq!(padded_size(13), 16);
    }
}
