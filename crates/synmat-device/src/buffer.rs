// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Scoped device allocations
//!
//! A [`DeviceBuffer`] owns exactly one allocation and frees it when dropped.
//! [`DeviceArray`] adds an element type on top for `bytemuck::Pod` data.

use core::fmt;
use core::marker::PhantomData;

use bytemuck::Pod;
use tracing::warn;

use crate::backend::DeviceMemory;
use crate::error::{DeviceOperation, DeviceStatus, MirrorError, MirrorResult, TransferDirection};

/// One owned device allocation
///
/// Zero-length buffers hold no allocation. `Drop` frees; a failing free is
/// logged since `Drop` cannot report it. Use [`DeviceBuffer::release`] to
/// observe the status.
pub struct DeviceBuffer<D: DeviceMemory> {
    device: D,
    handle: Option<D::Handle>,
    byte_len: usize,
    label: &'static str,
}

impl<D: DeviceMemory> DeviceBuffer<D> {
    /// Allocate `byte_len` bytes
    pub fn allocate(device: &D, label: &'static str, byte_len: usize) -> MirrorResult<Self> {
        let handle = if byte_len == 0 {
            None
        } else {
            let handle = device
                .allocate(byte_len)
                .map_err(|status| MirrorError::device(DeviceOperation::Allocate, label, status))?;
            Some(handle)
        };

        Ok(Self {
            device: device.clone(),
            handle,
            byte_len,
            label,
        })
    }

    /// Allocate and fill from `bytes`
    pub fn from_bytes(device: &D, label: &'static str, bytes: &[u8]) -> MirrorResult<Self> {
        let mut buffer = Self::allocate(device, label, bytes.len())?;
        buffer.write(bytes)?;
        Ok(buffer)
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Backend handle, `None` for zero-length buffers
    pub fn handle(&self) -> Option<&D::Handle> {
        self.handle.as_ref()
    }

    /// Overwrite the whole buffer
    pub fn write(&mut self, bytes: &[u8]) -> MirrorResult<()> {
        let operation = DeviceOperation::Copy(TransferDirection::HostToDevice);
        if bytes.len() != self.byte_len {
            return Err(MirrorError::device(
                operation,
                self.label,
                DeviceStatus::SizeMismatch {
                    expected: self.byte_len,
                    actual: bytes.len(),
                },
            ));
        }
        match self.handle.as_mut() {
            Some(handle) => self
                .device
                .copy_host_to_device(handle, bytes)
                .map_err(|status| MirrorError::device(operation, self.label, status)),
            None => Ok(()),
        }
    }

    /// Read the whole buffer into `out`
    pub fn read(&self, out: &mut [u8]) -> MirrorResult<()> {
        let operation = DeviceOperation::Copy(TransferDirection::DeviceToHost);
        if out.len() != self.byte_len {
            return Err(MirrorError::device(
                operation,
                self.label,
                DeviceStatus::SizeMismatch {
                    expected: self.byte_len,
                    actual: out.len(),
                },
            ));
        }
        match self.handle.as_ref() {
            Some(handle) => self
                .device
                .copy_device_to_host(out, handle)
                .map_err(|status| MirrorError::device(operation, self.label, status)),
            None => Ok(()),
        }
    }

    /// Free the allocation and report the status
    pub fn release(mut self) -> MirrorResult<()> {
        match self.handle.take() {
            Some(handle) => self
                .device
                .free(handle)
                .map_err(|status| MirrorError::device(DeviceOperation::Free, self.label, status)),
            None => Ok(()),
        }
    }
}

impl<D: DeviceMemory> Drop for DeviceBuffer<D> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(status) = self.device.free(handle) {
                warn!(
                    array = self.label,
                    bytes = self.byte_len,
                    device = self.device.name(),
                    "failed to free device buffer: {}",
                    status
                );
            }
        }
    }
}

impl<D: DeviceMemory> fmt::Debug for DeviceBuffer<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceBuffer")
            .field("label", &self.label)
            .field("byte_len", &self.byte_len)
            .field("device", &self.device.name())
            .finish()
    }
}

/// Typed device array of `len` elements
pub struct DeviceArray<T, D: DeviceMemory> {
    buffer: DeviceBuffer<D>,
    len: usize,
    _element: PhantomData<T>,
}

impl<T: Pod, D: DeviceMemory> DeviceArray<T, D> {
    /// Allocate and copy `data` to the device
    pub fn upload(device: &D, label: &'static str, data: &[T]) -> MirrorResult<Self> {
        Ok(Self {
            buffer: DeviceBuffer::from_bytes(device, label, bytemuck::cast_slice(data))?,
            len: data.len(),
            _element: PhantomData,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Copy the whole array back to the host
    pub fn download(&self) -> MirrorResult<Vec<T>> {
        let mut values = vec![T::zeroed(); self.len];
        self.buffer.read(bytemuck::cast_slice_mut(&mut values))?;
        Ok(values)
    }

    /// Re-copy the whole array; `data` must keep the same length
    pub fn update(&mut self, data: &[T]) -> MirrorResult<()> {
        self.buffer.write(bytemuck::cast_slice(data))
    }

    pub fn buffer(&self) -> &DeviceBuffer<D> {
        &self.buffer
    }

    /// Free the allocation and report the status
    pub fn release(self) -> MirrorResult<()> {
        self.buffer.release()
    }
}

impl<T, D: DeviceMemory> fmt::Debug for DeviceArray<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceArray")
            .field("element", &core::any::type_name::<T>())
            .field("len", &self.len)
            .field("buffer", &self.buffer)
            .finish()
    }
}
