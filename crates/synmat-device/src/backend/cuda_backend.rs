// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! CUDA device memory (NVIDIA only)
//!
//! Raw byte allocations through cudarc. Copies are synchronous; `last_error`
//! synchronises the device so that errors from earlier asynchronous work
//! surface there.

use std::sync::Arc;

use cudarc::driver::sys::CUresult;
use cudarc::driver::{CudaDevice, CudaSlice, DriverError};
use tracing::{debug, info};

use super::DeviceMemory;
use crate::error::DeviceStatus;

/// CUDA device context
#[derive(Clone)]
pub struct CudaMemory {
    name: Arc<str>,
    device: Arc<CudaDevice>,
}

fn status_from(error: DriverError, requested: usize) -> DeviceStatus {
    match error.0 {
        CUresult::CUDA_ERROR_OUT_OF_MEMORY => DeviceStatus::OutOfMemory {
            requested,
            available: 0,
        },
        CUresult::CUDA_ERROR_INVALID_HANDLE | CUresult::CUDA_ERROR_INVALID_VALUE => {
            DeviceStatus::InvalidHandle
        }
        _ => DeviceStatus::Backend(error.to_string()),
    }
}

impl CudaMemory {
    /// Open device `ordinal`
    pub fn new(ordinal: usize) -> Result<Self, DeviceStatus> {
        let device = CudaDevice::new(ordinal).map_err(|e| {
            DeviceStatus::Unavailable(format!("failed to open CUDA device {}: {}", ordinal, e))
        })?;
        let name = format!(
            "CUDA ({})",
            device.name().unwrap_or_else(|_| format!("device {}", ordinal))
        );

        info!(device = %name, "opened CUDA device");
        Ok(Self {
            name: name.into(),
            device,
        })
    }
}

impl DeviceMemory for CudaMemory {
    type Handle = CudaSlice<u8>;

    fn name(&self) -> &str {
        &self.name
    }

    fn allocate(&self, byte_count: usize) -> Result<CudaSlice<u8>, DeviceStatus> {
        let slice = self
            .device
            .alloc_zeros::<u8>(byte_count)
            .map_err(|e| status_from(e, byte_count))?;
        debug!(bytes = byte_count, "allocated CUDA buffer");
        Ok(slice)
    }

    fn copy_host_to_device(&self, dst: &mut CudaSlice<u8>, src: &[u8]) -> Result<(), DeviceStatus> {
        if dst.len() != src.len() {
            return Err(DeviceStatus::SizeMismatch {
                expected: dst.len(),
                actual: src.len(),
            });
        }
        self.device
            .htod_sync_copy_into(src, dst)
            .map_err(|e| status_from(e, src.len()))
    }

    fn copy_device_to_host(&self, dst: &mut [u8], src: &CudaSlice<u8>) -> Result<(), DeviceStatus> {
        if dst.len() != src.len() {
            return Err(DeviceStatus::SizeMismatch {
                expected: src.len(),
                actual: dst.len(),
            });
        }
        self.device
            .dtoh_sync_copy_into(src, dst)
            .map_err(|e| status_from(e, dst.len()))
    }

    fn free(&self, handle: CudaSlice<u8>) -> Result<(), DeviceStatus> {
        // CudaSlice releases its allocation on drop
        drop(handle);
        Ok(())
    }

    fn last_error(&self) -> DeviceStatus {
        match self.device.synchronize() {
            Ok(()) => DeviceStatus::Success,
            Err(e) => status_from(e, 0),
        }
    }
}

/// True if device 0 can be opened
pub fn is_cuda_available() -> bool {
    CudaDevice::new(0).is_ok()
}
