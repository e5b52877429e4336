// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Device Memory Backends
//!
//! A minimal allocate/copy/free interface over device memory. Mirrors only
//! ever move opaque bytes; typing happens in [`crate::DeviceArray`].
//!
//! Available backends:
//! - [`HostDevice`]: device memory emulated in host RAM (always built)
//! - `WgpuDevice`: storage buffers via WGPU (feature `gpu`)
//! - `CudaMemory`: device allocations via cudarc (feature `cuda`)

mod host;
#[cfg(feature = "cuda")]
mod cuda_backend;
#[cfg(feature = "gpu")]
mod wgpu_backend;

pub use host::{HostDevice, HostHandle};
#[cfg(feature = "cuda")]
pub use cuda_backend::{is_cuda_available, CudaMemory};
#[cfg(feature = "gpu")]
pub use wgpu_backend::{WgpuDevice, WgpuHandle};

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::DeviceStatus;

/// Abstract device memory
///
/// Implementations are cheap to clone (shared context). Every call is
/// synchronous; a copy has completed once it returns. Failures that a backend
/// can only observe later (asynchronous validation, sticky driver errors) are
/// reported by [`DeviceMemory::last_error`], which clears the pending status.
pub trait DeviceMemory: Clone + Send + Sync {
    /// Owned allocation; consumed by `free`
    type Handle: Send + Sync;

    /// Backend name for logging
    fn name(&self) -> &str;

    /// Allocate `byte_count` bytes (`byte_count > 0`)
    fn allocate(&self, byte_count: usize) -> Result<Self::Handle, DeviceStatus>;

    /// Copy the whole of `src` into the allocation; lengths must match
    fn copy_host_to_device(&self, dst: &mut Self::Handle, src: &[u8]) -> Result<(), DeviceStatus>;

    /// Copy the whole allocation into `dst`; lengths must match
    fn copy_device_to_host(&self, dst: &mut [u8], src: &Self::Handle) -> Result<(), DeviceStatus>;

    fn free(&self, handle: Self::Handle) -> Result<(), DeviceStatus>;

    /// Pending deferred failure, `Success` if none
    fn last_error(&self) -> DeviceStatus;
}

/// Backend kind used for device selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceBackend {
    /// Host-emulated device memory
    #[default]
    Host,
    /// WGPU (Metal/Vulkan/DirectX)
    Wgpu,
    /// CUDA (NVIDIA only)
    Cuda,
}

impl fmt::Display for DeviceBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceBackend::Host => write!(f, "host"),
            DeviceBackend::Wgpu => write!(f, "wgpu"),
            DeviceBackend::Cuda => write!(f, "cuda"),
        }
    }
}

impl FromStr for DeviceBackend {
    type Err = DeviceStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "host" | "cpu" => Ok(DeviceBackend::Host),
            "wgpu" | "gpu" => Ok(DeviceBackend::Wgpu),
            "cuda" => Ok(DeviceBackend::Cuda),
            other => Err(DeviceStatus::Unavailable(format!("unknown device backend '{}'", other))),
        }
    }
}

/// Device selection passed from the application layer
///
/// Kept independent of the configuration crate; callers convert their
/// settings into this struct.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceConfig {
    pub backend: DeviceBackend,
    /// Adapter/ordinal for GPU backends
    pub device_index: usize,
    /// Byte budget for the host backend
    pub memory_limit_bytes: Option<usize>,
}

/// Any of the compiled-in backends
#[derive(Clone)]
pub enum AnyDevice {
    Host(HostDevice),
    #[cfg(feature = "gpu")]
    Wgpu(WgpuDevice),
    #[cfg(feature = "cuda")]
    Cuda(CudaMemory),
}

/// Handle of an [`AnyDevice`] allocation
pub enum AnyHandle {
    Host(HostHandle),
    #[cfg(feature = "gpu")]
    Wgpu(WgpuHandle),
    #[cfg(feature = "cuda")]
    Cuda(<CudaMemory as DeviceMemory>::Handle),
}

impl fmt::Debug for AnyDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AnyDevice").field(&self.name()).finish()
    }
}

impl DeviceMemory for AnyDevice {
    type Handle = AnyHandle;

    fn name(&self) -> &str {
        match self {
            AnyDevice::Host(device) => device.name(),
            #[cfg(feature = "gpu")]
            AnyDevice::Wgpu(device) => device.name(),
            #[cfg(feature = "cuda")]
            AnyDevice::Cuda(device) => device.name(),
        }
    }

    fn allocate(&self, byte_count: usize) -> Result<AnyHandle, DeviceStatus> {
        match self {
            AnyDevice::Host(device) => device.allocate(byte_count).map(AnyHandle::Host),
            #[cfg(feature = "gpu")]
            AnyDevice::Wgpu(device) => device.allocate(byte_count).map(AnyHandle::Wgpu),
            #[cfg(feature = "cuda")]
            AnyDevice::Cuda(device) => device.allocate(byte_count).map(AnyHandle::Cuda),
        }
    }

    #[allow(unreachable_patterns)]
    fn copy_host_to_device(&self, dst: &mut AnyHandle, src: &[u8]) -> Result<(), DeviceStatus> {
        match (self, dst) {
            (AnyDevice::Host(device), AnyHandle::Host(handle)) => {
                device.copy_host_to_device(handle, src)
            }
            #[cfg(feature = "gpu")]
            (AnyDevice::Wgpu(device), AnyHandle::Wgpu(handle)) => {
                device.copy_host_to_device(handle, src)
            }
            #[cfg(feature = "cuda")]
            (AnyDevice::Cuda(device), AnyHandle::Cuda(handle)) => {
                device.copy_host_to_device(handle, src)
            }
            _ => Err(DeviceStatus::InvalidHandle),
        }
    }

    #[allow(unreachable_patterns)]
    fn copy_device_to_host(&self, dst: &mut [u8], src: &AnyHandle) -> Result<(), DeviceStatus> {
        match (self, src) {
            (AnyDevice::Host(device), AnyHandle::Host(handle)) => {
                device.copy_device_to_host(dst, handle)
            }
            #[cfg(feature = "gpu")]
            (AnyDevice::Wgpu(device), AnyHandle::Wgpu(handle)) => {
                device.copy_device_to_host(dst, handle)
            }
            #[cfg(feature = "cuda")]
            (AnyDevice::Cuda(device), AnyHandle::Cuda(handle)) => {
                device.copy_device_to_host(dst, handle)
            }
            _ => Err(DeviceStatus::InvalidHandle),
        }
    }

    #[allow(unreachable_patterns)]
    fn free(&self, handle: AnyHandle) -> Result<(), DeviceStatus> {
        match (self, handle) {
            (AnyDevice::Host(device), AnyHandle::Host(handle)) => device.free(handle),
            #[cfg(feature = "gpu")]
            (AnyDevice::Wgpu(device), AnyHandle::Wgpu(handle)) => device.free(handle),
            #[cfg(feature = "cuda")]
            (AnyDevice::Cuda(device), AnyHandle::Cuda(handle)) => device.free(handle),
            _ => Err(DeviceStatus::InvalidHandle),
        }
    }

    fn last_error(&self) -> DeviceStatus {
        match self {
            AnyDevice::Host(device) => device.last_error(),
            #[cfg(feature = "gpu")]
            AnyDevice::Wgpu(device) => device.last_error(),
            #[cfg(feature = "cuda")]
            AnyDevice::Cuda(device) => device.last_error(),
        }
    }
}

/// Create the configured backend
///
/// Requesting a backend that was not compiled in fails with `Unavailable`.
pub fn select_device(config: &DeviceConfig) -> Result<AnyDevice, DeviceStatus> {
    let device = match config.backend {
        DeviceBackend::Host => {
            let device = match config.memory_limit_bytes {
                Some(limit) => HostDevice::with_memory_limit(limit),
                None => HostDevice::new(),
            };
            AnyDevice::Host(device)
        }
        #[cfg(feature = "gpu")]
        DeviceBackend::Wgpu => AnyDevice::Wgpu(WgpuDevice::new(config.device_index)?),
        #[cfg(not(feature = "gpu"))]
        DeviceBackend::Wgpu => {
            return Err(DeviceStatus::Unavailable(
                "built without the `gpu` feature".to_string(),
            ))
        }
        #[cfg(feature = "cuda")]
        DeviceBackend::Cuda => AnyDevice::Cuda(CudaMemory::new(config.device_index)?),
        #[cfg(not(feature = "cuda"))]
        DeviceBackend::Cuda => {
            return Err(DeviceStatus::Unavailable(
                "built without the `cuda` feature".to_string(),
            ))
        }
    };

    info!(backend = %config.backend, device = device.name(), "selected device");
    Ok(device)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str() {
        assert_eq!("CPU".parse::<DeviceBackend>().unwrap(), DeviceBackend::Host);
        assert_eq!("gpu".parse::<DeviceBackend>().unwrap(), DeviceBackend::Wgpu);
        assert_eq!("cuda".parse::<DeviceBackend>().unwrap(), DeviceBackend::Cuda);
        assert!("tpu".parse::<DeviceBackend>().is_err());
    }

    #[test]
    fn test_select_host_device() {
        let config = DeviceConfig {
            memory_limit_bytes: Some(64),
            ..Default::default()
        };
        let device = select_device(&config).unwrap();
        assert!(matches!(device, AnyDevice::Host(_)));

        let mut handle = device.allocate(16).unwrap();
        device.copy_host_to_device(&mut handle, &[7u8; 16]).unwrap();
        let mut out = [0u8; 16];
        device.copy_device_to_host(&mut out, &handle).unwrap();
        assert_eq!(out, [7u8; 16]);
        device.free(handle).unwrap();

        assert!(matches!(
            device.allocate(65),
            Err(DeviceStatus::OutOfMemory { requested: 65, .. })
        ));
    }

    #[cfg(not(feature = "cuda"))]
    #[test]
    fn test_select_missing_backend() {
        let config = DeviceConfig {
            backend: DeviceBackend::Cuda,
            ..Default::default()
        };
        assert!(matches!(select_device(&config), Err(DeviceStatus::Unavailable(_))));
    }
}
