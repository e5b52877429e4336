// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Device Mirrors for Sparse Connectivity
//!
//! Replicates CSR/CSRC structure into device memory and moves variables
//! between host and device on explicit request.
//!
//! ## Design
//! - **No implicit sync**: the device copy is as current as the last upload
//! - **Scoped ownership**: every allocation is a [`DeviceBuffer`] freed on drop
//! - **Loud failures**: device status is checked after every batch of calls and
//!   surfaces as [`MirrorError::Device`]
//!
//! ## Usage
//!
//! ```rust
//! use synmat_device::{CsrDeviceMirror, HostDevice};
//! use synmat_sparse::{CsrMatrix, ListInput};
//!
//! let input = ListInput::new(vec![0u32, 2], vec![vec![1, 2], vec![0]])?;
//! let host: CsrMatrix = CsrMatrix::from_lil(3, 3, &input)?;
//!
//! let mirror = CsrDeviceMirror::new(HostDevice::new(), host)?;
//! let weights = mirror.upload_matrix_variable(&[0.1f32, 0.2, 0.3])?;
//! assert_eq!(
//!     mirror.download_matrix_variable_as_lil(&weights)?,
//!     vec![vec![0.1, 0.2], vec![0.3]]
//! );
//! # Ok::<(), synmat_device::MirrorError>(())
//! ```

pub mod backend;
pub mod buffer;
pub mod error;
pub mod mirror;

pub use backend::{
    select_device, AnyDevice, AnyHandle, DeviceBackend, DeviceConfig, DeviceMemory, HostDevice,
    HostHandle,
};
#[cfg(feature = "cuda")]
pub use backend::{is_cuda_available, CudaMemory};
#[cfg(feature = "gpu")]
pub use backend::{WgpuDevice, WgpuHandle};
pub use buffer::{DeviceArray, DeviceBuffer};
pub use error::{DeviceOperation, DeviceStatus, MirrorError, MirrorResult, TransferDirection};
pub use mirror::{CsrDeviceMirror, CsrcDeviceMirror, DeviceMirror, MirrorFormat};
