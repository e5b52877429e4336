// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for device memory and mirrors

use core::fmt;

use synmat_sparse::SparseError;

/// Result type for mirror operations
pub type MirrorResult<T> = Result<T, MirrorError>;

/// Status reported by a device memory implementation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceStatus {
    #[error("success")]
    Success,

    #[error("out of device memory: requested {requested} bytes, {available} available")]
    OutOfMemory { requested: usize, available: usize },

    #[error("invalid device handle")]
    InvalidHandle,

    #[error("transfer size mismatch: buffer holds {expected} bytes, host side has {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("device unavailable: {0}")]
    Unavailable(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl DeviceStatus {
    /// Numeric status code, 0 on success
    pub fn code(&self) -> i32 {
        match self {
            DeviceStatus::Success => 0,
            DeviceStatus::OutOfMemory { .. } => 2,
            DeviceStatus::InvalidHandle => 3,
            DeviceStatus::SizeMismatch { .. } => 4,
            DeviceStatus::Unavailable(_) => 5,
            DeviceStatus::Backend(_) => 99,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DeviceStatus::Success)
    }
}

/// Copy direction between host and device memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferDirection {
    HostToDevice,
    DeviceToHost,
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferDirection::HostToDevice => write!(f, "host->device"),
            TransferDirection::DeviceToHost => write!(f, "device->host"),
        }
    }
}

/// Device call that produced a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceOperation {
    Allocate,
    Copy(TransferDirection),
    Free,
    /// Deferred status check after a batch of calls
    Synchronize,
}

impl fmt::Display for DeviceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceOperation::Allocate => write!(f, "allocate"),
            DeviceOperation::Copy(direction) => write!(f, "copy {}", direction),
            DeviceOperation::Free => write!(f, "free"),
            DeviceOperation::Synchronize => write!(f, "synchronize"),
        }
    }
}

/// Errors raised by a device mirror
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MirrorError {
    /// The device memory interface reported a failure
    #[error(
        "Device error during {operation} of '{array}': {status} (code {code})",
        code = .status.code()
    )]
    Device {
        operation: DeviceOperation,
        array: &'static str,
        status: DeviceStatus,
    },

    #[error(transparent)]
    Sparse(#[from] SparseError),
}

impl MirrorError {
    pub(crate) fn device(
        operation: DeviceOperation,
        array: &'static str,
        status: DeviceStatus,
    ) -> Self {
        MirrorError::Device {
            operation,
            array,
            status,
        }
    }

    /// Transfer direction of a failed copy, if the failure was a copy
    pub fn direction(&self) -> Option<TransferDirection> {
        match self {
            MirrorError::Device {
                operation: DeviceOperation::Copy(direction),
                ..
            } => Some(*direction),
            _ => None,
        }
    }

    /// Underlying device status, if this is a device failure
    pub fn status(&self) -> Option<&DeviceStatus> {
        match self {
            MirrorError::Device { status, .. } => Some(status),
            MirrorError::Sparse(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(DeviceStatus::Success.code(), 0);
        assert!(DeviceStatus::Success.is_success());
        assert!(!DeviceStatus::InvalidHandle.is_success());
        assert_ne!(
            DeviceStatus::Backend("x".into()).code(),
            DeviceStatus::Unavailable("x".into()).code()
        );
    }

    #[test]
    fn test_mirror_error_message() {
        let err = MirrorError::device(
            DeviceOperation::Copy(TransferDirection::HostToDevice),
            "row_ptr",
            DeviceStatus::SizeMismatch { expected: 8, actual: 4 },
        );
        assert_eq!(
            err.to_string(),
            "Device error during copy host->device of 'row_ptr': transfer size mismatch: \
             buffer holds 8 bytes, host side has 4 (code 4)"
        );
        assert_eq!(err.direction(), Some(TransferDirection::HostToDevice));
    }

    #[test]
    fn test_sparse_errors_convert() {
        let err: MirrorError = SparseError::EntryNotFound { row: 1, column: 2 }.into();
        assert!(err.status().is_none());
        assert_eq!(err.to_string(), "No entry stored at row 1, column 2");
    }
}
