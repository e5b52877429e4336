// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Device memory emulated in host RAM
//!
//! Behaves like a discrete device: allocations live in a separate slab and
//! are only reachable through copies. Keeps live allocation counters so that
//! leaks show up in tests.

use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::Mutex;
use tracing::trace;

use super::DeviceMemory;
use crate::error::DeviceStatus;

/// Allocation in a [`HostDevice`]
#[derive(Debug)]
pub struct HostHandle {
    id: u64,
    byte_len: usize,
}

impl HostHandle {
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }
}

#[derive(Debug, Default)]
struct HostMemory {
    slab: AHashMap<u64, Vec<u8>>,
    next_id: u64,
    limit: Option<usize>,
    bytes_in_use: usize,
    peak_bytes: usize,
    total_allocations: u64,
    deferred: Option<DeviceStatus>,
}

/// Host-emulated device; clones share the same memory
#[derive(Debug, Clone, Default)]
pub struct HostDevice {
    memory: Arc<Mutex<HostMemory>>,
}

impl HostDevice {
    /// Unlimited device memory
    pub fn new() -> Self {
        Self::default()
    }

    /// Device memory capped at `limit` bytes
    pub fn with_memory_limit(limit: usize) -> Self {
        let device = Self::default();
        device.memory.lock().limit = Some(limit);
        device
    }

    /// Allocations not yet freed
    pub fn live_allocations(&self) -> usize {
        self.memory.lock().slab.len()
    }

    /// Bytes held by live allocations
    pub fn bytes_in_use(&self) -> usize {
        self.memory.lock().bytes_in_use
    }

    /// High-water mark of `bytes_in_use`
    pub fn peak_bytes(&self) -> usize {
        self.memory.lock().peak_bytes
    }

    /// Allocations made since creation
    pub fn total_allocations(&self) -> u64 {
        self.memory.lock().total_allocations
    }

    /// Queue a failure for the next `last_error` call
    ///
    /// Emulates errors a real device only reports after the fact.
    pub fn set_deferred_error(&self, status: DeviceStatus) {
        self.memory.lock().deferred = Some(status);
    }
}

impl DeviceMemory for HostDevice {
    type Handle = HostHandle;

    fn name(&self) -> &str {
        "host"
    }

    fn allocate(&self, byte_count: usize) -> Result<HostHandle, DeviceStatus> {
        let mut memory = self.memory.lock();

        if let Some(limit) = memory.limit {
            let available = limit.saturating_sub(memory.bytes_in_use);
            if byte_count > available {
                return Err(DeviceStatus::OutOfMemory {
                    requested: byte_count,
                    available,
                });
            }
        }

        let id = memory.next_id;
        memory.next_id += 1;
        memory.slab.insert(id, vec![0u8; byte_count]);
        memory.bytes_in_use += byte_count;
        memory.peak_bytes = memory.peak_bytes.max(memory.bytes_in_use);
        memory.total_allocations += 1;

        trace!(id, bytes = byte_count, "host device allocation");
        Ok(HostHandle {
            id,
            byte_len: byte_count,
        })
    }

    fn copy_host_to_device(&self, dst: &mut HostHandle, src: &[u8]) -> Result<(), DeviceStatus> {
        let mut memory = self.memory.lock();
        let slot = memory.slab.get_mut(&dst.id).ok_or(DeviceStatus::InvalidHandle)?;
        if slot.len() != src.len() {
            return Err(DeviceStatus::SizeMismatch {
                expected: slot.len(),
                actual: src.len(),
            });
        }
        slot.copy_from_slice(src);
        Ok(())
    }

    fn copy_device_to_host(&self, dst: &mut [u8], src: &HostHandle) -> Result<(), DeviceStatus> {
        let memory = self.memory.lock();
        let slot = memory.slab.get(&src.id).ok_or(DeviceStatus::InvalidHandle)?;
        if slot.len() != dst.len() {
            return Err(DeviceStatus::SizeMismatch {
                expected: slot.len(),
                actual: dst.len(),
            });
        }
        dst.copy_from_slice(slot);
        Ok(())
    }

    fn free(&self, handle: HostHandle) -> Result<(), DeviceStatus> {
        let mut memory = self.memory.lock();
        let slot = memory.slab.remove(&handle.id).ok_or(DeviceStatus::InvalidHandle)?;
        memory.bytes_in_use -= slot.len();
        Ok(())
    }

    fn last_error(&self) -> DeviceStatus {
        self.memory.lock().deferred.take().unwrap_or(DeviceStatus::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_accounting() {
        let device = HostDevice::new();
        let a = device.allocate(100).unwrap();
        let b = device.allocate(28).unwrap();
        assert_eq!(device.live_allocations(), 2);
        assert_eq!(device.bytes_in_use(), 128);

        device.free(a).unwrap();
        assert_eq!(device.bytes_in_use(), 28);
        assert_eq!(device.peak_bytes(), 128);

        device.free(b).unwrap();
        assert_eq!(device.live_allocations(), 0);
        assert_eq!(device.total_allocations(), 2);
    }

    #[test]
    fn test_clones_share_memory() {
        let device = HostDevice::new();
        let clone = device.clone();
        let mut handle = clone.allocate(4).unwrap();
        device.copy_host_to_device(&mut handle, &[1, 2, 3, 4]).unwrap();

        let mut out = [0u8; 4];
        clone.copy_device_to_host(&mut out, &handle).unwrap();
        assert_eq!(out, [1, 2, 3, 4]);
        assert_eq!(device.live_allocations(), 1);
        clone.free(handle).unwrap();
    }

    #[test]
    fn test_size_mismatch() {
        let device = HostDevice::new();
        let mut handle = device.allocate(8).unwrap();
        assert_eq!(
            device.copy_host_to_device(&mut handle, &[0u8; 4]),
            Err(DeviceStatus::SizeMismatch { expected: 8, actual: 4 })
        );
        device.free(handle).unwrap();
    }

    #[test]
    fn test_handle_from_other_device_is_invalid() {
        let a = HostDevice::new();
        let b = HostDevice::new();
        let handle = a.allocate(4).unwrap();
        let mut out = [0u8; 4];
        // fresh device: id 0 was never allocated there
        assert_eq!(b.copy_device_to_host(&mut out, &handle), Err(DeviceStatus::InvalidHandle));
        a.free(handle).unwrap();
    }

    #[test]
    fn test_memory_limit_and_deferred_error() {
        let device = HostDevice::with_memory_limit(10);
        let handle = device.allocate(8).unwrap();
        assert_eq!(
            device.allocate(4).unwrap_err(),
            DeviceStatus::OutOfMemory { requested: 4, available: 2 }
        );
        device.free(handle).unwrap();

        assert!(device.last_error().is_success());
        device.set_deferred_error(DeviceStatus::Backend("lost".into()));
        assert_eq!(device.last_error(), DeviceStatus::Backend("lost".into()));
        assert!(device.last_error().is_success());
    }
}
