// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Device mirror of a CSR or CSRC store.

The mirror owns the host store and one device buffer per structural array.
It is synchronised only by explicit calls: every rebuild through the mirror
re-uploads the structure, and variables are copied on request.

Structural arrays by name:

| name       | host array   | width |
|------------|--------------|-------|
| `post_rank`| `post_ranks` | `I`   |
| `row_ptr`  | `row_begin`  | `P`   |
| `pre_rank` | `col_idx`    | `I`   |
| `col_ptr`  | `col_ptr`    | `P`   | (CSRC)
| `row_idx`  | `row_idx`    | `I`   | (CSRC)
| `inv_idx`  | `inv_idx`    | `P`   | (CSRC)
*/

use bytemuck::Pod;
use rand::Rng;
use tracing::debug;

use synmat_sparse::{
    build_fixed_count, build_fixed_probability, CsrMatrix, CsrcMatrix, FormatKind,
    SparseConnectivity, SparseError, SparseIndex, SparseResult,
};

use crate::backend::DeviceMemory;
use crate::buffer::{DeviceArray, DeviceBuffer};
use crate::error::{DeviceOperation, MirrorError, MirrorResult};

/// Host store that can be mirrored to a device
pub trait MirrorFormat {
    type Index: SparseIndex;
    type Pointer: SparseIndex;

    const FORMAT: FormatKind;

    /// Row-wise view used for variable layout
    fn forward(&self) -> &CsrMatrix<Self::Index, Self::Pointer>;

    /// Structural arrays to upload, as `(name, bytes)`
    fn structure(&self) -> Vec<(&'static str, &[u8])>;

    /// Build a store of the same shape holding a new structure; `self` is untouched
    fn rebuilt(
        &self,
        row_indices: &[Self::Index],
        column_lists: &[Vec<Self::Index>],
    ) -> SparseResult<Self>
    where
        Self: Sized;
}

impl<I: SparseIndex, P: SparseIndex> MirrorFormat for CsrMatrix<I, P> {
    type Index = I;
    type Pointer = P;

    const FORMAT: FormatKind = FormatKind::Csr;

    fn forward(&self) -> &CsrMatrix<I, P> {
        self
    }

    fn structure(&self) -> Vec<(&'static str, &[u8])> {
        vec![
            ("post_rank", bytemuck::cast_slice(self.post_ranks())),
            ("row_ptr", bytemuck::cast_slice(self.row_begin())),
            ("pre_rank", bytemuck::cast_slice(self.col_idx())),
        ]
    }

    fn rebuilt(&self, row_indices: &[I], column_lists: &[Vec<I>]) -> SparseResult<Self> {
        let mut next = Self::new(self.num_rows(), self.num_columns())?;
        next.build(row_indices, column_lists)?;
        Ok(next)
    }
}

impl<I: SparseIndex, P: SparseIndex> MirrorFormat for CsrcMatrix<I, P> {
    type Index = I;
    type Pointer = P;

    const FORMAT: FormatKind = FormatKind::Csrc;

    fn forward(&self) -> &CsrMatrix<I, P> {
        CsrcMatrix::forward(self)
    }

    fn structure(&self) -> Vec<(&'static str, &[u8])> {
        let mut arrays = MirrorFormat::forward(self).structure();
        arrays.extend([
            ("col_ptr", bytemuck::cast_slice(self.col_ptr())),
            ("row_idx", bytemuck::cast_slice(self.row_idx())),
            ("inv_idx", bytemuck::cast_slice(self.inv_idx())),
        ]);
        arrays
    }

    fn rebuilt(&self, row_indices: &[I], column_lists: &[Vec<I>]) -> SparseResult<Self> {
        let mut next = Self::new(self.num_rows(), self.num_columns())?;
        next.build(row_indices, column_lists)?;
        Ok(next)
    }
}

/// Host store plus its device-resident structure
#[derive(Debug)]
pub struct DeviceMirror<D: DeviceMemory, M> {
    device: D,
    host: M,
    structure: Vec<DeviceBuffer<D>>,
}

/// CSR store mirrored to `D`
pub type CsrDeviceMirror<D, I = u32, P = u32> = DeviceMirror<D, CsrMatrix<I, P>>;

/// CSRC store mirrored to `D`
pub type CsrcDeviceMirror<D, I = u32, P = u32> = DeviceMirror<D, CsrcMatrix<I, P>>;

impl<D: DeviceMemory, M: MirrorFormat> DeviceMirror<D, M> {
    /// Take ownership of a built host store and upload its structure
    pub fn new(device: D, host: M) -> MirrorResult<Self> {
        let mut mirror = Self {
            device,
            host,
            structure: Vec::new(),
        };
        mirror.upload_structure()?;
        Ok(mirror)
    }

    pub fn host(&self) -> &M {
        &self.host
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Rebuild the host store and re-upload the structure
    ///
    /// The new store is built and uploaded before either side is replaced, so
    /// on any error the host and the device both keep the previous structure.
    pub fn rebuild(
        &mut self,
        row_indices: &[M::Index],
        column_lists: &[Vec<M::Index>],
    ) -> MirrorResult<()> {
        let next = self.host.rebuilt(row_indices, column_lists)?;
        let fresh = self.stage_structure(&next)?;
        self.host = next;
        self.commit_structure(fresh)
    }

    pub fn generate_fixed_count<R: Rng + ?Sized>(
        &mut self,
        post_ranks: &[M::Index],
        pre_ranks: &[M::Index],
        count: usize,
        rng: &mut R,
    ) -> MirrorResult<()> {
        let input = build_fixed_count(post_ranks, pre_ranks, count, rng)?;
        self.rebuild(&input.post_ranks, &input.pre_ranks)
    }

    pub fn generate_fixed_probability<R: Rng + ?Sized>(
        &mut self,
        post_ranks: &[M::Index],
        pre_ranks: &[M::Index],
        probability: f64,
        allow_self_connections: bool,
        rng: &mut R,
    ) -> MirrorResult<()> {
        let input = build_fixed_probability(
            post_ranks,
            pre_ranks,
            probability,
            allow_self_connections,
            rng,
        )?;
        self.rebuild(&input.post_ranks, &input.pre_ranks)
    }

    /// Upload every structural array of the current host state
    ///
    /// New buffers are allocated and filled before the previous ones are
    /// released. On failure the previous buffers stay in place.
    pub fn upload_structure(&mut self) -> MirrorResult<()> {
        let fresh = self.stage_structure(&self.host)?;
        self.commit_structure(fresh)
    }

    /// Allocate and fill device buffers for `host` without touching the mirror
    fn stage_structure(&self, host: &M) -> MirrorResult<Vec<DeviceBuffer<D>>> {
        let mut fresh = Vec::new();
        for (name, bytes) in host.structure() {
            fresh.push(DeviceBuffer::from_bytes(&self.device, name, bytes)?);
        }
        self.check_device("structure")?;
        Ok(fresh)
    }

    fn commit_structure(&mut self, fresh: Vec<DeviceBuffer<D>>) -> MirrorResult<()> {
        let previous = std::mem::replace(&mut self.structure, fresh);
        release_all(previous)?;

        debug!(
            format = M::FORMAT.as_str(),
            device = self.device.name(),
            arrays = self.structure.len(),
            bytes = self.device_bytes(),
            "uploaded structure"
        );
        Ok(())
    }

    /// Device buffer of a structural array
    pub fn structure_buffer(&self, name: &str) -> Option<&DeviceBuffer<D>> {
        self.structure.iter().find(|buffer| buffer.label() == name)
    }

    /// Names of the uploaded structural arrays, in upload order
    pub fn structure_names(&self) -> Vec<&'static str> {
        self.structure.iter().map(DeviceBuffer::label).collect()
    }

    /// Bytes held by structural buffers
    pub fn device_bytes(&self) -> usize {
        self.structure.iter().map(DeviceBuffer::byte_len).sum()
    }

    /// Read a structural array back as raw bytes
    pub fn download_structure(&self, name: &str) -> MirrorResult<Vec<u8>> {
        let buffer = self.structure_buffer(name).ok_or_else(|| {
            SparseError::InvalidArgument(format!("no structural array named '{}'", name))
        })?;
        let mut bytes = vec![0u8; buffer.byte_len()];
        buffer.read(&mut bytes)?;
        Ok(bytes)
    }

    // === Variables ===

    /// Copy a matrix variable (one value per entry) to the device
    pub fn upload_matrix_variable<T: Pod>(&self, values: &[T]) -> MirrorResult<DeviceArray<T, D>> {
        expect_len("matrix variable", self.host.forward().nnz(), values.len())?;
        let array = DeviceArray::upload(&self.device, "matrix_variable", values)?;
        self.check_device("matrix_variable")?;
        Ok(array)
    }

    /// Copy a vector variable (one value per non-empty row) to the device
    pub fn upload_vector_variable<T: Pod>(&self, values: &[T]) -> MirrorResult<DeviceArray<T, D>> {
        expect_len("vector variable", self.host.forward().row_count(), values.len())?;
        let array = DeviceArray::upload(&self.device, "vector_variable", values)?;
        self.check_device("vector_variable")?;
        Ok(array)
    }

    /// Copy a matrix variable back and split it per row, in `post_ranks` order
    pub fn download_matrix_variable_as_lil<T>(
        &self,
        array: &DeviceArray<T, D>,
    ) -> MirrorResult<Vec<Vec<T>>>
    where
        T: Pod + Send + Sync,
    {
        expect_len("matrix variable", self.host.forward().nnz(), array.len())?;
        let flat = array.download()?;
        self.check_device("matrix_variable")?;
        Ok(self.host.forward().get_matrix_variable_all(&flat)?)
    }

    /// Copy a vector variable back
    pub fn download_vector_variable<T: Pod>(
        &self,
        array: &DeviceArray<T, D>,
    ) -> MirrorResult<Vec<T>> {
        expect_len("vector variable", self.host.forward().row_count(), array.len())?;
        let values = array.download()?;
        self.check_device("vector_variable")?;
        Ok(values)
    }

    /// Free the structure, reporting the status, and hand back the host store
    pub fn release(self) -> MirrorResult<M> {
        let DeviceMirror { host, structure, .. } = self;
        release_all(structure)?;
        Ok(host)
    }

    fn check_device(&self, array: &'static str) -> MirrorResult<()> {
        let status = self.device.last_error();
        if status.is_success() {
            Ok(())
        } else {
            Err(MirrorError::device(DeviceOperation::Synchronize, array, status))
        }
    }
}

fn expect_len(context: &'static str, expected: usize, actual: usize) -> MirrorResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(SparseError::ConnectivityMismatch {
            context,
            expected,
            actual,
        }
        .into())
    }
}

/// Release every buffer, returning the first failure
fn release_all<D: DeviceMemory>(buffers: Vec<DeviceBuffer<D>>) -> MirrorResult<()> {
    let mut first_error = None;
    for buffer in buffers {
        if let Err(error) = buffer.release() {
            first_error.get_or_insert(error);
        }
    }
    first_error.map_or(Ok(()), Err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HostDevice;
    use crate::error::DeviceStatus;
    use synmat_sparse::ListInput;

    fn example() -> CsrMatrix {
        let input = ListInput::new(vec![0u32, 1, 3], vec![vec![1], vec![0, 2], vec![2]]).unwrap();
        CsrMatrix::from_lil(4, 3, &input).unwrap()
    }

    #[test]
    fn test_structure_matches_host() {
        let device = HostDevice::new();
        let mirror = CsrDeviceMirror::new(device.clone(), example()).unwrap();

        assert_eq!(mirror.structure_names(), vec!["post_rank", "row_ptr", "pre_rank"]);
        assert_eq!(device.live_allocations(), 3);

        let row_ptr: Vec<u32> = mirror
            .download_structure("row_ptr")
            .unwrap()
            .chunks_exact(4)
            .map(|b| u32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        assert_eq!(row_ptr, vec![0, 1, 3, 3, 4]);
        assert!(mirror.download_structure("col_ptr").is_err());
    }

    #[test]
    fn test_deferred_error_keeps_previous_structure() {
        let device = HostDevice::new();
        let mut mirror = CsrDeviceMirror::new(device.clone(), example()).unwrap();

        device.set_deferred_error(DeviceStatus::Backend("ecc".into()));
        let err = mirror.upload_structure().unwrap_err();
        assert!(matches!(
            err,
            MirrorError::Device {
                operation: DeviceOperation::Synchronize,
                ..
            }
        ));
        // new buffers were dropped, old ones kept
        assert_eq!(device.live_allocations(), 3);
        assert_eq!(mirror.structure_names().len(), 3);
    }

    #[test]
    fn test_release_returns_host() {
        let device = HostDevice::new();
        let mirror = CsrDeviceMirror::new(device.clone(), example()).unwrap();
        let host = mirror.release().unwrap();
        assert_eq!(host.nnz(), 4);
        assert_eq!(device.live_allocations(), 0);
    }
}
