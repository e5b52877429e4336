// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Index types for sparse storage
//!
//! Stores are generic over two integer widths:
//! - `I` for ranks and per-entry column/row indices (the large arrays)
//! - `P` for cumulative offsets (`row_begin`, `col_ptr`, `inv_idx`)
//!
//! Keeping them independent allows e.g. `u16` column indices with `u64`
//! offsets for very large projections.

use core::fmt::{Debug, Display};
use core::hash::Hash;

use crate::error::{SparseError, SparseResult};

/// Unsigned integer usable as a sparse index or offset
pub trait SparseIndex:
    bytemuck::Pod + Copy + Default + Ord + Hash + Debug + Display + Send + Sync + 'static
{
    /// Type name used in error messages and diagnostics
    const TYPE_NAME: &'static str;

    /// Largest value representable, saturated to `usize`
    const MAX_USIZE: usize;

    /// Convert from `usize`, failing with `IndexOverflow` if the value does not fit
    fn try_from_usize(value: usize) -> SparseResult<Self>;

    /// Widen to `usize`
    fn as_usize(self) -> usize;
}

macro_rules! impl_sparse_index {
    ($($ty:ty),*) => {
        $(
            impl SparseIndex for $ty {
                const TYPE_NAME: &'static str = stringify!($ty);

                const MAX_USIZE: usize = if (<$ty>::MAX as u128) > (usize::MAX as u128) {
                    usize::MAX
                } else {
                    <$ty>::MAX as usize
                };

                #[inline]
                fn try_from_usize(value: usize) -> SparseResult<Self> {
                    <$ty>::try_from(value).map_err(|_| SparseError::IndexOverflow {
                        value,
                        type_name: Self::TYPE_NAME,
                    })
                }

                #[inline]
                fn as_usize(self) -> usize {
                    self as usize
                }
            }
        )*
    };
}

impl_sparse_index!(u8, u16, u32, u64, usize);

/// Checks that every value in `0..count` is representable by `T`
pub(crate) fn ensure_capacity<T: SparseIndex>(count: usize) -> SparseResult<()> {
    if count == 0 || count - 1 <= T::MAX_USIZE {
        Ok(())
    } else {
        Err(SparseError::IndexOverflow {
            value: count - 1,
            type_name: T::TYPE_NAME,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_roundtrip() {
        assert_eq!(u8::try_from_usize(255).unwrap(), 255u8);
        assert_eq!(u16::try_from_usize(1000).unwrap().as_usize(), 1000);
        assert_eq!(u64::try_from_usize(7).unwrap().as_usize(), 7);
    }

    #[test]
    fn test_overflow_is_reported() {
        let err = u8::try_from_usize(256).unwrap_err();
        assert_eq!(
            err,
            SparseError::IndexOverflow {
                value: 256,
                type_name: "u8"
            }
        );
    }

    #[test]
    fn test_capacity() {
        assert!(ensure_capacity::<u8>(0).is_ok());
        assert!(ensure_capacity::<u8>(256).is_ok());
        assert!(ensure_capacity::<u8>(257).is_err());
        assert_eq!(<u16 as SparseIndex>::MAX_USIZE, 65_535);
    }
}
