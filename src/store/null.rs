//! The null byte store (spec §4.3, §6): a zero-capacity immortal singleton
//! every memory operation against which fails with
//! [`BufferError::Unsupported`]. Its reference-count operations are no-ops
//! that always succeed, since spec's `NullByteStore` is never actually
//! released in the ordinary sense — there is nothing behind it to release.

use crate::error::{BufferError, Result};
use crate::refcount::OwnerToken;
use crate::store::{AtomicPrimitives, ByteStore, RandomInput, RandomOutput, UncheckedView};

/// The zero-capacity sentinel store (spec's `NullByteStore::INSTANCE`).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStore;

impl NullStore {
    /// The single instance; cheap to construct since it carries no state,
    /// but exposed as a constant-like accessor to mirror the spec's
    /// singleton framing.
    pub const INSTANCE: NullStore = NullStore;
}

impl RandomInput for NullStore {
    fn read_u8(&self, _offset: usize) -> Result<u8> {
        Err(BufferError::Unsupported)
    }
    fn read_u8_volatile(&self, _offset: usize) -> Result<u8> {
        Err(BufferError::Unsupported)
    }
    fn read_u16(&self, _offset: usize) -> Result<u16> {
        Err(BufferError::Unsupported)
    }
    fn read_u16_volatile(&self, _offset: usize) -> Result<u16> {
        Err(BufferError::Unsupported)
    }
    fn read_u32(&self, _offset: usize) -> Result<u32> {
        Err(BufferError::Unsupported)
    }
    fn read_u32_volatile(&self, _offset: usize) -> Result<u32> {
        Err(BufferError::Unsupported)
    }
    fn read_u64(&self, _offset: usize) -> Result<u64> {
        Err(BufferError::Unsupported)
    }
    fn read_u64_volatile(&self, _offset: usize) -> Result<u64> {
        Err(BufferError::Unsupported)
    }
    fn read_int24(&self, _offset: usize) -> Result<i32> {
        Err(BufferError::Unsupported)
    }
    fn read_bytes(&self, _offset: usize, dst: &mut [u8]) -> Result<i64> {
        if dst.is_empty() {
            Ok(-1)
        } else {
            Err(BufferError::Unsupported)
        }
    }
}

impl RandomOutput for NullStore {
    fn write_u8(&self, _offset: usize, _value: u8) -> Result<()> {
        Err(BufferError::Unsupported)
    }
    fn write_u8_ordered(&self, _offset: usize, _value: u8) -> Result<()> {
        Err(BufferError::Unsupported)
    }
    fn write_u8_volatile(&self, _offset: usize, _value: u8) -> Result<()> {
        Err(BufferError::Unsupported)
    }
    fn write_u16(&self, _offset: usize, _value: u16) -> Result<()> {
        Err(BufferError::Unsupported)
    }
    fn write_u16_ordered(&self, _offset: usize, _value: u16) -> Result<()> {
        Err(BufferError::Unsupported)
    }
    fn write_u16_volatile(&self, _offset: usize, _value: u16) -> Result<()> {
        Err(BufferError::Unsupported)
    }
    fn write_u32(&self, _offset: usize, _value: u32) -> Result<()> {
        Err(BufferError::Unsupported)
    }
    fn write_u32_ordered(&self, _offset: usize, _value: u32) -> Result<()> {
        Err(BufferError::Unsupported)
    }
    fn write_u32_volatile(&self, _offset: usize, _value: u32) -> Result<()> {
        Err(BufferError::Unsupported)
    }
    fn write_u64(&self, _offset: usize, _value: u64) -> Result<()> {
        Err(BufferError::Unsupported)
    }
    fn write_u64_ordered(&self, _offset: usize, _value: u64) -> Result<()> {
        Err(BufferError::Unsupported)
    }
    fn write_u64_volatile(&self, _offset: usize, _value: u64) -> Result<()> {
        Err(BufferError::Unsupported)
    }
    fn write_bytes(&self, _offset: usize, src: &[u8]) -> Result<()> {
        if src.is_empty() {
            Ok(())
        } else {
            Err(BufferError::Unsupported)
        }
    }
}

impl AtomicPrimitives for NullStore {
    fn compare_and_swap_i32(&self, _offset: usize, _expected: i32, _new: i32) -> Result<bool> {
        Err(BufferError::Unsupported)
    }
    fn compare_and_swap_i64(&self, _offset: usize, _expected: i64, _new: i64) -> Result<bool> {
        Err(BufferError::Unsupported)
    }
    fn test_and_set_i32(&self, _offset: usize, _expected: i32, _new: i32) -> Result<()> {
        Err(BufferError::Unsupported)
    }
    fn test_and_set_i64(&self, _offset: usize, _expected: i64, _new: i64) -> Result<()> {
        Err(BufferError::Unsupported)
    }
    fn add_and_get_i32(&self, _offset: usize, _diff: i32) -> Result<i32> {
        Err(BufferError::Unsupported)
    }
    fn add_and_get_i64(&self, _offset: usize, _diff: i64) -> Result<i64> {
        Err(BufferError::Unsupported)
    }
}

impl ByteStore for NullStore {
    fn size(&self) -> usize {
        0
    }

    fn is_native(&self) -> bool {
        false
    }

    fn is_heap(&self) -> bool {
        false
    }

    fn is_released(&self) -> bool {
        false
    }

    fn ref_count(&self) -> usize {
        0
    }

    fn reserve(&self, _owner: OwnerToken) -> Result<()> {
        Ok(())
    }

    fn try_reserve(&self, _owner: OwnerToken) -> bool {
        true
    }

    fn release(&self, _owner: OwnerToken) {}

    fn release_last(&self, _owner: OwnerToken) {}

    fn address_for_read(&self, _offset: usize) -> Result<*const u8> {
        Err(BufferError::Unsupported)
    }

    fn address_for_write(&self, _offset: usize) -> Result<*mut u8> {
        Err(BufferError::Unsupported)
    }

    fn move_within(&self, _from: usize, _to: usize, len: usize) -> Result<()> {
        if len == 0 {
            Ok(())
        } else {
            Err(BufferError::Unsupported)
        }
    }

    fn zero_out(&self, begin: usize, end: usize) -> Result<()> {
        if begin == end {
            Ok(())
        } else {
            Err(BufferError::Unsupported)
        }
    }

    fn native_read(&self, _offset: usize, _raw: *mut u8, len: usize) -> Result<()> {
        if len == 0 {
            Ok(())
        } else {
            Err(BufferError::Unsupported)
        }
    }

    fn native_write(&self, _raw: *const u8, _offset: usize, len: usize) -> Result<()> {
        if len == 0 {
            Ok(())
        } else {
            Err(BufferError::Unsupported)
        }
    }

    fn copy_to(&self, _dst: &dyn ByteStore) -> Result<()> {
        Ok(())
    }

    fn unchecked_view(&self) -> Option<UncheckedView<'_>> {
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn null_store_is_zero_sized_and_unsupported() {
        let n = NullStore::INSTANCE;
        assert_eq!(n.size(), 0);
        assert_eq!(n.read_u8(0), Err(BufferError::Unsupported));
        assert_eq!(n.write_u8(0, 1), Err(BufferError::Unsupported));
    }

    #[test]
    fn null_store_refcount_ops_are_inert() {
        let n = NullStore::INSTANCE;
        let owner = OwnerToken::new();
        assert!(n.reserve(owner).is_ok());
        n.release(owner);
        assert!(!n.is_released());
    }

    #[test]
    fn zero_length_bulk_ops_succeed() {
        let n = NullStore::INSTANCE;
        assert_eq!(n.read_bytes(0, &mut []), Ok(-1));
        assert!(n.write_bytes(0, &[]).is_ok());
        assert!(n.move_within(0, 0, 0).is_ok());
        assert!(n.zero_out(5, 5).is_ok());
    }
}
