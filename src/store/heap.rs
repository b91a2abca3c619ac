//! The on-heap byte-store variant (spec §4.3).
//!
//! Backed by a boxed byte slice, the Rust analogue of "a primitive byte
//! array or the array underlying a non-direct buffer" that spec describes.
//! There is no Java-style `(hostObject, objectOffset)` pair to thread
//! through: the base pointer is taken straight from the `Box<[u8]>`, exactly
//! as the teacher's ring buffer takes its base pointer from a borrowed
//! slice (`self.buf.as_ptr().cast_mut().cast()` in `ring_buffer.rs`).
//! Mutation then goes through raw pointers under the single-writer
//! discipline spec §5 requires, not through `&mut` borrows, since multiple
//! cursors may hold reservations on the same store concurrently.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::error::{BufferError, Result};
use crate::memory;
use crate::refcount::{OwnerToken, RefCount};
use crate::store::{check_bounds, AtomicPrimitives, ByteStore, RandomInput, RandomOutput, UncheckedView};

/// A fixed-capacity store backed by heap-allocated memory.
pub struct HeapStore {
    data: Box<[u8]>,
    refs: RefCount,
    released: AtomicBool,
}

impl HeapStore {
    /// Wraps an existing byte vector as a fixed-capacity store, taking
    /// ownership of its backing allocation.
    pub fn wrap(data: Vec<u8>) -> Self {
        Self {
            data: data.into_boxed_slice(),
            refs: RefCount::new(),
            released: AtomicBool::new(false),
        }
    }

    /// Allocates a new store of `len` bytes, zero-initialized.
    pub fn fixed_capacity(len: usize) -> Self {
        Self::wrap(vec![0u8; len])
    }

    fn base_ptr(&self) -> *mut u8 {
        self.data.as_ptr().cast_mut()
    }

    fn ensure_live(&self) -> Result<()> {
        if self.released.load(Ordering::Acquire) {
            Err(BufferError::Released)
        } else {
            Ok(())
        }
    }
}

impl RandomInput for HeapStore {
    fn read_u8(&self, offset: usize) -> Result<u8> {
        self.ensure_live()?;
        check_bounds(offset, 1, self.data.len())?;
        // SAFETY: bounds checked above, pointer derived from `self.data`.
        Ok(unsafe { memory::read_u8(self.base_ptr().add(offset)) })
    }

    fn read_u8_volatile(&self, offset: usize) -> Result<u8> {
        self.ensure_live()?;
        check_bounds(offset, 1, self.data.len())?;
        // SAFETY: bounds checked above.
        Ok(unsafe { memory::atomic_u8::load_volatile(self.base_ptr().add(offset)) })
    }

    fn read_u16(&self, offset: usize) -> Result<u16> {
        self.ensure_live()?;
        check_bounds(offset, 2, self.data.len())?;
        // SAFETY: bounds checked above.
        Ok(unsafe { memory::read_u16(self.base_ptr().add(offset).cast()) })
    }

    fn read_u16_volatile(&self, offset: usize) -> Result<u16> {
        self.ensure_live()?;
        check_bounds(offset, 2, self.data.len())?;
        // SAFETY: bounds checked above.
        Ok(unsafe { memory::atomic_u16::load_volatile(self.base_ptr().add(offset).cast()) })
    }

    fn read_u32(&self, offset: usize) -> Result<u32> {
        self.ensure_live()?;
        check_bounds(offset, 4, self.data.len())?;
        // SAFETY: bounds checked above.
        Ok(unsafe { memory::read_u32(self.base_ptr().add(offset).cast()) })
    }

    fn read_u32_volatile(&self, offset: usize) -> Result<u32> {
        self.ensure_live()?;
        check_bounds(offset, 4, self.data.len())?;
        // SAFETY: bounds checked above.
        Ok(unsafe { memory::atomic_u32::load_volatile(self.base_ptr().add(offset).cast()) })
    }

    fn read_u64(&self, offset: usize) -> Result<u64> {
        self.ensure_live()?;
        check_bounds(offset, 8, self.data.len())?;
        // SAFETY: bounds checked above.
        Ok(unsafe { memory::read_u64(self.base_ptr().add(offset).cast()) })
    }

    fn read_u64_volatile(&self, offset: usize) -> Result<u64> {
        self.ensure_live()?;
        check_bounds(offset, 8, self.data.len())?;
        // SAFETY: bounds checked above.
        Ok(unsafe { memory::atomic_u64::load_volatile(self.base_ptr().add(offset).cast()) })
    }

    fn read_int24(&self, offset: usize) -> Result<i32> {
        self.ensure_live()?;
        check_bounds(offset, 3, self.data.len())?;
        // SAFETY: bounds checked above.
        Ok(unsafe { memory::read_int24(self.base_ptr().add(offset)) })
    }

    fn read_bytes(&self, offset: usize, dst: &mut [u8]) -> Result<i64> {
        self.ensure_live()?;
        if offset > self.data.len() {
            return Err(BufferError::BulkBounds {
                index: offset,
                low: 0,
                high: self.data.len(),
            });
        }
        let available = self.data.len() - offset;
        if available == 0 || dst.is_empty() {
            return Ok(-1);
        }
        let n = available.min(dst.len());
        // SAFETY: `offset + n <= self.data.len()` by construction above;
        // `dst[..n]` is a valid, non-overlapping destination.
        unsafe { memory::copy_bytes(self.base_ptr().add(offset), dst.as_mut_ptr(), n) };
        Ok(n as i64)
    }
}

impl RandomOutput for HeapStore {
    fn write_u8(&self, offset: usize, value: u8) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, 1, self.data.len())?;
        // SAFETY: bounds checked above.
        unsafe { memory::write_u8(self.base_ptr().add(offset), value) };
        Ok(())
    }

    fn write_u8_ordered(&self, offset: usize, value: u8) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, 1, self.data.len())?;
        // SAFETY: bounds checked above.
        unsafe { memory::atomic_u8::store_ordered(self.base_ptr().add(offset), value) };
        Ok(())
    }

    fn write_u8_volatile(&self, offset: usize, value: u8) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, 1, self.data.len())?;
        // SAFETY: bounds checked above.
        unsafe { memory::atomic_u8::store_volatile(self.base_ptr().add(offset), value) };
        Ok(())
    }

    fn write_u16(&self, offset: usize, value: u16) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, 2, self.data.len())?;
        // SAFETY: bounds checked above.
        unsafe { memory::write_u16(self.base_ptr().add(offset).cast(), value) };
        Ok(())
    }

    fn write_u16_ordered(&self, offset: usize, value: u16) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, 2, self.data.len())?;
        // SAFETY: bounds checked above.
        unsafe { memory::atomic_u16::store_ordered(self.base_ptr().add(offset).cast(), value) };
        Ok(())
    }

    fn write_u16_volatile(&self, offset: usize, value: u16) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, 2, self.data.len())?;
        // SAFETY: bounds checked above.
        unsafe { memory::atomic_u16::store_volatile(self.base_ptr().add(offset).cast(), value) };
        Ok(())
    }

    fn write_u32(&self, offset: usize, value: u32) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, 4, self.data.len())?;
        // SAFETY: bounds checked above.
        unsafe { memory::write_u32(self.base_ptr().add(offset).cast(), value) };
        Ok(())
    }

    fn write_u32_ordered(&self, offset: usize, value: u32) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, 4, self.data.len())?;
        // SAFETY: bounds checked above.
        unsafe { memory::atomic_u32::store_ordered(self.base_ptr().add(offset).cast(), value) };
        Ok(())
    }

    fn write_u32_volatile(&self, offset: usize, value: u32) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, 4, self.data.len())?;
        // SAFETY: bounds checked above.
        unsafe { memory::atomic_u32::store_volatile(self.base_ptr().add(offset).cast(), value) };
        Ok(())
    }

    fn write_u64(&self, offset: usize, value: u64) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, 8, self.data.len())?;
        // SAFETY: bounds checked above.
        unsafe { memory::write_u64(self.base_ptr().add(offset).cast(), value) };
        Ok(())
    }

    fn write_u64_ordered(&self, offset: usize, value: u64) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, 8, self.data.len())?;
        // SAFETY: bounds checked above.
        unsafe { memory::atomic_u64::store_ordered(self.base_ptr().add(offset).cast(), value) };
        Ok(())
    }

    fn write_u64_volatile(&self, offset: usize, value: u64) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, 8, self.data.len())?;
        // SAFETY: bounds checked above.
        unsafe { memory::atomic_u64::store_volatile(self.base_ptr().add(offset).cast(), value) };
        Ok(())
    }

    fn write_bytes(&self, offset: usize, src: &[u8]) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, src.len(), self.data.len())?;
        if src.is_empty() {
            return Ok(());
        }
        // SAFETY: bounds checked above; `src` and this store's heap
        // allocation are distinct, non-overlapping allocations.
        unsafe { memory::copy_bytes(src.as_ptr(), self.base_ptr().add(offset), src.len()) };
        Ok(())
    }
}

impl AtomicPrimitives for HeapStore {
    fn compare_and_swap_i32(&self, offset: usize, expected: i32, new: i32) -> Result<bool> {
        self.ensure_live()?;
        check_bounds(offset, 4, self.data.len())?;
        // SAFETY: bounds checked above.
        Ok(unsafe { memory::atomic_i32::compare_and_swap(self.base_ptr().add(offset).cast(), expected, new) })
    }

    fn compare_and_swap_i64(&self, offset: usize, expected: i64, new: i64) -> Result<bool> {
        self.ensure_live()?;
        check_bounds(offset, 8, self.data.len())?;
        // SAFETY: bounds checked above.
        Ok(unsafe { memory::atomic_i64::compare_and_swap(self.base_ptr().add(offset).cast(), expected, new) })
    }

    fn test_and_set_i32(&self, offset: usize, expected: i32, new: i32) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, 4, self.data.len())?;
        // SAFETY: bounds checked above.
        unsafe { memory::atomic_i32::test_and_set(self.base_ptr().add(offset).cast(), expected, new) };
        Ok(())
    }

    fn test_and_set_i64(&self, offset: usize, expected: i64, new: i64) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, 8, self.data.len())?;
        // SAFETY: bounds checked above.
        unsafe { memory::atomic_i64::test_and_set(self.base_ptr().add(offset).cast(), expected, new) };
        Ok(())
    }

    fn add_and_get_i32(&self, offset: usize, diff: i32) -> Result<i32> {
        self.ensure_live()?;
        check_bounds(offset, 4, self.data.len())?;
        // SAFETY: bounds checked above.
        Ok(unsafe { memory::atomic_i32::add_and_get(self.base_ptr().add(offset).cast(), diff) })
    }

    fn add_and_get_i64(&self, offset: usize, diff: i64) -> Result<i64> {
        self.ensure_live()?;
        check_bounds(offset, 8, self.data.len())?;
        // SAFETY: bounds checked above.
        Ok(unsafe { memory::atomic_i64::add_and_get(self.base_ptr().add(offset).cast(), diff) })
    }
}

impl ByteStore for HeapStore {
    fn size(&self) -> usize {
        self.data.len()
    }

    fn is_native(&self) -> bool {
        false
    }

    fn is_heap(&self) -> bool {
        true
    }

    fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    fn ref_count(&self) -> usize {
        self.refs.ref_count()
    }

    fn reserve(&self, owner: OwnerToken) -> Result<()> {
        self.refs.reserve(owner)
    }

    fn try_reserve(&self, owner: OwnerToken) -> bool {
        self.refs.try_reserve(owner)
    }

    fn release(&self, owner: OwnerToken) {
        if self.refs.release(owner) {
            // The heap allocation is reclaimed by `Box`'s own `Drop` once
            // this `HeapStore` itself is dropped; marking `released` here
            // just makes subsequent operations fail fast instead of racing
            // the final drop.
            self.released.store(true, Ordering::Release);
        }
    }

    fn release_last(&self, owner: OwnerToken) {
        self.refs.release_last(owner);
        self.released.store(true, Ordering::Release);
    }

    fn address_for_read(&self, _offset: usize) -> Result<*const u8> {
        Err(BufferError::Unsupported)
    }

    fn address_for_write(&self, _offset: usize) -> Result<*mut u8> {
        Err(BufferError::Unsupported)
    }

    fn move_within(&self, from: usize, to: usize, len: usize) -> Result<()> {
        self.ensure_live()?;
        check_bounds(from, len, self.data.len())?;
        check_bounds(to, len, self.data.len())?;
        if len == 0 {
            return Ok(());
        }
        // SAFETY: both ranges bounds-checked above; `move_bytes` tolerates
        // overlap.
        unsafe { memory::move_bytes(self.base_ptr().add(from), self.base_ptr().add(to), len) };
        Ok(())
    }

    fn zero_out(&self, begin: usize, end: usize) -> Result<()> {
        self.ensure_live()?;
        if begin > end {
            return Err(BufferError::InvalidArgument("zero_out: begin > end"));
        }
        check_bounds(begin, end - begin, self.data.len())?;
        // SAFETY: range checked above.
        unsafe { memory::set_bytes(self.base_ptr().add(begin), end - begin, 0) };
        Ok(())
    }

    fn native_read(&self, offset: usize, raw: *mut u8, len: usize) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, len, self.data.len())?;
        if len == 0 {
            return Ok(());
        }
        // SAFETY: offset range checked above; caller guarantees `raw` is
        // valid for `len` bytes per the trait's documented contract.
        unsafe { memory::copy_bytes(self.base_ptr().add(offset), raw, len) };
        Ok(())
    }

    fn native_write(&self, raw: *const u8, offset: usize, len: usize) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, len, self.data.len())?;
        if len == 0 {
            return Ok(());
        }
        // SAFETY: offset range checked above; caller guarantees `raw` is
        // valid for `len` bytes.
        unsafe { memory::copy_bytes(raw, self.base_ptr().add(offset), len) };
        Ok(())
    }

    fn unchecked_view(&self) -> Option<UncheckedView<'_>> {
        if self.is_released() {
            return None;
        }
        // SAFETY: `self.data` is valid for `self.data.len()` bytes for as
        // long as `self` (and thus this view's lifetime `'_`) is alive.
        Some(unsafe { UncheckedView::new(self.base_ptr(), self.data.len()) })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn read_write_roundtrip_all_widths() {
        let s = HeapStore::fixed_capacity(32);
        let owner = OwnerToken::new();
        s.reserve(owner).unwrap();

        s.write_u8(0, 0xAB).unwrap();
        assert_eq!(s.read_u8(0).unwrap(), 0xAB);

        s.write_u16(2, 0x1234).unwrap();
        assert_eq!(s.read_u16(2).unwrap(), 0x1234);

        s.write_u32(4, 0xDEAD_BEEF).unwrap();
        assert_eq!(s.read_u32(4).unwrap(), 0xDEAD_BEEF);

        s.write_u64(8, 0x0123_4567_89AB_CDEF).unwrap();
        assert_eq!(s.read_u64(8).unwrap(), 0x0123_4567_89AB_CDEF);

        s.write_f32(16, 255.0).unwrap();
        assert_eq!(s.read_f32(16).unwrap(), 255.0);

        s.write_f64(20, 12345.6789).unwrap();
        assert_eq!(s.read_f64(20).unwrap(), 12345.6789);

        s.release(owner);
    }

    #[test]
    fn bounds_violation_fails() {
        let s = HeapStore::fixed_capacity(4);
        assert!(s.read_u32(2).is_err());
        assert!(s.write_u64(0, 1).is_err());
    }

    #[test]
    fn zero_out_clears_range() {
        let s = HeapStore::wrap(vec![1, 2, 3, 4, 5, 6]);
        s.zero_out(1, 4).unwrap();
        let mut out = [0u8; 6];
        s.read_bytes(0, &mut out).unwrap();
        assert_eq!(out, [1, 0, 0, 0, 5, 6]);
    }

    #[test]
    fn move_within_handles_overlap() {
        let s = HeapStore::wrap(vec![1, 2, 3, 4, 5]);
        s.move_within(0, 1, 4).unwrap();
        let mut out = [0u8; 5];
        s.read_bytes(0, &mut out).unwrap();
        assert_eq!(out, [1, 1, 2, 3, 4]);
    }

    #[test]
    fn read_bytes_reports_minus_one_when_empty() {
        let s = HeapStore::fixed_capacity(4);
        let mut out = [0u8; 2];
        assert_eq!(s.read_bytes(4, &mut out).unwrap(), -1);
    }

    #[test]
    fn address_for_read_unsupported_on_heap() {
        let s = HeapStore::fixed_capacity(4);
        assert_eq!(s.address_for_read(0), Err(BufferError::Unsupported));
    }

    #[test]
    fn copy_to_sink_drains_full_extent() {
        let s = HeapStore::wrap(vec![1, 2, 3, 4, 5]);
        let mut sink: Vec<u8> = Vec::new();
        s.copy_to_sink(&mut sink).unwrap();
        assert_eq!(sink, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn cas_contention_single_writer() {
        let s = HeapStore::fixed_capacity(8);
        s.write_u32(0, 0).unwrap();
        for _ in 0..1_000_000 {
            s.add_and_get_i32(0, 1).unwrap();
        }
        assert_eq!(s.read_u32_volatile(0).unwrap(), 1_000_000);
    }
}
