//! The native (off-heap) byte-store variant (spec §4.3).
//!
//! Backed by a raw address from the global allocator
//! (`crate::memory::allocate`/`free`, standing in for spec §6's "native
//! allocator and deallocator service" collaborator). Zero-fill on
//! allocation is optional per spec; blocks at or above 128 KiB are assumed
//! already zero by the allocator contract and are not re-zeroed here.

use core::ptr::NonNull;
use core::sync::atomic::{AtomicBool, Ordering};

use crate::error::{BufferError, Result};
use crate::memory::{self, alloc_layout::Layout};
use crate::refcount::{OwnerToken, RefCount};
use crate::store::{check_bounds, AtomicPrimitives, ByteStore, RandomInput, RandomOutput, UncheckedView};

enum Origin {
    /// Allocated (and thus owned for deallocation purposes) by this store.
    Owned { layout: Layout },
    /// Wraps caller-provided memory; this store never calls `free`.
    Borrowed,
}

/// A fixed-capacity store backed by native (off-heap) memory.
pub struct NativeStore {
    ptr: Option<NonNull<u8>>,
    len: usize,
    origin: Origin,
    refs: RefCount,
    released: AtomicBool,
}

// SAFETY: `NativeStore` only exposes interior mutation through the bounds-
// checked, explicitly-ordered operations on `ByteStore`/`RandomInput`/
// `RandomOutput`/`AtomicPrimitives`, matching the single-writer discipline
// the cursor layer enforces; the raw pointer itself has no thread affinity.
unsafe impl Send for NativeStore {}
// SAFETY: see above; concurrent readers are explicitly supported via the
// atomic/volatile family (spec §5).
unsafe impl Sync for NativeStore {}

impl NativeStore {
    /// Allocates `len` bytes of native memory, optionally zero-filled.
    pub fn fixed_capacity(len: usize, zero_fill: bool) -> Result<Self> {
        if len == 0 {
            return Ok(Self {
                ptr: None,
                len: 0,
                origin: Origin::Borrowed,
                refs: RefCount::new(),
                released: AtomicBool::new(false),
            });
        }
        let (ptr, layout) =
            memory::allocate(len, zero_fill).ok_or(BufferError::AllocationFailed { requested: len })?;
        Ok(Self {
            ptr: Some(ptr),
            len,
            origin: Origin::Owned { layout },
            refs: RefCount::new(),
            released: AtomicBool::new(false),
        })
    }

    /// Allocates without zero-filling; the allocator contract leaves the
    /// content unspecified (spec's `lazyFixedCapacity`).
    pub fn lazy_fixed_capacity(len: usize) -> Result<Self> {
        Self::fixed_capacity(len, false)
    }

    /// Wraps a caller-provided, already-allocated region. This store will
    /// not free `ptr` on release.
    ///
    /// # Safety
    /// `ptr` must be valid for reads and writes of `len` bytes for the
    /// lifetime of this store, and the caller must not alias it mutably
    /// outside the single-writer discipline spec §5 requires.
    pub unsafe fn from_raw_parts(ptr: NonNull<u8>, len: usize) -> Self {
        Self {
            ptr: if len == 0 { None } else { Some(ptr) },
            len,
            origin: Origin::Borrowed,
            refs: RefCount::new(),
            released: AtomicBool::new(false),
        }
    }

    fn base_ptr(&self) -> Result<*mut u8> {
        self.ptr.map(|p| p.as_ptr()).ok_or(BufferError::Unsupported)
    }

    fn ensure_live(&self) -> Result<()> {
        if self.released.load(Ordering::Acquire) {
            Err(BufferError::Released)
        } else {
            Ok(())
        }
    }
}

impl Drop for NativeStore {
    fn drop(&mut self) {
        if let (Origin::Owned { layout }, Some(ptr)) = (&self.origin, self.ptr) {
            if crate::config::config().resource_tracing && !self.released.load(Ordering::Acquire) {
                log::trace!(
                    "native store dropped with {} outstanding reference(s) without reaching release()",
                    self.refs.ref_count()
                );
            }
            // SAFETY: `ptr`/`layout` are exactly the pair `memory::allocate`
            // returned for this store, and this is the only place that ever
            // frees them (the store owns this allocation per `Origin::Owned`).
            unsafe { memory::free(ptr, *layout) };
        }
    }
}

impl RandomInput for NativeStore {
    fn read_u8(&self, offset: usize) -> Result<u8> {
        self.ensure_live()?;
        check_bounds(offset, 1, self.len)?;
        // SAFETY: bounds checked above; base pointer valid for `self.len`.
        Ok(unsafe { memory::read_u8(self.base_ptr()?.add(offset)) })
    }

    fn read_u8_volatile(&self, offset: usize) -> Result<u8> {
        self.ensure_live()?;
        check_bounds(offset, 1, self.len)?;
        // SAFETY: bounds checked above.
        Ok(unsafe { memory::atomic_u8::load_volatile(self.base_ptr()?.add(offset)) })
    }

    fn read_u16(&self, offset: usize) -> Result<u16> {
        self.ensure_live()?;
        check_bounds(offset, 2, self.len)?;
        // SAFETY: bounds checked above.
        Ok(unsafe { memory::read_u16(self.base_ptr()?.add(offset).cast()) })
    }

    fn read_u16_volatile(&self, offset: usize) -> Result<u16> {
        self.ensure_live()?;
        check_bounds(offset, 2, self.len)?;
        // SAFETY: bounds checked above.
        Ok(unsafe { memory::atomic_u16::load_volatile(self.base_ptr()?.add(offset).cast()) })
    }

    fn read_u32(&self, offset: usize) -> Result<u32> {
        self.ensure_live()?;
        check_bounds(offset, 4, self.len)?;
        // SAFETY: bounds checked above.
        Ok(unsafe { memory::read_u32(self.base_ptr()?.add(offset).cast()) })
    }

    fn read_u32_volatile(&self, offset: usize) -> Result<u32> {
        self.ensure_live()?;
        check_bounds(offset, 4, self.len)?;
        // SAFETY: bounds checked above.
        Ok(unsafe { memory::atomic_u32::load_volatile(self.base_ptr()?.add(offset).cast()) })
    }

    fn read_u64(&self, offset: usize) -> Result<u64> {
        self.ensure_live()?;
        check_bounds(offset, 8, self.len)?;
        // SAFETY: bounds checked above.
        Ok(unsafe { memory::read_u64(self.base_ptr()?.add(offset).cast()) })
    }

    fn read_u64_volatile(&self, offset: usize) -> Result<u64> {
        self.ensure_live()?;
        check_bounds(offset, 8, self.len)?;
        // SAFETY: bounds checked above.
        Ok(unsafe { memory::atomic_u64::load_volatile(self.base_ptr()?.add(offset).cast()) })
    }

    fn read_int24(&self, offset: usize) -> Result<i32> {
        self.ensure_live()?;
        check_bounds(offset, 3, self.len)?;
        // SAFETY: bounds checked above.
        Ok(unsafe { memory::read_int24(self.base_ptr()?.add(offset)) })
    }

    fn read_bytes(&self, offset: usize, dst: &mut [u8]) -> Result<i64> {
        self.ensure_live()?;
        if offset > self.len {
            return Err(BufferError::BulkBounds {
                index: offset,
                low: 0,
                high: self.len,
            });
        }
        let available = self.len - offset;
        if available == 0 || dst.is_empty() {
            return Ok(-1);
        }
        let n = available.min(dst.len());
        // SAFETY: `offset + n <= self.len`; `dst[..n]` is a valid,
        // non-overlapping destination.
        unsafe { memory::copy_bytes(self.base_ptr()?.add(offset), dst.as_mut_ptr(), n) };
        Ok(n as i64)
    }
}

impl RandomOutput for NativeStore {
    fn write_u8(&self, offset: usize, value: u8) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, 1, self.len)?;
        // SAFETY: bounds checked above.
        unsafe { memory::write_u8(self.base_ptr()?.add(offset), value) };
        Ok(())
    }

    fn write_u8_ordered(&self, offset: usize, value: u8) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, 1, self.len)?;
        // SAFETY: bounds checked above.
        unsafe { memory::atomic_u8::store_ordered(self.base_ptr()?.add(offset), value) };
        Ok(())
    }

    fn write_u8_volatile(&self, offset: usize, value: u8) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, 1, self.len)?;
        // SAFETY: bounds checked above.
        unsafe { memory::atomic_u8::store_volatile(self.base_ptr()?.add(offset), value) };
        Ok(())
    }

    fn write_u16(&self, offset: usize, value: u16) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, 2, self.len)?;
        // SAFETY: bounds checked above.
        unsafe { memory::write_u16(self.base_ptr()?.add(offset).cast(), value) };
        Ok(())
    }

    fn write_u16_ordered(&self, offset: usize, value: u16) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, 2, self.len)?;
        // SAFETY: bounds checked above.
        unsafe { memory::atomic_u16::store_ordered(self.base_ptr()?.add(offset).cast(), value) };
        Ok(())
    }

    fn write_u16_volatile(&self, offset: usize, value: u16) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, 2, self.len)?;
        // SAFETY: bounds checked above.
        unsafe { memory::atomic_u16::store_volatile(self.base_ptr()?.add(offset).cast(), value) };
        Ok(())
    }

    fn write_u32(&self, offset: usize, value: u32) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, 4, self.len)?;
        // SAFETY: bounds checked above.
        unsafe { memory::write_u32(self.base_ptr()?.add(offset).cast(), value) };
        Ok(())
    }

    fn write_u32_ordered(&self, offset: usize, value: u32) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, 4, self.len)?;
        // SAFETY: bounds checked above.
        unsafe { memory::atomic_u32::store_ordered(self.base_ptr()?.add(offset).cast(), value) };
        Ok(())
    }

    fn write_u32_volatile(&self, offset: usize, value: u32) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, 4, self.len)?;
        // SAFETY: bounds checked above.
        unsafe { memory::atomic_u32::store_volatile(self.base_ptr()?.add(offset).cast(), value) };
        Ok(())
    }

    fn write_u64(&self, offset: usize, value: u64) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, 8, self.len)?;
        // SAFETY: bounds checked above.
        unsafe { memory::write_u64(self.base_ptr()?.add(offset).cast(), value) };
        Ok(())
    }

    fn write_u64_ordered(&self, offset: usize, value: u64) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, 8, self.len)?;
        // SAFETY: bounds checked above.
        unsafe { memory::atomic_u64::store_ordered(self.base_ptr()?.add(offset).cast(), value) };
        Ok(())
    }

    fn write_u64_volatile(&self, offset: usize, value: u64) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, 8, self.len)?;
        // SAFETY: bounds checked above.
        unsafe { memory::atomic_u64::store_volatile(self.base_ptr()?.add(offset).cast(), value) };
        Ok(())
    }

    fn write_bytes(&self, offset: usize, src: &[u8]) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, src.len(), self.len)?;
        if src.is_empty() {
            return Ok(());
        }
        // SAFETY: bounds checked above; `src` and this allocation are
        // distinct, non-overlapping allocations.
        unsafe { memory::copy_bytes(src.as_ptr(), self.base_ptr()?.add(offset), src.len()) };
        Ok(())
    }
}

impl AtomicPrimitives for NativeStore {
    fn compare_and_swap_i32(&self, offset: usize, expected: i32, new: i32) -> Result<bool> {
        self.ensure_live()?;
        check_bounds(offset, 4, self.len)?;
        // SAFETY: bounds checked above.
        Ok(unsafe { memory::atomic_i32::compare_and_swap(self.base_ptr()?.add(offset).cast(), expected, new) })
    }

    fn compare_and_swap_i64(&self, offset: usize, expected: i64, new: i64) -> Result<bool> {
        self.ensure_live()?;
        check_bounds(offset, 8, self.len)?;
        // SAFETY: bounds checked above.
        Ok(unsafe { memory::atomic_i64::compare_and_swap(self.base_ptr()?.add(offset).cast(), expected, new) })
    }

    fn test_and_set_i32(&self, offset: usize, expected: i32, new: i32) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, 4, self.len)?;
        // SAFETY: bounds checked above.
        unsafe { memory::atomic_i32::test_and_set(self.base_ptr()?.add(offset).cast(), expected, new) };
        Ok(())
    }

    fn test_and_set_i64(&self, offset: usize, expected: i64, new: i64) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, 8, self.len)?;
        // SAFETY: bounds checked above.
        unsafe { memory::atomic_i64::test_and_set(self.base_ptr()?.add(offset).cast(), expected, new) };
        Ok(())
    }

    fn add_and_get_i32(&self, offset: usize, diff: i32) -> Result<i32> {
        self.ensure_live()?;
        check_bounds(offset, 4, self.len)?;
        // SAFETY: bounds checked above.
        Ok(unsafe { memory::atomic_i32::add_and_get(self.base_ptr()?.add(offset).cast(), diff) })
    }

    fn add_and_get_i64(&self, offset: usize, diff: i64) -> Result<i64> {
        self.ensure_live()?;
        check_bounds(offset, 8, self.len)?;
        // SAFETY: bounds checked above.
        Ok(unsafe { memory::atomic_i64::add_and_get(self.base_ptr()?.add(offset).cast(), diff) })
    }
}

impl ByteStore for NativeStore {
    fn size(&self) -> usize {
        self.len
    }

    fn is_native(&self) -> bool {
        true
    }

    fn is_heap(&self) -> bool {
        false
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
            self.released.store(true, Ordering::Release);
        }
    }

    fn release_last(&self, owner: OwnerToken) {
        self.refs.release_last(owner);
        self.released.store(true, Ordering::Release);
    }

    fn address_for_read(&self, offset: usize) -> Result<*const u8> {
        self.ensure_live()?;
        check_bounds(offset, 0, self.len)?;
        Ok(self.base_ptr()?.wrapping_add(offset) as *const u8)
    }

    fn address_for_write(&self, offset: usize) -> Result<*mut u8> {
        self.ensure_live()?;
        check_bounds(offset, 0, self.len)?;
        Ok(self.base_ptr()?.wrapping_add(offset))
    }

    fn move_within(&self, from: usize, to: usize, len: usize) -> Result<()> {
        self.ensure_live()?;
        check_bounds(from, len, self.len)?;
        check_bounds(to, len, self.len)?;
        if len == 0 {
            return Ok(());
        }
        // SAFETY: both ranges bounds-checked above; `move_bytes` tolerates
        // overlap.
        unsafe { memory::move_bytes(self.base_ptr()?.add(from), self.base_ptr()?.add(to), len) };
        Ok(())
    }

    fn zero_out(&self, begin: usize, end: usize) -> Result<()> {
        self.ensure_live()?;
        if begin > end {
            return Err(BufferError::InvalidArgument("zero_out: begin > end"));
        }
        check_bounds(begin, end - begin, self.len)?;
        if begin == end {
            return Ok(());
        }
        // SAFETY: range checked above.
        unsafe { memory::set_bytes(self.base_ptr()?.add(begin), end - begin, 0) };
        Ok(())
    }

    fn native_read(&self, offset: usize, raw: *mut u8, len: usize) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, len, self.len)?;
        if len == 0 {
            return Ok(());
        }
        // SAFETY: offset range checked above; caller guarantees `raw` is
        // valid for `len` bytes.
        unsafe { memory::copy_bytes(self.base_ptr()?.add(offset), raw, len) };
        Ok(())
    }

    fn native_write(&self, raw: *const u8, offset: usize, len: usize) -> Result<()> {
        self.ensure_live()?;
        check_bounds(offset, len, self.len)?;
        if len == 0 {
            return Ok(());
        }
        // SAFETY: offset range checked above; caller guarantees `raw` is
        // valid for `len` bytes.
        unsafe { memory::copy_bytes(raw, self.base_ptr()?.add(offset), len) };
        Ok(())
    }

    fn unchecked_view(&self) -> Option<UncheckedView<'_>> {
        if self.is_released() || self.ptr.is_none() {
            return None;
        }
        // SAFETY: `self.ptr` is valid for `self.len` bytes for as long as
        // `self` is alive, and it is live here (checked above).
        Some(unsafe { UncheckedView::new(self.ptr.unwrap().as_ptr(), self.len) })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn allocate_and_roundtrip() {
        let s = NativeStore::fixed_capacity(64, true).unwrap();
        let owner = OwnerToken::new();
        s.reserve(owner).unwrap();

        s.write_u64(0, 0xFFAB_CD00_0000_0000).unwrap();
        assert_eq!(s.read_u64(0).unwrap(), 0xFFAB_CD00_0000_0000);

        let addr = s.address_for_read(8).unwrap();
        assert!(!addr.is_null());

        s.release(owner);
    }

    #[test]
    fn zero_length_store_supports_no_memory_ops() {
        let s = NativeStore::fixed_capacity(0, false).unwrap();
        assert_eq!(s.size(), 0);
        assert!(s.read_u8(0).is_err());
    }

    #[test]
    fn address_for_read_unsupported_on_empty_store() {
        let s = NativeStore::fixed_capacity(0, false).unwrap();
        assert_eq!(s.address_for_read(0), Err(BufferError::Unsupported));
    }
}
