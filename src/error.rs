//! The error taxonomy described for the byte-store and cursor layers.
//!
//! Every fallible public operation returns [`Result`]. The "unchecked" fast
//! paths (the random-input view used by content equality, and the `*_unchecked`
//! sequential advances on a cursor) are infallible by contract: callers must
//! have already validated the range, matching the teacher's distinction
//! between the checked `RingBuffer::split` entry point and the `unsafe`
//! invariants documented directly on `Producer::write`/`Consumer::read`.

use thiserror::Error;

/// Errors raised by store and cursor operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    /// The store (or the store backing a cursor) has already released its
    /// memory; no further operations are permitted.
    #[error("operation attempted on a released byte-store")]
    Released,

    /// A random-access offset plus its access width falls outside the
    /// store's valid range.
    #[error("offset {offset} + {advance} bytes is outside [{low}, {high})")]
    Bounds {
        offset: usize,
        advance: usize,
        low: usize,
        high: usize,
    },

    /// A bulk operation's index argument falls outside the valid range.
    #[error("bulk operation index {index} is outside [{low}, {high})")]
    BulkBounds {
        index: usize,
        low: usize,
        high: usize,
    },

    /// The operation is not implemented by this store variant (for example,
    /// `address_for_read` on a heap store, or any memory op on the null
    /// store).
    #[error("operation is not supported by this store")]
    Unsupported,

    /// An argument was structurally invalid: a negative length, or mismatched
    /// region sizes between two bulk-operation participants.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The native allocator could not satisfy a request.
    #[error("native allocation of {requested} bytes failed")]
    AllocationFailed { requested: usize },

    /// A requested logical size exceeds the elastic capacity ceiling, or a
    /// length computation would overflow pointer arithmetic.
    #[error("requested size {requested} exceeds capacity {capacity}")]
    Overflow { requested: usize, capacity: usize },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, BufferError>;
