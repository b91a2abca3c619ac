#![warn(missing_docs)]
//! A random-access and sequential-access byte buffer engine over heap and
//! native memory.
//!
//! Three layers, bottom to top:
//! - [`store`] — the byte-store capability: [`HeapStore`], [`NativeStore`]
//!   and [`NullStore`], each implementing [`RandomInput`], [`RandomOutput`]
//!   and [`AtomicPrimitives`] over store-local logical offsets, composed
//!   into the [`ByteStore`] supertrait.
//! - [`cursor`] — [`Bytes`], a read/write cursor layered on a reserved
//!   [`ByteStore`] reference: position tracking, lenient sequential reads,
//!   and the elastic growth protocol.
//! - [`hash`], [`equality`], [`fieldgroup`] — the content-hash, content-
//!   equality, and field-group-layout capabilities that operate directly
//!   against a store.
//!
//! [`config`] and [`error`] are the ambient plumbing every layer shares:
//! process-wide platform flags read once from the environment, and the
//! [`BufferError`] taxonomy every fallible operation returns.

pub mod config;
pub mod cursor;
pub mod equality;
pub mod error;
pub mod fieldgroup;
pub mod hash;
pub mod memory;
pub mod refcount;
pub mod store;

pub use config::{config, Config};
pub use cursor::{Bytes, HEAP_MAX_SIZE, NATIVE_MAX_CAPACITY};
pub use equality::content_equals;
pub use error::{BufferError, Result};
pub use fieldgroup::{FieldGroupBuilder, FieldGroupLayout, FieldWidth};
pub use hash::{hash, hash32};
pub use refcount::OwnerToken;
pub use store::{
    AtomicPrimitives, ByteStore, HeapStore, NativeStore, NullStore, RandomInput, RandomOutput, UncheckedView,
};
