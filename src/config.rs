//! Process-wide platform flags and runtime-configurable knobs (spec §6).
//!
//! These mirror the `getBoolean("name", default)`-style lookups the source
//! system performs by name: a handful of read-mostly, init-once booleans that
//! trade safety or portability for speed. They are read once from the
//! environment and cached, the same init-once lifecycle the teacher gives its
//! own process-wide statics (`LOGGER_STATE`, the `INITIALIZED` flag in
//! `init()`).

use std::env;
use std::sync::OnceLock;

/// Cached snapshot of the boolean platform flags.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// `bounds_check.disable` / `zbytes.bounds_check.disable` — skip the
    /// `[start, size)` / `[start, writeLimit)` range checks on the hot path.
    pub bounds_check_disabled: bool,
    /// `vectorized.content_equals.disable` — always use the scalar
    /// word/byte comparison loop in content equality, even when the
    /// `vectorized-equals` feature is compiled in.
    pub vectorized_equals_disabled: bool,
    /// Disables the debug-only single-writer reentrancy assertion on cursors.
    pub single_threaded_check_disabled: bool,
    /// Enables a trace log whenever a native store is dropped without having
    /// reached a zero refcount through the normal release path.
    pub resource_tracing: bool,
}

fn flag(name: &str) -> bool {
    match env::var(name) {
        Ok(v) => {
            let v = v.trim();
            v == "1" || v.eq_ignore_ascii_case("true")
        }
        Err(_) => false,
    }
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Returns the process-wide configuration, reading environment variables on
/// first access and caching the result for the remainder of the process.
pub fn config() -> &'static Config {
    CONFIG.get_or_init(|| Config {
        bounds_check_disabled: flag("ZBYTES_BOUNDS_CHECK_DISABLE"),
        vectorized_equals_disabled: flag("ZBYTES_VECTORIZED_EQUALS_DISABLE")
            || cfg!(not(feature = "vectorized-equals")),
        single_threaded_check_disabled: flag("ZBYTES_SINGLE_THREADED_CHECK_DISABLE"),
        resource_tracing: flag("ZBYTES_RESOURCE_TRACING") || cfg!(feature = "resource-tracing"),
    })
}

/// Whether the host pointer width is 64 bits.
#[inline]
pub const fn is_64_bit() -> bool {
    cfg!(target_pointer_width = "64")
}

/// Whether debug assertions (and, by extension, the debug-only owner-token
/// diagnostics in [`crate::refcount`]) are compiled in.
#[inline]
pub const fn is_assert_enabled() -> bool {
    cfg!(debug_assertions)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn flags_default_to_false_when_unset() {
        // SAFETY: test runs single-threaded within this process; no other
        // test touches these specific variable names.
        unsafe {
            env::remove_var("ZBYTES_BOUNDS_CHECK_DISABLE");
        }
        assert!(!flag("ZBYTES_BOUNDS_CHECK_DISABLE"));
    }

    #[test]
    fn flag_accepts_1_and_true() {
        unsafe {
            env::set_var("ZBYTES_TEST_FLAG", "1");
        }
        assert!(flag("ZBYTES_TEST_FLAG"));
        unsafe {
            env::set_var("ZBYTES_TEST_FLAG", "true");
        }
        assert!(flag("ZBYTES_TEST_FLAG"));
        unsafe {
            env::set_var("ZBYTES_TEST_FLAG", "no");
        }
        assert!(!flag("ZBYTES_TEST_FLAG"));
        unsafe {
            env::remove_var("ZBYTES_TEST_FLAG");
        }
    }
}
