// Tue Jan 20 2026 - Alex

//! C interface used by the Python `ctypes` binding.
//!
//! A `BinaryPattern*` is created by [`BinaryPattern_Parse`] and must be destroyed exactly once
//! by [`BinaryPattern_Free`]. Scanning with a freed handle, freeing a handle twice, or passing a
//! `data` pointer that is not valid for `length` bytes is undefined behaviour. None of this is
//! checked beyond rejecting null pointers.

#![allow(non_snake_case)]

use crate::pattern::CompiledPattern;
use std::ffi::{c_char, CStr};
use std::{ptr, slice};

/// Opaque compiled pattern handed out to C callers.
pub struct BinaryPattern(CompiledPattern);

/// Compiles a NUL-terminated pattern string.
///
/// Returns NULL if `pattern` is NULL, is not valid UTF-8, or does not parse.
///
/// # Safety
///
/// `pattern` must be NULL or point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn BinaryPattern_Parse(pattern: *const c_char) -> *mut BinaryPattern {
    if pattern.is_null() {
        return ptr::null_mut();
    }

    let source = match CStr::from_ptr(pattern).to_str() {
        Ok(source) => source,
        Err(_) => return ptr::null_mut(),
    };

    match CompiledPattern::compile(source) {
        Ok(compiled) => Box::into_raw(Box::new(BinaryPattern(compiled))),
        Err(e) => {
            log::debug!("Rejected pattern \"{}\": {}", source, e);
            ptr::null_mut()
        }
    }
}

/// Destroys a pattern returned by [`BinaryPattern_Parse`]. NULL is ignored.
///
/// # Safety
///
/// `pattern` must be NULL or a handle from [`BinaryPattern_Parse`] that has not been freed.
#[no_mangle]
pub unsafe extern "C" fn BinaryPattern_Free(pattern: *mut BinaryPattern) {
    if !pattern.is_null() {
        drop(Box::from_raw(pattern));
    }
}

/// Scans `length` bytes at `data`, writing up to `max_results` ascending offsets into
/// `results`. Returns the number of offsets written.
///
/// `max_results == 0` writes nothing and returns 0.
///
/// # Safety
///
/// `pattern` must be a live handle from [`BinaryPattern_Parse`]. If `length` is non-zero,
/// `data` must be valid for reads of `length` bytes. `results` must be valid for writes of
/// `max_results` offsets. The handle may be scanned from several threads at once, but must not
/// be freed while any scan is running.
#[no_mangle]
pub unsafe extern "C" fn BinjaPattern_Scan(
    pattern: *const BinaryPattern,
    data: *const u8,
    length: usize,
    results: *mut usize,
    max_results: usize,
) -> usize {
    let pattern = match pattern.as_ref() {
        Some(pattern) => &pattern.0,
        None => return 0,
    };

    if results.is_null() || max_results == 0 || length == 0 || data.is_null() {
        return 0;
    }

    let data = slice::from_raw_parts(data, length);
    let results = slice::from_raw_parts_mut(results, max_results);

    pattern.scan_into(data, results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn parse(source: &str) -> *mut BinaryPattern {
        let source = CString::new(source).unwrap();
        unsafe { BinaryPattern_Parse(source.as_ptr()) }
    }

    #[test]
    fn test_parse_scan_free() {
        let pattern = parse("AA ?? CC");
        assert!(!pattern.is_null());

        let data = [0xAA, 0x01, 0xCC, 0xAA, 0x02, 0xCC];
        let mut results = [0usize; 4];
        let count = unsafe {
            BinjaPattern_Scan(pattern, data.as_ptr(), data.len(), results.as_mut_ptr(), results.len())
        };

        assert_eq!(count, 2);
        assert_eq!(&results[..count], &[0, 3]);

        unsafe { BinaryPattern_Free(pattern) };
    }

    #[test]
    fn test_single_result_like_python_find() {
        let pattern = parse("AA AA");
        let data = [0xAA; 3];
        let mut result = usize::MAX;
        let count = unsafe { BinjaPattern_Scan(pattern, data.as_ptr(), data.len(), &mut result, 1) };

        assert_eq!(count, 1);
        assert_eq!(result, 0);

        unsafe { BinaryPattern_Free(pattern) };
    }

    #[test]
    fn test_never_writes_past_capacity() {
        let pattern = parse("00");
        let data = [0u8; 8];
        let mut results = [usize::MAX; 4];
        let count = unsafe { BinjaPattern_Scan(pattern, data.as_ptr(), data.len(), results.as_mut_ptr(), 2) };

        assert_eq!(count, 2);
        assert_eq!(results, [0, 1, usize::MAX, usize::MAX]);

        unsafe { BinaryPattern_Free(pattern) };
    }

    #[test]
    fn test_zero_capacity_and_empty_buffer() {
        let pattern = parse("00");
        let data = [0u8; 8];
        let mut results = [usize::MAX; 1];

        let count = unsafe { BinjaPattern_Scan(pattern, data.as_ptr(), data.len(), results.as_mut_ptr(), 0) };
        assert_eq!(count, 0);
        assert_eq!(results[0], usize::MAX);

        let count = unsafe { BinjaPattern_Scan(pattern, ptr::null(), 0, results.as_mut_ptr(), 1) };
        assert_eq!(count, 0);

        unsafe { BinaryPattern_Free(pattern) };
    }

    #[test]
    fn test_invalid_pattern_returns_null() {
        assert!(parse("ZZ").is_null());
        assert!(parse("").is_null());
        assert!(unsafe { BinaryPattern_Parse(ptr::null()) }.is_null());
    }

    #[test]
    fn test_null_handles() {
        let data = [0u8; 4];
        let mut results = [0usize; 1];
        let count = unsafe { BinjaPattern_Scan(ptr::null(), data.as_ptr(), data.len(), results.as_mut_ptr(), 1) };
        assert_eq!(count, 0);
        unsafe { BinaryPattern_Free(ptr::null_mut()) };
    }
}
