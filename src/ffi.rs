//! C ABI for mobile hosts.
//!
//! Every entry point works on the process-wide lifecycle from
//! [`global`](crate::session::lifecycle::global). Panics are caught here and
//! reported as [`EDGEFRAME_PANIC`]; nothing unwinds into the host.

use std::ffi::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;

use tracing::error;

use crate::session::error::FrameError;
use crate::session::lifecycle::global;

pub const EDGEFRAME_OK: i32 = 0;
pub const EDGEFRAME_UNINITIALIZED: i32 = 1;
pub const EDGEFRAME_MALFORMED_INPUT: i32 = 2;
pub const EDGEFRAME_BUSY: i32 = 3;
pub const EDGEFRAME_ENCODING_FAULT: i32 = 4;
pub const EDGEFRAME_INVALID_ARGUMENT: i32 = 5;
pub const EDGEFRAME_PANIC: i32 = 6;

/// Heap bytes handed to the host. Release with [`edgeframe_buffer_free`].
#[repr(C)]
#[derive(Debug)]
pub struct EdgeframeBuffer {
    pub data: *mut u8,
    pub len: usize,
}

impl EdgeframeBuffer {
    fn null() -> Self {
        Self {
            data: ptr::null_mut(),
            len: 0,
        }
    }

    fn from_vec(bytes: Vec<u8>) -> Self {
        let boxed = bytes.into_boxed_slice();
        let len = boxed.len();
        Self {
            data: Box::into_raw(boxed).cast::<u8>(),
            len,
        }
    }
}

fn status_code(err: &FrameError) -> i32 {
    match err {
        FrameError::Uninitialized => EDGEFRAME_UNINITIALIZED,
        FrameError::MalformedInput(_) => EDGEFRAME_MALFORMED_INPUT,
        FrameError::Busy => EDGEFRAME_BUSY,
        FrameError::Encoding(_) => EDGEFRAME_ENCODING_FAULT,
    }
}

/// Create (or recreate) the processor. Returns `false` on failure.
#[no_mangle]
pub extern "C" fn edgeframe_initialize() -> bool {
    catch_unwind(|| global().initialize()).unwrap_or_else(|_| {
        error!("panic while initializing edge processor");
        false
    })
}

/// Process one 4:2:0 frame into JPEG bytes written to `out`.
///
/// On any non-zero status `out` is set to an empty buffer.
///
/// # Safety
///
/// `data` must point to `len` readable bytes and `out` to a writable
/// `EdgeframeBuffer`, both valid for the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn edgeframe_process_frame(
    data: *const u8,
    len: usize,
    width: u32,
    height: u32,
    out: *mut EdgeframeBuffer,
) -> i32 {
    if out.is_null() {
        return EDGEFRAME_INVALID_ARGUMENT;
    }
    // SAFETY: `out` is non-null and writable per the contract above.
    unsafe { out.write(EdgeframeBuffer::null()) };
    if data.is_null() {
        return EDGEFRAME_INVALID_ARGUMENT;
    }

    // SAFETY: the caller guarantees `data` points to `len` readable bytes.
    let input = unsafe { std::slice::from_raw_parts(data, len) };
    let result = catch_unwind(AssertUnwindSafe(|| {
        global().process_frame(input, width, height)
    }));

    match result {
        Ok(Ok(jpeg)) => {
            // SAFETY: as above.
            unsafe { out.write(EdgeframeBuffer::from_vec(jpeg)) };
            EDGEFRAME_OK
        }
        Ok(Err(e)) => status_code(&e),
        Err(_) => {
            error!("panic while processing {width}x{height} frame");
            EDGEFRAME_PANIC
        }
    }
}

/// Release bytes returned by [`edgeframe_process_frame`]. Null or already
/// freed buffers are ignored.
///
/// # Safety
///
/// `buffer` must be null or point to an `EdgeframeBuffer` filled by
/// [`edgeframe_process_frame`] and not modified since.
#[no_mangle]
pub unsafe extern "C" fn edgeframe_buffer_free(buffer: *mut EdgeframeBuffer) {
    if buffer.is_null() {
        return;
    }
    // SAFETY: non-null and valid per the contract above.
    let buffer = unsafe { &mut *buffer };
    if buffer.data.is_null() {
        return;
    }
    // SAFETY: `data`/`len` came from `Box<[u8]>::into_raw` in `from_vec`.
    drop(unsafe { Box::from_raw(ptr::slice_from_raw_parts_mut(buffer.data, buffer.len)) });
    *buffer = EdgeframeBuffer::null();
}

/// Copy the stats summary into `out` as a NUL-terminated string, truncating
/// to `capacity - 1` bytes. Returns the full summary length in bytes.
///
/// # Safety
///
/// `out` must be null or point to `capacity` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn edgeframe_get_stats(out: *mut c_char, capacity: usize) -> usize {
    let summary = catch_unwind(|| global().get_stats()).unwrap_or_default();
    let bytes = summary.as_bytes();
    if !out.is_null() && capacity > 0 {
        let n = bytes.len().min(capacity - 1);
        // SAFETY: `out` has room for `capacity` bytes and `n < capacity`.
        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), out.cast::<u8>(), n);
            out.add(n).write(0);
        }
    }
    bytes.len()
}

/// Release the processor. Idempotent.
#[no_mangle]
pub extern "C" fn edgeframe_cleanup() {
    if catch_unwind(|| global().cleanup()).is_err() {
        error!("panic while cleaning up edge processor");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::compress::JPEG_MAGIC;
    use crate::frame::dummy::test_frame;
    use crate::session::lifecycle::NOT_INITIALIZED;

    fn stats_string() -> String {
        let mut buf = vec![0 as c_char; 128];
        let len = unsafe { edgeframe_get_stats(buf.as_mut_ptr(), buf.len()) };
        let bytes: Vec<u8> = buf[..len.min(127)].iter().map(|&c| c as u8).collect();
        String::from_utf8(bytes).unwrap()
    }

    // The global lifecycle is shared process state, so the whole boundary
    // round-trip lives in one test.
    #[test]
    fn boundary_round_trip() {
        edgeframe_cleanup();
        assert_eq!(stats_string(), NOT_INITIALIZED);

        let frame = test_frame(64, 48, 0);
        let mut out = EdgeframeBuffer::null();
        let status =
            unsafe { edgeframe_process_frame(frame.as_ptr(), frame.len(), 64, 48, &mut out) };
        assert_eq!(status, EDGEFRAME_UNINITIALIZED);
        assert!(out.data.is_null());

        assert!(edgeframe_initialize());
        assert_eq!(stats_string(), "No frames processed");

        let status =
            unsafe { edgeframe_process_frame(frame.as_ptr(), frame.len(), 64, 48, &mut out) };
        assert_eq!(status, EDGEFRAME_OK);
        assert!(out.len > 3);
        let jpeg = unsafe { std::slice::from_raw_parts(out.data, out.len) };
        assert_eq!(jpeg[..3], JPEG_MAGIC);
        unsafe { edgeframe_buffer_free(&mut out) };
        assert!(out.data.is_null());
        unsafe { edgeframe_buffer_free(&mut out) };

        let status = unsafe {
            edgeframe_process_frame(frame.as_ptr(), frame.len() - 1, 64, 48, &mut out)
        };
        assert_eq!(status, EDGEFRAME_MALFORMED_INPUT);

        let status = unsafe { edgeframe_process_frame(ptr::null(), 0, 64, 48, &mut out) };
        assert_eq!(status, EDGEFRAME_INVALID_ARGUMENT);

        assert!(stats_string().starts_with("frameCount=1,"));

        let mut short = [0x7f as c_char; 4];
        let full_len = unsafe { edgeframe_get_stats(short.as_mut_ptr(), short.len()) };
        assert_eq!(full_len, stats_string().len());
        assert_eq!(short.map(|c| c as u8), *b"fra\0");

        edgeframe_cleanup();
        edgeframe_cleanup();
        assert_eq!(stats_string(), NOT_INITIALIZED);
    }

    #[test]
    fn null_output_is_rejected() {
        let frame = [0u8; 6];
        let status =
            unsafe { edgeframe_process_frame(frame.as_ptr(), 6, 2, 2, ptr::null_mut()) };
        assert_eq!(status, EDGEFRAME_INVALID_ARGUMENT);
    }

    #[test]
    fn free_ignores_null() {
        unsafe { edgeframe_buffer_free(ptr::null_mut()) };
    }
}
