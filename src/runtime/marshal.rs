//! UTF-8 string marshaling across the native boundary.

use super::error::MagickError;
use std::ffi::{CStr, CString, c_char, c_void};

/// Native routine releasing memory the native side allocated.
pub type RelinquishFn = unsafe extern "C" fn(*mut c_void);

pub struct Utf8Marshaler;

impl Utf8Marshaler {
    /// Encode a caller string for the duration of one call.
    pub fn managed_to_native(value: &str) -> Result<CString, MagickError> {
        CString::new(value).map_err(|e| MagickError::InteriorNul(e.nul_position()))
    }

    /// Copy a string the caller still owns. Null maps to `None`.
    ///
    /// # Safety
    ///
    /// `value` must be null or a nul-terminated string valid for the call.
    pub unsafe fn native_to_managed(value: *const c_char) -> Option<String> {
        if value.is_null() {
            return None;
        }
        let text = unsafe { CStr::from_ptr(value) };
        Some(text.to_string_lossy().into_owned())
    }

    /// Copy a native-allocated string, then release it through `relinquish`.
    ///
    /// # Safety
    ///
    /// `value` must be null or a nul-terminated string allocated by the native
    /// library and owned by the caller. It is invalid after this call.
    pub unsafe fn native_to_managed_and_relinquish(
        value: *mut c_char,
        relinquish: RelinquishFn,
    ) -> Option<String> {
        let text = unsafe { Self::native_to_managed(value) };
        if !value.is_null() {
            unsafe { relinquish(value as *mut c_void) };
        }
        text
    }
}
