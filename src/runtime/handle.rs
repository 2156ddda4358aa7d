//! Native instance ownership.
//!
//! Three bases back the generated wrappers, matching the class shapes:
//!
//! | Base | Handle | Disposes |
//! |------|--------|----------|
//! | [`NativeInstance`] | owned, re-seatable | yes, exactly once |
//! | [`ConstNativeInstance`] | borrowed | never |
//! | [`NativeHelper`] | none | n/a |
//!
//! Each carries a [`Warnings`] router so instance calls forward warnings to the
//! sink of the object that made them.

use super::error::MagickError;
use super::outcome::Outcome;
use super::warning::{WarningSink, Warnings};
use std::ffi::c_void;
use std::ptr;
use std::sync::Arc;

/// Opaque pointer to a native instance.
pub type RawHandle = *mut c_void;

/// Opaque pointer to a native exception record.
pub type RawException = *mut c_void;

/// Native routine releasing one instance.
pub type DisposeFn = unsafe extern "C" fn(RawHandle);

/// Exposes the raw handle of a managed object for argument passing.
pub trait HasNativeInstance {
    fn native_instance(&self) -> Result<RawHandle, MagickError>;
}

/// Reject a null handle returned on the success path of a creating call.
pub fn ensure_created(raw: RawHandle) -> Result<RawHandle, MagickError> {
    if raw.is_null() {
        return Err(MagickError::InvalidOperation(
            "the native call reported success but returned no instance".to_string(),
        ));
    }
    Ok(raw)
}

// ============================================================================
// NativeHandle
// ============================================================================

/// A single owned native handle.
///
/// Dropping or disposing releases the handle through its dispose routine. A
/// second dispose is a no-op.
#[derive(Debug)]
pub struct NativeHandle {
    raw: RawHandle,
    dispose: Option<DisposeFn>,
}

impl NativeHandle {
    pub fn new(raw: RawHandle, dispose: DisposeFn) -> Self {
        Self {
            raw,
            dispose: Some(dispose),
        }
    }

    /// The zero sentinel passed for an absent managed reference.
    pub fn zero() -> Self {
        Self {
            raw: ptr::null_mut(),
            dispose: None,
        }
    }

    pub fn raw(&self) -> RawHandle {
        self.raw
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_null()
    }

    /// Replace the held handle, releasing the previous one.
    ///
    /// Re-seating the handle already held does nothing.
    pub fn reseat(&mut self, raw: RawHandle) {
        if raw == self.raw {
            return;
        }
        self.dispose();
        self.raw = raw;
    }

    pub fn dispose(&mut self) {
        let raw = std::mem::replace(&mut self.raw, ptr::null_mut());
        if raw.is_null() {
            return;
        }
        if let Some(dispose) = self.dispose {
            unsafe { dispose(raw) };
        }
    }

    /// Give up ownership without disposing.
    pub fn into_raw(mut self) -> RawHandle {
        std::mem::replace(&mut self.raw, ptr::null_mut())
    }
}

impl Drop for NativeHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}

// ============================================================================
// Wrapper bases
// ============================================================================

/// Base of wrappers owning a native instance.
#[derive(Debug)]
pub struct NativeInstance {
    handle: NativeHandle,
    type_name: &'static str,
    warnings: Warnings,
}

impl NativeInstance {
    /// An empty instance; a constructor seats the handle.
    pub fn new(dispose: DisposeFn, type_name: &'static str) -> Self {
        Self::from_raw(ptr::null_mut(), dispose, type_name)
    }

    /// Take ownership of an existing native handle.
    pub fn from_raw(raw: RawHandle, dispose: DisposeFn, type_name: &'static str) -> Self {
        Self {
            handle: NativeHandle::new(raw, dispose),
            type_name,
            warnings: Warnings::default(),
        }
    }

    /// The live handle, or [`MagickError::Disposed`].
    pub fn instance(&self) -> Result<RawHandle, MagickError> {
        if self.handle.is_zero() {
            return Err(MagickError::Disposed(self.type_name));
        }
        Ok(self.handle.raw())
    }

    pub fn has_instance(&self) -> bool {
        !self.handle.is_zero()
    }

    pub fn reseat(&mut self, raw: RawHandle) {
        self.handle.reseat(raw);
    }

    pub fn dispose(&mut self) {
        self.handle.dispose();
    }

    pub fn into_raw(self) -> RawHandle {
        self.handle.into_raw()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn set_warning_sink(&mut self, sink: Arc<dyn WarningSink>) {
        self.warnings.set_sink(sink);
    }

    pub fn finish<T>(&self, outcome: Outcome<T>) -> Result<T, MagickError> {
        outcome.into_result(&self.warnings)
    }
}

/// Base of wrappers around a borrowed native instance.
#[derive(Debug)]
pub struct ConstNativeInstance {
    raw: RawHandle,
    type_name: &'static str,
    warnings: Warnings,
}

impl ConstNativeInstance {
    pub fn new(raw: RawHandle, type_name: &'static str) -> Self {
        Self {
            raw,
            type_name,
            warnings: Warnings::default(),
        }
    }

    pub fn instance(&self) -> Result<RawHandle, MagickError> {
        if self.raw.is_null() {
            return Err(MagickError::Disposed(self.type_name));
        }
        Ok(self.raw)
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn set_warning_sink(&mut self, sink: Arc<dyn WarningSink>) {
        self.warnings.set_sink(sink);
    }

    pub fn finish<T>(&self, outcome: Outcome<T>) -> Result<T, MagickError> {
        outcome.into_result(&self.warnings)
    }
}

/// Base of wrappers with no native instance of their own.
#[derive(Debug, Default)]
pub struct NativeHelper {
    warnings: Warnings,
}

impl NativeHelper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_warning_sink(&mut self, sink: Arc<dyn WarningSink>) {
        self.warnings.set_sink(sink);
    }

    pub fn finish<T>(&self, outcome: Outcome<T>) -> Result<T, MagickError> {
        outcome.into_result(&self.warnings)
    }
}
