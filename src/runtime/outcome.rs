//! The native exception protocol as a sum type.
//!
//! Every throwing native export takes a trailing `*mut RawException`. The
//! native side leaves it null on success, or points it at an exception record.
//! [`Outcome::capture`] turns that pair (raw result, exception slot) into:
//!
//! ```text
//! exception == null            -> Success(result)
//! exception.severity <  400    -> Warning(result, exception)   result kept
//! exception.severity >= 400    -> Failure(error)               cleanup(result) first
//! ```
//!
//! Cleanup runs at most once, only on the failure branch, and only when the raw
//! result is non-zero. Higher layers never see the exception pointer.

use super::error::{MagickError, NativeException};
use super::handle::RawException;
use super::warning::WarningSink;

/// Decodes native exception records.
///
/// Implemented once per native library binding. `read` must release the
/// record; the slot is not touched again afterwards.
pub trait ExceptionReader {
    /// # Safety
    ///
    /// `raw` must be a non-null exception record produced by the native library
    /// and not yet released.
    unsafe fn read(raw: RawException) -> NativeException;
}

/// Raw native results that can be tested for the zero sentinel.
pub trait NativeValue: Copy {
    fn is_zero(&self) -> bool;
}

impl<T> NativeValue for *mut T {
    fn is_zero(&self) -> bool {
        self.is_null()
    }
}

impl<T> NativeValue for *const T {
    fn is_zero(&self) -> bool {
        self.is_null()
    }
}

impl NativeValue for () {
    fn is_zero(&self) -> bool {
        true
    }
}

impl NativeValue for bool {
    fn is_zero(&self) -> bool {
        !*self
    }
}

macro_rules! zero_checked {
    ($($ty:ty),*) => {
        $(impl NativeValue for $ty {
            fn is_zero(&self) -> bool {
                *self == 0 as $ty
            }
        })*
    };
}

zero_checked!(u8, i8, u16, i16, u32, i32, u64, i64, usize, isize, f32, f64);

/// Result of one native call that reports through the exception slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Warning(T, NativeException),
    Failure(MagickError),
}

impl<T: NativeValue> Outcome<T> {
    /// Classify the exception slot after a native call.
    ///
    /// # Safety
    ///
    /// `exception` must be null or a live record produced by the call that
    /// returned `result`.
    pub unsafe fn capture<R: ExceptionReader>(result: T, exception: RawException) -> Self {
        unsafe { Self::capture_or_cleanup::<R, _>(result, exception, |_| {}) }
    }

    /// Like [`Outcome::capture`], releasing a non-zero `result` through
    /// `cleanup` when the call failed.
    ///
    /// # Safety
    ///
    /// Same as [`Outcome::capture`]. `cleanup` must be safe to call on `result`.
    pub unsafe fn capture_or_cleanup<R, F>(result: T, exception: RawException, cleanup: F) -> Self
    where
        R: ExceptionReader,
        F: FnOnce(T),
    {
        if exception.is_null() {
            return Outcome::Success(result);
        }
        let exception = unsafe { R::read(exception) };
        if exception.is_error() {
            if !result.is_zero() {
                cleanup(result);
            }
            return Outcome::Failure(MagickError::Native(exception));
        }
        Outcome::Warning(result, exception)
    }
}

impl<T> Outcome<T> {
    /// Collapse into a `Result`, forwarding a warning to `sink`.
    pub fn into_result(self, sink: &dyn WarningSink) -> Result<T, MagickError> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Warning(value, warning) => {
                sink.warning(&warning);
                Ok(value)
            }
            Outcome::Failure(error) => Err(error),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::Warning(value, warning) => Outcome::Warning(f(value), warning),
            Outcome::Failure(error) => Outcome::Failure(error),
        }
    }
}
