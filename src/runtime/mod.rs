//! Runtime surface called by generated wrappers.
//!
//! Generated modules import everything from here: handle bases, the
//! [`Outcome`] exception protocol, string marshaling, warning routing, and the
//! environment guard. Nothing in this module knows about specific classes.

mod environment;
mod error;
mod handle;
mod marshal;
mod outcome;
mod warning;

#[cfg(test)]
pub(crate) mod test_support;

pub use environment::EnvironmentGuard;
pub use error::{ERROR_THRESHOLD, MagickError, NativeException};
pub use handle::{
    ConstNativeInstance, DisposeFn, HasNativeInstance, NativeHandle, NativeHelper, NativeInstance,
    RawException, RawHandle, ensure_created,
};
pub use marshal::{RelinquishFn, Utf8Marshaler};
pub use outcome::{ExceptionReader, NativeValue, Outcome};
pub use warning::{TracingWarningSink, WarningSink, Warnings, process_sink};
