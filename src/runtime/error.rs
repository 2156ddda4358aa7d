//! Native exception decoding and the error type surfaced by generated wrappers.
//!
//! ImageMagick reports every failure through an exception record carrying a
//! numeric severity. Codes below [`ERROR_THRESHOLD`] are warnings: the call
//! succeeded with an advisory. Codes at or above it are hard errors.

use std::fmt;
use thiserror::Error;

/// Severity codes at or above this value are hard errors.
pub const ERROR_THRESHOLD: u32 = 400;

/// A decoded native exception record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeException {
    pub severity: u32,
    pub message: String,
    pub description: Option<String>,
}

impl NativeException {
    /// Build an exception record, substituting a diagnostic when the native
    /// side supplied an empty message.
    pub fn new(severity: u32, message: impl Into<String>, description: Option<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            format!("native call failed with severity {severity}")
        } else {
            message
        };
        let description = description.filter(|d| !d.trim().is_empty());
        Self {
            severity,
            message,
            description,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity >= ERROR_THRESHOLD
    }

    pub fn is_warning(&self) -> bool {
        !self.is_error()
    }
}

impl fmt::Display for NativeException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(description) => write!(f, "{} ({})", self.message, description),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Errors raised by generated wrappers and the runtime around them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MagickError {
    #[error("{0}")]
    Native(NativeException),
    #[error("Cannot access a disposed {0} instance")]
    Disposed(&'static str),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("String argument contains an interior nul byte at position {0}")]
    InteriorNul(usize),
}

impl MagickError {
    /// The native exception behind this error, if it came from the native side.
    pub fn native(&self) -> Option<&NativeException> {
        match self {
            MagickError::Native(exception) => Some(exception),
            _ => None,
        }
    }
}

impl From<NativeException> for MagickError {
    fn from(exception: NativeException) -> Self {
        MagickError::Native(exception)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_threshold_splits_warnings_and_errors() {
        assert!(NativeException::new(300, "corrupt profile", None).is_warning());
        assert!(NativeException::new(399, "warning", None).is_warning());
        assert!(NativeException::new(400, "error", None).is_error());
        assert!(NativeException::new(700, "fatal", None).is_error());
    }

    #[test]
    fn empty_message_gets_diagnostic() {
        let exception = NativeException::new(425, "  ", None);
        assert_eq!(exception.message, "native call failed with severity 425");
        assert!(!MagickError::Native(exception).to_string().is_empty());
    }

    #[test]
    fn display_includes_description() {
        let exception = NativeException::new(
            425,
            "unable to open image",
            Some("No such file or directory".to_string()),
        );
        assert_eq!(
            exception.to_string(),
            "unable to open image (No such file or directory)"
        );
    }

    #[test]
    fn blank_description_dropped() {
        let exception = NativeException::new(425, "boom", Some(String::new()));
        assert_eq!(exception.description, None);
        assert_eq!(exception.to_string(), "boom");
    }

    #[test]
    fn disposed_message_names_type() {
        let err = MagickError::Disposed("MagickImage");
        assert_eq!(
            err.to_string(),
            "Cannot access a disposed MagickImage instance"
        );
        assert!(err.native().is_none());
    }
}
