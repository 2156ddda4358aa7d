//! Descriptor model: what the emission engine consumes.
//!
//! ```text
//! TypeDescriptor  <-  ArgumentDescriptor / PropertyDescriptor / MethodDescriptor
//!                                 |
//!                          ClassDescriptor  ->  emit
//! ```
//!
//! Descriptors are built once per generation run (see [`crate::schema`]) and
//! never mutated afterwards. [`ClassDescriptor::validate`] is the gate: the
//! emission engine refuses classes that fail it.

pub mod class;
pub mod member;
pub mod types;

pub use class::{ClassDescriptor, ClassShape, DynamicMode};
pub use member::{
    ArgumentDescriptor, CallScope, CleanupSpec, ConstructorDescriptor, Direction, Marshaling,
    Member, MethodDescriptor, PropertyDescriptor, call_scopes,
};
pub use types::{ClassTypeInfo, TypeDescriptor, TypeKind, TypeTable, ValueCast};

use thiserror::Error;

/// A descriptor the engine cannot lower without undefined behavior.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("{class}: a static class cannot hold a native instance")]
    StaticWithInstance { class: String },
    #[error("{class}: dynamic conversion requires an owned native instance")]
    DynamicWithoutInstance { class: String },
    #[error("{class}: native-to-managed conversion requires hasNativeConstructor")]
    MissingNativeConstructor { class: String },
    #[error("{class}: member '{member}' is declared more than once")]
    DuplicateMember { class: String, member: String },
    #[error("{class}.{member}: generated fn '{ident}' collides with another fn of the wrapper")]
    NameCollision {
        class: String,
        member: String,
        ident: String,
    },
    #[error("{class}.{member}: argument '{argument}' is declared more than once")]
    DuplicateArgument {
        class: String,
        member: String,
        argument: String,
    },
    #[error("{class}.{member}: type '{ty}' is not supported here")]
    UnsupportedType {
        class: String,
        member: String,
        ty: String,
    },
    #[error("{class}.{member}: out argument '{argument}' has no supported marshaling")]
    UnsupportedOut {
        class: String,
        member: String,
        argument: String,
    },
    #[error("{class}.{member}: re-seating the instance requires an owned native instance")]
    ReseatWithoutInstance { class: String, member: String },
    #[error("{class}.{member}: a cleanup call needs a throwing member")]
    CleanupWithoutThrows { class: String, member: String },
    #[error("{class}.{member}: cleanup '{cleanup}' is not a static, non-throwing method of the class")]
    UnknownCleanup {
        class: String,
        member: String,
        cleanup: String,
    },
    #[error("{class}.{member}: argument 'exception' collides with the exception slot")]
    ExceptionSlotConflict { class: String, member: String },
}
