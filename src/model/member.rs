//! Member descriptors: constructors, properties, and methods of a native class.
//!
//! Besides the plain data, this module owns the argument marshaling order.
//! Arguments that need a helper around the native call (an encoded string, a
//! pinned buffer, a native instance built from a managed value, or a
//! pre-allocated out instance) open a scope in declaration order. Scopes close
//! in reverse order once the call and its post-processing are done:
//!
//! ```text
//! {                       // arg 0: CreateNative
//!     {                   // arg 2: Pinned
//!         native call
//!         post-call
//!     }                   // arg 2 released
//! }                       // arg 0 released
//! ```

use super::types::{TypeDescriptor, TypeKind, ValueCast};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    In,
    Out,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArgumentDescriptor {
    pub name: String,
    pub ty: TypeDescriptor,
    pub direction: Direction,
}

impl ArgumentDescriptor {
    pub fn input(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
            direction: Direction::In,
        }
    }

    pub fn output(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
            direction: Direction::Out,
        }
    }

    pub fn is_out(&self) -> bool {
        self.direction == Direction::Out
    }

    /// How this argument is carried across the call.
    pub fn marshaling(&self) -> Marshaling {
        match (self.direction, self.ty.kind) {
            (Direction::Out, TypeKind::InstanceHandle) => Marshaling::CreateOut,
            (Direction::Out, _) => Marshaling::ValueOut,
            (Direction::In, TypeKind::String | TypeKind::NativeString) => Marshaling::Utf8,
            (Direction::In, TypeKind::FixedBuffer) => Marshaling::Pinned,
            (Direction::In, TypeKind::WritableBuffer) => Marshaling::PinnedMut,
            (Direction::In, TypeKind::InstanceHandle) if self.ty.converts_to_native() => {
                Marshaling::CreateNative
            }
            (Direction::In, TypeKind::InstanceHandle) => Marshaling::Handle,
            (Direction::In, TypeKind::Value | TypeKind::Void) => Marshaling::Value(self.ty.cast),
        }
    }

    /// Whether an `out` argument of this type can be emitted.
    pub fn out_supported(&self) -> bool {
        match self.ty.kind {
            TypeKind::Value => self.ty.cast == ValueCast::Identity,
            TypeKind::InstanceHandle => self.ty.converts_to_managed(),
            _ => false,
        }
    }
}

/// Per-argument marshaling strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Marshaling {
    /// Passed by value with the given cast.
    Value(ValueCast),
    /// Written through a `&mut` of an identity-cast value.
    ValueOut,
    /// Raw handle of a managed object that already holds one.
    Handle,
    /// Encoded to a nul-terminated UTF-8 buffer for the call.
    Utf8,
    /// Slice pointer, valid for the call.
    Pinned,
    /// Mutable slice pointer the native side may write through, valid for the call.
    PinnedMut,
    /// Native instance created from the managed value for the call.
    CreateNative,
    /// Native instance allocated before the call, converted back after it.
    CreateOut,
}

impl Marshaling {
    /// Whether the argument opens a helper scope around the call.
    pub fn is_scoped(&self) -> bool {
        matches!(
            self,
            Marshaling::Utf8
                | Marshaling::Pinned
                | Marshaling::PinnedMut
                | Marshaling::CreateNative
                | Marshaling::CreateOut
        )
    }
}

/// A helper scope opened for one argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallScope {
    pub index: usize,
    pub marshaling: Marshaling,
}

/// Helper scopes in opening order. Close them in reverse.
pub fn call_scopes(arguments: &[ArgumentDescriptor]) -> Vec<CallScope> {
    arguments
        .iter()
        .enumerate()
        .map(|(index, argument)| CallScope {
            index,
            marshaling: argument.marshaling(),
        })
        .filter(|scope| scope.marshaling.is_scoped())
        .collect()
}

/// A native de-allocation call run on a partial result after a hard error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupSpec {
    pub name: String,
    /// Extra argument expressions appended after the raw result.
    pub arguments: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConstructorDescriptor {
    pub arguments: Vec<ArgumentDescriptor>,
    pub throws: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyDescriptor {
    pub name: String,
    pub ty: TypeDescriptor,
    pub throws: bool,
    pub read_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDescriptor {
    pub name: String,
    pub arguments: Vec<ArgumentDescriptor>,
    pub return_type: TypeDescriptor,
    pub throws: bool,
    pub creates_instance: bool,
    pub is_static: bool,
    pub cleanup: Option<CleanupSpec>,
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
            return_type: TypeDescriptor::void(),
            throws: false,
            creates_instance: false,
            is_static: false,
            cleanup: None,
        }
    }

    /// Construction-style method: the call returns a handle that replaces the
    /// class's own.
    pub fn reseats_instance(&self) -> bool {
        self.creates_instance && self.return_type.is_void()
    }
}

/// Common view of members that take arguments.
pub trait Member {
    fn arguments(&self) -> &[ArgumentDescriptor];
    fn throws(&self) -> bool;

    fn declares_argument(&self, name: &str) -> bool {
        self.arguments().iter().any(|a| a.name == name)
    }
}

impl Member for ConstructorDescriptor {
    fn arguments(&self) -> &[ArgumentDescriptor] {
        &self.arguments
    }

    fn throws(&self) -> bool {
        self.throws
    }
}

impl Member for MethodDescriptor {
    fn arguments(&self) -> &[ArgumentDescriptor] {
        &self.arguments
    }

    fn throws(&self) -> bool {
        self.throws
    }
}
