//! Emission strategies as pure functions of descriptor flags.
//!
//! Every decision the instance emitter makes is taken here, once per member,
//! and returned as a plain value. The emitter only renders; `plan` output and
//! tests inspect the same values.

use crate::model::{ClassDescriptor, MethodDescriptor, PropertyDescriptor, TypeDescriptor, TypeKind, ValueCast};
use crate::naming;
use serde::Serialize;

/// How a returned native value becomes a managed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnStrategy {
    Void,
    /// Converted through the returned class's `create_managed`.
    Dynamic,
    /// Copied, then released with the native relinquish routine.
    NativeString,
    /// Copied; the native side keeps ownership.
    String,
    /// Wrapped by the managed type's `from_raw_handle` factory.
    OwnedInstance,
    /// Passed through with a cast.
    Value(ValueCast),
}

pub fn return_strategy(ty: &TypeDescriptor) -> ReturnStrategy {
    if ty.is_void() {
        return ReturnStrategy::Void;
    }
    if ty.converts_to_managed() {
        return ReturnStrategy::Dynamic;
    }
    match ty.kind {
        TypeKind::NativeString => ReturnStrategy::NativeString,
        TypeKind::String => ReturnStrategy::String,
        TypeKind::InstanceHandle if ty.has_instance => ReturnStrategy::OwnedInstance,
        _ => ReturnStrategy::Value(ty.cast),
    }
}

/// What happens to the raw result after the exception check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PostCall {
    /// A non-zero result replaces the wrapper's handle.
    Reseat,
    Return(ReturnStrategy),
}

/// Native call run on a partial result when a hard error aborts the member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupAction {
    /// A declared cleanup export, called with the result and extra arguments.
    Explicit { export: String, arguments: Vec<String> },
    /// The returned class's dispose routine.
    DisposeResult { native_struct: String },
}

/// Cleanup for a method: the declared one, else a default dispose when the
/// result owns an instance of another class, else none.
pub fn cleanup_action(class: &ClassDescriptor, method: &MethodDescriptor) -> Option<CleanupAction> {
    match &method.cleanup {
        Some(spec) => Some(CleanupAction::Explicit {
            export: naming::export_name(&class.name, &spec.name),
            arguments: spec.arguments.clone(),
        }),
        None if method.return_type.has_instance && method.return_type.managed_name != class.name => {
            Some(CleanupAction::DisposeResult {
                native_struct: naming::native_struct_name(&method.return_type.managed_name),
            })
        }
        None => None,
    }
}

/// Handling of the exception slot after the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionCheck {
    /// The member does not throw.
    None,
    Plain,
    /// Dispose a non-zero result through the class's own dispose routine.
    DisposeOnError,
    Cleanup(CleanupAction),
}

pub fn exception_check(class: &ClassDescriptor, method: &MethodDescriptor) -> ExceptionCheck {
    if !method.throws {
        return ExceptionCheck::None;
    }
    if let Some(cleanup) = cleanup_action(class, method) {
        return ExceptionCheck::Cleanup(cleanup);
    }
    if method.creates_instance && !class.is_const && class.emits_dispose() {
        return ExceptionCheck::DisposeOnError;
    }
    ExceptionCheck::Plain
}

/// Where warnings from a member go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningRoute {
    /// The wrapper's own sink.
    Instance,
    /// The process-wide sink.
    Process,
}

/// Receiver of a wrapper fn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Receiver {
    None,
    Ref,
    Mut,
}

impl Receiver {
    pub fn render(&self) -> Option<&'static str> {
        match self {
            Receiver::None => None,
            Receiver::Ref => Some("&self"),
            Receiver::Mut => Some("&mut self"),
        }
    }
}

/// Whether a method wrapper is an associated fn without `self`.
///
/// Throwing or instance-creating calls stay on the instance side even when the
/// native call is static, so their warnings and cleanup have a home.
pub fn method_is_static(class: &ClassDescriptor, method: &MethodDescriptor) -> bool {
    class.shape().is_stateless() || (method.is_static && !method.throws && !method.creates_instance)
}

/// Whether the native call's return value must be kept.
pub fn needs_result(method: &MethodDescriptor) -> bool {
    method.creates_instance
        || method.return_type.converts_to_managed()
        || !method.return_type.is_void()
}

pub fn warning_route(class: &ClassDescriptor) -> WarningRoute {
    if class.shape().is_stateless() {
        WarningRoute::Process
    } else {
        WarningRoute::Instance
    }
}

/// Everything the emitter needs to know about one method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodPlan {
    pub receiver: Receiver,
    pub passes_instance: bool,
    pub needs_result: bool,
    pub exception: ExceptionCheck,
    pub post: PostCall,
    pub ensure_created: bool,
    pub warnings: WarningRoute,
}

pub fn plan_method(class: &ClassDescriptor, method: &MethodDescriptor) -> MethodPlan {
    let is_static = method_is_static(class, method);
    let needs_result = needs_result(method);
    let post = if needs_result && method.return_type.is_void() {
        PostCall::Reseat
    } else {
        PostCall::Return(return_strategy(&method.return_type))
    };
    let receiver = match (is_static, post) {
        (true, _) => Receiver::None,
        (false, PostCall::Reseat) => Receiver::Mut,
        (false, _) => Receiver::Ref,
    };
    MethodPlan {
        receiver,
        passes_instance: passes_instance(class) && !method.is_static,
        needs_result,
        exception: exception_check(class, method),
        post,
        ensure_created: method.creates_instance
            && post != PostCall::Reseat
            && method.return_type.native_name == "RawHandle",
        warnings: warning_route(class),
    }
}

/// Everything the emitter needs to know about one property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyPlan {
    pub receiver: Receiver,
    pub passes_instance: bool,
    pub getter: ReturnStrategy,
    pub has_setter: bool,
    pub warnings: WarningRoute,
}

pub fn plan_property(class: &ClassDescriptor, property: &PropertyDescriptor) -> PropertyPlan {
    PropertyPlan {
        receiver: if class.shape().is_stateless() {
            Receiver::None
        } else {
            Receiver::Ref
        },
        passes_instance: passes_instance(class),
        getter: return_strategy(&property.ty),
        has_setter: !property.read_only,
        warnings: warning_route(class),
    }
}

fn passes_instance(class: &ClassDescriptor) -> bool {
    class.has_instance && !class.is_static
}
