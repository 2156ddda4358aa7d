//! The `extern "C"` table of one class.
//!
//! Declares every export the wrapper calls, in emission order: dispose,
//! create, property accessors, methods. Instance-side calls take the handle
//! first; throwing calls take the exception slot last.

use super::EmitOptions;
use super::strategy::{self, PostCall};
use super::writer::CodeWriter;
use crate::model::{ArgumentDescriptor, ClassDescriptor, Marshaling, TypeKind};
use crate::naming;

pub fn write_externs(w: &mut CodeWriter, class: &ClassDescriptor, options: &EmitOptions) {
    if !options.native_library.is_empty() {
        w.line(format!("#[link(name = \"{}\")]", options.native_library));
    }
    w.open("unsafe extern \"C\"");

    if class.emits_dispose() {
        w.line(format!(
            "fn {}(instance: RawHandle);",
            naming::dispose_export(&class.name)
        ));
    }

    if class.emits_constructor() {
        let params = parameters(false, &class.constructor.arguments, class.constructor.throws);
        w.line(format!(
            "fn {}({params}) -> RawHandle;",
            naming::create_export(&class.name)
        ));
    }

    for property in &class.properties {
        let plan = strategy::plan_property(class, property);
        let getter = parameters(plan.passes_instance, &[], property.throws);
        w.line(format!(
            "fn {}({getter}) -> {};",
            naming::getter_export(&class.name, &property.name),
            property.ty.native_name
        ));
        if plan.has_setter {
            let value = ArgumentDescriptor::input("value", property.ty.clone());
            let setter = parameters(plan.passes_instance, &[value], property.throws);
            w.line(format!(
                "fn {}({setter});",
                naming::setter_export(&class.name, &property.name)
            ));
        }
    }

    for method in &class.methods {
        let plan = strategy::plan_method(class, method);
        let params = parameters(plan.passes_instance, &method.arguments, method.throws);
        let export = naming::export_name(&class.name, &method.name);
        match plan.post {
            PostCall::Reseat => w.line(format!("fn {export}({params}) -> RawHandle;")),
            _ if method.return_type.is_void() => w.line(format!("fn {export}({params});")),
            _ => w.line(format!(
                "fn {export}({params}) -> {};",
                method.return_type.native_name
            )),
        }
    }

    if relinquishes_strings(class) {
        w.line(format!("fn {}(value: *mut c_void);", options.memory_relinquish));
    }

    w.close();
}

/// Whether any member returns a string the caller must release.
pub fn relinquishes_strings(class: &ClassDescriptor) -> bool {
    class
        .properties
        .iter()
        .map(|p| &p.ty)
        .chain(class.methods.iter().map(|m| &m.return_type))
        .any(|ty| ty.kind == TypeKind::NativeString)
}

fn parameters(instance: bool, arguments: &[ArgumentDescriptor], throws: bool) -> String {
    let mut params = Vec::with_capacity(arguments.len() + 2);
    if instance {
        params.push("instance: RawHandle".to_string());
    }
    for argument in arguments {
        params.push(format!(
            "{}: {}",
            naming::argument_ident(&argument.name),
            native_type(argument)
        ));
    }
    if throws {
        params.push("exception: *mut RawException".to_string());
    }
    params.join(", ")
}

/// FFI type of an argument.
pub fn native_type(argument: &ArgumentDescriptor) -> String {
    match argument.marshaling() {
        Marshaling::Value(_) | Marshaling::Pinned | Marshaling::PinnedMut => {
            argument.ty.native_name.clone()
        }
        // Native strings are returned as `*mut` but passed in as borrowed text.
        Marshaling::Utf8 => "*const c_char".to_string(),
        Marshaling::ValueOut => format!("*mut {}", argument.ty.native_name),
        Marshaling::Handle | Marshaling::CreateNative | Marshaling::CreateOut => {
            "RawHandle".to_string()
        }
    }
}
