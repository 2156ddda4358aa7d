//! The per-class native wrapper.
//!
//! Renders the `Native<Class>` struct and its impl block. Members appear in a
//! fixed order: environment hook, dispose, constructors, type name, base
//! accessors, properties, methods, conversions.
//!
//! Generated code relies on a small contract from the managed side:
//!
//! | Used for | Required item |
//! |----------|---------------|
//! | owned-instance arguments | `HasNativeInstance` on the managed type |
//! | owned-instance returns | `Y::from_raw_handle(RawHandle) -> Y` |
//! | native-to-managed conversion | `Y::from_native(&NativeY) -> Y` |
//! | managed-to-native conversion | `y.create_native_instance()`, or `Y::create_native_instance(&dyn IY)` for interface and quantum types, returning `Result<NativeHandle, MagickError>` |
//! | enums | `Copy`, `From<usize>`, and `usize: From<Enum>` |

use super::EmitOptions;
use super::strategy::{
    self, CleanupAction, ExceptionCheck, PostCall, Receiver, ReturnStrategy, WarningRoute,
};
use super::writer::CodeWriter;
use crate::model::{
    ArgumentDescriptor, ClassDescriptor, ClassShape, DynamicMode, Marshaling, MethodDescriptor,
    PropertyDescriptor, TypeDescriptor, ValueCast, call_scopes,
};
use crate::naming;

pub fn write_wrapper(w: &mut CodeWriter, class: &ClassDescriptor, options: &EmitOptions) {
    let emitter = Emitter { class, options };
    emitter.write_struct(w);
    w.blank();
    w.open(format!("impl {}", emitter.struct_name()));
    emitter.write_environment(w);
    emitter.write_dispose(w);
    emitter.write_constructors(w);
    emitter.write_type_name(w);
    emitter.write_base_accessors(w);
    for property in &class.properties {
        emitter.write_property(w, property);
    }
    for method in &class.methods {
        emitter.write_method(w, method);
    }
    emitter.write_conversions(w);
    w.close();
}

/// Base type backing a shape, if any.
fn base_type(shape: ClassShape) -> Option<&'static str> {
    match shape {
        ClassShape::Static | ClassShape::NativeStatic => None,
        ClassShape::Helper => Some("NativeHelper"),
        ClassShape::ConstInstance => Some("ConstNativeInstance"),
        ClassShape::OwnedInstance => Some("NativeInstance"),
    }
}

struct Emitter<'a> {
    class: &'a ClassDescriptor,
    options: &'a EmitOptions,
}

impl Emitter<'_> {
    fn struct_name(&self) -> String {
        naming::native_struct_name(&self.class.name)
    }

    fn initializes_environment(&self) -> bool {
        self.class.name != self.options.bootstrap_class
    }

    fn write_init_call(&self, w: &mut CodeWriter) {
        if self.initializes_environment() {
            w.line("Self::initialize_environment();");
        }
    }

    // ========================================================================
    // Struct and lifecycle
    // ========================================================================

    fn write_struct(&self, w: &mut CodeWriter) {
        w.line("#[derive(Debug)]");
        match base_type(self.class.shape()) {
            None => w.line(format!("pub struct {};", self.struct_name())),
            Some(base) => {
                w.open(format!("pub struct {}", self.struct_name()));
                w.line(format!("base: {base},"));
                w.close();
            }
        }
    }

    fn write_environment(&self, w: &mut CodeWriter) {
        if !self.initializes_environment() {
            return;
        }
        w.open("fn initialize_environment()");
        w.line(format!("{}();", self.options.environment_initializer));
        w.close();
    }

    fn write_dispose(&self, w: &mut CodeWriter) {
        if !self.class.emits_dispose() {
            return;
        }
        let export = naming::dispose_export(&self.class.name);

        w.blank();
        w.open("pub unsafe extern \"C\" fn dispose_raw(instance: RawHandle)");
        w.line(format!("unsafe {{ {export}(instance) }}"));
        w.close();

        if self.class.has_no_constructor {
            w.blank();
            w.line("/// # Safety");
            w.line("///");
            w.line("/// `instance` must be a live handle owned by the caller.");
            w.open("pub unsafe fn dispose_instance(instance: RawHandle)");
            w.line("unsafe { Self::dispose_raw(instance) }");
            w.close();
        }

        w.blank();
        w.open("pub fn dispose(&mut self)");
        w.line("self.base.dispose();");
        w.close();
    }

    fn write_constructors(&self, w: &mut CodeWriter) {
        let class = self.class;
        let shape = class.shape();

        if class.emits_constructor() {
            let constructor = &class.constructor;
            let params = managed_params(None, &constructor.arguments, self.options);
            w.blank();
            w.open(format!("pub fn new({params}) -> Result<Self, MagickError>"));
            self.write_init_call(w);
            w.open("let mut native = Self");
            w.line("base: NativeInstance::new(Self::dispose_raw, Self::TYPE_NAME),");
            w.close_with("};");
            write_scopes(w, &constructor.arguments);
            if constructor.throws {
                w.line("let mut exception: RawException = ptr::null_mut();");
            }
            let args = call_arguments(false, &constructor.arguments, constructor.throws);
            w.line(format!(
                "let result = unsafe {{ {}({args}) }};",
                naming::create_export(&class.name)
            ));
            if constructor.throws {
                self.write_capture(w, "result", Some("|result| Self::dispose_raw(result)".into()));
                w.line("let result = native.base.finish(outcome)?;");
            }
            w.line("native.base.reseat(ensure_created(result)?);");
            write_out_conversions(w, &constructor.arguments);
            w.line("Ok(native)");
            w.close();
        }

        if class.emits_native_constructor() {
            w.blank();
            w.open("pub fn from_raw(instance: RawHandle) -> Self");
            w.open("Self");
            if shape == ClassShape::ConstInstance {
                w.line("base: ConstNativeInstance::new(instance, Self::TYPE_NAME),");
            } else {
                w.line("base: NativeInstance::from_raw(instance, Self::dispose_raw, Self::TYPE_NAME),");
            }
            w.close();
            w.close();
        }

        if shape == ClassShape::Helper {
            w.blank();
            w.open("pub fn new() -> Self");
            self.write_init_call(w);
            w.open("Self");
            w.line("base: NativeHelper::new(),");
            w.close();
            w.close();
        }
    }

    fn write_type_name(&self, w: &mut CodeWriter) {
        if !self.class.has_instance {
            return;
        }
        w.blank();
        w.line(format!(
            "pub const TYPE_NAME: &'static str = \"{}\";",
            self.class.name
        ));
    }

    fn write_base_accessors(&self, w: &mut CodeWriter) {
        let Some(base) = base_type(self.class.shape()) else {
            return;
        };
        w.blank();
        w.open(format!("pub fn base(&self) -> &{base}"));
        w.line("&self.base");
        w.close();
        w.blank();
        w.open(format!("pub fn base_mut(&mut self) -> &mut {base}"));
        w.line("&mut self.base");
        w.close();
    }

    // ========================================================================
    // Members
    // ========================================================================

    fn write_property(&self, w: &mut CodeWriter, property: &PropertyDescriptor) {
        let plan = strategy::plan_property(self.class, property);
        let (getter, setter) = naming::property_fns(&property.name);
        let returns = managed_return(plan.getter, &property.ty, false);

        w.blank();
        w.open(format!(
            "pub fn {getter}({}) -> Result<{returns}, MagickError>",
            plan.receiver.render().unwrap_or_default()
        ));
        if plan.receiver == Receiver::None {
            self.write_init_call(w);
        }
        if plan.passes_instance {
            w.line("let instance = self.base.instance()?;");
        }
        if property.throws {
            w.line("let mut exception: RawException = ptr::null_mut();");
        }
        let args = call_arguments(plan.passes_instance, &[], property.throws);
        w.line(format!(
            "let result = unsafe {{ {}({args}) }};",
            naming::getter_export(&self.class.name, &property.name)
        ));
        if property.throws {
            self.write_capture(w, "result", None);
            w.line(format!("let result = {}?;", finish(plan.warnings, "self")));
        }
        w.line(format!(
            "Ok({})",
            return_expr(plan.getter, &property.ty, false, self.options)
        ));
        w.close();

        if !plan.has_setter {
            return;
        }
        let value = [ArgumentDescriptor::input("value", property.ty.clone())];
        let receiver = match plan.receiver {
            Receiver::None => None,
            _ => Some("&mut self"),
        };
        w.blank();
        w.open(format!(
            "pub fn {setter}({}) -> Result<(), MagickError>",
            managed_params(receiver, &value, self.options)
        ));
        if receiver.is_none() {
            self.write_init_call(w);
        }
        if plan.passes_instance {
            w.line("let instance = self.base.instance()?;");
        }
        write_scopes(w, &value);
        if property.throws {
            w.line("let mut exception: RawException = ptr::null_mut();");
        }
        let args = call_arguments(plan.passes_instance, &value, property.throws);
        w.line(format!(
            "unsafe {{ {}({args}) }};",
            naming::setter_export(&self.class.name, &property.name)
        ));
        if property.throws {
            self.write_capture(w, "()", None);
            w.line(format!("{}?;", finish(plan.warnings, "self")));
        }
        w.line("Ok(())");
        w.close();
    }

    fn write_method(&self, w: &mut CodeWriter, method: &MethodDescriptor) {
        let plan = strategy::plan_method(self.class, method);
        let returns = match plan.post {
            PostCall::Reseat => "()".to_string(),
            PostCall::Return(strategy) => {
                managed_return(strategy, &method.return_type, plan.ensure_created)
            }
        };

        w.blank();
        w.open(format!(
            "pub fn {}({}) -> Result<{returns}, MagickError>",
            naming::fn_ident(&method.name),
            managed_params(plan.receiver.render(), &method.arguments, self.options)
        ));
        if plan.receiver == Receiver::None {
            self.write_init_call(w);
        }
        if plan.passes_instance {
            w.line("let instance = self.base.instance()?;");
        }
        write_scopes(w, &method.arguments);
        if method.throws {
            w.line("let mut exception: RawException = ptr::null_mut();");
        }

        let call = format!(
            "{}({})",
            naming::export_name(&self.class.name, &method.name),
            call_arguments(plan.passes_instance, &method.arguments, method.throws)
        );
        if plan.needs_result {
            w.line(format!("let result = unsafe {{ {call} }};"));
        } else {
            w.line(format!("unsafe {{ {call} }};"));
        }

        if method.throws {
            let value = if plan.needs_result { "result" } else { "()" };
            let cleanup = match &plan.exception {
                ExceptionCheck::DisposeOnError => Some("|result| Self::dispose_raw(result)".into()),
                ExceptionCheck::Cleanup(action) => Some(cleanup_closure(action, method)),
                ExceptionCheck::Plain | ExceptionCheck::None => None,
            };
            self.write_capture(w, value, cleanup);
            let finish = finish(plan.warnings, "self");
            if plan.needs_result {
                w.line(format!("let result = {finish}?;"));
            } else {
                w.line(format!("{finish}?;"));
            }
        }
        if plan.ensure_created {
            w.line("let result = ensure_created(result)?;");
        }
        write_out_conversions(w, &method.arguments);

        match plan.post {
            PostCall::Reseat => {
                w.open("if !result.is_null()");
                w.line("self.base.reseat(result);");
                w.close();
                w.line("Ok(())");
            }
            PostCall::Return(strategy) => w.line(format!(
                "Ok({})",
                return_expr(strategy, &method.return_type, plan.ensure_created, self.options)
            )),
        }
        w.close();
    }

    /// `let outcome = ...` for the exception slot, with an optional cleanup.
    fn write_capture(&self, w: &mut CodeWriter, value: &str, cleanup: Option<String>) {
        let reader = &self.options.exception_reader;
        w.open("let outcome = unsafe");
        match cleanup {
            None => w.line(format!("Outcome::capture::<{reader}>({value}, exception)")),
            Some(cleanup) => w.line(format!(
                "Outcome::capture_or_cleanup::<{reader}, _>({value}, exception, {cleanup})"
            )),
        }
        w.close_with("};");
    }

    // ========================================================================
    // Conversions
    // ========================================================================

    fn write_conversions(&self, w: &mut CodeWriter) {
        let class = self.class;
        if !class.emits_conversions() {
            return;
        }
        let interface = class.has_interface || class.is_quantum_type;

        if class.dynamic_mode.contains(DynamicMode::MANAGED_TO_NATIVE) {
            let param = if interface {
                format!("Option<&dyn {}>", class.managed_name(&self.options.quantum))
            } else {
                format!("Option<&{}>", class.name)
            };
            w.blank();
            w.open(format!(
                "pub fn create_instance(instance: {param}) -> Result<NativeHandle, MagickError>"
            ));
            w.open("let Some(instance) = instance else");
            w.line("return Ok(NativeHandle::zero());");
            w.close_with("};");
            if interface {
                w.line(format!("{}::create_native_instance(instance)", class.name));
            } else {
                w.line("instance.create_native_instance()");
            }
            w.close();
        }

        if class.dynamic_mode.contains(DynamicMode::NATIVE_TO_MANAGED) {
            w.blank();
            w.open(format!(
                "pub fn create_managed(instance: RawHandle) -> Option<{}>",
                class.name
            ));
            w.open("if instance.is_null()");
            w.line("return None;");
            w.close();
            w.line("let native = Self::from_raw(instance);");
            w.line(format!("Some({}::from_native(&native))", class.name));
            w.close();
        }
    }
}

fn finish(route: WarningRoute, owner: &str) -> String {
    match route {
        WarningRoute::Instance => format!("{owner}.base.finish(outcome)"),
        WarningRoute::Process => "outcome.into_result(process_sink())".to_string(),
    }
}

fn cleanup_closure(action: &CleanupAction, method: &MethodDescriptor) -> String {
    match action {
        CleanupAction::Explicit { export, arguments } => {
            let mut args = vec!["result".to_string()];
            args.extend(arguments.iter().map(|a| cleanup_argument(a, method)));
            format!("|result| {export}({})", args.join(", "))
        }
        CleanupAction::DisposeResult { native_struct } => {
            format!("|result| {native_struct}::dispose_raw(result)")
        }
    }
}

/// A cleanup argument naming a method argument reads its native form after the
/// call. Anything else is emitted verbatim.
fn cleanup_argument(expression: &str, method: &MethodDescriptor) -> String {
    let Some(argument) = method.arguments.iter().find(|a| a.name == expression) else {
        return expression.to_string();
    };
    let ident = naming::argument_ident(&argument.name);
    match argument.marshaling() {
        Marshaling::ValueOut => format!("*{ident}"),
        Marshaling::Handle => format!("{ident}.native_instance().unwrap_or(ptr::null_mut())"),
        _ => call_argument(argument),
    }
}

// ============================================================================
// Arguments
// ============================================================================

/// Managed parameter list, receiver first.
fn managed_params(
    receiver: Option<&str>,
    arguments: &[ArgumentDescriptor],
    options: &EmitOptions,
) -> String {
    receiver
        .map(str::to_string)
        .into_iter()
        .chain(arguments.iter().map(|argument| {
            format!(
                "{}: {}",
                naming::argument_ident(&argument.name),
                managed_param_type(argument, options)
            )
        }))
        .collect::<Vec<_>>()
        .join(", ")
}

fn managed_param_type(argument: &ArgumentDescriptor, options: &EmitOptions) -> String {
    let ty = &argument.ty;
    match argument.marshaling() {
        Marshaling::Value(_) => ty.managed_name.clone(),
        Marshaling::ValueOut => format!("&mut {}", ty.managed_name),
        Marshaling::Utf8 => "&str".to_string(),
        Marshaling::Pinned => format!("&[{}]", ty.managed_name),
        Marshaling::PinnedMut => format!("&mut [{}]", ty.managed_name),
        Marshaling::CreateNative if ty.has_interface || ty.is_quantum_type => {
            format!("Option<&dyn {}>", ty.interface_name(&options.quantum))
        }
        Marshaling::CreateNative => format!("Option<&{}>", ty.managed_name),
        Marshaling::Handle => format!("&{}", ty.managed_name),
        Marshaling::CreateOut => format!("&mut Option<{}>", ty.managed_name),
    }
}

/// Open one helper local per scoped argument, in declaration order.
fn write_scopes(w: &mut CodeWriter, arguments: &[ArgumentDescriptor]) {
    for scope in call_scopes(arguments) {
        let argument = &arguments[scope.index];
        let ident = naming::argument_ident(&argument.name);
        match scope.marshaling {
            Marshaling::Utf8 => w.line(format!(
                "let {} = Utf8Marshaler::managed_to_native({ident})?;",
                naming::helper_local(&argument.name, "native")
            )),
            Marshaling::Pinned => w.line(format!(
                "let {} = {ident}.as_ptr();",
                naming::helper_local(&argument.name, "fixed")
            )),
            Marshaling::PinnedMut => w.line(format!(
                "let {} = {ident}.as_mut_ptr();",
                naming::helper_local(&argument.name, "fixed")
            )),
            Marshaling::CreateNative => w.line(format!(
                "let {} = {}::create_instance({ident})?;",
                naming::helper_local(&argument.name, "native"),
                naming::native_struct_name(&argument.ty.managed_name)
            )),
            Marshaling::CreateOut => {
                let native = naming::helper_local(&argument.name, "native");
                w.line(format!(
                    "let {native} = {}::new()?;",
                    naming::native_struct_name(&argument.ty.managed_name)
                ));
                w.line(format!(
                    "let {} = {native}.base().instance()?;",
                    naming::helper_local(&argument.name, "native_out")
                ));
            }
            Marshaling::Value(_) | Marshaling::ValueOut | Marshaling::Handle => {}
        }
    }
}

/// Convert pre-allocated out instances back after a successful call.
fn write_out_conversions(w: &mut CodeWriter, arguments: &[ArgumentDescriptor]) {
    for argument in arguments {
        if argument.marshaling() != Marshaling::CreateOut {
            continue;
        }
        w.line(format!(
            "*{} = Some({}::from_native(&{}));",
            naming::argument_ident(&argument.name),
            argument.ty.managed_name,
            naming::helper_local(&argument.name, "native")
        ));
    }
}

fn call_arguments(instance: bool, arguments: &[ArgumentDescriptor], throws: bool) -> String {
    let mut args = Vec::with_capacity(arguments.len() + 2);
    if instance {
        args.push("instance".to_string());
    }
    args.extend(arguments.iter().map(call_argument));
    if throws {
        args.push("&mut exception".to_string());
    }
    args.join(", ")
}

fn call_argument(argument: &ArgumentDescriptor) -> String {
    let ident = naming::argument_ident(&argument.name);
    match argument.marshaling() {
        Marshaling::Value(ValueCast::Identity) | Marshaling::ValueOut => ident,
        Marshaling::Value(ValueCast::Enum) => format!("usize::from({ident})"),
        Marshaling::Utf8 => format!("{}.as_ptr()", naming::helper_local(&argument.name, "native")),
        Marshaling::Pinned | Marshaling::PinnedMut => naming::helper_local(&argument.name, "fixed"),
        Marshaling::CreateNative => {
            format!("{}.raw()", naming::helper_local(&argument.name, "native"))
        }
        Marshaling::Handle => format!("{ident}.native_instance()?"),
        Marshaling::CreateOut => naming::helper_local(&argument.name, "native_out"),
    }
}

// ============================================================================
// Returns
// ============================================================================

fn managed_return(strategy: ReturnStrategy, ty: &TypeDescriptor, ensured: bool) -> String {
    match strategy {
        ReturnStrategy::Void => "()".to_string(),
        ReturnStrategy::Dynamic => format!("Option<{}>", ty.managed_name),
        ReturnStrategy::NativeString | ReturnStrategy::String => "Option<String>".to_string(),
        ReturnStrategy::OwnedInstance if ensured => ty.managed_name.clone(),
        ReturnStrategy::OwnedInstance => format!("Option<{}>", ty.managed_name),
        ReturnStrategy::Value(ValueCast::Identity) => ty.native_name.clone(),
        ReturnStrategy::Value(ValueCast::Enum) => ty.managed_name.clone(),
    }
}

fn return_expr(
    strategy: ReturnStrategy,
    ty: &TypeDescriptor,
    ensured: bool,
    options: &EmitOptions,
) -> String {
    match strategy {
        ReturnStrategy::Void => "()".to_string(),
        ReturnStrategy::Dynamic => format!(
            "{}::create_managed(result)",
            naming::native_struct_name(&ty.managed_name)
        ),
        ReturnStrategy::NativeString => format!(
            "unsafe {{ Utf8Marshaler::native_to_managed_and_relinquish(result, {}) }}",
            options.memory_relinquish
        ),
        ReturnStrategy::String => "unsafe { Utf8Marshaler::native_to_managed(result) }".to_string(),
        ReturnStrategy::OwnedInstance if ensured => {
            format!("{}::from_raw_handle(result)", ty.managed_name)
        }
        ReturnStrategy::OwnedInstance => format!(
            "(!result.is_null()).then(|| {}::from_raw_handle(result))",
            ty.managed_name
        ),
        ReturnStrategy::Value(ValueCast::Identity) => "result".to_string(),
        ReturnStrategy::Value(ValueCast::Enum) => format!("{}::from(result)", ty.managed_name),
    }
}
