//! Type descriptors: how a schema type crosses the native boundary.
//!
//! Classification is a pure function of the type name and a [`TypeTable`]
//! listing the schema's classes and enums:
//!
//! | Schema name | Kind | Managed (Rust) | Native (FFI) |
//! |-------------|------|----------------|--------------|
//! | `void` | Void | `()` | `()` |
//! | `int`, `size_t`, `double`, ... | Value | `i32`, `usize`, `f64` | same |
//! | `QuantumType` | Value | configured quantum | same |
//! | `IntPtr` | Value | `RawHandle` | `RawHandle` |
//! | declared enum | Value (enum cast) | enum name | `usize` |
//! | `string` | String | `String` | `*const c_char` |
//! | `NativeString` | NativeString | `String` | `*mut c_char` |
//! | `byte[]`, `ReadOnlySpan<double>` | FixedBuffer | `&[u8]`, `&[f64]` | `*const u8` |
//! | `Span<byte>` | WritableBuffer | `&mut [u8]` | `*mut u8` |
//! | schema class | InstanceHandle | class name | `RawHandle` |
//!
//! `has_instance` is only ever set on InstanceHandle types, and only when the
//! referenced class owns its handle (not const, not static).

use super::class::DynamicMode;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Marshaling shape of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Value,
    String,
    NativeString,
    /// Slice the native side only reads.
    FixedBuffer,
    /// Slice the native side fills.
    WritableBuffer,
    InstanceHandle,
    Void,
}

/// Conversion applied to a value between its managed and native forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueCast {
    Identity,
    /// Enums travel as `usize`.
    Enum,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDescriptor {
    /// Name as written in the schema.
    pub schema_name: String,
    /// Rust type on the wrapper side. For fixed buffers, the element type.
    pub managed_name: String,
    /// Rust type in the `extern "C"` declaration.
    pub native_name: String,
    pub kind: TypeKind,
    pub cast: ValueCast,
    pub has_instance: bool,
    pub is_quantum_type: bool,
    pub has_interface: bool,
    pub dynamic_mode: DynamicMode,
}

impl TypeDescriptor {
    pub fn void() -> Self {
        Self::plain("void", "()", "()", TypeKind::Void)
    }

    pub fn value(schema_name: &str, rust_name: &str) -> Self {
        Self::plain(schema_name, rust_name, rust_name, TypeKind::Value)
    }

    fn plain(schema_name: &str, managed: &str, native: &str, kind: TypeKind) -> Self {
        Self {
            schema_name: schema_name.to_string(),
            managed_name: managed.to_string(),
            native_name: native.to_string(),
            kind,
            cast: ValueCast::Identity,
            has_instance: false,
            is_quantum_type: false,
            has_interface: false,
            dynamic_mode: DynamicMode::empty(),
        }
    }

    pub fn is_void(&self) -> bool {
        self.kind == TypeKind::Void
    }

    pub fn is_buffer(&self) -> bool {
        matches!(self.kind, TypeKind::FixedBuffer | TypeKind::WritableBuffer)
    }

    pub fn is_string(&self) -> bool {
        matches!(self.kind, TypeKind::String | TypeKind::NativeString)
    }

    /// Instance type converted into a managed wrapper when returned.
    pub fn converts_to_managed(&self) -> bool {
        self.kind == TypeKind::InstanceHandle
            && self.dynamic_mode.contains(DynamicMode::NATIVE_TO_MANAGED)
    }

    /// Instance type built from a managed value when passed in.
    pub fn converts_to_native(&self) -> bool {
        self.kind == TypeKind::InstanceHandle
            && self.dynamic_mode.contains(DynamicMode::MANAGED_TO_NATIVE)
    }

    /// Managed name as seen by callers: `IMagickColor<f32>`, `IMagickGeometry`,
    /// or the plain class name.
    pub fn interface_name(&self, quantum: &str) -> String {
        interface_name(&self.managed_name, self.is_quantum_type, self.has_interface, quantum)
    }
}

/// `I<Name><Quantum>` for quantum types, `I<Name>` for interface types.
pub fn interface_name(name: &str, is_quantum_type: bool, has_interface: bool, quantum: &str) -> String {
    if is_quantum_type {
        format!("I{name}<{quantum}>")
    } else if has_interface {
        format!("I{name}")
    } else {
        name.to_string()
    }
}

// ============================================================================
// Type table
// ============================================================================

/// What classification needs to know about a schema class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClassTypeInfo {
    pub owns_instance: bool,
    pub has_interface: bool,
    pub is_quantum_type: bool,
    pub dynamic_mode: DynamicMode,
}

const VALUE_TYPES: &[(&str, &str)] = &[
    ("bool", "bool"),
    ("byte", "u8"),
    ("sbyte", "i8"),
    ("short", "i16"),
    ("ushort", "u16"),
    ("int", "i32"),
    ("uint", "u32"),
    ("long", "i64"),
    ("ulong", "u64"),
    ("size_t", "usize"),
    ("ssize_t", "isize"),
    ("float", "f32"),
    ("double", "f64"),
    ("IntPtr", "RawHandle"),
];

/// Names resolvable in a schema.
#[derive(Debug, Clone)]
pub struct TypeTable {
    classes: BTreeMap<String, ClassTypeInfo>,
    enums: BTreeSet<String>,
    quantum: String,
}

impl TypeTable {
    pub fn new(quantum: impl Into<String>) -> Self {
        Self {
            classes: BTreeMap::new(),
            enums: BTreeSet::new(),
            quantum: quantum.into(),
        }
    }

    pub fn insert_class(&mut self, name: impl Into<String>, info: ClassTypeInfo) {
        self.classes.insert(name.into(), info);
    }

    pub fn insert_enum(&mut self, name: impl Into<String>) {
        self.enums.insert(name.into());
    }

    pub fn quantum(&self) -> &str {
        &self.quantum
    }

    /// Classify a schema type name. `None` if the name is not resolvable.
    pub fn classify(&self, name: &str) -> Option<TypeDescriptor> {
        let name = name.trim();
        if name == "void" {
            return Some(TypeDescriptor::void());
        }
        if let Some(value) = self.classify_value(name) {
            return Some(value);
        }
        match name {
            "string" => {
                return Some(TypeDescriptor::plain(
                    name,
                    "String",
                    "*const c_char",
                    TypeKind::String,
                ));
            }
            "NativeString" => {
                return Some(TypeDescriptor::plain(
                    name,
                    "String",
                    "*mut c_char",
                    TypeKind::NativeString,
                ));
            }
            _ => {}
        }
        if let Some((element, writable)) = buffer_element(name) {
            let element = self.classify_value(element)?;
            if element.cast != ValueCast::Identity || element.managed_name == "RawHandle" {
                return None;
            }
            let (pointer, kind) = if writable {
                ("*mut", TypeKind::WritableBuffer)
            } else {
                ("*const", TypeKind::FixedBuffer)
            };
            return Some(TypeDescriptor::plain(
                name,
                &element.managed_name,
                &format!("{pointer} {}", element.native_name),
                kind,
            ));
        }
        if let Some(info) = self.classes.get(name) {
            let mut descriptor =
                TypeDescriptor::plain(name, name, "RawHandle", TypeKind::InstanceHandle);
            descriptor.has_instance = info.owns_instance;
            descriptor.has_interface = info.has_interface;
            descriptor.is_quantum_type = info.is_quantum_type;
            descriptor.dynamic_mode = info.dynamic_mode;
            return Some(descriptor);
        }
        None
    }

    fn classify_value(&self, name: &str) -> Option<TypeDescriptor> {
        if name == "QuantumType" {
            return Some(TypeDescriptor::value(name, &self.quantum));
        }
        if let Some((_, rust)) = VALUE_TYPES.iter().find(|(schema, _)| *schema == name) {
            return Some(TypeDescriptor::value(name, rust));
        }
        if self.enums.contains(name) {
            let mut descriptor = TypeDescriptor::plain(name, name, "usize", TypeKind::Value);
            descriptor.cast = ValueCast::Enum;
            return Some(descriptor);
        }
        None
    }
}

/// Element name of `T[]`, `ReadOnlySpan<T>` or `Span<T>`, and whether the
/// native side writes through the buffer (`Span<T>` only).
fn buffer_element(name: &str) -> Option<(&str, bool)> {
    if let Some(element) = name.strip_suffix("[]") {
        return Some((element.trim(), false));
    }
    if let Some(rest) = name.strip_prefix("ReadOnlySpan<") {
        return rest.strip_suffix('>').map(|element| (element.trim(), false));
    }
    name.strip_prefix("Span<")
        .and_then(|rest| rest.strip_suffix('>'))
        .map(|element| (element.trim(), true))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TypeTable {
        let mut table = TypeTable::new("f32");
        table.insert_class(
            "MagickGeometry",
            ClassTypeInfo {
                owns_instance: true,
                has_interface: true,
                dynamic_mode: DynamicMode::all(),
                ..Default::default()
            },
        );
        table.insert_class(
            "MagickColor",
            ClassTypeInfo {
                owns_instance: true,
                is_quantum_type: true,
                dynamic_mode: DynamicMode::MANAGED_TO_NATIVE,
                ..Default::default()
            },
        );
        table.insert_class("MagickFormatInfo", ClassTypeInfo::default());
        table.insert_enum("ColorSpace");
        table
    }

    #[test]
    fn classifies_void() {
        let ty = table().classify("void").unwrap();
        assert_eq!(ty.kind, TypeKind::Void);
        assert!(ty.is_void());
        assert!(!ty.has_instance);
    }

    #[test]
    fn classifies_values() {
        let table = table();
        let size = table.classify("size_t").unwrap();
        assert_eq!(size.kind, TypeKind::Value);
        assert_eq!(size.managed_name, "usize");
        assert_eq!(size.native_name, "usize");
        assert_eq!(table.classify("double").unwrap().native_name, "f64");
        assert_eq!(table.classify("IntPtr").unwrap().native_name, "RawHandle");
    }

    #[test]
    fn quantum_follows_table() {
        let ty = TypeTable::new("u16").classify("QuantumType").unwrap();
        assert_eq!(ty.managed_name, "u16");
        assert_eq!(ty.kind, TypeKind::Value);
    }

    #[test]
    fn enums_cast_through_usize() {
        let ty = table().classify("ColorSpace").unwrap();
        assert_eq!(ty.kind, TypeKind::Value);
        assert_eq!(ty.cast, ValueCast::Enum);
        assert_eq!(ty.managed_name, "ColorSpace");
        assert_eq!(ty.native_name, "usize");
    }

    #[test]
    fn classifies_strings() {
        let table = table();
        let caller = table.classify("string").unwrap();
        assert_eq!(caller.kind, TypeKind::String);
        assert_eq!(caller.native_name, "*const c_char");
        let native = table.classify("NativeString").unwrap();
        assert_eq!(native.kind, TypeKind::NativeString);
        assert_eq!(native.native_name, "*mut c_char");
        assert!(caller.is_string() && native.is_string());
    }

    #[test]
    fn classifies_fixed_buffers() {
        let table = table();
        let bytes = table.classify("byte[]").unwrap();
        assert_eq!(bytes.kind, TypeKind::FixedBuffer);
        assert_eq!(bytes.managed_name, "u8");
        assert_eq!(bytes.native_name, "*const u8");
        let span = table.classify("ReadOnlySpan<double>").unwrap();
        assert_eq!(span.kind, TypeKind::FixedBuffer);
        assert_eq!(span.native_name, "*const f64");
        let quantum = table.classify("QuantumType[]").unwrap();
        assert_eq!(quantum.native_name, "*const f32");
    }

    #[test]
    fn span_is_writable_and_read_only_span_is_not() {
        let table = table();
        let filled = table.classify("Span<byte>").unwrap();
        assert_eq!(filled.kind, TypeKind::WritableBuffer);
        assert_eq!(filled.managed_name, "u8");
        assert_eq!(filled.native_name, "*mut u8");
        assert!(filled.is_buffer());

        let read = table.classify("ReadOnlySpan<byte>").unwrap();
        assert_eq!(read.kind, TypeKind::FixedBuffer);
        assert_eq!(read.native_name, "*const u8");
        assert!(read.is_buffer());
        assert!(table.classify("Span<ColorSpace>").is_none());
    }

    #[test]
    fn buffers_of_enums_or_handles_are_unresolvable() {
        let table = table();
        assert!(table.classify("ColorSpace[]").is_none());
        assert!(table.classify("IntPtr[]").is_none());
        assert!(table.classify("MagickGeometry[]").is_none());
    }

    #[test]
    fn classifies_instance_handles() {
        let ty = table().classify("MagickGeometry").unwrap();
        assert_eq!(ty.kind, TypeKind::InstanceHandle);
        assert_eq!(ty.native_name, "RawHandle");
        assert!(ty.has_instance);
        assert!(ty.converts_to_managed());
        assert!(ty.converts_to_native());
        assert_eq!(ty.interface_name("f32"), "IMagickGeometry");
    }

    #[test]
    fn borrowed_instance_has_no_instance_flag() {
        let ty = table().classify("MagickFormatInfo").unwrap();
        assert_eq!(ty.kind, TypeKind::InstanceHandle);
        assert!(!ty.has_instance);
        assert!(!ty.converts_to_managed());
    }

    #[test]
    fn quantum_interface_name() {
        let ty = table().classify("MagickColor").unwrap();
        assert_eq!(ty.interface_name("f32"), "IMagickColor<f32>");
        assert!(ty.converts_to_native());
        assert!(!ty.converts_to_managed());
    }

    #[test]
    fn has_instance_only_on_instance_handles() {
        let table = table();
        for name in ["void", "int", "string", "NativeString", "byte[]", "Span<byte>", "ColorSpace"] {
            let ty = table.classify(name).unwrap();
            assert!(!ty.has_instance, "{name} must not carry an instance");
        }
    }

    #[test]
    fn unknown_names_are_unresolvable() {
        assert!(table().classify("Pixel").is_none());
        assert!(table().classify("Unknown[]").is_none());
    }
}
