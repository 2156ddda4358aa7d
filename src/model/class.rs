//! Class descriptors and their shape classification.
//!
//! A class is classified once into a [`ClassShape`] that fixes the form of the
//! generated wrapper:
//!
//! | Shape | When | Wrapper |
//! |-------|------|---------|
//! | `Static` | schema marks the class static | unit struct, every member an associated fn |
//! | `NativeStatic` | no instance; every method static, non-throwing, non-creating | unit struct |
//! | `Helper` | no instance otherwise | struct over `NativeHelper` |
//! | `ConstInstance` | borrowed instance | struct over `ConstNativeInstance` |
//! | `OwnedInstance` | owned instance | struct over `NativeInstance`, with dispose |

use super::DescriptorError;
use super::member::{ConstructorDescriptor, Member, MethodDescriptor, PropertyDescriptor};
use super::types::{ClassTypeInfo, interface_name};
use crate::naming;
use bitflags::bitflags;
use serde::Serialize;
use std::collections::HashSet;

bitflags! {
    /// Directions in which conversion helpers are generated.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct DynamicMode: u8 {
        /// Managed value -> scoped native instance.
        const MANAGED_TO_NATIVE = 0b01;
        /// Native handle -> managed value.
        const NATIVE_TO_MANAGED = 0b10;
    }
}

impl Default for DynamicMode {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassShape {
    Static,
    NativeStatic,
    Helper,
    ConstInstance,
    OwnedInstance,
}

impl ClassShape {
    /// Whether wrapper members are associated fns without `self`.
    pub fn is_stateless(&self) -> bool {
        matches!(self, ClassShape::Static | ClassShape::NativeStatic)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassDescriptor {
    pub name: String,
    pub has_instance: bool,
    pub is_static: bool,
    pub is_const: bool,
    pub has_native_constructor: bool,
    pub has_no_constructor: bool,
    pub has_interface: bool,
    pub is_quantum_type: bool,
    pub dynamic_mode: DynamicMode,
    pub constructor: ConstructorDescriptor,
    pub properties: Vec<PropertyDescriptor>,
    pub methods: Vec<MethodDescriptor>,
}

impl ClassDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            has_instance: false,
            is_static: false,
            is_const: false,
            has_native_constructor: false,
            has_no_constructor: false,
            has_interface: false,
            is_quantum_type: false,
            dynamic_mode: DynamicMode::empty(),
            constructor: ConstructorDescriptor::default(),
            properties: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn shape(&self) -> ClassShape {
        if self.is_static {
            ClassShape::Static
        } else if self.is_native_static() {
            ClassShape::NativeStatic
        } else if !self.has_instance {
            ClassShape::Helper
        } else if self.is_const {
            ClassShape::ConstInstance
        } else {
            ClassShape::OwnedInstance
        }
    }

    fn is_native_static(&self) -> bool {
        !self.has_instance
            && self
                .methods
                .iter()
                .all(|m| m.is_static && !m.throws && !m.creates_instance)
    }

    pub fn owns_instance(&self) -> bool {
        self.has_instance && !self.is_const && !self.is_static
    }

    pub fn emits_dispose(&self) -> bool {
        self.owns_instance()
    }

    pub fn emits_constructor(&self) -> bool {
        self.owns_instance() && !self.has_no_constructor
    }

    pub fn emits_native_constructor(&self) -> bool {
        self.has_instance && !self.is_static && self.has_native_constructor
    }

    pub fn emits_conversions(&self) -> bool {
        self.owns_instance() && !self.dynamic_mode.is_empty()
    }

    /// Managed name used by conversion helpers.
    pub fn managed_name(&self, quantum: &str) -> String {
        interface_name(&self.name, self.is_quantum_type, self.has_interface, quantum)
    }

    pub fn type_info(&self) -> ClassTypeInfo {
        ClassTypeInfo {
            owns_instance: self.owns_instance(),
            has_interface: self.has_interface,
            is_quantum_type: self.is_quantum_type,
            dynamic_mode: self.dynamic_mode,
        }
    }

    pub fn find_method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Reject descriptors whose generated code would have undefined ownership
    /// or exception behavior.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        let class = || self.name.clone();

        if self.is_static && self.has_instance {
            return Err(DescriptorError::StaticWithInstance { class: class() });
        }
        if !self.dynamic_mode.is_empty() && !self.owns_instance() {
            return Err(DescriptorError::DynamicWithoutInstance { class: class() });
        }
        if self.dynamic_mode.contains(DynamicMode::NATIVE_TO_MANAGED) && !self.has_native_constructor
        {
            return Err(DescriptorError::MissingNativeConstructor { class: class() });
        }

        let mut seen = HashSet::new();
        for name in self
            .properties
            .iter()
            .map(|p| p.name.as_str())
            .chain(self.methods.iter().map(|m| m.name.as_str()))
        {
            if !seen.insert(name) {
                return Err(DescriptorError::DuplicateMember {
                    class: class(),
                    member: name.to_string(),
                });
            }
        }

        let reserved = self.generated_fns();
        let mut idents = HashSet::new();
        for (member, ident) in self.member_fns() {
            if reserved.contains(&ident.as_str()) || !idents.insert(ident.clone()) {
                return Err(DescriptorError::NameCollision {
                    class: class(),
                    member: member.to_string(),
                    ident,
                });
            }
        }

        self.validate_arguments("constructor", &self.constructor)?;

        for property in &self.properties {
            if property.ty.is_buffer() || property.ty.is_void() {
                return Err(DescriptorError::UnsupportedType {
                    class: class(),
                    member: property.name.clone(),
                    ty: property.ty.schema_name.clone(),
                });
            }
        }

        for method in &self.methods {
            self.validate_arguments(&method.name, method)?;

            if method.return_type.is_buffer() {
                return Err(DescriptorError::UnsupportedType {
                    class: class(),
                    member: method.name.clone(),
                    ty: method.return_type.schema_name.clone(),
                });
            }
            if method.reseats_instance() && !self.owns_instance() {
                return Err(DescriptorError::ReseatWithoutInstance {
                    class: class(),
                    member: method.name.clone(),
                });
            }
            if let Some(cleanup) = &method.cleanup {
                if !method.throws {
                    return Err(DescriptorError::CleanupWithoutThrows {
                        class: class(),
                        member: method.name.clone(),
                    });
                }
                let target = self.find_method(&cleanup.name);
                if !target.is_some_and(|t| t.is_static && !t.throws) {
                    return Err(DescriptorError::UnknownCleanup {
                        class: class(),
                        member: method.name.clone(),
                        cleanup: cleanup.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Fns the wrapper declares on its own, whatever its members.
    fn generated_fns(&self) -> Vec<&'static str> {
        let shape = self.shape();
        let mut names = vec!["initialize_environment"];
        if self.emits_dispose() {
            names.extend(["dispose_raw", "dispose"]);
            if self.has_no_constructor {
                names.push("dispose_instance");
            }
        }
        if self.emits_constructor() || shape == ClassShape::Helper {
            names.push("new");
        }
        if self.emits_native_constructor() {
            names.push("from_raw");
        }
        if !shape.is_stateless() {
            names.extend(["base", "base_mut"]);
        }
        if self.emits_conversions() {
            if self.dynamic_mode.contains(DynamicMode::MANAGED_TO_NATIVE) {
                names.push("create_instance");
            }
            if self.dynamic_mode.contains(DynamicMode::NATIVE_TO_MANAGED) {
                names.push("create_managed");
            }
        }
        names
    }

    /// Fn names emitted for members, paired with the member they come from.
    fn member_fns(&self) -> Vec<(&str, String)> {
        let mut fns = Vec::new();
        for property in &self.properties {
            let (getter, setter) = naming::property_fns(&property.name);
            fns.push((property.name.as_str(), getter));
            if !property.read_only {
                fns.push((property.name.as_str(), setter));
            }
        }
        for method in &self.methods {
            fns.push((method.name.as_str(), naming::fn_ident(&method.name)));
        }
        fns
    }

    fn validate_arguments(&self, member: &str, descriptor: &dyn Member) -> Result<(), DescriptorError> {
        if descriptor.throws() && descriptor.declares_argument("exception") {
            return Err(DescriptorError::ExceptionSlotConflict {
                class: self.name.clone(),
                member: member.to_string(),
            });
        }
        let mut seen = HashSet::new();
        for argument in descriptor.arguments() {
            if !seen.insert(argument.name.as_str()) {
                return Err(DescriptorError::DuplicateArgument {
                    class: self.name.clone(),
                    member: member.to_string(),
                    argument: argument.name.clone(),
                });
            }
            if argument.ty.is_void() {
                return Err(DescriptorError::UnsupportedType {
                    class: self.name.clone(),
                    member: member.to_string(),
                    ty: argument.ty.schema_name.clone(),
                });
            }
            if argument.is_out() && !argument.out_supported() {
                return Err(DescriptorError::UnsupportedOut {
                    class: self.name.clone(),
                    member: member.to_string(),
                    argument: argument.name.clone(),
                });
            }
        }
        Ok(())
    }
}
