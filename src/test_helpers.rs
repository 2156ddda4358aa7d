//! Shared test utilities for the magick-interop test suite.
//!
//! Provides descriptor builders over a fixed type table and fixture helpers
//! for the schema pipeline.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let mut class = owned_class("MagickImage");
//! let mut read = method("ReadBlob");
//! read.arguments.push(ArgumentDescriptor::input("data", ty("byte[]")));
//! class.methods.push(read);
//!
//! let tmp = setup_fixtures();
//! let manifest = load_schema(tmp.path()).unwrap();
//! let image = find_class(&manifest.classes, "MagickImage");
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::model::{
    ClassDescriptor, ClassTypeInfo, DynamicMode, MethodDescriptor, PropertyDescriptor,
    TypeDescriptor, TypeKind, TypeTable,
};

// =========================================================================
// Type table
// =========================================================================

/// Type table shared by unit tests.
///
/// | Class | Owns | Interface | Quantum | Dynamic |
/// |-------|------|-----------|---------|---------|
/// | MagickGeometry | yes | yes | no | both |
/// | MagickImage | yes | no | no | none |
/// | MagickColor | yes | no | yes | managed-to-native |
/// | MagickSettings | yes | no | no | managed-to-native |
/// | MagickFormatInfo | no | no | no | none |
///
/// `ColorSpace` is an enum; the quantum type is `f32`.
pub fn type_table() -> TypeTable {
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
        "MagickImage",
        ClassTypeInfo {
            owns_instance: true,
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
    table.insert_class(
        "MagickSettings",
        ClassTypeInfo {
            owns_instance: true,
            dynamic_mode: DynamicMode::MANAGED_TO_NATIVE,
            ..Default::default()
        },
    );
    table.insert_class("MagickFormatInfo", ClassTypeInfo::default());
    table.insert_enum("ColorSpace");
    table
}

/// Classify `name` against [`type_table`]. Panics on unknown names.
pub fn ty(name: &str) -> TypeDescriptor {
    type_table()
        .classify(name)
        .unwrap_or_else(|| panic!("type '{name}' not in the test type table"))
}

/// Like [`ty`], asserting the name is a class.
pub fn instance_type(name: &str) -> TypeDescriptor {
    let ty = ty(name);
    assert_eq!(ty.kind, TypeKind::InstanceHandle, "'{name}' is not a class");
    ty
}

// =========================================================================
// Descriptor builders
// =========================================================================

pub fn method(name: &str) -> MethodDescriptor {
    MethodDescriptor::new(name)
}

/// A class holding an owned native instance, with no members.
pub fn owned_class(name: &str) -> ClassDescriptor {
    let mut class = ClassDescriptor::new(name);
    class.has_instance = true;
    class
}

pub fn property(name: &str, type_name: &str) -> PropertyDescriptor {
    PropertyDescriptor {
        name: name.to_string(),
        ty: ty(type_name),
        throws: false,
        read_only: false,
    }
}

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/schema/` to a temp directory and return it.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/schema");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Lookup helpers
// =========================================================================

/// Find a class by name. Panics with the available names if missing.
pub fn find_class<'a>(classes: &'a [ClassDescriptor], name: &str) -> &'a ClassDescriptor {
    classes.iter().find(|c| c.name == name).unwrap_or_else(|| {
        let names: Vec<&str> = classes.iter().map(|c| c.name.as_str()).collect();
        panic!("class '{name}' not found. Available: {names:?}")
    })
}

/// Find a method by name. Panics with the available names if missing.
pub fn find_method<'a>(class: &'a ClassDescriptor, name: &str) -> &'a MethodDescriptor {
    class.find_method(name).unwrap_or_else(|| {
        let names: Vec<&str> = class.methods.iter().map(|m| m.name.as_str()).collect();
        panic!("method '{name}' not found on {}. Available: {names:?}", class.name)
    })
}
