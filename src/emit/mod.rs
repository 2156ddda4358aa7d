//! Code emission engine.
//!
//! Turns validated [`ClassDescriptor`]s into Rust source. Each class becomes
//! one module file:
//!
//! ```text
//! // header
//! #![allow(...)]
//! use ...;
//!
//! #[link(name = "...")]
//! unsafe extern "C" { ... }        // externs: every export the class uses
//!
//! pub struct NativeMagickImage { base: NativeInstance }
//!
//! impl NativeMagickImage { ... }   // instance: lifecycle, members, conversions
//! ```
//!
//! Decisions are made in [`strategy`]; [`externs`] and [`instance`] only
//! render them through a [`CodeWriter`].

pub mod externs;
pub mod instance;
pub mod strategy;
pub mod writer;

use crate::config::GeneratorConfig;
use crate::model::{ClassDescriptor, DescriptorError};
use crate::naming;
use std::path::PathBuf;
use writer::CodeWriter;

pub use strategy::{MethodPlan, PropertyPlan, plan_method, plan_property};

/// Everything emission needs beyond the descriptors.
#[derive(Debug, Clone, PartialEq)]
pub struct EmitOptions {
    pub runtime_path: String,
    pub exception_reader: String,
    pub environment_initializer: String,
    pub memory_relinquish: String,
    pub native_library: String,
    pub bootstrap_class: String,
    pub quantum: String,
    pub header: String,
    pub visibility: String,
}

impl EmitOptions {
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self {
            runtime_path: config.runtime.crate_path.clone(),
            exception_reader: config.runtime.exception_reader.clone(),
            environment_initializer: config.runtime.environment_initializer.clone(),
            memory_relinquish: config.runtime.memory_relinquish.clone(),
            native_library: config.native.library.clone(),
            bootstrap_class: config.native.bootstrap_class.clone(),
            quantum: config.types.quantum.clone(),
            header: config.output.header.clone(),
            visibility: config.output.visibility.clone(),
        }
    }
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self::from_config(&GeneratorConfig::default())
    }
}

/// One emitted file, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub contents: String,
}

/// Emit the module for one class. Refuses classes that fail validation.
pub fn emit_class(class: &ClassDescriptor, options: &EmitOptions) -> Result<GeneratedFile, DescriptorError> {
    class.validate()?;

    let mut w = CodeWriter::new();
    write_header(&mut w, options);
    w.line("#![allow(dead_code, non_snake_case, unused_imports, unused_mut, unused_unsafe, clippy::all)]");
    w.blank();
    w.line("use std::ffi::{c_char, c_void};");
    w.line("use std::ptr;");
    w.blank();
    w.line(format!("use {}::*;", options.runtime_path));
    w.line("use super::*;");
    w.blank();
    externs::write_externs(&mut w, class, options);
    w.blank();
    instance::write_wrapper(&mut w, class, options);

    tracing::debug!(class = %class.name, shape = ?class.shape(), "emitted native wrapper");

    Ok(GeneratedFile {
        path: PathBuf::from(naming::module_file_name(&class.name)),
        contents: w.finish(),
    })
}

/// `mod.rs` declaring every generated module and re-exporting its wrapper.
pub fn emit_module_index(classes: &[ClassDescriptor], options: &EmitOptions) -> GeneratedFile {
    let mut w = CodeWriter::new();
    write_header(&mut w, options);
    w.line("use super::*;");
    w.blank();
    for class in classes {
        w.line(format!("mod {};", naming::module_name(&class.name)));
    }
    w.blank();
    for class in classes {
        w.line(format!(
            "{} use {}::{};",
            options.visibility,
            naming::module_name(&class.name),
            naming::native_struct_name(&class.name)
        ));
    }
    GeneratedFile {
        path: PathBuf::from("mod.rs"),
        contents: w.finish(),
    }
}

/// Emit every class, sorted by name so output is stable across runs.
pub fn emit_all(
    classes: &[ClassDescriptor],
    options: &EmitOptions,
    module_index: bool,
) -> Result<Vec<GeneratedFile>, DescriptorError> {
    let mut sorted: Vec<&ClassDescriptor> = classes.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let mut files = sorted
        .iter()
        .map(|class| emit_class(class, options))
        .collect::<Result<Vec<_>, _>>()?;
    if module_index {
        let owned: Vec<ClassDescriptor> = sorted.into_iter().cloned().collect();
        files.push(emit_module_index(&owned, options));
    }
    Ok(files)
}

fn write_header(w: &mut CodeWriter, options: &EmitOptions) {
    for line in options.header.lines() {
        if line.is_empty() {
            w.line("//");
        } else {
            w.line(format!("// {line}"));
        }
    }
    if !options.header.is_empty() {
        w.blank();
    }
}
