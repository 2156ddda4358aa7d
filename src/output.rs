//! CLI output formatting for all pipeline stages.
//!
//! # Class-First Display
//!
//! Output is organised around native classes, not files. Every class is shown
//! by positional index and name with its shape in parentheses; details follow
//! on indented lines. `check`, `plan` and `generate` share the same header so
//! a class looks the same in every command.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Classes
//! 001 DrawingWand (owned instance)
//!     Members: constructor, 0 properties, 2 methods
//! 002 Environment (static)
//!     Members: 0 properties, 2 methods
//!
//! Config
//!     Quantum: f32
//!     Enums: Channels, ColorSpace
//!     Library: MagickNative
//!
//! Checked 2 classes
//! ```
//!
//! ## Plan
//!
//! ```text
//! 001 MagickImage (owned instance)
//!     new: throws, dispose on error
//!     Conversions: native-to-managed
//!     Property Width [&self]: get value
//!     Property Format [&self]: get native string, throws
//!     Method ReadBlob [&mut self]: throws, dispose on error, re-seat
//!     Method BoundingBox [&self]: throws, cleanup NativeMagickGeometry::dispose_raw → dynamic
//! ```
//!
//! ## Generate
//!
//! ```text
//! mod.rs (24 lines): written
//! native_magick_image.rs (412 lines): unchanged
//! Removed native_old_class.rs
//!
//! Generated 12 files → src/native: 1 written, 11 unchanged (12 total), 1 pruned
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::emit::strategy::{CleanupAction, ExceptionCheck, PostCall, Receiver, ReturnStrategy};
use crate::emit::{plan_method, plan_property};
use crate::generate::{FileStatus, GenerateResult};
use crate::model::{ClassDescriptor, ClassShape, DynamicMode, ValueCast};
use crate::schema::SchemaManifest;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn shape_label(shape: ClassShape) -> &'static str {
    match shape {
        ClassShape::Static => "static",
        ClassShape::NativeStatic => "native static",
        ClassShape::Helper => "helper",
        ClassShape::ConstInstance => "const instance",
        ClassShape::OwnedInstance => "owned instance",
    }
}

/// ```text
/// 001 MagickImage (owned instance)
/// ```
fn class_header(index: usize, class: &ClassDescriptor) -> String {
    format!(
        "{} {} ({})",
        format_index(index),
        class.name,
        shape_label(class.shape())
    )
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

fn return_label(strategy: ReturnStrategy) -> &'static str {
    match strategy {
        ReturnStrategy::Void => "nothing",
        ReturnStrategy::Dynamic => "dynamic",
        ReturnStrategy::NativeString => "native string",
        ReturnStrategy::String => "string",
        ReturnStrategy::OwnedInstance => "owned instance",
        ReturnStrategy::Value(ValueCast::Identity) => "value",
        ReturnStrategy::Value(ValueCast::Enum) => "enum",
    }
}

fn exception_label(check: &ExceptionCheck) -> Option<String> {
    match check {
        ExceptionCheck::None => None,
        ExceptionCheck::Plain => Some("throws".to_string()),
        ExceptionCheck::DisposeOnError => Some("throws, dispose on error".to_string()),
        ExceptionCheck::Cleanup(CleanupAction::Explicit { export, arguments }) => {
            if arguments.is_empty() {
                Some(format!("throws, cleanup {export}"))
            } else {
                Some(format!("throws, cleanup {export}({})", arguments.join(", ")))
            }
        }
        ExceptionCheck::Cleanup(CleanupAction::DisposeResult { native_struct }) => {
            Some(format!("throws, cleanup {native_struct}::dispose_raw"))
        }
    }
}

fn receiver_label(receiver: Receiver) -> &'static str {
    receiver.render().unwrap_or("static")
}

fn conversions_label(mode: DynamicMode) -> String {
    let mut parts = Vec::new();
    if mode.contains(DynamicMode::MANAGED_TO_NATIVE) {
        parts.push("managed-to-native");
    }
    if mode.contains(DynamicMode::NATIVE_TO_MANAGED) {
        parts.push("native-to-managed");
    }
    parts.join(", ")
}

// ============================================================================
// Check output
// ============================================================================

/// Format the class inventory of a loaded schema.
pub fn format_check_output(manifest: &SchemaManifest) -> Vec<String> {
    let mut lines = vec!["Classes".to_string()];

    for (i, class) in manifest.classes.iter().enumerate() {
        lines.push(class_header(i + 1, class));
        let mut members = Vec::new();
        if class.emits_constructor() {
            members.push("constructor".to_string());
        }
        members.push(plural(class.properties.len(), "property", "properties"));
        members.push(plural(class.methods.len(), "method", "methods"));
        lines.push(format!("{}Members: {}", indent(1), members.join(", ")));
    }

    let config = &manifest.config;
    lines.push(String::new());
    lines.push("Config".to_string());
    lines.push(format!("{}Quantum: {}", indent(1), config.types.quantum));
    if !config.types.enums.is_empty() {
        lines.push(format!("{}Enums: {}", indent(1), config.types.enums.join(", ")));
    }
    if config.native.library.is_empty() {
        lines.push(format!("{}Library: (not linked)", indent(1)));
    } else {
        lines.push(format!("{}Library: {}", indent(1), config.native.library));
    }

    lines.push(String::new());
    lines.push(format!("Checked {}", plural(manifest.classes.len(), "class", "classes")));
    lines
}

pub fn print_check_output(manifest: &SchemaManifest) {
    for line in format_check_output(manifest) {
        println!("{}", line);
    }
}

// ============================================================================
// Plan output
// ============================================================================

/// Format the emission decisions for one class.
pub fn format_plan_output(index: usize, class: &ClassDescriptor) -> Vec<String> {
    let mut lines = vec![class_header(index, class)];

    if class.emits_constructor() {
        let detail = if class.constructor.throws {
            "throws, dispose on error"
        } else {
            "infallible"
        };
        lines.push(format!("{}new: {}", indent(1), detail));
    }
    if class.emits_conversions() {
        lines.push(format!(
            "{}Conversions: {}",
            indent(1),
            conversions_label(class.dynamic_mode)
        ));
    }

    for property in &class.properties {
        let plan = plan_property(class, property);
        let mut parts = vec![format!("get {}", return_label(plan.getter))];
        if plan.has_setter {
            parts.push("set".to_string());
        }
        if property.throws {
            parts.push("throws".to_string());
        }
        lines.push(format!(
            "{}Property {} [{}]: {}",
            indent(1),
            property.name,
            receiver_label(plan.receiver),
            parts.join(", ")
        ));
    }

    for method in &class.methods {
        let plan = plan_method(class, method);
        let mut detail = exception_label(&plan.exception).unwrap_or_else(|| "infallible".into());
        match plan.post {
            PostCall::Reseat => detail.push_str(", re-seat"),
            PostCall::Return(ReturnStrategy::Void) => {}
            PostCall::Return(strategy) => {
                detail.push_str(" → ");
                detail.push_str(return_label(strategy));
            }
        }
        lines.push(format!(
            "{}Method {} [{}]: {}",
            indent(1),
            method.name,
            receiver_label(plan.receiver),
            detail
        ));
    }

    lines
}

pub fn print_plan_output(classes: &[&ClassDescriptor]) {
    for (i, class) in classes.iter().enumerate() {
        if i > 0 {
            println!();
        }
        for line in format_plan_output(i + 1, class) {
            println!("{}", line);
        }
    }
}

// ============================================================================
// Generate output
// ============================================================================

/// Format the per-file result of the generate stage.
pub fn format_generate_output(result: &GenerateResult, output_dir: &Path) -> Vec<String> {
    let mut lines = Vec::new();

    for file in &result.files {
        let status = match file.status {
            FileStatus::Written => "written",
            FileStatus::Unchanged => "unchanged",
        };
        lines.push(format!(
            "{} ({}): {}",
            file.path.display(),
            plural(file.lines, "line", "lines"),
            status
        ));
    }
    for path in &result.pruned {
        lines.push(format!("Removed {}", path.display()));
    }

    lines.push(String::new());
    lines.push(format!(
        "Generated {} → {}: {}",
        plural(result.files.len(), "file", "files"),
        output_dir.display(),
        result.cache_stats
    ));
    lines
}

pub fn print_generate_output(result: &GenerateResult, output_dir: &Path) {
    for line in format_generate_output(result, output_dir) {
        println!("{}", line);
    }
}
