//! Schema loading and descriptor resolution.
//!
//! Stage 1 of the generation pipeline. Reads a schema directory holding one
//! JSON document per native class, resolves every type name against the
//! classes and the configured enums, and produces validated
//! [`ClassDescriptor`]s that the emission stage consumes.
//!
//! ## Directory Structure
//!
//! ```text
//! schema/
//! ├── generator.toml             # Generator configuration (optional)
//! ├── Environment.json
//! ├── MagickImage.json
//! ├── .draft.json                # Hidden = ignored
//! └── formats/
//!     └── MagickFormatInfo.json  # Subdirectories are searched too
//! ```
//!
//! Files are processed in sorted path order and classes are returned sorted
//! by name, so the same schema always produces the same output.
//!
//! ## Validation
//!
//! Resolution fails when:
//! - two documents declare the same class
//! - a type name is neither a built-in, a class, nor a configured enum
//! - a class fails [`ClassDescriptor::validate`]
//! - an `out` instance argument names a class without a parameterless constructor

use crate::config::{self, GeneratorConfig};
use crate::model::{
    ArgumentDescriptor, ClassDescriptor, ClassTypeInfo, CleanupSpec, ConstructorDescriptor,
    DescriptorError, DynamicMode, Marshaling, MethodDescriptor, PropertyDescriptor,
    TypeDescriptor, TypeTable,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Class {name} is declared in both {first} and {second}")]
    DuplicateClass {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },
    #[error("{class}.{member}: unknown type '{ty}'")]
    UnknownType {
        class: String,
        member: String,
        ty: String,
    },
    #[error("Invalid descriptor: {0}")]
    Descriptor(#[from] DescriptorError),
    #[error(
        "{class}.{member}: out argument '{argument}' needs {ty} to have a parameterless constructor"
    )]
    OutWithoutDefaultConstructor {
        class: String,
        member: String,
        argument: String,
        ty: String,
    },
}

/// Output of the schema stage.
#[derive(Debug, Serialize)]
pub struct SchemaManifest {
    pub classes: Vec<ClassDescriptor>,
    pub config: GeneratorConfig,
}

// ============================================================================
// Schema documents
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
enum RawDynamicMode {
    #[default]
    None,
    ManagedToNative,
    NativeToManaged,
    Both,
}

impl From<RawDynamicMode> for DynamicMode {
    fn from(mode: RawDynamicMode) -> Self {
        match mode {
            RawDynamicMode::None => DynamicMode::empty(),
            RawDynamicMode::ManagedToNative => DynamicMode::MANAGED_TO_NATIVE,
            RawDynamicMode::NativeToManaged => DynamicMode::NATIVE_TO_MANAGED,
            RawDynamicMode::Both => DynamicMode::all(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawClass {
    name: String,
    #[serde(default)]
    has_instance: bool,
    #[serde(default)]
    is_static: bool,
    #[serde(default)]
    is_const: bool,
    #[serde(default)]
    has_native_constructor: bool,
    #[serde(default)]
    has_no_constructor: bool,
    #[serde(default)]
    has_interface: bool,
    #[serde(default)]
    is_quantum_type: bool,
    #[serde(default)]
    dynamic_mode: RawDynamicMode,
    #[serde(default)]
    constructor: RawConstructor,
    #[serde(default)]
    properties: Vec<RawProperty>,
    #[serde(default)]
    methods: Vec<RawMethod>,
}

impl RawClass {
    fn type_info(&self) -> ClassTypeInfo {
        ClassTypeInfo {
            owns_instance: self.has_instance && !self.is_const && !self.is_static,
            has_interface: self.has_interface,
            is_quantum_type: self.is_quantum_type,
            dynamic_mode: self.dynamic_mode.into(),
        }
    }

    /// Whether `Native<Name>::new()` exists with no arguments.
    fn has_default_constructor(&self) -> bool {
        self.type_info().owns_instance
            && !self.has_no_constructor
            && self.constructor.arguments.is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawConstructor {
    #[serde(default)]
    throws: bool,
    #[serde(default)]
    arguments: Vec<RawArgument>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawArgument {
    name: String,
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    out: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawProperty {
    name: String,
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    throws: bool,
    #[serde(default)]
    read_only: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawMethod {
    name: String,
    #[serde(rename = "type", default = "void_type")]
    ty: String,
    #[serde(default)]
    is_static: bool,
    #[serde(default)]
    throws: bool,
    #[serde(default)]
    creates_instance: bool,
    #[serde(default)]
    arguments: Vec<RawArgument>,
    #[serde(default)]
    cleanup: Option<RawCleanup>,
}

fn void_type() -> String {
    "void".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCleanup {
    name: String,
    #[serde(default)]
    arguments: Vec<String>,
}

// ============================================================================
// Loading
// ============================================================================

/// Load, resolve and validate every class document under `dir`.
pub fn load_schema(dir: &Path) -> Result<SchemaManifest, SchemaError> {
    let config = config::load_config(dir)?;

    let mut documents: Vec<(PathBuf, RawClass)> = Vec::new();
    for path in collect_documents(dir)? {
        let content = fs::read_to_string(&path)?;
        let raw: RawClass = serde_json::from_str(&content).map_err(|source| SchemaError::Json {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(class = %raw.name, path = %path.display(), "loaded class schema");
        documents.push((path, raw));
    }

    let classes = resolve(documents, &config)?;
    Ok(SchemaManifest { classes, config })
}

/// `*.json` files under `dir`, hidden entries skipped, in sorted order.
fn collect_documents(dir: &Path) -> Result<Vec<PathBuf>, SchemaError> {
    let mut paths = Vec::new();
    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));
    for entry in walker {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path.to_path_buf());
        }
    }
    Ok(paths)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn resolve(
    documents: Vec<(PathBuf, RawClass)>,
    config: &GeneratorConfig,
) -> Result<Vec<ClassDescriptor>, SchemaError> {
    let mut by_name: BTreeMap<String, (PathBuf, RawClass)> = BTreeMap::new();
    for (path, raw) in documents {
        if let Some((first, _)) = by_name.get(&raw.name) {
            return Err(SchemaError::DuplicateClass {
                name: raw.name.clone(),
                first: first.clone(),
                second: path,
            });
        }
        by_name.insert(raw.name.clone(), (path, raw));
    }

    let mut table = TypeTable::new(config.types.quantum.clone());
    for (name, (_, raw)) in &by_name {
        table.insert_class(name.clone(), raw.type_info());
    }
    for name in &config.types.enums {
        table.insert_enum(name.clone());
    }

    let resolver = Resolver {
        table: &table,
        raw: &by_name,
    };
    let mut classes = Vec::with_capacity(by_name.len());
    for (_, raw) in by_name.values() {
        let class = resolver.class(raw)?;
        class.validate()?;
        resolver.check_out_arguments(&class)?;
        classes.push(class);
    }
    // BTreeMap iteration already orders by name.
    Ok(classes)
}

struct Resolver<'a> {
    table: &'a TypeTable,
    raw: &'a BTreeMap<String, (PathBuf, RawClass)>,
}

impl Resolver<'_> {
    fn class(&self, raw: &RawClass) -> Result<ClassDescriptor, SchemaError> {
        let mut class = ClassDescriptor::new(raw.name.clone());
        class.has_instance = raw.has_instance;
        class.is_static = raw.is_static;
        class.is_const = raw.is_const;
        class.has_native_constructor = raw.has_native_constructor;
        class.has_no_constructor = raw.has_no_constructor;
        class.has_interface = raw.has_interface;
        class.is_quantum_type = raw.is_quantum_type;
        class.dynamic_mode = raw.dynamic_mode.into();

        class.constructor = ConstructorDescriptor {
            arguments: self.arguments(&raw.name, "constructor", &raw.constructor.arguments)?,
            throws: raw.constructor.throws,
        };

        for property in &raw.properties {
            class.properties.push(PropertyDescriptor {
                name: property.name.clone(),
                ty: self.ty(&raw.name, &property.name, &property.ty)?,
                throws: property.throws,
                read_only: property.read_only,
            });
        }

        for method in &raw.methods {
            class.methods.push(MethodDescriptor {
                name: method.name.clone(),
                arguments: self.arguments(&raw.name, &method.name, &method.arguments)?,
                return_type: self.ty(&raw.name, &method.name, &method.ty)?,
                throws: method.throws,
                creates_instance: method.creates_instance,
                is_static: method.is_static,
                cleanup: method.cleanup.as_ref().map(|c| CleanupSpec {
                    name: c.name.clone(),
                    arguments: c.arguments.clone(),
                }),
            });
        }
        Ok(class)
    }

    fn arguments(
        &self,
        class: &str,
        member: &str,
        raw: &[RawArgument],
    ) -> Result<Vec<ArgumentDescriptor>, SchemaError> {
        raw.iter()
            .map(|argument| {
                let ty = self.ty(class, member, &argument.ty)?;
                Ok(if argument.out {
                    ArgumentDescriptor::output(argument.name.clone(), ty)
                } else {
                    ArgumentDescriptor::input(argument.name.clone(), ty)
                })
            })
            .collect()
    }

    fn ty(&self, class: &str, member: &str, name: &str) -> Result<TypeDescriptor, SchemaError> {
        self.table
            .classify(name)
            .ok_or_else(|| SchemaError::UnknownType {
                class: class.to_string(),
                member: member.to_string(),
                ty: name.to_string(),
            })
    }

    fn check_out_arguments(&self, class: &ClassDescriptor) -> Result<(), SchemaError> {
        let members = std::iter::once(("constructor", class.constructor.arguments.as_slice()))
            .chain(
                class
                    .methods
                    .iter()
                    .map(|m| (m.name.as_str(), m.arguments.as_slice())),
            );
        for (member, arguments) in members {
            for argument in arguments {
                if argument.marshaling() != Marshaling::CreateOut {
                    continue;
                }
                let target = &argument.ty.managed_name;
                let constructible = self
                    .raw
                    .get(target)
                    .is_some_and(|(_, raw)| raw.has_default_constructor());
                if !constructible {
                    return Err(SchemaError::OutWithoutDefaultConstructor {
                        class: class.name.clone(),
                        member: member.to_string(),
                        argument: argument.name.clone(),
                        ty: target.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassShape, TypeKind};
    use crate::test_helpers::{find_class, find_method, setup_fixtures};
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    // =========================================================================
    // Fixture schema
    // =========================================================================

    #[test]
    fn fixtures_load_all_classes_sorted() {
        let tmp = setup_fixtures();
        let manifest = load_schema(tmp.path()).unwrap();
        let names: Vec<&str> = manifest.classes.iter().map(|c| c.name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(names.contains(&"MagickImage"));
        assert!(names.contains(&"MagickFormatInfo"));
        assert!(names.contains(&"Environment"));
    }

    #[test]
    fn fixtures_resolve_shapes() {
        let tmp = setup_fixtures();
        let manifest = load_schema(tmp.path()).unwrap();
        let classes = &manifest.classes;
        assert_eq!(find_class(classes, "Environment").shape(), ClassShape::Static);
        assert_eq!(find_class(classes, "Quantum").shape(), ClassShape::NativeStatic);
        assert_eq!(find_class(classes, "MagickImageCollection").shape(), ClassShape::Helper);
        assert_eq!(find_class(classes, "MagickFormatInfo").shape(), ClassShape::ConstInstance);
        assert_eq!(find_class(classes, "MagickImage").shape(), ClassShape::OwnedInstance);
    }

    #[test]
    fn fixtures_resolve_types() {
        let tmp = setup_fixtures();
        let manifest = load_schema(tmp.path()).unwrap();
        let image = find_class(&manifest.classes, "MagickImage");
        let read = find_method(image, "ReadBlob");
        assert_eq!(read.arguments[0].ty.kind, TypeKind::InstanceHandle);
        assert_eq!(read.arguments[1].ty.kind, TypeKind::FixedBuffer);
        assert!(read.return_type.is_void());

        let clone = find_method(image, "Clone");
        assert!(clone.return_type.has_instance);
        assert!(clone.return_type.converts_to_managed());
    }

    #[test]
    fn fixtures_config_is_loaded() {
        let tmp = setup_fixtures();
        let manifest = load_schema(tmp.path()).unwrap();
        assert!(manifest.config.types.enums.contains(&"ColorSpace".to_string()));
    }

    // =========================================================================
    // Discovery
    // =========================================================================

    #[test]
    fn hidden_and_non_json_files_are_ignored() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "A.json", r#"{ "name": "A" }"#);
        write(tmp.path(), ".B.json", r#"{ "name": "B" }"#);
        write(tmp.path(), ".hidden/C.json", r#"{ "name": "C" }"#);
        write(tmp.path(), "notes.txt", "not a schema");
        write(tmp.path(), "nested/D.json", r#"{ "name": "D" }"#);

        let manifest = load_schema(tmp.path()).unwrap();
        let names: Vec<&str> = manifest.classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "D"]);
    }

    #[test]
    fn empty_directory_yields_no_classes() {
        let tmp = TempDir::new().unwrap();
        let manifest = load_schema(tmp.path()).unwrap();
        assert!(manifest.classes.is_empty());
        assert_eq!(manifest.config, GeneratorConfig::default());
    }

    // =========================================================================
    // Errors
    // =========================================================================

    #[test]
    fn invalid_json_reports_path() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "Broken.json", "{ not json");
        match load_schema(tmp.path()) {
            Err(SchemaError::Json { path, .. }) => assert!(path.ends_with("Broken.json")),
            other => panic!("expected JSON error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "A.json", r#"{ "name": "A", "hasInstanse": true }"#);
        assert!(matches!(load_schema(tmp.path()), Err(SchemaError::Json { .. })));
    }

    #[test]
    fn duplicate_class_is_error() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a/Image.json", r#"{ "name": "MagickImage" }"#);
        write(tmp.path(), "b/Image.json", r#"{ "name": "MagickImage" }"#);
        assert!(matches!(
            load_schema(tmp.path()),
            Err(SchemaError::DuplicateClass { name, .. }) if name == "MagickImage"
        ));
    }

    #[test]
    fn unknown_type_is_error() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "A.json",
            r#"{ "name": "A", "hasInstance": true, "properties": [ { "name": "P", "type": "Pixel" } ] }"#,
        );
        match load_schema(tmp.path()) {
            Err(SchemaError::UnknownType { class, member, ty }) => {
                assert_eq!((class.as_str(), member.as_str(), ty.as_str()), ("A", "P", "Pixel"));
            }
            other => panic!("expected unknown type, got {other:?}"),
        }
    }

    #[test]
    fn enums_come_from_config() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "A.json",
            r#"{ "name": "A", "hasInstance": true, "properties": [ { "name": "Space", "type": "ColorSpace" } ] }"#,
        );
        assert!(matches!(load_schema(tmp.path()), Err(SchemaError::UnknownType { .. })));

        write(tmp.path(), "generator.toml", "[types]\nenums = [\"ColorSpace\"]\n");
        let manifest = load_schema(tmp.path()).unwrap();
        assert_eq!(manifest.classes[0].properties[0].ty.native_name, "usize");
    }

    #[test]
    fn descriptor_validation_runs() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "A.json",
            r#"{ "name": "A", "isStatic": true, "hasInstance": true }"#,
        );
        assert!(matches!(
            load_schema(tmp.path()),
            Err(SchemaError::Descriptor(DescriptorError::StaticWithInstance { .. }))
        ));
    }

    #[test]
    fn out_instance_needs_parameterless_constructor() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "Geometry.json",
            r#"{ "name": "Geometry", "hasInstance": true, "hasNativeConstructor": true,
                 "dynamicMode": "nativeToManaged",
                 "constructor": { "arguments": [ { "name": "width", "type": "size_t" } ] } }"#,
        );
        write(
            tmp.path(),
            "Image.json",
            r#"{ "name": "Image", "hasInstance": true,
                 "methods": [ { "name": "Page", "throws": true,
                                "arguments": [ { "name": "page", "type": "Geometry", "out": true } ] } ] }"#,
        );
        assert!(matches!(
            load_schema(tmp.path()),
            Err(SchemaError::OutWithoutDefaultConstructor { argument, .. }) if argument == "page"
        ));
    }

    #[test]
    fn dynamic_modes_parse() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "A.json",
            r#"{ "name": "A", "hasInstance": true, "hasNativeConstructor": true, "dynamicMode": "both" }"#,
        );
        write(
            tmp.path(),
            "B.json",
            r#"{ "name": "B", "hasInstance": true, "dynamicMode": "managedToNative" }"#,
        );
        let manifest = load_schema(tmp.path()).unwrap();
        assert_eq!(manifest.classes[0].dynamic_mode, DynamicMode::all());
        assert_eq!(manifest.classes[1].dynamic_mode, DynamicMode::MANAGED_TO_NATIVE);
    }

    #[test]
    fn cleanup_spec_is_carried() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "List.json",
            r#"{ "name": "List",
                 "methods": [
                   { "name": "Create", "type": "IntPtr", "throws": true,
                     "arguments": [ { "name": "length", "type": "size_t", "out": true } ],
                     "cleanup": { "name": "Free", "arguments": ["length"] } },
                   { "name": "Free", "isStatic": true,
                     "arguments": [ { "name": "list", "type": "IntPtr" }, { "name": "length", "type": "size_t" } ] }
                 ] }"#,
        );
        let manifest = load_schema(tmp.path()).unwrap();
        let create = find_method(&manifest.classes[0], "Create");
        assert_eq!(
            create.cleanup,
            Some(CleanupSpec {
                name: "Free".into(),
                arguments: vec!["length".into()],
            })
        );
        assert!(create.arguments[0].is_out());
    }
}
