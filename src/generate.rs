//! Generate stage: write emitted wrappers to the output directory.
//!
//! Takes the [`SchemaManifest`] produced by [`crate::schema::load_schema`],
//! emits one module per class (plus `mod.rs` when `output.module_index` is
//! set) and writes the files:
//!
//! ```text
//! src/native/
//! ├── .interop-cache.json          # Output cache (see crate::cache)
//! ├── mod.rs                       # mod + re-export lines
//! ├── native_magick_image.rs
//! ├── native_magick_geometry.rs
//! └── ...
//! ```
//!
//! Files whose contents are unchanged since the last run are left alone.
//! Files the previous run wrote that this run no longer produces (a class was
//! removed from the schema) are deleted. Files the cache never recorded are
//! never touched, so generated modules can share a directory with
//! hand-written ones.

use crate::cache::{self, CacheManifest, CacheStats};
use crate::emit::{self, EmitOptions, GeneratedFile};
use crate::model::DescriptorError;
use crate::schema::SchemaManifest;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid descriptor: {0}")]
    Descriptor(#[from] DescriptorError),
}

/// What happened to one emitted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Written,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
    pub lines: usize,
}

/// Result of the generate stage.
#[derive(Debug)]
pub struct GenerateResult {
    pub files: Vec<FileReport>,
    pub pruned: Vec<PathBuf>,
    pub cache_stats: CacheStats,
}

pub fn generate(
    manifest: &SchemaManifest,
    output_dir: &Path,
    use_cache: bool,
) -> Result<GenerateResult, GenerateError> {
    let options = EmitOptions::from_config(&manifest.config);
    let emitted = emit::emit_all(&manifest.classes, &options, manifest.config.output.module_index)?;
    write_files(&emitted, output_dir, use_cache)
}

/// Write emitted files, consulting and updating the output cache.
pub fn write_files(
    emitted: &[GeneratedFile],
    output_dir: &Path,
    use_cache: bool,
) -> Result<GenerateResult, GenerateError> {
    fs::create_dir_all(output_dir)?;

    let previous = if use_cache {
        CacheManifest::load(output_dir)
    } else {
        CacheManifest::empty()
    };
    let mut next = CacheManifest::empty();
    let mut stats = CacheStats::default();
    let mut files = Vec::with_capacity(emitted.len());

    for file in emitted {
        let relative = cache_key(&file.path);
        let hash = cache::hash_contents(&file.contents);

        let status = if previous.is_current(&relative, &hash, output_dir) {
            stats.skip();
            FileStatus::Unchanged
        } else {
            let target = output_dir.join(&file.path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, &file.contents)?;
            stats.write();
            FileStatus::Written
        };
        tracing::debug!(path = %relative, ?status, "generated file");

        next.insert(relative, hash);
        files.push(FileReport {
            path: file.path.clone(),
            status,
            lines: file.contents.lines().count(),
        });
    }

    let keep: Vec<String> = next.entries.keys().cloned().collect();
    let mut pruned = Vec::new();
    for stale in previous.stale_paths(&keep) {
        let target = output_dir.join(stale);
        match fs::remove_file(&target) {
            Ok(()) => {
                tracing::info!(path = %stale, "removed stale generated file");
                stats.prune();
                pruned.push(PathBuf::from(stale));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }

    next.save(output_dir)?;

    Ok(GenerateResult {
        files,
        pruned,
        cache_stats: stats,
    })
}

/// Manifest keys use `/` regardless of platform.
fn cache_key(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::load_schema;
    use crate::test_helpers::setup_fixtures;
    use tempfile::TempDir;

    fn file(path: &str, contents: &str) -> GeneratedFile {
        GeneratedFile {
            path: PathBuf::from(path),
            contents: contents.to_string(),
        }
    }

    #[test]
    fn first_run_writes_everything() {
        let out = TempDir::new().unwrap();
        let files = vec![file("a.rs", "fn a() {}\n"), file("mod.rs", "mod a;\n")];
        let result = write_files(&files, out.path(), true).unwrap();

        assert_eq!(result.cache_stats.written, 2);
        assert!(result.files.iter().all(|f| f.status == FileStatus::Written));
        assert_eq!(fs::read_to_string(out.path().join("a.rs")).unwrap(), "fn a() {}\n");
        assert!(cache::manifest_path(out.path()).exists());
    }

    #[test]
    fn second_run_skips_unchanged() {
        let out = TempDir::new().unwrap();
        let files = vec![file("a.rs", "fn a() {}\n"), file("b.rs", "fn b() {}\n")];
        write_files(&files, out.path(), true).unwrap();

        let changed = vec![file("a.rs", "fn a() {}\n"), file("b.rs", "fn b2() {}\n")];
        let result = write_files(&changed, out.path(), true).unwrap();
        assert_eq!(result.cache_stats.unchanged, 1);
        assert_eq!(result.cache_stats.written, 1);
        assert_eq!(result.files[0].status, FileStatus::Unchanged);
        assert_eq!(result.files[1].status, FileStatus::Written);
    }

    #[test]
    fn no_cache_rewrites_everything() {
        let out = TempDir::new().unwrap();
        let files = vec![file("a.rs", "fn a() {}\n")];
        write_files(&files, out.path(), true).unwrap();
        let result = write_files(&files, out.path(), false).unwrap();
        assert_eq!(result.cache_stats.written, 1);
        assert_eq!(result.cache_stats.unchanged, 0);
    }

    #[test]
    fn hand_edited_file_is_overwritten() {
        let out = TempDir::new().unwrap();
        let files = vec![file("a.rs", "fn a() {}\n")];
        write_files(&files, out.path(), true).unwrap();
        fs::write(out.path().join("a.rs"), "// edited\n").unwrap();

        let result = write_files(&files, out.path(), true).unwrap();
        assert_eq!(result.files[0].status, FileStatus::Written);
        assert_eq!(fs::read_to_string(out.path().join("a.rs")).unwrap(), "fn a() {}\n");
    }

    #[test]
    fn stale_generated_files_are_pruned() {
        let out = TempDir::new().unwrap();
        write_files(&[file("a.rs", "a"), file("b.rs", "b")], out.path(), true).unwrap();

        let result = write_files(&[file("a.rs", "a")], out.path(), true).unwrap();
        assert_eq!(result.pruned, vec![PathBuf::from("b.rs")]);
        assert_eq!(result.cache_stats.pruned, 1);
        assert!(!out.path().join("b.rs").exists());
    }

    #[test]
    fn unrecorded_files_are_left_alone() {
        let out = TempDir::new().unwrap();
        fs::write(out.path().join("handwritten.rs"), "pub fn keep() {}").unwrap();
        write_files(&[file("a.rs", "a")], out.path(), true).unwrap();
        write_files(&[file("b.rs", "b")], out.path(), true).unwrap();
        assert!(out.path().join("handwritten.rs").exists());
        assert!(!out.path().join("a.rs").exists());
    }

    #[test]
    fn prune_tolerates_already_deleted_file() {
        let out = TempDir::new().unwrap();
        write_files(&[file("a.rs", "a"), file("b.rs", "b")], out.path(), true).unwrap();
        fs::remove_file(out.path().join("b.rs")).unwrap();
        let result = write_files(&[file("a.rs", "a")], out.path(), true).unwrap();
        assert!(result.pruned.is_empty());
    }

    #[test]
    fn line_counts_are_reported() {
        let out = TempDir::new().unwrap();
        let result = write_files(&[file("a.rs", "one\ntwo\nthree\n")], out.path(), true).unwrap();
        assert_eq!(result.files[0].lines, 3);
    }

    #[test]
    fn generate_from_fixture_schema() {
        let schema = setup_fixtures();
        let out = TempDir::new().unwrap();
        let manifest = load_schema(schema.path()).unwrap();
        let result = generate(&manifest, out.path(), true).unwrap();

        assert_eq!(result.files.len(), manifest.classes.len() + 1);
        let image = fs::read_to_string(out.path().join("native_magick_image.rs")).unwrap();
        assert!(image.contains("pub struct NativeMagickImage"));
        let index = fs::read_to_string(out.path().join("mod.rs")).unwrap();
        assert!(index.contains("mod native_magick_image;"));
    }

    #[test]
    fn cache_key_uses_forward_slashes() {
        assert_eq!(cache_key(Path::new("a").join("b.rs").as_path()), "a/b.rs");
    }
}
