//! Format registry.
//!
//! Maps [`MagickFormat`] identifiers to [`FormatInfo`], populated from a
//! [`FormatSource`]:
//!
//! 1. every coder of the bulk list, in list order
//! 2. the stealth coders `DIB` and `TIF`, looked up by name
//!
//! Later entries for the same identifier replace earlier ones. Coders whose
//! native name has no identifier are skipped.
//!
//! The process-wide registry is loaded at most once; see
//! [`FormatRegistry::global`].

use super::format::MagickFormat;
use super::info::{FormatInfo, FormatSource};
use crate::runtime::MagickError;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

/// Coders missing from the bulk list that are registered explicitly.
pub const STEALTH_CODERS: [&str; 2] = ["DIB", "TIF"];

#[derive(Debug, Clone, Default)]
pub struct FormatRegistry {
    formats: BTreeMap<MagickFormat, FormatInfo>,
}

static GLOBAL: OnceLock<Result<FormatRegistry, MagickError>> = OnceLock::new();

impl FormatRegistry {
    /// Build a registry from `source`.
    pub fn load(source: &dyn FormatSource) -> Result<Self, MagickError> {
        let mut registry = Self::default();
        let mut skipped = 0usize;

        for record in source.formats()? {
            match FormatInfo::from_record(&record) {
                Some(info) => registry.register(info),
                // A native library newer than the identifier table can list
                // coders with no `MagickFormat` yet. They are left out of the
                // registry rather than failing the load.
                None => {
                    tracing::debug!(name = %record.name, "skipping coder without identifier");
                    skipped += 1;
                }
            }
        }

        for name in STEALTH_CODERS {
            if let Some(info) = source
                .format_by_name(name)?
                .as_ref()
                .and_then(FormatInfo::from_record)
            {
                registry.register(info);
            }
        }

        tracing::info!(formats = registry.len(), skipped, "loaded format registry");
        Ok(registry)
    }

    /// The process-wide registry, loaded from `source` on first use.
    ///
    /// Only the first caller's source is consulted. Its result, including a
    /// load error, is what every later call returns.
    pub fn global(source: &dyn FormatSource) -> Result<&'static FormatRegistry, MagickError> {
        GLOBAL
            .get_or_init(|| Self::load(source))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// The process-wide registry if it has loaded successfully.
    pub fn try_global() -> Option<&'static FormatRegistry> {
        GLOBAL.get().and_then(|result| result.as_ref().ok())
    }

    fn register(&mut self, info: FormatInfo) {
        self.formats.insert(info.format, info);
    }

    pub fn get(&self, format: MagickFormat) -> Option<&FormatInfo> {
        self.formats.get(&format)
    }

    /// Info for the format implied by a file's extension.
    pub fn for_path(&self, path: &Path) -> Option<&FormatInfo> {
        self.get(MagickFormat::from_extension(path)?)
    }

    /// All infos, ordered by identifier.
    pub fn all(&self) -> impl Iterator<Item = &FormatInfo> {
        self.formats.values()
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}
