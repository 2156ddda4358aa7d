//! # magick-interop
//!
//! Generates the native-instance marshaling layer of an image-library
//! binding. Every native class (an opaque handle plus a set of C exports) is
//! described once in a JSON schema; the generator writes the Rust wrapper
//! that owns the handle, marshals arguments, checks the exception slot and
//! converts results.
//!
//! # Architecture: Three-Stage Pipeline
//!
//! ```text
//! 1. Schema    schema/   →  SchemaManifest   (JSON documents → validated descriptors)
//! 2. Emit      manifest  →  GeneratedFile[]  (descriptors → Rust source text)
//! 3. Generate  files     →  src/native/      (written, cached, stale files pruned)
//! ```
//!
//! Stages 1 and 2 are pure: the same schema always yields the same text, so
//! emission can be tested without touching the filesystem. `magick-interop
//! dump` prints the stage 1 manifest and `magick-interop plan` prints the
//! decisions stage 2 takes for each member.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`schema`] | Stage 1: reads class documents, resolves types, validates descriptors |
//! | [`model`] | Type, member and class descriptors, and their validation rules |
//! | [`emit`] | Stage 2: strategy selection and rendering of the extern table and wrapper |
//! | [`generate`] | Stage 3: writes emitted files to the output directory |
//! | [`cache`] | Content-hash manifest letting stage 3 skip unchanged files |
//! | [`config`] | `generator.toml` loading, validation and the stock config |
//! | [`naming`] | Export, struct, module and identifier naming |
//! | [`runtime`] | Types the generated code calls: handles, `Outcome`, marshaling, warnings |
//! | [`formats`] | Format registry and typed coder defines |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## The Exception Slot Becomes `Result`
//!
//! Native exports report failure through a trailing exception pointer. The
//! generated code never exposes it: [`runtime::Outcome`] classifies it as
//! success, warning or failure, warnings go to a [`runtime::WarningSink`],
//! and failures become [`runtime::MagickError`]. Partially created native
//! results are released before the error is returned.
//!
//! ## One Owner per Handle
//!
//! A wrapper either owns its handle ([`runtime::NativeInstance`], disposed on
//! drop) or borrows it ([`runtime::ConstNativeInstance`], never disposed).
//! Re-seating a wrapper onto a new handle disposes the previous one exactly
//! once.
//!
//! ## Decisions Before Text
//!
//! Every flag combination is first reduced to a plan ([`emit::MethodPlan`],
//! [`emit::PropertyPlan`]) by pure functions. The renderers only format
//! plans, so the interesting logic is testable as data.

pub mod cache;
pub mod config;
pub mod emit;
pub mod formats;
pub mod generate;
pub mod model;
pub mod naming;
pub mod output;
pub mod runtime;
pub mod schema;

#[cfg(test)]
pub(crate) mod test_helpers;
