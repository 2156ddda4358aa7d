//! Image format collaborators of the generated bindings.
//!
//! - [`FormatRegistry`]: which coders the native library provides, keyed by
//!   [`MagickFormat`], loaded once from a [`FormatSource`]
//! - [`DefinesCreator`] implementations: typed coder options rendered as the
//!   `<format>:<option>` defines the native reader and writer understand
//!
//! Nothing here mutates the native coder list.

pub mod defines;
pub mod format;
pub mod info;
pub mod png;
pub mod psd;
pub mod registry;
pub mod webp;

pub use defines::{DefineValue, DefinesCreator, MagickDefine};
pub use format::MagickFormat;
pub use info::{
    FormatExports, FormatInfo, FormatSource, NativeFormatList, NativeFormatRecord,
    NativeFormatSource, StaticFormatSource,
};
pub use png::{PngProfileTypes, PngReadDefines};
pub use psd::PsdReadDefines;
pub use registry::FormatRegistry;
pub use webp::{
    WebPAlphaCompression, WebPAlphaFiltering, WebPFilterType, WebPImageHint, WebPPreprocessing,
    WebPWriteDefines,
};
