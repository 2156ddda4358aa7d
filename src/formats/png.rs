//! PNG read options.

use super::defines::{DefinesCreator, MagickDefine};
use super::format::MagickFormat;
use bitflags::bitflags;

bitflags! {
    /// Profiles the PNG reader can skip.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PngProfileTypes: u8 {
        const EXIF = 0b0001;
        const ICC = 0b0010;
        const IPTC = 0b0100;
        const XMP = 0b1000;
    }
}

impl PngProfileTypes {
    /// Comma-separated profile names as the native reader expects them.
    pub fn to_define_value(self) -> String {
        const NAMES: [(PngProfileTypes, &str); 4] = [
            (PngProfileTypes::EXIF, "Exif"),
            (PngProfileTypes::ICC, "Icc"),
            (PngProfileTypes::IPTC, "Iptc"),
            (PngProfileTypes::XMP, "Xmp"),
        ];
        NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PngReadDefines {
    /// Maximum number of ancillary chunks to read.
    pub chunk_cache_max: Option<i64>,
    /// Maximum memory a single chunk may allocate.
    pub chunk_malloc_max: Option<i64>,
    /// Keep the iCCP chunk even when it is invalid.
    pub preserve_iccp: bool,
    pub ignore_crc: bool,
    pub skip_profiles: Option<PngProfileTypes>,
    /// Swap bytes of 16-bit samples.
    pub swap_bytes: bool,
}

impl DefinesCreator for PngReadDefines {
    fn format(&self) -> MagickFormat {
        MagickFormat::Png
    }

    fn defines(&self) -> impl Iterator<Item = MagickDefine> {
        let skip_profiles = self
            .skip_profiles
            .map(PngProfileTypes::to_define_value)
            .filter(|value| !value.is_empty())
            .map(|value| MagickDefine::bare("profile:skip", value));
        [
            self.chunk_cache_max.map(|max| self.define("chunk-cache-max", max)),
            self.chunk_malloc_max.map(|max| self.define("chunk-malloc-max", max)),
            self.ignore_crc.then(|| self.define("ignore-crc", true)),
            self.preserve_iccp.then(|| self.define("preserve-iCCP", true)),
            skip_profiles,
            self.swap_bytes.then(|| self.define("swap-bytes", true)),
        ]
        .into_iter()
        .flatten()
    }
}
