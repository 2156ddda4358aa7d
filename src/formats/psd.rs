//! PSD read options.

use super::defines::{DefinesCreator, MagickDefine};
use super::format::MagickFormat;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PsdReadDefines {
    /// `Some(false)` disables alpha unblending of the merged image. The native
    /// default is on, so `Some(true)` emits nothing.
    pub alpha_unblend: Option<bool>,
    pub preserve_opacity_mask: Option<bool>,
    /// Copy the profiles of the merged image to every layer.
    pub replicate_profile: Option<bool>,
}

impl DefinesCreator for PsdReadDefines {
    fn format(&self) -> MagickFormat {
        MagickFormat::Psd
    }

    fn defines(&self) -> impl Iterator<Item = MagickDefine> {
        [
            (self.alpha_unblend == Some(false)).then(|| self.define("alpha-unblend", false)),
            self.preserve_opacity_mask
                .map(|value| self.define("preserve-opacity-mask", value)),
            self.replicate_profile
                .map(|value| self.define("replicate-profile", value)),
        ]
        .into_iter()
        .flatten()
    }
}
