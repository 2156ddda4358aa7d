//! WebP write options.
//!
//! Every field is optional; unset fields emit no define and leave the encoder
//! default in place. Enum options are sent as their numeric value, except the
//! image hint which is sent by name.

use super::defines::{DefinesCreator, MagickDefine};
use super::format::MagickFormat;
use strum::{Display, EnumIter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum WebPAlphaCompression {
    None = 0,
    Compressed = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum WebPAlphaFiltering {
    None = 0,
    Fast = 1,
    Best = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum WebPFilterType {
    Simple = 0,
    Strong = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum WebPImageHint {
    Default,
    Picture,
    Photo,
    Graph,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum WebPPreprocessing {
    None = 0,
    SegmentSmooth = 1,
    PseudoRandomDithering = 2,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebPWriteDefines {
    pub alpha_compression: Option<WebPAlphaCompression>,
    pub alpha_filtering: Option<WebPAlphaFiltering>,
    /// 0 to 100.
    pub alpha_quality: Option<i32>,
    pub auto_filter: Option<bool>,
    pub emulate_jpeg_size: Option<bool>,
    /// Keep RGB values under transparent areas.
    pub exact: Option<bool>,
    pub filter_sharpness: Option<i32>,
    pub filter_strength: Option<i32>,
    pub filter_type: Option<WebPFilterType>,
    pub image_hint: Option<WebPImageHint>,
    pub lossless: Option<bool>,
    pub low_memory: Option<bool>,
    /// Speed/quality trade-off, 0 (fast) to 6 (slow).
    pub method: Option<i32>,
    pub near_lossless: Option<i32>,
    pub partition_limit: Option<i32>,
    pub partitions: Option<i32>,
    /// Entropy analysis passes, 1 to 10.
    pub pass: Option<i32>,
    pub preprocessing: Option<WebPPreprocessing>,
    pub segment: Option<i32>,
    pub show_compressed: Option<bool>,
    pub sns_strength: Option<i32>,
    pub target_psnr: Option<f64>,
    /// Target size in bytes.
    pub target_size: Option<i32>,
    pub thread_level: Option<bool>,
    pub use_sharp_yuv: Option<bool>,
}

impl DefinesCreator for WebPWriteDefines {
    fn format(&self) -> MagickFormat {
        MagickFormat::WebP
    }

    fn defines(&self) -> impl Iterator<Item = MagickDefine> {
        [
            self.alpha_compression.map(|v| self.define("alpha-compression", v as i32)),
            self.alpha_filtering.map(|v| self.define("alpha-filtering", v as i32)),
            self.alpha_quality.map(|v| self.define("alpha-quality", v)),
            self.auto_filter.map(|v| self.define("auto-filter", v)),
            self.emulate_jpeg_size.map(|v| self.define("emulate-jpeg-size", v)),
            self.exact.map(|v| self.define("exact", v)),
            self.filter_strength.map(|v| self.define("filter-strength", v)),
            self.filter_sharpness.map(|v| self.define("filter-sharpness", v)),
            self.filter_type.map(|v| self.define("filter-type", v as i32)),
            self.image_hint.map(|v| self.define("image-hint", v.to_string())),
            self.lossless.map(|v| self.define("lossless", v)),
            self.low_memory.map(|v| self.define("low-memory", v)),
            self.method.map(|v| self.define("method", v)),
            self.near_lossless.map(|v| self.define("near-lossless", v)),
            self.partition_limit.map(|v| self.define("partition-limit", v)),
            self.partitions.map(|v| self.define("partitions", v)),
            self.pass.map(|v| self.define("pass", v)),
            self.preprocessing.map(|v| self.define("preprocessing", v as i32)),
            self.segment.map(|v| self.define("segment", v)),
            self.show_compressed.map(|v| self.define("show-compressed", v)),
            self.sns_strength.map(|v| self.define("sns-strength", v)),
            self.target_psnr.map(|v| self.define("target-psnr", v)),
            self.target_size.map(|v| self.define("target-size", v)),
            self.thread_level.map(|v| self.define("thread-level", v)),
            self.use_sharp_yuv.map(|v| self.define("use-sharp-yuv", v)),
        ]
        .into_iter()
        .flatten()
    }
}
