//! Format identifiers and native-name normalization.
//!
//! Native coder names are upper-case and may contain dashes (`RADIAL-GRADIENT`)
//! or start with a digit (`3FR`). Identifiers are Rust variants, so a native
//! name is normalized before parsing:
//!
//! 1. dashes are removed: `RADIAL-GRADIENT` → `RADIALGRADIENT`
//! 2. a three-character name starting with a digit has the digit spelled out:
//!    `3FR` → `ThreeFR`, `3G2` → `ThreeG2`
//! 3. the result is parsed case-insensitively: `ThreeFR` → [`MagickFormat::ThreeFr`]
//!
//! The same normalization applies to file extensions.

use serde::Serialize;
use std::path::Path;
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Identifier of an image format coder.
///
/// Coders the native library registers under a name not listed here are
/// skipped by the registry.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum MagickFormat {
    Unknown,
    ThreeFr,
    ThreeG2,
    ThreeGp,
    A,
    Aai,
    Ai,
    Apng,
    Art,
    Arw,
    Avi,
    Avif,
    Avs,
    B,
    Bgr,
    Bgra,
    Bgro,
    Bmp,
    Bmp2,
    Bmp3,
    Brf,
    C,
    Cal,
    Cals,
    Canvas,
    Caption,
    Cin,
    Cip,
    Clip,
    Cmyk,
    Cmyka,
    Cr2,
    Cr3,
    Crw,
    Cube,
    Cur,
    Cut,
    Data,
    Dcm,
    Dcr,
    Dcraw,
    Dcx,
    Dds,
    Dfont,
    Dib,
    Dng,
    Dpx,
    Dxt1,
    Dxt5,
    Emf,
    Epdf,
    Epi,
    Eps,
    Eps2,
    Eps3,
    Epsf,
    Epsi,
    Ept,
    Ept2,
    Ept3,
    Erf,
    Exr,
    Farbfeld,
    Fax,
    Ff,
    Fits,
    Fl32,
    Flv,
    Fractal,
    Fts,
    G,
    G3,
    G4,
    Gif,
    Gif87,
    Gradient,
    Gray,
    Graya,
    Group4,
    Hald,
    Hdr,
    Heic,
    Heif,
    Histogram,
    Hrz,
    Htm,
    Html,
    Icb,
    Ico,
    Icon,
    Iiq,
    Info,
    Inline,
    Ipl,
    Isobrl,
    Isobrl6,
    J2c,
    J2k,
    Jng,
    Jnx,
    Jp2,
    Jpc,
    Jpe,
    Jpeg,
    Jpg,
    Jpm,
    Jps,
    Jpt,
    Json,
    Jxl,
    K,
    K25,
    Kdc,
    Label,
    M,
    M2v,
    M4v,
    Mac,
    Map,
    Mask,
    Mat,
    Matte,
    Mef,
    Miff,
    Mkv,
    Mng,
    Mono,
    Mov,
    Mp4,
    Mpc,
    Mpeg,
    Mpg,
    Mrw,
    Msl,
    Msvg,
    Mtv,
    Mvg,
    Nef,
    Nrw,
    Null,
    O,
    Ora,
    Orf,
    Otb,
    Otf,
    Pal,
    Palm,
    Pam,
    Pango,
    Pattern,
    Pbm,
    Pcd,
    Pcds,
    Pcl,
    Pct,
    Pcx,
    Pdb,
    Pdf,
    Pdfa,
    Pef,
    Pes,
    Pfa,
    Pfb,
    Pfm,
    Pgm,
    Pgx,
    Phm,
    Picon,
    Pict,
    Pix,
    Pjpeg,
    Plasma,
    Png,
    Png00,
    Png24,
    Png32,
    Png48,
    Png64,
    Png8,
    Pnm,
    Pocketmod,
    Ppm,
    Ps,
    Ps2,
    Ps3,
    Psb,
    Psd,
    Ptif,
    Pwp,
    Qoi,
    R,
    RadialGradient,
    Raf,
    Ras,
    Raw,
    Rgb,
    Rgb565,
    Rgba,
    Rgbo,
    Rgf,
    Rla,
    Rle,
    Rmf,
    Rw2,
    Scr,
    Screenshot,
    Sct,
    Sfw,
    Sgi,
    Shtml,
    Six,
    Sixel,
    SparseColor,
    Sr2,
    Srf,
    Stegano,
    StrImg,
    Sun,
    Svg,
    Svgz,
    Text,
    Tga,
    Thumbnail,
    Tif,
    Tiff,
    Tiff64,
    Tile,
    Tim,
    Tm2,
    Ttc,
    Ttf,
    Txt,
    Ubrl,
    Ubrl6,
    Uil,
    Uyvy,
    Vda,
    Vicar,
    Vid,
    Viff,
    Vips,
    Vst,
    Wbmp,
    WebM,
    WebP,
    Wmf,
    Wmv,
    Wpg,
    X3f,
    Xbm,
    Xc,
    Xcf,
    Xpm,
    Xps,
    Xv,
    Y,
    Yaml,
    Ycbcr,
    Ycbcra,
    Yuv,
}

const DIGIT_WORDS: [&str; 10] = [
    "Zero", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine",
];

impl MagickFormat {
    /// Parse a native coder name. `None` for names with no identifier and for
    /// `UNKNOWN` itself.
    pub fn from_native_name(name: &str) -> Option<Self> {
        let normalized = normalize(name);
        Self::from_str(&normalized)
            .ok()
            .filter(|format| *format != MagickFormat::Unknown)
    }

    /// Format implied by a file extension, e.g. `photo.PNG` → `Png`.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        if extension.is_empty() {
            return None;
        }
        Self::from_native_name(extension)
    }

    /// The upper-case name the native library knows this coder by.
    ///
    /// Inverse of [`MagickFormat::from_native_name`] except for dashed names.
    pub fn native_name(&self) -> String {
        let name: &'static str = self.into();
        for (digit, word) in DIGIT_WORDS.iter().enumerate() {
            if let Some(rest) = name.strip_prefix(word)
                && rest.len() == 2
                && rest.starts_with(|c: char| c.is_ascii_uppercase())
            {
                return format!("{digit}{}", rest.to_ascii_uppercase());
            }
        }
        name.to_ascii_uppercase()
    }
}

fn normalize(name: &str) -> String {
    let name: String = name.chars().filter(|c| *c != '-').collect();
    let mut chars = name.chars();
    if name.chars().count() == 3
        && let Some(first) = chars.next()
        && let Some(digit) = first.to_digit(10)
    {
        return format!("{}{}", DIGIT_WORDS[digit as usize], chars.as_str());
    }
    name
}
