//! Coder options passed to the native library as key/value defines.

use super::format::MagickFormat;
use std::collections::BTreeMap;
use std::fmt;

/// A `<format>:<name>=<value>` coder option, or a bare key such as
/// `profile:skip`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagickDefine {
    pub format: Option<MagickFormat>,
    pub name: String,
    pub value: String,
}

impl MagickDefine {
    pub fn new(format: MagickFormat, name: &str, value: impl DefineValue) -> Self {
        Self {
            format: Some(format),
            name: name.to_string(),
            value: value.render(),
        }
    }

    /// A define whose key is used as-is.
    pub fn bare(key: &str, value: impl DefineValue) -> Self {
        Self {
            format: None,
            name: key.to_string(),
            value: value.render(),
        }
    }

    pub fn key(&self) -> String {
        match self.format {
            Some(format) => format!("{}:{}", format.native_name().to_ascii_lowercase(), self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for MagickDefine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key(), self.value)
    }
}

/// Values a define can carry.
pub trait DefineValue {
    fn render(self) -> String;
}

impl DefineValue for bool {
    fn render(self) -> String {
        if self { "true" } else { "false" }.to_string()
    }
}

macro_rules! display_value {
    ($($ty:ty),*) => {
        $(impl DefineValue for $ty {
            fn render(self) -> String {
                self.to_string()
            }
        })*
    };
}

display_value!(i32, i64, u32, u64, usize, f64, String, &str);

/// A group of coder options for one format.
pub trait DefinesCreator {
    fn format(&self) -> MagickFormat;

    /// The defines for every option that is set, in a fixed order.
    fn defines(&self) -> impl Iterator<Item = MagickDefine>;

    /// Helper for implementors: a define keyed by this creator's format.
    fn define(&self, name: &str, value: impl DefineValue) -> MagickDefine
    where
        Self: Sized,
    {
        MagickDefine::new(self.format(), name, value)
    }

    /// Insert every define into a key/value option table.
    fn apply_to(&self, options: &mut BTreeMap<String, String>) {
        for define in self.defines() {
            options.insert(define.key(), define.value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    impl DefinesCreator for Fixed {
        fn format(&self) -> MagickFormat {
            MagickFormat::Jpeg
        }

        fn defines(&self) -> impl Iterator<Item = MagickDefine> {
            [
                self.define("quality", 90),
                MagickDefine::bare("profile:skip", "Icc"),
            ]
            .into_iter()
        }
    }

    #[test]
    fn keys_are_prefixed_with_lowercase_format() {
        let define = MagickDefine::new(MagickFormat::WebP, "lossless", true);
        assert_eq!(define.key(), "webp:lossless");
        assert_eq!(define.value, "true");
        assert_eq!(define.to_string(), "webp:lossless=true");
    }

    #[test]
    fn bare_keys_are_used_as_is() {
        let define = MagickDefine::bare("profile:skip", "Exif,Icc");
        assert_eq!(define.key(), "profile:skip");
    }

    #[test]
    fn values_render_invariantly() {
        assert_eq!(false.render(), "false");
        assert_eq!(42i64.render(), "42");
        assert_eq!(40.0f64.render(), "40");
        assert_eq!(42.5f64.render(), "42.5");
    }

    #[test]
    fn defines_stream_in_declaration_order() {
        let keys: Vec<String> = Fixed.defines().map(|d| d.key()).collect();
        assert_eq!(keys, vec!["jpeg:quality", "profile:skip"]);
    }

    #[test]
    fn apply_inserts_every_define() {
        let mut options = BTreeMap::new();
        options.insert("jpeg:quality".to_string(), "10".to_string());
        Fixed.apply_to(&mut options);
        assert_eq!(options["jpeg:quality"], "90");
        assert_eq!(options["profile:skip"], "Icc");
    }
}
