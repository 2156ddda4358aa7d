//! Naming conventions shared by the emitter and the output stage.
//!
//! Native exports follow `<Class>_<Member>[_Get|_Set]`, with `_Create` and
//! `_Dispose` reserved for construction and disposal. Generated Rust items use
//! snake_case members and a `Native` prefix on the wrapper struct:
//!
//! - `MagickImage` → struct `NativeMagickImage`, module `native_magick_image`
//! - `GetIPTCProfile` → fn `get_iptc_profile`
//! - `AnimationDelay` property → `animation_delay()` / `set_animation_delay()`

/// Rust keywords usable as raw identifiers.
const RAW_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Keywords that cannot be raw identifiers.
const RESERVED: &[&str] = &["crate", "self", "Self", "super"];

/// Locals the emitter declares inside every wrapper body.
const EMITTER_LOCALS: &[&str] = &["result", "exception", "outcome", "native", "instance"];

/// Convert a PascalCase or camelCase name to snake_case.
///
/// Acronym runs stay together: `GetIPTCProfile` → `get_iptc_profile`.
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower);
            if boundary && prev != '_' {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }
    out
}

/// A snake_case identifier safe to emit as a fn name.
pub fn fn_ident(name: &str) -> String {
    escape_keyword(to_snake_case(name))
}

/// A snake_case identifier safe to emit as an argument name.
///
/// Names that would shadow emitter locals get a trailing underscore.
pub fn argument_ident(name: &str) -> String {
    let snake = to_snake_case(name);
    if EMITTER_LOCALS.contains(&snake.as_str()) {
        return format!("{snake}_");
    }
    escape_keyword(snake)
}

fn escape_keyword(ident: String) -> String {
    if RESERVED.contains(&ident.as_str()) {
        format!("{ident}_")
    } else if RAW_KEYWORDS.contains(&ident.as_str()) {
        format!("r#{ident}")
    } else {
        ident
    }
}

/// Strip a raw-identifier prefix for use inside derived names.
fn bare(ident: &str) -> &str {
    ident.strip_prefix("r#").unwrap_or(ident)
}

/// Name of a helper local derived from an argument: `data` → `data_fixed`.
pub fn helper_local(argument: &str, suffix: &str) -> String {
    format!("{}_{suffix}", bare(&argument_ident(argument)))
}

pub fn native_struct_name(class: &str) -> String {
    format!("Native{class}")
}

pub fn module_name(class: &str) -> String {
    to_snake_case(&native_struct_name(class))
}

pub fn module_file_name(class: &str) -> String {
    format!("{}.rs", module_name(class))
}

/// Export of a method: `MagickImage_ReadBlob`.
pub fn export_name(class: &str, member: &str) -> String {
    format!("{class}_{member}")
}

pub fn getter_export(class: &str, property: &str) -> String {
    format!("{class}_{property}_Get")
}

pub fn setter_export(class: &str, property: &str) -> String {
    format!("{class}_{property}_Set")
}

pub fn create_export(class: &str) -> String {
    export_name(class, "Create")
}

pub fn dispose_export(class: &str) -> String {
    export_name(class, "Dispose")
}

/// Getter/setter fn names for a property.
pub fn property_fns(property: &str) -> (String, String) {
    let snake = to_snake_case(property);
    (escape_keyword(snake.clone()), format!("set_{snake}"))
}
