//! Environment variable naming.
//!
//! Every nesting level of the config tree contributes one upper-snake-case
//! segment, so `packagerConfig.osxSign.identity` is overridden by
//! `ELECTRON_FORGE_PACKAGER_CONFIG_OSX_SIGN_IDENTITY`.

use regex_lite::Regex;
use std::sync::LazyLock;

/// Any character followed by a capitalised word (`xHttp`, `PKey`).
static WORD_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("static regex"));

/// A lowercase letter or digit followed by an uppercase letter (`yH`, `2D`).
static CASE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("static regex"));

/// Convert a camelCase or PascalCase identifier into an env var segment.
///
/// Acronyms stay together: `myHTTPKey` becomes `MY_HTTP_KEY`. Applying the
/// function to its own output returns the output unchanged.
pub fn mangle(identifier: &str) -> String {
    let words = WORD_BOUNDARY.replace_all(identifier, "${1}_${2}");
    CASE_BOUNDARY
        .replace_all(&words, "${1}_${2}")
        .to_uppercase()
}

/// Name of the variable overriding `field` below `prefix`.
pub fn env_var_name(prefix: &str, field: &str) -> String {
    format!("{}_{}", prefix, mangle(field))
}

/// Name of the variable overriding a dotted path such as `packagerConfig.name`.
pub fn env_var_for_path(prefix: &str, path: &str) -> String {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .fold(prefix.to_string(), |acc, segment| env_var_name(&acc, segment))
}
