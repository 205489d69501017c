//! Multi-valued parameter decoding.
//!
//! GExport flattens some parameters into a single attribute value of the
//! shape `key-value&key-value&...` (e.g. `BAND-7&POWER-20`). The decoder
//! recognizes that shape and splits it into ordered (child key, child value)
//! pairs so the engine can fan the parameter out into one column per child.
//!
//! Detection is purely syntactic. A legitimately hyphenated value that
//! happens to repeat the `token-token&token-token` shape is indistinguishable
//! from a real encoding and is expanded too; that is an accepted limit of the
//! source format, not something to correct here.

use once_cell::sync::Lazy;
use regex::Regex;

/// A parameter name that is never decoded, whatever its value looks like.
const EXEMPT_PARAMETER: &str = "ACTION";

/// Two or more `key-value` groups joined by `&`.
static MULTI_VALUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^-]+-[^-]+)(?:&[^-]+-[^-]+)+$").unwrap());

/// Decode a raw attribute value into (child key, child value) pairs.
///
/// Returns `None` for plain values and for the exempt `ACTION` parameter,
/// which keeps its raw `&`-joined value as a single column. The caller is
/// expected to pass the already-uppercased parameter name.
pub fn decode(param_name: &str, raw_value: &str) -> Option<Vec<(String, String)>> {
    if param_name == EXEMPT_PARAMETER || !MULTI_VALUE_RE.is_match(raw_value) {
        return None;
    }

    let pairs = raw_value
        .split('&')
        .map(|segment| {
            // Key ends at the first '-'; the value keeps any later hyphens.
            let (key, value) = segment.split_once('-').unwrap_or((segment, ""));
            (key.to_string(), value.to_string())
        })
        .collect();

    Some(pairs)
}
