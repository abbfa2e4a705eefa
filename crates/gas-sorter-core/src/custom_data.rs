//! Line-oriented `key=value` text kept in a block's free-text field.
//!
//! The field is shared with players and other plugins, so writes only touch
//! lines that carry our key. Every other byte, blank lines and `\r\n`
//! endings included, is carried over unchanged.

/// Prefix of the Gas Control line, e.g. `[GasSorter]GasControl=1`.
pub const GAS_CONTROL_KEY: &str = "[GasSorter]GasControl=";

fn starts_with_ignore_case(line: &str, key: &str) -> bool {
    line.get(..key.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(key))
}

/// Value of the first line whose trimmed text starts with `key`.
///
/// Key matching is case-insensitive; the value is trimmed.
pub fn find_value<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    text.split('\n').find_map(|raw| {
        let line = raw.trim();
        starts_with_ignore_case(line, key).then(|| line[key.len()..].trim())
    })
}

/// Return `text` with every `key` line set to `value`, appending one if absent.
pub fn set_value(text: &str, key: &str, value: &str) -> String {
    let mut out = String::with_capacity(text.len() + key.len() + value.len() + 1);
    let mut found = false;

    for segment in text.split_inclusive('\n') {
        let body = segment.trim_end_matches(['\n', '\r']);
        if starts_with_ignore_case(body.trim_start(), key) {
            out.push_str(key);
            out.push_str(value);
            out.push_str(&segment[body.len()..]);
            found = true;
        } else {
            out.push_str(segment);
        }
    }

    if !found {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(key);
        out.push_str(value);
        out.push('\n');
    }

    out
}

/// Parse a persisted boolean. `1` and `true` (any case) are on; all else off.
pub fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

/// Encode a boolean the way [`parse_flag`] reads it.
pub fn encode_flag(on: bool) -> &'static str {
    if on { "1" } else { "0" }
}
