//! Escaping schemes used in generated search shards

use std::string::FromUtf8Error;

use regex::{Captures, Regex};

lazy_static::lazy_static! {
    static ref KEY_ESCAPE: Regex = Regex::new(r"_([0-9a-fA-F]{2})").unwrap();
    static ref HTML_ENTITY: Regex = Regex::new(r"&(lt|gt|amp|quot|apos|#[0-9]+);").unwrap();
}

/// Decode a Doxygen search key, where every non-alphanumeric byte is
/// written as `_` followed by two hex digits (`really_5fcopy`).
///
/// Fails when the decoded bytes are not UTF-8 (`a_ff`).
pub fn decode_key(raw: &str) -> Result<String, FromUtf8Error> {
    if !raw.contains('_') {
        return Ok(raw.to_string());
    }

    let mut bytes = Vec::with_capacity(raw.len());
    let mut last = 0;
    for caps in KEY_ESCAPE.captures_iter(raw) {
        let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
        bytes.extend_from_slice(raw[last..whole.start].as_bytes());
        match u8::from_str_radix(&caps[1], 16) {
            Ok(b) => bytes.push(b),
            Err(_) => bytes.extend_from_slice(raw[whole.clone()].as_bytes()),
        }
        last = whole.end;
    }
    bytes.extend_from_slice(raw[last..].as_bytes());

    String::from_utf8(bytes)
}

/// Lowercased lookup form of an already decoded name.
///
/// Whitespace is significant here; loaders trim keys before normalizing.
pub fn normalize_key(name: &str) -> String {
    name.to_lowercase()
}

/// Decode the handful of HTML entities generators emit in labels.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    HTML_ENTITY
        .replace_all(text, |caps: &Captures| match &caps[1] {
            "lt" => "<".to_string(),
            "gt" => ">".to_string(),
            "amp" => "&".to_string(),
            "quot" => "\"".to_string(),
            "apos" => "'".to_string(),
            numeric => numeric[1..]
                .parse::<u32>()
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string()),
        })
        .into_owned()
}
