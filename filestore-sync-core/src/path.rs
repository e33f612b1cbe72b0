//! Path encoding and normalisation between local ids and filestore ids.
//!
//! The filestore addresses entities by container-relative ids whose segments
//! are percent-escaped and joined by an escaped slash (`%2f`). Local ids are
//! plain `/`-separated paths. Everything that converts between the two lives
//! here.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left untouched by URI-component encoding.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const SLASH_ESCAPED: &str = "%2f";
const SLASH_ESCAPED_UPPER: &str = "%2F";

/// Encodes a value the way a URI component is encoded: everything except
/// `A-Z a-z 0-9 - _ . ! ~ * ' ( )` becomes `%XX` with upper-case hex.
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Decodes `%XX` sequences. Invalid UTF-8 is replaced rather than rejected.
pub fn decode_component(value: &str) -> String {
    percent_decode_str(value).decode_utf8_lossy().into_owned()
}

/// Splits an id into its parent path and its last segment.
///
/// `/sub/b.txt` gives `("/sub", "b.txt")`, `/a.txt` gives `("", "a.txt")`.
pub fn split_parent(id: &str) -> (&str, &str) {
    match id.rfind('/') {
        Some(index) => (&id[..index], &id[index + 1..]),
        None => ("", id),
    }
}

/// Turns a filestore entity id into a local-style id rooted at the container.
///
/// The container prefix is stripped in its encoded form. A container inside a
/// namespace (`/NS/APP`) encodes to `%2FNS%2FAPP` while the server reports the
/// prefix with lower-case escapes, so exactly the first two escaped slashes
/// are upper-cased before stripping. The remainder is split on escaped
/// slashes and each segment is decoded.
pub fn normalize_remote_id(raw_id: &str, container: &str) -> String {
    let encoded_container = encode_component(container);

    let mut id = raw_id.to_string();
    if encoded_container.contains(SLASH_ESCAPED_UPPER) {
        id = id.replacen(SLASH_ESCAPED, SLASH_ESCAPED_UPPER, 1);
        id = id.replacen(SLASH_ESCAPED, SLASH_ESCAPED_UPPER, 1);
    }

    let stripped = id.replacen(&encoded_container, "", 1);
    let stripped = stripped.replace(SLASH_ESCAPED_UPPER, SLASH_ESCAPED);

    let mut segments: Vec<&str> = stripped.split(SLASH_ESCAPED).collect();
    if segments.first() == Some(&"") {
        segments.remove(0);
    }

    let decoded: Vec<String> = segments.into_iter().map(decode_component).collect();
    format!("/{}", decoded.join("/"))
}

/// Converts a relative path using `separator` into a normalised id.
///
/// Empty segments (leading, doubled or trailing separators) are dropped.
pub fn to_id(relative_path: &str, separator: char) -> String {
    let segments: Vec<&str> = relative_path
        .split(separator)
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();
    format!("/{}", segments.join("/"))
}
