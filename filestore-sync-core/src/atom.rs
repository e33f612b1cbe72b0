//! Minimal reader for the Atom feeds returned by folder listings.
//!
//! Elements are matched by local name, whatever namespace prefix they carry
//! (`atom:entry` and `entry` alike); the namespace URI itself is not checked.
//! Text content is unescaped for the predefined entities and numeric
//! character references. CDATA sections are not supported.

use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use crate::artifact::ArtifactKind;

/// One `atom:entry` of a listing: the raw (still escaped) entity id and its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub raw_id: String,
    pub kind: ArtifactKind,
}

fn entry_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<(?:[\w.-]+:)?entry\b[^>]*>(.*?)</(?:[\w.-]+:)?entry>")
            .expect("valid entry regex")
    })
}

fn id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<(?:[\w.-]+:)?id>(.*?)</(?:[\w.-]+:)?id>").expect("valid id regex")
    })
}

fn term_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"<(?:[\w.-]+:)?category\b[^>]*?\bterm\s*=\s*["']([^"']*)["']"#)
            .expect("valid category regex")
    })
}

/// Extracts every file/folder entry from a listing feed.
///
/// Entries without an id or with an unknown category term are skipped.
pub fn parse_feed(body: &str) -> Vec<FeedEntry> {
    let mut entries = Vec::new();

    for entry in entry_re().captures_iter(body) {
        let inner = &entry[1];
        let raw_id = match id_re().captures(inner) {
            Some(caps) => unescape_xml(caps[1].trim()),
            None => {
                warn!("Skipping Atom entry without atom:id");
                continue;
            }
        };
        let term = term_re()
            .captures(inner)
            .map(|caps| caps[1].to_string())
            .unwrap_or_default();

        match ArtifactKind::from_term(&term) {
            Some(kind) => entries.push(FeedEntry { raw_id, kind }),
            None => warn!(id = %raw_id, term = %term, "Skipping Atom entry with unknown category"),
        }
    }

    entries
}

fn entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|lt|gt|quot|apos|amp);").expect("valid entity regex")
    })
}

/// Single pass, so `&amp;lt;` stays `&lt;`. Unknown or invalid references are kept as is.
pub fn unescape_xml(text: &str) -> String {
    entity_re()
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            let decoded = match name {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "amp" => Some('&'),
                _ => {
                    let code = match name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => name[1..].parse::<u32>().ok(),
                    };
                    code.and_then(char::from_u32)
                }
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}
