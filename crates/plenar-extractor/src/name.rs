//! Speaker name parsing
//!
//! Splits a raw speaker name into honorifics, given names and family name.
//! Unparseable input yields an empty [`ParsedName`] rather than an error.

use once_cell::sync::Lazy;
use regex::Regex;

use plenar_core::{ParsedName, SpeakerFact};

/// Honorifics and nobility particles, matched token by token
pub const TITLE_TOKENS: [&str; 15] = [
    "Dr", "Frau", "D", "-Ing", "von", "und", "zu", "van", "de", "Baron", "Freiherr", "Prinz", "h",
    "c", "Prof",
];

static NON_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-ZÖÄÜäöüß\-]").unwrap());

static INTERJECTION_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(Gegenrufe?\sdes\s|Gegenrufe?\sder\s|Zurufe?\sdes\s|Zurufe?\sder\s)(Abg\s?\.\s)*",
    )
    .unwrap()
});

static MEMBER_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(Abg\s?\.\s?|Abgeordneten\s)").unwrap());

static LEADING_ARTICLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s?(der|die|das|von)(\s|$)").unwrap());

/// Split a raw name into titles, first names and last name
pub fn parse_name(raw: &str) -> ParsedName {
    let cleaned = NON_NAME_CHARS.replace_all(raw, " ");

    let mut parsed = ParsedName::default();
    let mut names = Vec::new();
    for token in cleaned.split_whitespace() {
        if TITLE_TOKENS.contains(&token) {
            parsed.titles.push(token.to_string());
        } else {
            names.push(token.to_string());
        }
    }

    if let Some(last) = names.pop() {
        parsed.last_name = last;
        parsed.first_names = names;
    }
    parsed
}

/// Strip interjection phrasing and member markers from a person fragment
///
/// `"Zuruf des Abg. Dr. Weber"` becomes `"Dr. Weber"`.
pub fn clean_name_fragment(raw: &str) -> String {
    let text = raw.replace('\n', " ");
    let text = INTERJECTION_PREFIX.replace_all(&text, "");
    let text = MEMBER_MARKER.replace_all(&text, "");
    let text = LEADING_ARTICLE.replace(&text, "");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Speaker facts for a turn header
pub fn speaker_fact(name_raw: &str, position_raw: &str) -> SpeakerFact {
    SpeakerFact {
        name: parse_name(name_raw),
        position_raw: position_raw.split_whitespace().collect::<Vec<_>>().join(" "),
    }
}
