//! Transcript segmentation
//!
//! Detects speaker headers in three layouts and partitions the transcript
//! into turns. Header candidates from all layouts are merged and pruned
//! greedily by start offset; bodies are computed from the surviving headers
//! before noise turns are discarded.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

use crate::Segmenter;
use plenar_core::{HeaderFamily, SegmentationConfig, Span, Turn};

/// Letters-only run at the end of a glued header prefix
static TRAILING_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-zäöüÄÖÜß.\-\s]+$").unwrap());

/// Body consisting of one parenthesized stage direction
static STAGE_DIRECTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\([^)]+\)$").unwrap());

// ============================================================================
// Header candidates
// ============================================================================

#[derive(Debug, Clone)]
struct HeaderCandidate {
    family: HeaderFamily,
    span: Span,
    header: String,
    name: String,
    position: String,
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn without_whitespace(text: &str) -> String {
    text.split_whitespace().collect()
}

/// Byte offset where a glued prefix ends, e.g. 3 for `CSUAlexander`
///
/// A capital only starts a new word when it directly follows a letter, so
/// `Hans-Peter` has no glued prefix.
fn glued_prefix_len(token: &str) -> usize {
    let chars: Vec<(usize, char)> = token.char_indices().collect();
    chars
        .windows(3)
        .filter(|w| w[0].1.is_alphabetic() && w[1].1.is_uppercase() && w[2].1.is_lowercase())
        .map(|w| w[1].0)
        .last()
        .unwrap_or(0)
}

/// The layout repeats the name: the text before the clean name must already
/// contain it with the spaces removed
fn repeats_name(combined: &str, name: &str) -> bool {
    let compact = without_whitespace(combined);
    let name = without_whitespace(name);
    compact.len() > name.len() && compact[..compact.len() - name.len()].contains(&name)
}

// ============================================================================
// Segmenter
// ============================================================================

/// Rule-based segmenter for plenary transcripts
pub struct TranscriptSegmenter {
    patterns: Vec<(HeaderFamily, Regex)>,
    min_body_chars: usize,
    strip_name_headers: bool,
}

impl TranscriptSegmenter {
    /// Create a segmenter with default settings
    pub fn new() -> Self {
        Self::from_config(&SegmentationConfig::default())
    }

    /// Create a segmenter from configuration
    pub fn from_config(config: &SegmentationConfig) -> Self {
        let mut segmenter = Self {
            patterns: Vec::new(),
            min_body_chars: config.min_body_chars,
            strip_name_headers: config.strip_name_headers,
        };
        segmenter.init_patterns();
        segmenter
    }

    /// Set minimum body length
    pub fn with_min_body_chars(mut self, min_body_chars: usize) -> Self {
        self.min_body_chars = min_body_chars;
        self
    }

    /// Enable or disable removal of repeated name lines
    pub fn with_name_header_stripping(mut self, enabled: bool) -> Self {
        self.strip_name_headers = enabled;
        self
    }

    fn init_patterns(&mut self) {
        // AlexanderHoffmannCDU/CSUAlexander Hoffmann (CDU/CSU):
        self.add_pattern(
            HeaderFamily::NameRepeated,
            r"(?m)^[ \t]*([A-Za-zäöüÄÖÜß.]+)([^:\n()]+)\(([^()]+)\):",
        );
        // Dr. Angela Merkel (CDU/CSU):
        // A nested bracket marks an annotation, not a faction
        self.add_pattern(
            HeaderFamily::Parenthesized,
            r"(?m)^[ \t]*([A-Za-zäöüÄÖÜß.\- \t]+)\(([^()]+)\):",
        );
        // Dr. Angela Merkel, Bundeskanzlerin:
        // No brackets in the role, so prose followed by an annotation colon is skipped
        self.add_pattern(
            HeaderFamily::Role,
            r"(?m)^[ \t]*([A-Za-zäöüÄÖÜß.\- \t]+),[ \t]+([^:\n()\[\]]+):",
        );
    }

    fn add_pattern(&mut self, family: HeaderFamily, pattern: &str) {
        if let Ok(regex) = Regex::new(pattern) {
            self.patterns.push((family, regex));
        }
    }

    fn build_candidate(family: HeaderFamily, caps: &Captures<'_>) -> Option<HeaderCandidate> {
        let whole = caps.get(0)?;
        let (name, position) = match family {
            HeaderFamily::NameRepeated => {
                let combined = format!("{}{}", caps.get(1)?.as_str(), caps.get(2)?.as_str());
                let combined = combined.trim_end();
                let run = TRAILING_NAME.find(combined)?;
                let mut tokens: Vec<&str> = run.as_str().split_whitespace().collect();
                let first = *tokens.first()?;
                tokens[0] = &first[glued_prefix_len(first)..];
                let name = tokens.join(" ");

                // Plain headers are left to the parenthesized layout
                if run.start() == 0 && !repeats_name(combined, &name) {
                    return None;
                }
                (name, caps.get(3)?.as_str())
            }
            HeaderFamily::Parenthesized | HeaderFamily::Role => (
                normalize_whitespace(caps.get(1)?.as_str()),
                caps.get(2)?.as_str(),
            ),
        };

        if name.is_empty() {
            return None;
        }

        Some(HeaderCandidate {
            family,
            span: Span::new(whole.start(), whole.end()),
            header: whole.as_str().trim().to_string(),
            name,
            position: normalize_whitespace(position),
        })
    }

    fn candidates(&self, text: &str) -> Vec<HeaderCandidate> {
        self.patterns
            .iter()
            .flat_map(|(family, regex)| {
                regex
                    .captures_iter(text)
                    .filter_map(move |caps| Self::build_candidate(*family, &caps))
            })
            .collect()
    }

    /// Earliest start wins, ties go to the higher-priority family
    fn select(mut candidates: Vec<HeaderCandidate>) -> Vec<HeaderCandidate> {
        candidates.sort_by_key(|c| (c.span.start, c.family));

        let mut kept: Vec<HeaderCandidate> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if kept.iter().any(|k| k.span.intersects(&candidate.span)) {
                continue;
            }
            kept.push(candidate);
        }
        kept
    }

    fn strip_name_lines(body: &str, names: &HashSet<&str>) -> String {
        body.lines()
            .filter(|line| !names.contains(normalize_whitespace(line).as_str()))
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }

    fn is_noise(&self, body: &str) -> bool {
        body.chars().count() <= self.min_body_chars || STAGE_DIRECTION.is_match(body)
    }
}

impl Default for TranscriptSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Segmenter for TranscriptSegmenter {
    fn segment(&self, text: &str) -> Vec<Turn> {
        let candidates = self.candidates(text);
        let candidate_count = candidates.len();
        let headers = Self::select(candidates);

        let names: HashSet<&str> = if self.strip_name_headers {
            headers.iter().map(|h| h.name.as_str()).collect()
        } else {
            HashSet::new()
        };

        let mut turns = Vec::with_capacity(headers.len());
        for (i, header) in headers.iter().enumerate() {
            let body_end = headers.get(i + 1).map_or(text.len(), |next| next.span.start);
            let raw_body = &text[header.span.end..body_end];

            let leading = raw_body.len() - raw_body.trim_start().len();
            let trimmed = raw_body.trim();
            let body_span = Span::new(
                header.span.end + leading,
                header.span.end + leading + trimmed.len(),
            );

            let body = if self.strip_name_headers {
                Self::strip_name_lines(trimmed, &names)
            } else {
                trimmed.to_string()
            };

            if self.is_noise(&body) {
                continue;
            }

            turns.push(Turn {
                index: turns.len(),
                header: header.header.clone(),
                name_raw: header.name.clone(),
                position_raw: header.position.clone(),
                body,
                span: Span::new(header.span.start, body_span.end.max(header.span.end)),
                header_span: header.span,
                body_span,
                family: header.family,
            });
        }

        debug!(
            candidates = candidate_count,
            headers = headers.len(),
            turns = turns.len(),
            "segmented transcript"
        );

        turns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const LONG_BODY: &str = "Sehr geehrte Damen und Herren, ich komme zum Haushalt des Jahres.";

    fn segmenter() -> TranscriptSegmenter {
        TranscriptSegmenter::new()
    }

    #[test]
    fn test_parenthesized_header() {
        let text = format!("Dr. Angela Merkel (CDU/CSU):\n{LONG_BODY}\n");
        let turns = segmenter().segment(&text);

        assert_eq!(turns.len(), 1);
        let turn = &turns[0];
        assert_eq!(turn.family, HeaderFamily::Parenthesized);
        assert_eq!(turn.name_raw, "Dr. Angela Merkel");
        assert_eq!(turn.position_raw, "CDU/CSU");
        assert_eq!(turn.body, LONG_BODY);
        assert_eq!(&text[turn.body_span.start..turn.body_span.end], LONG_BODY);
        assert_eq!(turn.header, "Dr. Angela Merkel (CDU/CSU):");
    }

    #[test]
    fn test_role_header() {
        let text = format!("Olaf Scholz, Bundesminister der Finanzen:\n{LONG_BODY}");
        let turns = segmenter().segment(&text);

        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].family, HeaderFamily::Role);
        assert_eq!(turns[0].name_raw, "Olaf Scholz");
        assert_eq!(turns[0].position_raw, "Bundesminister der Finanzen");
    }

    #[test]
    fn test_prose_with_annotation_colon_is_not_a_header() {
        let body = "Wir haben viel erreicht, meine Damen und Herren. (Zuruf des Abg. Wehner [SPD]: Unsinn!)";
        let text = format!("Dr. Angela Merkel (CDU/CSU):\n{body}\n");
        let turns = segmenter().segment(&text);

        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].body, body);
    }

    #[test]
    fn test_nested_annotation_colon_is_not_a_header() {
        let body = "Das ist der richtige Weg für unser Land. (Zuruf des Abg. Schmidt (Hamburg): Falsch!)";
        let text = format!("Hans Müller (FDP):\n{body}\n");
        let turns = segmenter().segment(&text);

        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].name_raw, "Hans Müller");
        assert_eq!(turns[0].body, body);
    }

    #[test]
    fn test_name_repeated_header() {
        let text = format!("AlexanderHoffmannCDU/CSUAlexander Hoffmann (CDU/CSU):\n{LONG_BODY}");
        let turns = segmenter().segment(&text);

        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].family, HeaderFamily::NameRepeated);
        assert_eq!(turns[0].name_raw, "Alexander Hoffmann");
        assert_eq!(turns[0].position_raw, "CDU/CSU");
    }

    #[test]
    fn test_glued_name_without_separator() {
        let text = format!("AngelaMerkelAngela Merkel (CDU/CSU):\n{LONG_BODY}");
        let turns = segmenter().segment(&text);

        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].family, HeaderFamily::NameRepeated);
        assert_eq!(turns[0].name_raw, "Angela Merkel");
    }

    #[test]
    fn test_glued_faction_prefix() {
        let text = format!("CDU/CSUAlexander Hoffmann (CDU/CSU):\n{LONG_BODY}");
        let turns = segmenter().segment(&text);

        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].family, HeaderFamily::NameRepeated);
        assert_eq!(turns[0].name_raw, "Alexander Hoffmann");
    }

    #[test]
    fn test_glued_hyphenated_name() {
        let text = format!(
            "Hans-PeterFriedrichCDU/CSUHans-Peter Friedrich (CDU/CSU):\n{LONG_BODY}"
        );
        let turns = segmenter().segment(&text);

        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].family, HeaderFamily::NameRepeated);
        assert_eq!(turns[0].name_raw, "Hans-Peter Friedrich");
    }

    #[test]
    fn test_plain_names_keep_hyphens_and_capitals() {
        let names = [
            "Hans-Peter Friedrich",
            "Ernst Müller-Hermann",
            "Karl-Theodor zu Guttenberg",
            "Dr. Hans-Ulrich Krüger",
            "DeWitt",
            "Ernst DeWitt",
        ];
        for name in names {
            let text = format!("{name} (CDU/CSU):\n{LONG_BODY}");
            let turns = segmenter().segment(&text);

            assert_eq!(turns.len(), 1, "{name}");
            assert_eq!(turns[0].family, HeaderFamily::Parenthesized, "{name}");
            assert_eq!(turns[0].name_raw, name);
            assert_eq!(turns[0].position_raw, "CDU/CSU");
        }
    }

    #[test]
    fn test_bodies_partition_text() {
        let text = format!(
            "Dr. Angela Merkel (CDU/CSU):\n{LONG_BODY}\nOlaf Scholz (SPD):\n{LONG_BODY} Danke.\n"
        );
        let turns = segmenter().segment(&text);

        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].index, 0);
        assert_eq!(turns[1].index, 1);
        assert_eq!(turns[0].body, LONG_BODY);
        assert_eq!(turns[1].body, format!("{LONG_BODY} Danke."));
        assert!(turns[0].span.end <= turns[1].span.start);
        assert_eq!(turns[1].name_raw, "Olaf Scholz");
    }

    #[test]
    fn test_noise_turns_dropped() {
        let text = format!(
            "Dr. Angela Merkel (CDU/CSU):\n(Beifall bei der CDU/CSU)\nOlaf Scholz (SPD):\nZu kurz.\nAnnalena Baerbock (BÜNDNIS 90/DIE GRÜNEN):\n{LONG_BODY}"
        );
        let turns = segmenter().segment(&text);

        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].name_raw, "Annalena Baerbock");
        assert_eq!(turns[0].index, 0);
    }

    #[test]
    fn test_min_body_chars_boundary() {
        let body = "x".repeat(30);
        let text = format!("Olaf Scholz (SPD):\n{body}");
        assert!(segmenter().segment(&text).is_empty());

        let text = format!("Olaf Scholz (SPD):\n{body}x");
        assert_eq!(segmenter().segment(&text).len(), 1);

        let lenient = segmenter().with_min_body_chars(5);
        let text = format!("Olaf Scholz (SPD):\n{body}");
        assert_eq!(lenient.segment(&text).len(), 1);
    }

    #[test]
    fn test_repeated_name_lines_stripped() {
        let text = format!(
            "Olaf Scholz (SPD):\n{LONG_BODY}\nOlaf Scholz\n{LONG_BODY}\nDr. Angela Merkel (CDU/CSU):\n{LONG_BODY}"
        );
        let turns = segmenter().segment(&text);
        assert_eq!(turns[0].body, format!("{LONG_BODY}\n{LONG_BODY}"));

        let turns = segmenter().with_name_header_stripping(false).segment(&text);
        assert_eq!(turns[0].body, format!("{LONG_BODY}\nOlaf Scholz\n{LONG_BODY}"));
    }

    #[test]
    fn test_no_headers() {
        assert!(segmenter().segment("").is_empty());
        assert!(segmenter().segment(LONG_BODY).is_empty());
    }

    #[test]
    fn test_glued_prefix_len() {
        assert_eq!(glued_prefix_len("CSUAlexander"), 3);
        assert_eq!(glued_prefix_len("Alexander"), 0);
        assert_eq!(glued_prefix_len("Dr."), 0);
        assert_eq!(glued_prefix_len("AngelaMerkelAngela"), 12);
        assert_eq!(glued_prefix_len(""), 0);
        assert_eq!(glued_prefix_len("Hans-Peter"), 0);
        assert_eq!(glued_prefix_len("CSUHans-Peter"), 3);
    }

    #[test]
    fn test_repeats_name() {
        assert!(repeats_name("AngelaMerkelAngela Merkel", "Angela Merkel"));
        assert!(!repeats_name("Dr. Angela Merkel", "Dr. Angela Merkel"));
        assert!(!repeats_name("Hans-Peter Friedrich", "Peter Friedrich"));
        assert!(!repeats_name("DeWitt", "Witt"));
    }

    proptest! {
        #[test]
        fn test_turn_spans_never_overlap(
            lines in proptest::collection::vec(
                prop_oneof![
                    Just("Olaf Scholz (SPD):".to_string()),
                    Just("Dr. Angela Merkel, Bundeskanzlerin:".to_string()),
                    Just("AngelaMerkelCDUAngela Merkel (CDU/CSU):".to_string()),
                    Just("Hans-Peter Friedrich (CDU/CSU):".to_string()),
                    Just(LONG_BODY.to_string()),
                    "[a-zA-Z ,.():]{0,40}",
                ],
                0..20,
            )
        ) {
            let text = lines.join("\n");
            let turns = segmenter().segment(&text);
            for pair in turns.windows(2) {
                prop_assert!(pair[0].span.end <= pair[1].span.start);
                prop_assert!(pair[0].header_span.start < pair[1].header_span.start);
                prop_assert_eq!(pair[0].index + 1, pair[1].index);
            }
            for turn in &turns {
                prop_assert!(turn.body.chars().count() > 30);
                prop_assert!(turn.header_span.end <= turn.body_span.start);
                if turn.header == "Hans-Peter Friedrich (CDU/CSU):" {
                    prop_assert_eq!(turn.name_raw.as_str(), "Hans-Peter Friedrich");
                }
            }
        }
    }
}
