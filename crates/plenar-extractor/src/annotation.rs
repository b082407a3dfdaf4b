//! Annotation classifier
//!
//! Lifts parenthesized asides such as `(Beifall bei der SPD)` or
//! `(Zuruf des Abg. Wehner [SPD]: Unsinn!)` out of a speech body, replaces
//! each with a `{n}` marker and classifies it by keyword family:
//! - Applause, interjection, laughter, objection
//! - Interruption (never attributed)
//! - Disturbance, approval
//! - Other (fallback)

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::faction::FactionRegistry;
use crate::{AnnotationExtractor, ExtractedBody};
use plenar_core::{marker, Annotation, AnnotationKind, PositionNumbering};

/// One level of nested parentheses
static SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^()]*(\([^()]*\))*[^()]*)\)").unwrap());

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// `Abg.` followed by a name, up to a bracket, list separator or the end
static PERSON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Abg\s?\.\s?([A-ZÄÖÜa-zäöüß.\-\s]+?)(?:\s*\(|\s*\[|\s*,|\s+und\s|\s*$)").unwrap()
});

/// Boundary between sub-annotations, e.g. `Beifall bei der SPD – Zuruf von der AfD`
static SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s[–—]\s|\s-{1,2}\s|;").unwrap());

/// Parenthesized text right after a person; the closing bracket may be cut off
static TRAILING_PAREN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\(([^()]+)").unwrap());

/// Text from the start of the sub-annotation holding the keyword
fn keyword_segment<'a>(text: &'a str, keyword: &Regex) -> &'a str {
    let start = keyword.find(text).map_or(0, |m| m.start());
    let from = SEPARATOR
        .find_iter(&text[..start])
        .last()
        .map_or(0, |m| m.end());
    text[from..].trim_start()
}

fn first_sub_annotation(text: &str) -> &str {
    SEPARATOR.split(text).next().unwrap_or(text).trim()
}

// ============================================================================
// Classification rules
// ============================================================================

struct KindRule {
    kind: AnnotationKind,
    keyword: Regex,
    initiator: Option<Regex>,
}

/// Keyword-family classifier for parenthesized annotations
pub struct AnnotationClassifier {
    rules: Vec<KindRule>,
    numbering: PositionNumbering,
    registry: &'static FactionRegistry,
}

impl AnnotationClassifier {
    /// Create a classifier numbering markers in document order
    pub fn new() -> Self {
        let mut classifier = Self {
            rules: Vec::new(),
            numbering: PositionNumbering::default(),
            registry: FactionRegistry::global(),
        };
        classifier.init_rules();
        classifier
    }

    /// Set marker numbering policy
    pub fn with_numbering(mut self, numbering: PositionNumbering) -> Self {
        self.numbering = numbering;
        self
    }

    fn init_rules(&mut self) {
        self.add_rule(AnnotationKind::Applause, "beifall");
        self.add_rule(AnnotationKind::Interjection, "zuruf|gegenruf|ruf");
        self.add_rule(AnnotationKind::Laughter, "heiterkeit|lachen");
        self.add_rule(AnnotationKind::Objection, "widerspruch");
        self.add_rule(AnnotationKind::Interruption, "unterbrechung");
        self.add_rule(AnnotationKind::Disturbance, "unruhe");
        self.add_rule(
            AnnotationKind::Approval,
            "zustimmung|sehr richtig|sehr wahr|bravo",
        );
    }

    fn add_rule(&mut self, kind: AnnotationKind, keywords: &str) {
        let initiator = match kind {
            AnnotationKind::Interjection => Some(r"\b(?:von|des|der)\s+([^:)]+)".to_string()),
            _ if kind.has_actor() => Some(format!(
                r"(?:{keywords})\w*[!.,]?\s+(?:beim|bei|im|der|des|vom|von)\s+([^)]+)"
            )),
            _ => None,
        };

        let keyword = RegexBuilder::new(keywords).case_insensitive(true).build();
        let initiator = initiator
            .map(|pattern| RegexBuilder::new(&pattern).case_insensitive(true).build())
            .transpose();

        if let (Ok(keyword), Ok(initiator)) = (keyword, initiator) {
            self.rules.push(KindRule {
                kind,
                keyword,
                initiator,
            });
        }
    }

    /// Classify the inner text of one span
    pub fn classify(&self, raw: &str, position: usize) -> Annotation {
        let inner = raw
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .unwrap_or(raw);
        let text = WHITESPACE.replace_all(inner, " ").trim().to_string();

        let mut annotation = Annotation {
            kind: AnnotationKind::Other,
            position,
            raw: raw.to_string(),
            text,
            quote: None,
            person: None,
            constituency: None,
            faction: None,
        };

        let Some(rule) = self.rules.iter().find(|r| r.keyword.is_match(&annotation.text)) else {
            return annotation;
        };
        annotation.kind = rule.kind;

        // Compound spans are attributed from the keyword's own sub-annotation
        let segment = keyword_segment(&annotation.text, &rule.keyword).to_string();

        // Interjection speaker and words are split at the first colon
        let head = match segment.split_once(':') {
            Some((head, quote)) if rule.kind == AnnotationKind::Interjection => {
                let quote = quote.trim();
                if !quote.is_empty() {
                    annotation.quote = Some(quote.to_string());
                }
                head
            }
            _ => segment.as_str(),
        };

        let clause = rule
            .initiator
            .as_ref()
            .and_then(|regex| regex.captures(head))
            .and_then(|caps| caps.get(1))
            .map(|m| first_sub_annotation(m.as_str()));

        if let Some(clause) = clause {
            annotation.faction = self.registry.find(clause).map(str::to_string);

            if let Some(person) = PERSON.captures(clause).and_then(|caps| caps.get(1)) {
                let name = person.as_str().trim();
                if !name.is_empty() {
                    annotation.person = Some(name.to_string());
                    annotation.constituency = self.constituency_after(&clause[person.end()..]);
                }
            }
        }

        annotation
    }

    /// `(Hamburg)` after a person is a constituency unless it names a faction
    fn constituency_after(&self, rest: &str) -> Option<String> {
        let inner = TRAILING_PAREN.captures(rest)?.get(1)?.as_str().trim();
        if inner.is_empty() || self.registry.resolve(inner).is_some() {
            return None;
        }
        Some(inner.to_string())
    }

    fn position_for(&self, index: usize, count: usize) -> usize {
        match self.numbering {
            PositionNumbering::DocumentOrder => index,
            PositionNumbering::ScanOrder => count - 1 - index,
        }
    }
}

impl Default for AnnotationClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationExtractor for AnnotationClassifier {
    fn extract(&self, body: &str) -> ExtractedBody {
        let spans: Vec<(usize, usize)> = SPAN
            .find_iter(body)
            .map(|m| (m.start(), m.end()))
            .collect();
        let count = spans.len();

        let annotations: Vec<Annotation> = spans
            .iter()
            .enumerate()
            .map(|(index, &(start, end))| {
                self.classify(&body[start..end], self.position_for(index, count))
            })
            .collect();

        // Back to front so earlier offsets stay valid
        let mut cleaned = body.to_string();
        for (&(start, end), annotation) in spans.iter().zip(&annotations).rev() {
            cleaned.replace_range(start..end, &marker(annotation.position));
        }

        tracing::trace!(annotations = count, "extracted annotations");

        ExtractedBody {
            annotations,
            body: cleaned,
        }
    }
}
