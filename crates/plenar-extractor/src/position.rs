//! Position classifier
//!
//! Maps the faction or role text of a speaker header to a role category.
//! Rules are tried in order and anchored at the start of the text; each
//! accepts the feminine `-in` form.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::faction::FactionRegistry;
use plenar_core::{PositionCategory, PositionInfo};

static GLOBAL: Lazy<PositionClassifier> = Lazy::new(PositionClassifier::new);

/// Optional feminine suffix followed by a separator
const SEPARATOR: &str = r"(?:in)?(?:\s|$|,|\.)";

/// Exact (lowercased) titles of the presiding officers
const PRESIDIUM_TITLES: [&str; 6] = [
    "präsidentin",
    "präsident",
    "präsident des deutschen bundestages",
    "präsidentin des deutschen bundestages",
    "vizepräsidentin",
    "vizepräsident",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Qualifier {
    Keep,
    Drop,
}

/// Ordered start-anchored role rules
pub struct PositionClassifier {
    rules: Vec<(Regex, PositionCategory, Qualifier)>,
    registry: &'static FactionRegistry,
}

impl PositionClassifier {
    pub fn new() -> Self {
        let mut classifier = Self {
            rules: Vec::new(),
            registry: FactionRegistry::global(),
        };
        classifier.init_rules();
        classifier
    }

    /// Shared classifier, compiled on first use
    pub fn global() -> &'static PositionClassifier {
        &GLOBAL
    }

    fn init_rules(&mut self) {
        use PositionCategory::*;

        self.add_rule(r"[Bb]erichterstatter", Member, Qualifier::Keep);

        // Presidium
        self.add_rule(r"[Bb]undestagspräsident", Presidium, Qualifier::Keep);
        self.add_rule(r"[Aa]lterspräsident", Presidium, Qualifier::Keep);
        self.add_rule(r"[Vv]izebundestagspräsident", Presidium, Qualifier::Keep);
        self.add_rule(r"[Ss]chriftführer", Presidium, Qualifier::Keep);

        // Guests
        self.add_rule(r"[Bb]undespräsident", Guest, Qualifier::Keep);
        self.add_rule(r"[Ss]taatsminister", Guest, Qualifier::Keep);
        self.add_rule(r"[Ss]enator", Guest, Qualifier::Keep);
        self.add_rule(r"[Pp]räsident", Guest, Qualifier::Keep);
        self.add_pattern(r"^[Gg]ast", Guest, Qualifier::Keep);

        // Government
        self.add_rule(r"[Bb]undeskanzler", Chancellor, Qualifier::Drop);
        self.add_rule(r"(?:Bundes)?[Mm]inister", Minister, Qualifier::Keep);
        self.add_rule(
            r"(?:[Pp]arl\s*\.\s+)?[Ss]taatssekretär",
            SecretaryOfState,
            Qualifier::Keep,
        );
    }

    fn add_rule(&mut self, stem: &str, category: PositionCategory, qualifier: Qualifier) {
        self.add_pattern(&format!("^{stem}{SEPARATOR}"), category, qualifier);
    }

    fn add_pattern(&mut self, pattern: &str, category: PositionCategory, qualifier: Qualifier) {
        if let Ok(regex) = Regex::new(pattern) {
            self.rules.push((regex, category, qualifier));
        }
    }

    /// Classify a raw role or faction string
    pub fn classify(&self, raw: &str) -> PositionInfo {
        let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");

        if self.registry.is_abbreviation(&text) {
            return PositionInfo::new(PositionCategory::Member, None);
        }

        // Exact presidium titles outrank the guest `Präsident` stem
        if PRESIDIUM_TITLES.contains(&text.to_lowercase().as_str()) {
            return PositionInfo::new(PositionCategory::Presidium, Some(text));
        }

        for (regex, category, qualifier) in &self.rules {
            if regex.is_match(&text) {
                let qualifier = match qualifier {
                    Qualifier::Keep => Some(text),
                    Qualifier::Drop => None,
                };
                return PositionInfo::new(*category, qualifier);
            }
        }

        PositionInfo::new(PositionCategory::NotFound, None)
    }
}

impl Default for PositionClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify with the shared classifier
pub fn classify_position(raw: &str) -> PositionInfo {
    PositionClassifier::global().classify(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use PositionCategory::*;

    fn category(raw: &str) -> PositionCategory {
        classify_position(raw).category
    }

    #[test]
    fn test_faction_is_member_without_qualifier() {
        let info = classify_position("CDU/CSU");
        assert_eq!(info.category, Member);
        assert_eq!(info.qualifier, None);
    }

    #[test]
    fn test_rapporteur_keeps_qualifier() {
        let info = classify_position("Berichterstatterin");
        assert_eq!(info.category, Member);
        assert_eq!(info.qualifier.as_deref(), Some("Berichterstatterin"));
    }

    #[test]
    fn test_presidium() {
        assert_eq!(category("Präsident"), Presidium);
        assert_eq!(category("Vizepräsidentin"), Presidium);
        assert_eq!(category("Präsidentin des Deutschen Bundestages"), Presidium);
        assert_eq!(category("Alterspräsident"), Presidium);
        assert_eq!(category("Schriftführerin"), Presidium);
    }

    #[test]
    fn test_guests() {
        assert_eq!(category("Bundespräsident"), Guest);
        assert_eq!(category("Präsident des Bundesrates"), Guest);
        assert_eq!(category("Staatsministerin für Kultur und Medien"), Guest);
        assert_eq!(category("Senator (Hamburg)"), Guest);
        assert_eq!(category("Gastredner"), Guest);
    }

    #[test]
    fn test_chancellor_drops_qualifier() {
        let info = classify_position("Bundeskanzlerin");
        assert_eq!(info.category, Chancellor);
        assert_eq!(info.qualifier, None);
        assert!(info.category.is_government());
    }

    #[test]
    fn test_ministers_and_secretaries() {
        let info = classify_position("Bundesministerin der Verteidigung");
        assert_eq!(info.category, Minister);
        assert_eq!(
            info.qualifier.as_deref(),
            Some("Bundesministerin der Verteidigung")
        );
        assert_eq!(category("Minister für Wirtschaft"), Minister);
        assert_eq!(category("Parl. Staatssekretär beim Bundesminister der Finanzen"), SecretaryOfState);
        assert_eq!(category("Staatssekretärin"), SecretaryOfState);
    }

    #[test]
    fn test_separator_is_literal_dot() {
        assert_eq!(category("Bundesministerium der Finanzen"), NotFound);
        assert_eq!(category("Bundeskanzleramt"), NotFound);
    }

    #[test]
    fn test_not_found() {
        let info = classify_position("Abgeordneter aus Berlin");
        assert_eq!(info.category, NotFound);
        assert_eq!(info.qualifier, None);
        assert_eq!(category(""), NotFound);
    }
}
