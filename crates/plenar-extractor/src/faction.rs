//! Faction pattern registry
//!
//! Ordered list of canonical faction abbreviations with OCR-tolerant
//! matchers. The first matching entry wins, so entries that are prefixes of
//! others (PDS before DIE LINKE., DPB before DP) come first.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

static GLOBAL: Lazy<FactionRegistry> = Lazy::new(FactionRegistry::new);

/// Ordered faction matchers, case-insensitive
pub struct FactionRegistry {
    patterns: Vec<(&'static str, Regex)>,
}

impl FactionRegistry {
    /// Create a registry with the Bundestag factions since 1949
    pub fn new() -> Self {
        let mut registry = Self {
            patterns: Vec::new(),
        };
        registry.init_patterns();
        registry
    }

    /// Shared registry, compiled on first use
    pub fn global() -> &'static FactionRegistry {
        &GLOBAL
    }

    fn init_patterns(&mut self) {
        // Current factions
        self.add_pattern("AfD", r"\bAfD\b|Alternative für Deutschland");
        self.add_pattern("BSW", r"\bBSW\b|Bündnis Sahra Wagenknecht");
        self.add_pattern(
            "BÜNDNIS 90/DIE GRÜNEN",
            r"(?:BÜNDNIS\s*(?:90)?/?(?:\s*D[1I]E)?|Bündnis\s*90/(?:\s*D[1I]E)?)?\s*[GC]R[UÜ].?\s*[ÑN]EN?(?:/Bündnis 90)?|BÜNDNISSES 90/\s?DIE GRÜNEN",
        );
        self.add_pattern(
            "CDU/CSU",
            r"(?:Gast|-)?(?:\s*\bC\s*[DSMU]\s*S?[DU]\s*(?:\s*[/,':!.-]?)*\s*(?:\s*C+\s*[DSs]?\s*[UÙ]?\s*)?)(?:-?Hosp\.|-Gast|1)?",
        );
        self.add_pattern("SPD", r"'?\bS(?:PD|DP)\b(?:\.|-Gast)?");
        self.add_pattern("FDP", r"\bF\.?\s*[PDO][.']?[DP]\b\.?");
        self.add_pattern(
            "PDS",
            r"(?:Gruppe\s*der\s*)?\bPDS\b(?:/(?:LL|Linke Liste))?",
        );
        self.add_pattern("DIE LINKE.", r"\bDIE\s+LIN\s?KEN?\b|\bLIN\s?KEN?\b");
        self.add_pattern("Fraktionslos", r"fraktionslos|parteilos");

        // Historic factions
        self.add_pattern("GB/BHE", r"(?:\bGB[/-]\s*)?\bBHE\b(?:-DG)?");
        self.add_pattern("DRP", r"\bDRP\b(?:-Hosp\.)?");
        self.add_pattern("FVP", r"\bFVP\b");
        self.add_pattern("DPB", r"\bDPB\b");
        self.add_pattern("DP", r"\bDP\b");
        self.add_pattern("KPD", r"\bKPD\b");
        self.add_pattern("Z", r"^Z$|\bZentrum\b");
        self.add_pattern("BP", r"\bBP\b|Bayernpartei");
        self.add_pattern("FU", r"\bFU\b");
        self.add_pattern("WAV", r"\bWAV\b");
        self.add_pattern("SSW", r"\bSSW\b");
        self.add_pattern("SRP", r"\bSRP\b");

        // Ordinary words when unanchored
        self.add_pattern("DA", r"^DA$");
        self.add_pattern("DBP", r"^DBP$");
        self.add_pattern("NR", r"^NR$");
        self.add_pattern("Gast", r"^Gast$");
    }

    fn add_pattern(&mut self, abbreviation: &'static str, pattern: &str) {
        if let Ok(regex) = RegexBuilder::new(pattern).case_insensitive(true).build() {
            self.patterns.push((abbreviation, regex));
        }
    }

    /// First faction whose pattern matches anywhere in `text`
    pub fn find(&self, text: &str) -> Option<&'static str> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.patterns
            .iter()
            .find(|(_, regex)| regex.is_match(text))
            .map(|(abbreviation, _)| *abbreviation)
    }

    /// Abbreviation equal to `text`, ignoring case
    pub fn exact(&self, text: &str) -> Option<&'static str> {
        let needle = text.trim().to_lowercase();
        self.patterns
            .iter()
            .map(|(abbreviation, _)| *abbreviation)
            .find(|abbreviation| abbreviation.to_lowercase() == needle)
    }

    /// Exact abbreviation first, then pattern search
    pub fn resolve(&self, text: &str) -> Option<&'static str> {
        self.exact(text).or_else(|| self.find(text))
    }

    /// Whether `text` is exactly one of the canonical abbreviations
    pub fn is_abbreviation(&self, text: &str) -> bool {
        self.exact(text).is_some()
    }

    /// Canonical abbreviations in priority order
    pub fn abbreviations(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.patterns.iter().map(|(abbreviation, _)| *abbreviation)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for FactionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
