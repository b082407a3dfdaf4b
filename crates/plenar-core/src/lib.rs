//! Plenar Core - Domain models, errors, and shared types
//!
//! This crate defines the core abstractions used throughout Plenar:
//! - Transcript, turn and annotation models
//! - Speaker facts and position categories
//! - Canonical reference records (factions, persons)
//! - Resolution outcomes
//! - Common error types
//! - Configuration management
//! - Electoral term calendar

pub mod config;
pub mod reference;
pub mod term;

pub use config::{
    AnnotationConfig, AppConfig, ConfigError, LoggingConfig, PipelineConfig, PositionNumbering,
    ResolutionConfig, SegmentationConfig,
};
pub use reference::ReferenceData;
pub use term::{term_for_date, ElectoralTerm, ELECTORAL_TERMS};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for Plenar operations
#[derive(Error, Debug)]
pub enum PlenarError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PlenarError>;

// ============================================================================
// Transcripts
// ============================================================================

/// Identifier of one sitting, e.g. `19001` for the first sitting of term 19
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u32);

impl SessionId {
    /// Electoral term encoded in the leading two digits
    pub fn electoral_term(&self) -> u32 {
        self.0 / 1000
    }

    /// Sitting number within the term
    pub fn sitting(&self) -> u32 {
        self.0 % 1000
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:05}", self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = PlenarError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.len() != 5 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(PlenarError::ValidationError(format!(
                "session id must have five digits: {s:?}"
            )));
        }
        trimmed
            .parse()
            .map(SessionId)
            .map_err(|e| PlenarError::ValidationError(format!("invalid session id {s:?}: {e}")))
    }
}

/// Raw text of one sitting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Session identifier
    pub session: SessionId,

    /// Date of the sitting, if known
    pub date: Option<NaiveDate>,

    /// Plain transcript text
    pub text: String,
}

impl Transcript {
    /// Create a new transcript
    pub fn new(session: SessionId, text: impl Into<String>) -> Self {
        Self {
            session,
            date: None,
            text: text.into(),
        }
    }

    /// Set sitting date
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Electoral term of this sitting
    pub fn electoral_term(&self) -> u32 {
        self.session.electoral_term()
    }
}

// ============================================================================
// Turns
// ============================================================================

/// Byte range into a transcript
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Half-open intersection test
    pub fn intersects(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Header layout that produced a turn
///
/// Declaration order is tie-break priority when two headers start at the
/// same offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderFamily {
    /// `AlexanderHoffmannCDU/CSUAlexander Hoffmann (CDU/CSU):`
    NameRepeated,
    /// `Name (Faction):`
    Parenthesized,
    /// `Name, Role:`
    Role,
}

impl HeaderFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NameRepeated => "name_repeated",
            Self::Parenthesized => "parenthesized",
            Self::Role => "role",
        }
    }
}

impl std::fmt::Display for HeaderFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One speaker-attributed block of a transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Position in the transcript's turn sequence
    pub index: usize,

    /// Matched header text
    pub header: String,

    /// Speaker name as written in the header
    pub name_raw: String,

    /// Faction or role text from the header
    pub position_raw: String,

    /// Speech body (trimmed)
    pub body: String,

    /// Header start to body end
    pub span: Span,

    /// Header location in the transcript
    pub header_span: Span,

    /// Location of the trimmed body in the transcript
    pub body_span: Span,

    /// Header layout that matched
    pub family: HeaderFamily,
}

// ============================================================================
// Annotations
// ============================================================================

/// Category of a parenthesized annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    Applause,
    Interjection,
    Laughter,
    Objection,
    Interruption,
    Disturbance,
    Approval,
    Other,
}

impl AnnotationKind {
    /// All kinds in classification priority order
    pub const ALL: [AnnotationKind; 8] = [
        Self::Applause,
        Self::Interjection,
        Self::Laughter,
        Self::Objection,
        Self::Interruption,
        Self::Disturbance,
        Self::Approval,
        Self::Other,
    ];

    /// German label as used in the transcripts
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applause => "Beifall",
            Self::Interjection => "Zuruf",
            Self::Laughter => "Heiterkeit",
            Self::Objection => "Widerspruch",
            Self::Interruption => "Unterbrechung",
            Self::Disturbance => "Unruhe",
            Self::Approval => "Zustimmung",
            Self::Other => "Sonstiges",
        }
    }

    /// Whether an acting person or faction is looked for
    pub fn has_actor(&self) -> bool {
        !matches!(self, Self::Interruption | Self::Other)
    }
}

impl std::fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parenthesized aside extracted from a speech body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Annotation category
    pub kind: AnnotationKind,

    /// Index of the `{n}` marker that replaced the span
    pub position: usize,

    /// Original span text including parentheses
    pub raw: String,

    /// Whitespace-normalized span text
    pub text: String,

    /// Words shouted in an interjection
    pub quote: Option<String>,

    /// Raw name fragment of an attributed person
    pub person: Option<String>,

    /// Constituency named in parentheses after the person, e.g. `Hamburg`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constituency: Option<String>,

    /// Canonical abbreviation of an attributed faction
    pub faction: Option<String>,
}

impl Annotation {
    /// Marker text that replaces this annotation in the body
    pub fn marker(&self) -> String {
        marker(self.position)
    }
}

/// Positional marker for annotation `position`
pub fn marker(position: usize) -> String {
    format!("{{{position}}}")
}

// ============================================================================
// Speakers
// ============================================================================

/// Components of a parsed person name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedName {
    /// Honorifics and nobility particles in order of appearance
    pub titles: Vec<String>,

    /// Given names
    pub first_names: Vec<String>,

    /// Family name, empty when nothing could be parsed
    pub last_name: String,
}

impl ParsedName {
    pub fn is_empty(&self) -> bool {
        self.last_name.is_empty()
    }

    /// Female form of address present
    pub fn is_female(&self) -> bool {
        self.titles.iter().any(|t| t == "Frau")
    }
}

/// Role category of a speaker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionCategory {
    Member,
    Presidium,
    Guest,
    Chancellor,
    Minister,
    SecretaryOfState,
    NotFound,
}

impl PositionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "Member of Parliament",
            Self::Presidium => "Presidium of Parliament",
            Self::Guest => "Guest",
            Self::Chancellor => "Chancellor",
            Self::Minister => "Minister",
            Self::SecretaryOfState => "Secretary of State",
            Self::NotFound => "Not found",
        }
    }

    /// Roles held by members of the government
    pub fn is_government(&self) -> bool {
        matches!(
            self,
            Self::Chancellor | Self::Minister | Self::SecretaryOfState
        )
    }
}

impl std::fmt::Display for PositionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classified role of a speaker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionInfo {
    pub category: PositionCategory,
    pub qualifier: Option<String>,
}

impl PositionInfo {
    pub fn new(category: PositionCategory, qualifier: Option<String>) -> Self {
        Self {
            category,
            qualifier,
        }
    }
}

/// Parsed facts about a turn's speaker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerFact {
    pub name: ParsedName,
    pub position_raw: String,
}

// ============================================================================
// Reference Records
// ============================================================================

/// Parliamentary group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faction {
    pub id: i64,
    pub name: String,
    pub abbreviation: String,
}

/// Gender of a person record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Gender {
    Female,
    Male,
    #[default]
    Unknown,
}

impl From<String> for Gender {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "female" | "weiblich" | "w" | "f" => Self::Female,
            "male" | "männlich" | "m" => Self::Male,
            _ => Self::Unknown,
        }
    }
}

/// Kind of seat a person record describes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordRole {
    #[default]
    #[serde(alias = "Abgeordneter")]
    Member,
    #[serde(alias = "Regierungsmitglied")]
    Government,
}

/// One (person, electoral term, role) row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRecord {
    /// Stable person identifier
    pub id: i64,

    pub electoral_term: u32,

    #[serde(default)]
    pub faction_id: Option<i64>,

    /// Given names, space separated
    #[serde(default)]
    pub first_name: String,

    pub last_name: String,

    #[serde(default)]
    pub gender: Gender,

    #[serde(default)]
    pub constituency: String,

    #[serde(default)]
    pub role: RecordRole,

    /// First day in government office
    #[serde(default)]
    pub tenure_from: Option<NaiveDate>,

    /// Last day in government office, open-ended when absent
    #[serde(default)]
    pub tenure_until: Option<NaiveDate>,
}

impl PersonRecord {
    /// Create a member record
    pub fn member(id: i64, electoral_term: u32, first_name: &str, last_name: &str) -> Self {
        Self {
            id,
            electoral_term,
            faction_id: None,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            gender: Gender::Unknown,
            constituency: String::new(),
            role: RecordRole::Member,
            tenure_from: None,
            tenure_until: None,
        }
    }

    /// Set faction
    pub fn with_faction(mut self, faction_id: i64) -> Self {
        self.faction_id = Some(faction_id);
        self
    }

    /// Set gender
    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = gender;
        self
    }

    /// Set constituency
    pub fn with_constituency(mut self, constituency: impl Into<String>) -> Self {
        self.constituency = constituency.into();
        self
    }

    /// Mark as a government record with an optional tenure
    pub fn in_government(mut self, from: Option<NaiveDate>, until: Option<NaiveDate>) -> Self {
        self.role = RecordRole::Government;
        self.tenure_from = from;
        self.tenure_until = until;
        self
    }

    /// Whether the tenure covers `date`; records without tenure always do
    pub fn holds_office_on(&self, date: NaiveDate) -> bool {
        let started = self.tenure_from.map_or(true, |from| from <= date);
        let not_ended = self.tenure_until.map_or(true, |until| date <= until);
        started && not_ended
    }
}

// ============================================================================
// Resolution Results
// ============================================================================

/// Cascade stage of the entity resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStage {
    LastName,
    GovernmentPool,
    Faction,
    FirstName,
    Constituency,
    Gender,
    GovernmentFallback,
    FuzzyLastName,
}

impl ResolutionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LastName => "last_name",
            Self::GovernmentPool => "government_pool",
            Self::Faction => "faction",
            Self::FirstName => "first_name",
            Self::Constituency => "constituency",
            Self::Gender => "gender",
            Self::GovernmentFallback => "government_fallback",
            Self::FuzzyLastName => "fuzzy_last_name",
        }
    }
}

impl std::fmt::Display for ResolutionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a fragment could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// Nothing to match on
    MissingLastName,
    /// No record carries the last name, even fuzzily
    NoCandidates,
    /// More than one person left after the last stage that ran
    Ambiguous {
        stage: ResolutionStage,
        remaining: usize,
    },
    /// Skipped by the per-transcript processing budget
    BudgetExceeded,
}

impl std::fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingLastName => write!(f, "missing last name"),
            Self::NoCandidates => write!(f, "no candidates"),
            Self::Ambiguous { stage, remaining } => {
                write!(f, "{remaining} candidates left after {stage}")
            }
            Self::BudgetExceeded => write!(f, "processing budget exceeded"),
        }
    }
}

/// Outcome of resolving one speaker fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    Resolved {
        person_id: i64,
        stage: ResolutionStage,
    },
    Unresolved {
        reason: UnresolvedReason,
    },
}

impl Resolution {
    pub fn resolved(person_id: i64, stage: ResolutionStage) -> Self {
        Self::Resolved { person_id, stage }
    }

    pub fn unresolved(reason: UnresolvedReason) -> Self {
        Self::Unresolved { reason }
    }

    pub fn person_id(&self) -> Option<i64> {
        match self {
            Self::Resolved { person_id, .. } => Some(*person_id),
            Self::Unresolved { .. } => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }

    pub fn reason(&self) -> Option<UnresolvedReason> {
        match self {
            Self::Resolved { .. } => None,
            Self::Unresolved { reason } => Some(*reason),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
