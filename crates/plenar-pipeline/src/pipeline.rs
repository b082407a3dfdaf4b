//! Transcript pipeline
//!
//! Segments a transcript into turns, extracts annotations from each body,
//! classifies the speaker and resolves speakers and annotation persons
//! against the candidate pool of the sitting. Batches run on a rayon pool
//! and keep their input order.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use plenar_core::{
    term_for_date, Annotation, AppConfig, HeaderFamily, ParsedName, PipelineConfig, PlenarError,
    PositionCategory, PositionInfo, ReferenceData, Resolution, Result, SessionId, Span,
    SpeakerFact, Transcript, Turn, UnresolvedReason,
};
use plenar_extractor::{
    clean_name_fragment, parse_name, speaker_fact, AnnotationClassifier, AnnotationExtractor,
    FactionRegistry, PositionClassifier, Segmenter, TranscriptSegmenter,
};
use plenar_resolver::{CandidatePool, CascadeResolver, EntityResolver, ResolverQuery};

use crate::stats::ResolutionStats;

// ============================================================================
// Output records
// ============================================================================

/// Annotation with its actor resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAnnotation {
    #[serde(flatten)]
    pub annotation: Annotation,

    /// Id of the attributed faction
    pub faction_id: Option<i64>,

    /// Parsed person fragment
    pub person_name: Option<ParsedName>,

    /// Outcome for the person fragment, absent when there is none
    pub person_resolution: Option<Resolution>,
}

/// One turn with speaker facts and resolution attached
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedTurn {
    pub index: usize,
    pub header: String,
    pub family: HeaderFamily,
    pub span: Span,
    pub speaker: SpeakerFact,
    pub position: PositionInfo,

    /// Canonical faction abbreviation of the speaker
    pub faction: Option<String>,
    pub faction_id: Option<i64>,
    pub resolution: Resolution,

    /// Body with annotations replaced by `{n}` markers
    pub body: String,
    pub annotations: Vec<ResolvedAnnotation>,
}

/// Result of processing one transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedTranscript {
    pub session: SessionId,
    pub electoral_term: u32,
    pub date: Option<NaiveDate>,
    pub turns: Vec<ProcessedTurn>,

    /// Some turns were left unresolved by the processing budget
    pub budget_exceeded: bool,
}

// ============================================================================
// Pipeline
// ============================================================================

/// End-to-end transcript processor
pub struct Pipeline {
    segmenter: TranscriptSegmenter,
    annotations: AnnotationClassifier,
    positions: &'static PositionClassifier,
    registry: &'static FactionRegistry,
    resolver: CascadeResolver,
    references: Arc<ReferenceData>,
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline from configuration and shared reference data
    pub fn new(config: &AppConfig, references: Arc<ReferenceData>) -> Self {
        Self {
            segmenter: TranscriptSegmenter::from_config(&config.segmentation),
            annotations: AnnotationClassifier::new().with_numbering(config.annotation.numbering),
            positions: PositionClassifier::global(),
            registry: FactionRegistry::global(),
            resolver: CascadeResolver::from_config(&config.resolution),
            references,
            config: config.pipeline.clone(),
        }
    }

    /// Process one transcript
    pub fn process(&self, transcript: &Transcript) -> ProcessedTranscript {
        let started = Instant::now();
        let term = transcript.electoral_term();

        if let Some(date) = transcript.date {
            match term_for_date(date) {
                Some(found) if found != term => warn!(
                    session = %transcript.session,
                    %date,
                    session_term = term,
                    date_term = found,
                    "sitting date belongs to a different electoral term"
                ),
                None => warn!(
                    session = %transcript.session,
                    %date,
                    "sitting date outside the electoral term calendar"
                ),
                _ => {}
            }
        }

        let turns = self.segmenter.segment(&transcript.text);
        if turns.is_empty() {
            warn!(session = %transcript.session, "no speaker turns found");
        }

        let pool = CandidatePool::for_sitting(&self.references, term, transcript.date);
        let budget = self.config.transcript_budget_ms.map(Duration::from_millis);

        let mut budget_exceeded = false;
        let mut processed = Vec::with_capacity(turns.len());
        for turn in turns {
            if !budget_exceeded && budget.is_some_and(|b| started.elapsed() >= b) {
                budget_exceeded = true;
                warn!(
                    session = %transcript.session,
                    turn = turn.index,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "processing budget exceeded, leaving remaining speakers unresolved"
                );
            }
            processed.push(self.process_turn(turn, &pool, budget_exceeded));
        }

        debug!(
            session = %transcript.session,
            turns = processed.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "processed transcript"
        );

        ProcessedTranscript {
            session: transcript.session,
            electoral_term: term,
            date: transcript.date,
            turns: processed,
            budget_exceeded,
        }
    }

    /// Process transcripts in parallel, preserving input order
    pub fn process_batch(&self, transcripts: &[Transcript]) -> Result<Vec<ProcessedTranscript>> {
        let run = || -> Vec<ProcessedTranscript> {
            transcripts.par_iter().map(|t| self.process(t)).collect()
        };

        let results = if self.config.workers == 0 {
            run()
        } else {
            rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.workers)
                .build()
                .map_err(|e| PlenarError::Other(anyhow::anyhow!("failed to build worker pool: {e}")))?
                .install(run)
        };

        let stats = ResolutionStats::from_transcripts(&results);
        info!(
            transcripts = stats.transcripts,
            turns = stats.turns,
            speakers_resolved = stats.speakers_resolved,
            annotations = stats.annotations,
            "batch complete"
        );

        Ok(results)
    }

    fn resolve(&self, query: &ResolverQuery, pool: &CandidatePool, skip: bool) -> Resolution {
        if skip {
            Resolution::unresolved(UnresolvedReason::BudgetExceeded)
        } else {
            self.resolver.resolve(query, pool)
        }
    }

    fn process_turn(&self, turn: Turn, pool: &CandidatePool, skip: bool) -> ProcessedTurn {
        let extracted = self.annotations.extract(&turn.body);
        let speaker = speaker_fact(&turn.name_raw, &turn.position_raw);

        let faction = self.registry.resolve(&speaker.position_raw);
        let position = self
            .positions
            .classify(faction.unwrap_or(&speaker.position_raw));
        let faction = faction.filter(|_| position.category == PositionCategory::Member);
        let faction_id = faction.and_then(|f| self.references.faction_id(f));

        let query = ResolverQuery::new(speaker.name.clone())
            .with_category(position.category)
            .with_faction(faction_id);
        let resolution = self.resolve(&query, pool, skip);

        let annotations = extracted
            .annotations
            .into_iter()
            .map(|annotation| self.resolve_annotation(annotation, pool, skip))
            .collect();

        debug!(
            turn = turn.index,
            speaker = %speaker.name.last_name,
            category = %position.category,
            resolved = resolution.is_resolved(),
            "processed turn"
        );

        ProcessedTurn {
            index: turn.index,
            header: turn.header,
            family: turn.family,
            span: turn.span,
            speaker,
            position,
            faction: faction.map(str::to_string),
            faction_id,
            resolution,
            body: extracted.body,
            annotations,
        }
    }

    fn resolve_annotation(
        &self,
        annotation: Annotation,
        pool: &CandidatePool,
        skip: bool,
    ) -> ResolvedAnnotation {
        let faction_id = annotation
            .faction
            .as_deref()
            .and_then(|f| self.references.faction_id(f));

        let person_name = annotation
            .person
            .as_deref()
            .map(|person| parse_name(&clean_name_fragment(person)));

        let person_resolution = person_name.as_ref().map(|name| {
            let mut query = ResolverQuery::new(name.clone()).with_faction(faction_id);
            if let Some(constituency) = annotation.constituency.as_deref() {
                query = query.with_constituency(constituency);
            }
            self.resolve(&query, pool, skip)
        });

        ResolvedAnnotation {
            annotation,
            faction_id,
            person_name,
            person_resolution,
        }
    }
}
