//! Resolution statistics
//!
//! Counters over processed transcripts with match rates and a text report.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use plenar_core::{Resolution, UnresolvedReason};

use crate::pipeline::ProcessedTranscript;

/// Aggregated resolution counters, mergeable across transcripts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolutionStats {
    pub transcripts: usize,
    pub turns: usize,
    /// Transcripts that hit the processing budget
    pub budget_exceeded: usize,

    pub speakers_resolved: usize,
    /// Resolved speakers per cascade stage
    pub resolved_by_stage: BTreeMap<String, usize>,
    pub missing_last_name: usize,
    pub no_candidates: usize,
    pub ambiguous: usize,
    pub skipped_by_budget: usize,

    pub annotations: usize,
    pub annotations_by_kind: BTreeMap<String, usize>,
    /// Annotations attributed to a faction
    pub annotation_factions: usize,
    /// Annotations naming a person
    pub annotation_persons: usize,
    pub annotation_persons_resolved: usize,
}

impl ResolutionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect statistics over a batch
    pub fn from_transcripts(transcripts: &[ProcessedTranscript]) -> Self {
        let mut stats = Self::new();
        for transcript in transcripts {
            stats.add_transcript(transcript);
        }
        stats
    }

    /// Add one processed transcript
    pub fn add_transcript(&mut self, transcript: &ProcessedTranscript) {
        self.transcripts += 1;
        if transcript.budget_exceeded {
            self.budget_exceeded += 1;
        }

        for turn in &transcript.turns {
            self.turns += 1;
            self.add_speaker(&turn.resolution);

            for resolved in &turn.annotations {
                self.annotations += 1;
                *self
                    .annotations_by_kind
                    .entry(resolved.annotation.kind.as_str().to_string())
                    .or_default() += 1;

                if resolved.annotation.faction.is_some() {
                    self.annotation_factions += 1;
                }
                if let Some(resolution) = &resolved.person_resolution {
                    self.annotation_persons += 1;
                    if resolution.is_resolved() {
                        self.annotation_persons_resolved += 1;
                    }
                }
            }
        }
    }

    fn add_speaker(&mut self, resolution: &Resolution) {
        match resolution {
            Resolution::Resolved { stage, .. } => {
                self.speakers_resolved += 1;
                *self
                    .resolved_by_stage
                    .entry(stage.as_str().to_string())
                    .or_default() += 1;
            }
            Resolution::Unresolved { reason } => match reason {
                UnresolvedReason::MissingLastName => self.missing_last_name += 1,
                UnresolvedReason::NoCandidates => self.no_candidates += 1,
                UnresolvedReason::Ambiguous { .. } => self.ambiguous += 1,
                UnresolvedReason::BudgetExceeded => self.skipped_by_budget += 1,
            },
        }
    }

    /// Merge counters from another batch
    pub fn merge(&mut self, other: &ResolutionStats) {
        self.transcripts += other.transcripts;
        self.turns += other.turns;
        self.budget_exceeded += other.budget_exceeded;
        self.speakers_resolved += other.speakers_resolved;
        self.missing_last_name += other.missing_last_name;
        self.no_candidates += other.no_candidates;
        self.ambiguous += other.ambiguous;
        self.skipped_by_budget += other.skipped_by_budget;
        self.annotations += other.annotations;
        self.annotation_factions += other.annotation_factions;
        self.annotation_persons += other.annotation_persons;
        self.annotation_persons_resolved += other.annotation_persons_resolved;

        for (stage, count) in &other.resolved_by_stage {
            *self.resolved_by_stage.entry(stage.clone()).or_default() += count;
        }
        for (kind, count) in &other.annotations_by_kind {
            *self.annotations_by_kind.entry(kind.clone()).or_default() += count;
        }
    }

    /// Share of turns whose speaker was resolved
    pub fn speaker_match_rate(&self) -> f32 {
        ratio(self.speakers_resolved, self.turns)
    }

    /// Share of annotation persons that were resolved
    pub fn annotation_person_match_rate(&self) -> f32 {
        ratio(self.annotation_persons_resolved, self.annotation_persons)
    }

    /// Render a summary report
    pub fn report(&self) -> String {
        let stages = join_counts(&self.resolved_by_stage);
        let kinds = join_counts(&self.annotations_by_kind);

        format!(
            "=== Speaker Resolution Report ===\n\n\
             Transcripts: {} (budget exceeded: {})\n\
             Turns:       {}\n\n\
             Speakers:\n\
               Match rate: {:.1}%\n\
               Resolved: {} | Missing last name: {} | No candidates: {} | Ambiguous: {} | Skipped: {}\n\
               By stage: {}\n\n\
             Annotations: {}\n\
               By kind: {}\n\
               With faction: {} | With person: {} | Persons resolved: {} ({:.1}%)\n",
            self.transcripts,
            self.budget_exceeded,
            self.turns,
            self.speaker_match_rate() * 100.0,
            self.speakers_resolved,
            self.missing_last_name,
            self.no_candidates,
            self.ambiguous,
            self.skipped_by_budget,
            stages,
            self.annotations,
            kinds,
            self.annotation_factions,
            self.annotation_persons,
            self.annotation_persons_resolved,
            self.annotation_person_match_rate() * 100.0,
        )
    }
}

fn ratio(part: usize, total: usize) -> f32 {
    if total == 0 {
        0.0
    } else {
        part as f32 / total as f32
    }
}

fn join_counts(counts: &BTreeMap<String, usize>) -> String {
    if counts.is_empty() {
        return "-".to_string();
    }
    counts
        .iter()
        .map(|(key, count)| format!("{key}={count}"))
        .collect::<Vec<_>>()
        .join(", ")
}
