//! Plenar Pipeline - Transcript processing
//!
//! Wires segmentation, annotation extraction, speaker classification and
//! entity resolution together and runs them over batches of transcripts.

pub mod pipeline;
pub mod stats;

pub use pipeline::{Pipeline, ProcessedTranscript, ProcessedTurn, ResolvedAnnotation};
pub use stats::ResolutionStats;
