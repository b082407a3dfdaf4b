//! Plenar Extractor - Transcript segmentation and classification
//!
//! Splits raw plenary transcripts into speaker turns, lifts parenthesized
//! annotations out of speech bodies and derives speaker facts from headers.

use plenar_core::{Annotation, Turn};

/// Speech body with its annotations replaced by `{n}` markers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedBody {
    pub annotations: Vec<Annotation>,
    pub body: String,
}

/// Trait for transcript segmenters
pub trait Segmenter: Send + Sync {
    fn segment(&self, text: &str) -> Vec<Turn>;
}

/// Trait for annotation extractors
pub trait AnnotationExtractor: Send + Sync {
    fn extract(&self, body: &str) -> ExtractedBody;
}

pub mod annotation;
pub mod faction;
pub mod name;
pub mod position;
pub mod segmenter;

pub use annotation::AnnotationClassifier;
pub use faction::FactionRegistry;
pub use name::{clean_name_fragment, parse_name, speaker_fact};
pub use position::{classify_position, PositionClassifier};
pub use segmenter::TranscriptSegmenter;
