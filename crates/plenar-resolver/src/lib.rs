//! Plenar Resolver - Speaker entity resolution
//!
//! Resolves parsed speaker names to canonical person records of one
//! electoral term through a cascade of increasingly weak signals.

use serde::{Deserialize, Serialize};

use plenar_core::{ParsedName, PositionCategory, Resolution};

/// Everything known about a speaker fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverQuery {
    pub name: ParsedName,
    pub category: PositionCategory,
    pub faction_id: Option<i64>,
    pub constituency: Option<String>,
}

impl ResolverQuery {
    pub fn new(name: ParsedName) -> Self {
        Self {
            name,
            category: PositionCategory::NotFound,
            faction_id: None,
            constituency: None,
        }
    }

    /// Set role category
    pub fn with_category(mut self, category: PositionCategory) -> Self {
        self.category = category;
        self
    }

    /// Set faction hint
    pub fn with_faction(mut self, faction_id: Option<i64>) -> Self {
        self.faction_id = faction_id;
        self
    }

    /// Set constituency hint
    pub fn with_constituency(mut self, constituency: impl Into<String>) -> Self {
        let constituency = constituency.into();
        self.constituency = (!constituency.trim().is_empty()).then_some(constituency);
        self
    }

    /// Faction hint usable for filtering
    pub fn faction_hint(&self) -> Option<i64> {
        self.faction_id.filter(|id| *id >= 0)
    }
}

/// Trait for entity resolvers
pub trait EntityResolver: Send + Sync {
    fn resolve(&self, query: &ResolverQuery, pool: &CandidatePool) -> Resolution;
}

pub mod cascade;
pub mod pool;
pub mod similarity;

pub use cascade::CascadeResolver;
pub use pool::CandidatePool;
