//! Cascading entity resolver
//!
//! Narrows the candidate records for a speaker stage by stage:
//!
//! 1. Exact last name (case-insensitive, `ß` as `ss`)
//! 2. Government pool first for government roles
//! 3. Faction
//! 4. First-name overlap (first overlapping candidate is accepted)
//! 5. Constituency similarity
//! 6. Gender from a `Frau` title
//!
//! When no record carries the last name, the government pool and then a
//! fuzzy last-name match are tried. Each stage is a pure function over a
//! slice of candidates; uniqueness is judged on distinct person ids.

use std::collections::BTreeSet;

use tracing::debug;

use crate::pool::CandidatePool;
use crate::similarity::{name_tokens, normalize_name, similarity};
use crate::{EntityResolver, ResolverQuery};
use plenar_core::{
    Gender, PersonRecord, Resolution, ResolutionConfig, ResolutionStage, UnresolvedReason,
};

type Candidates<'a> = Vec<&'a PersonRecord>;

// ============================================================================
// Stage functions
// ============================================================================

fn distinct_ids(candidates: &[&PersonRecord]) -> usize {
    candidates.iter().map(|c| c.id).collect::<BTreeSet<_>>().len()
}

/// Person id when every candidate is the same person
fn unique_id(candidates: &[&PersonRecord]) -> Option<i64> {
    match candidates.first() {
        Some(first) if candidates.iter().all(|c| c.id == first.id) => Some(first.id),
        _ => None,
    }
}

fn by_last_name<'a>(records: &'a [PersonRecord], last_name: &str) -> Candidates<'a> {
    records
        .iter()
        .filter(|r| normalize_name(&r.last_name) == last_name)
        .collect()
}

fn by_faction<'a>(candidates: &[&'a PersonRecord], faction_id: i64) -> Candidates<'a> {
    candidates
        .iter()
        .copied()
        .filter(|c| c.faction_id == Some(faction_id))
        .collect()
}

fn by_first_names<'a>(candidates: &[&'a PersonRecord], first_names: &[String]) -> Candidates<'a> {
    let wanted = name_tokens(&first_names.join(" "));
    candidates
        .iter()
        .copied()
        .filter(|c| !name_tokens(&c.first_name).is_disjoint(&wanted))
        .collect()
}

fn by_constituency<'a>(
    candidates: &[&'a PersonRecord],
    constituency: &str,
    threshold: f64,
) -> Candidates<'a> {
    candidates
        .iter()
        .copied()
        .filter(|c| !c.constituency.is_empty())
        .filter(|c| similarity(&c.constituency, constituency) > threshold)
        .collect()
}

fn by_gender<'a>(candidates: &[&'a PersonRecord], gender: Gender) -> Candidates<'a> {
    candidates
        .iter()
        .copied()
        .filter(|c| c.gender == gender)
        .collect()
}

fn by_fuzzy_last_name<'a>(
    records: &'a [PersonRecord],
    last_name: &str,
    threshold: f64,
) -> Candidates<'a> {
    records
        .iter()
        .filter(|r| similarity(&r.last_name, last_name) >= threshold)
        .collect()
}

// ============================================================================
// Cascade
// ============================================================================

/// Outcome of one narrowing step
enum Step<'a> {
    Done(Resolution),
    Continue(Candidates<'a>),
}

/// Staged resolver over exact, fuzzy and heuristic signals
#[derive(Debug, Clone)]
pub struct CascadeResolver {
    constituency_threshold: f64,
    fuzzy_last_name_threshold: f64,
}

impl CascadeResolver {
    pub fn new() -> Self {
        Self::from_config(&ResolutionConfig::default())
    }

    pub fn from_config(config: &ResolutionConfig) -> Self {
        Self {
            constituency_threshold: config.constituency_threshold,
            fuzzy_last_name_threshold: config.fuzzy_last_name_threshold,
        }
    }

    /// Keep a non-empty filter result; resolve when it names one person
    fn narrow<'a>(
        stage: ResolutionStage,
        current: Candidates<'a>,
        filtered: Candidates<'a>,
    ) -> Step<'a> {
        debug!(
            stage = %stage,
            before = current.len(),
            after = filtered.len(),
            "resolver stage"
        );
        if let Some(id) = unique_id(&filtered) {
            return Step::Done(Resolution::resolved(id, stage));
        }
        if filtered.is_empty() {
            Step::Continue(current)
        } else {
            Step::Continue(filtered)
        }
    }

    /// Stages 3 to 6 on an ambiguous candidate set
    fn disambiguate(
        &self,
        query: &ResolverQuery,
        mut candidates: Candidates<'_>,
        mut stage: ResolutionStage,
    ) -> Resolution {
        if let Some(faction_id) = query.faction_hint() {
            stage = ResolutionStage::Faction;
            let filtered = by_faction(&candidates, faction_id);
            match Self::narrow(stage, candidates, filtered) {
                Step::Done(resolution) => return resolution,
                Step::Continue(next) => candidates = next,
            }
        }

        if !query.name.first_names.is_empty() {
            stage = ResolutionStage::FirstName;
            let filtered = by_first_names(&candidates, &query.name.first_names);
            debug!(stage = %stage, before = candidates.len(), after = filtered.len(), "resolver stage");
            if let Some(first) = filtered.first() {
                return Resolution::resolved(first.id, stage);
            }
        }

        if let Some(constituency) = query.constituency.as_deref() {
            stage = ResolutionStage::Constituency;
            let filtered = by_constituency(&candidates, constituency, self.constituency_threshold);
            match Self::narrow(stage, candidates, filtered) {
                Step::Done(resolution) => return resolution,
                Step::Continue(next) => candidates = next,
            }
        }

        if query.name.is_female() {
            stage = ResolutionStage::Gender;
            let filtered = by_gender(&candidates, Gender::Female);
            match Self::narrow(stage, candidates, filtered) {
                Step::Done(resolution) => return resolution,
                Step::Continue(next) => candidates = next,
            }
        }

        Resolution::unresolved(UnresolvedReason::Ambiguous {
            stage,
            remaining: distinct_ids(&candidates),
        })
    }

    /// No primary record carries the last name
    fn fallback(&self, query: &ResolverQuery, pool: &CandidatePool, last_name: &str) -> Resolution {
        let government = by_last_name(pool.government(), last_name);
        if !government.is_empty() {
            let stage = ResolutionStage::GovernmentFallback;
            if let Some(id) = unique_id(&government) {
                return Resolution::resolved(id, stage);
            }
            let mut candidates = government;
            if let Some(faction_id) = query.faction_hint() {
                let filtered = by_faction(&candidates, faction_id);
                match Self::narrow(stage, candidates, filtered) {
                    Step::Done(resolution) => return resolution,
                    Step::Continue(next) => candidates = next,
                }
            }
            return Resolution::unresolved(UnresolvedReason::Ambiguous {
                stage,
                remaining: distinct_ids(&candidates),
            });
        }

        let fuzzy = by_fuzzy_last_name(pool.primary(), last_name, self.fuzzy_last_name_threshold);
        debug!(matches = fuzzy.len(), "fuzzy last-name fallback");
        match unique_id(&fuzzy) {
            Some(id) => Resolution::resolved(id, ResolutionStage::FuzzyLastName),
            None if fuzzy.is_empty() => Resolution::unresolved(UnresolvedReason::NoCandidates),
            None => Resolution::unresolved(UnresolvedReason::Ambiguous {
                stage: ResolutionStage::FuzzyLastName,
                remaining: distinct_ids(&fuzzy),
            }),
        }
    }
}

impl Default for CascadeResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityResolver for CascadeResolver {
    fn resolve(&self, query: &ResolverQuery, pool: &CandidatePool) -> Resolution {
        let last_name = normalize_name(&query.name.last_name);
        if last_name.is_empty() {
            return Resolution::unresolved(UnresolvedReason::MissingLastName);
        }

        let mut candidates = by_last_name(pool.primary(), &last_name);
        let mut stage = ResolutionStage::LastName;

        if query.category.is_government() {
            let government = by_last_name(pool.government(), &last_name);
            if !government.is_empty() {
                candidates = government;
                stage = ResolutionStage::GovernmentPool;
            }
        }

        debug!(
            last_name = %last_name,
            stage = %stage,
            candidates = candidates.len(),
            "resolver stage"
        );

        if candidates.is_empty() {
            return self.fallback(query, pool, &last_name);
        }
        if let Some(id) = unique_id(&candidates) {
            return Resolution::resolved(id, stage);
        }

        self.disambiguate(query, candidates, stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plenar_core::{ParsedName, PositionCategory};
    use proptest::prelude::*;

    fn name(titles: &[&str], first: &[&str], last: &str) -> ParsedName {
        ParsedName {
            titles: titles.iter().map(|s| s.to_string()).collect(),
            first_names: first.iter().map(|s| s.to_string()).collect(),
            last_name: last.to_string(),
        }
    }

    fn resolve(query: ResolverQuery, pool: &CandidatePool) -> Resolution {
        CascadeResolver::new().resolve(&query, pool)
    }

    fn mueller_pool() -> CandidatePool {
        CandidatePool::new(
            vec![
                PersonRecord::member(100, 19, "Anna", "Müller").with_faction(3),
                PersonRecord::member(200, 19, "Bernd", "Müller").with_faction(7),
            ],
            vec![],
        )
    }

    #[test]
    fn test_unique_last_name() {
        let pool = CandidatePool::new(
            vec![
                PersonRecord::member(1, 19, "Franz Josef", "Strauß"),
                PersonRecord::member(2, 19, "Anna", "Müller"),
            ],
            vec![],
        );
        let resolution = resolve(ResolverQuery::new(name(&[], &[], "STRAUSS")), &pool);
        assert_eq!(resolution, Resolution::resolved(1, ResolutionStage::LastName));
    }

    #[test]
    fn test_faction_disambiguates() {
        let query = ResolverQuery::new(name(&[], &[], "Müller")).with_faction(Some(7));
        let resolution = resolve(query, &mueller_pool());
        assert_eq!(resolution, Resolution::resolved(200, ResolutionStage::Faction));
    }

    #[test]
    fn test_negative_faction_is_ignored() {
        let query = ResolverQuery::new(name(&[], &[], "Müller")).with_faction(Some(-1));
        let resolution = resolve(query, &mueller_pool());
        assert_eq!(
            resolution,
            Resolution::unresolved(UnresolvedReason::Ambiguous {
                stage: ResolutionStage::LastName,
                remaining: 2,
            })
        );
    }

    #[test]
    fn test_first_name_overlap() {
        let query = ResolverQuery::new(name(&[], &["Bernd"], "Müller"));
        let resolution = resolve(query, &mueller_pool());
        assert_eq!(resolution, Resolution::resolved(200, ResolutionStage::FirstName));
    }

    #[test]
    fn test_first_name_accepts_first_of_several() {
        let pool = CandidatePool::new(
            vec![
                PersonRecord::member(10, 19, "Hans Peter", "Schmidt"),
                PersonRecord::member(11, 19, "Hans", "Schmidt"),
                PersonRecord::member(12, 19, "Karl", "Schmidt"),
            ],
            vec![],
        );
        let query = ResolverQuery::new(name(&[], &["Hans"], "Schmidt"));
        let resolution = resolve(query, &pool);
        assert_eq!(resolution, Resolution::resolved(10, ResolutionStage::FirstName));
    }

    #[test]
    fn test_constituency_similarity() {
        let pool = CandidatePool::new(
            vec![
                PersonRecord::member(1, 19, "Anna", "Weber").with_constituency("Berlin-Mitte"),
                PersonRecord::member(2, 19, "Bernd", "Weber").with_constituency("Köln I"),
            ],
            vec![],
        );
        let query =
            ResolverQuery::new(name(&[], &[], "Weber")).with_constituency("Berlin Mitte");
        let resolution = resolve(query, &pool);
        assert_eq!(resolution, Resolution::resolved(1, ResolutionStage::Constituency));
    }

    #[test]
    fn test_gender_from_title() {
        let pool = CandidatePool::new(
            vec![
                PersonRecord::member(1, 19, "Anna", "Schulz").with_gender(Gender::Female),
                PersonRecord::member(2, 19, "Bernd", "Schulz").with_gender(Gender::Male),
            ],
            vec![],
        );
        let query = ResolverQuery::new(name(&["Frau"], &[], "Schulz"));
        let resolution = resolve(query, &pool);
        assert_eq!(resolution, Resolution::resolved(1, ResolutionStage::Gender));
    }

    #[test]
    fn test_government_pool_priority() {
        let scholz_mp = PersonRecord::member(1, 19, "Olaf", "Scholz").with_faction(23);
        let other_mp = PersonRecord::member(2, 19, "Anna", "Scholz").with_faction(4);
        let scholz_gov = PersonRecord::member(1, 19, "Olaf", "Scholz").in_government(None, None);
        let pool = CandidatePool::new(
            vec![scholz_mp, other_mp, scholz_gov.clone()],
            vec![scholz_gov],
        );

        let query = ResolverQuery::new(name(&[], &[], "Scholz"))
            .with_category(PositionCategory::Minister);
        let resolution = resolve(query, &pool);
        assert_eq!(resolution, Resolution::resolved(1, ResolutionStage::GovernmentPool));

        let query = ResolverQuery::new(name(&[], &[], "Scholz"));
        let resolution = resolve(query, &pool);
        assert_eq!(
            resolution.reason(),
            Some(UnresolvedReason::Ambiguous {
                stage: ResolutionStage::LastName,
                remaining: 2,
            })
        );
    }

    #[test]
    fn test_government_fallback() {
        let pool = CandidatePool::new(
            vec![PersonRecord::member(1, 19, "Anna", "Müller")],
            vec![PersonRecord::member(9, 19, "Hans", "Eichel").in_government(None, None)],
        );
        let resolution = resolve(ResolverQuery::new(name(&[], &[], "Eichel")), &pool);
        assert_eq!(
            resolution,
            Resolution::resolved(9, ResolutionStage::GovernmentFallback)
        );
    }

    #[test]
    fn test_government_fallback_for_minister_without_seat() {
        let date = chrono::NaiveDate::from_ymd_opt(2019, 5, 15).unwrap();
        let tenure_start = chrono::NaiveDate::from_ymd_opt(2018, 3, 14);
        let references = plenar_core::ReferenceData::new(
            vec![],
            vec![
                PersonRecord::member(1, 19, "Anna", "Müller"),
                PersonRecord::member(8, 18, "Horst", "Seehofer").in_government(tenure_start, None),
            ],
        );
        let pool = CandidatePool::for_sitting(&references, 19, Some(date));

        let resolution = resolve(ResolverQuery::new(name(&[], &[], "Seehofer")), &pool);
        assert_eq!(
            resolution,
            Resolution::resolved(8, ResolutionStage::GovernmentFallback)
        );
    }

    #[test]
    fn test_fuzzy_last_name_fallback() {
        let pool = CandidatePool::new(
            vec![
                PersonRecord::member(1, 19, "Helmut", "Schmidt"),
                PersonRecord::member(2, 19, "Anna", "Müller"),
            ],
            vec![],
        );
        let resolution = resolve(ResolverQuery::new(name(&[], &[], "Schmitt")), &pool);
        assert_eq!(resolution, Resolution::resolved(1, ResolutionStage::FuzzyLastName));

        let resolution = resolve(ResolverQuery::new(name(&[], &[], "Zzyzx")), &pool);
        assert_eq!(resolution, Resolution::unresolved(UnresolvedReason::NoCandidates));
    }

    #[test]
    fn test_missing_last_name() {
        let resolution = resolve(ResolverQuery::new(ParsedName::default()), &mueller_pool());
        assert_eq!(
            resolution,
            Resolution::unresolved(UnresolvedReason::MissingLastName)
        );
    }

    #[test]
    fn test_duplicate_rows_of_one_person_are_unique() {
        let pool = CandidatePool::new(
            vec![
                PersonRecord::member(5, 19, "Anna", "Lührmann"),
                PersonRecord::member(5, 19, "Anna", "Lührmann").in_government(None, None),
            ],
            vec![],
        );
        let resolution = resolve(ResolverQuery::new(name(&[], &[], "Lührmann")), &pool);
        assert_eq!(resolution, Resolution::resolved(5, ResolutionStage::LastName));
    }

    fn arb_record() -> impl Strategy<Value = PersonRecord> {
        (
            0i64..20,
            prop::sample::select(vec!["Anna", "Bernd", "Hans Peter", "Karl"]),
            prop::sample::select(vec!["Müller", "Schmidt", "Schmitt", "Weber"]),
            prop::option::of(0i64..4),
        )
            .prop_map(|(id, first, last, faction)| {
                let mut record = PersonRecord::member(id, 19, first, last);
                record.faction_id = faction;
                record
            })
    }

    proptest! {
        #[test]
        fn test_resolver_is_deterministic(
            records in prop::collection::vec(arb_record(), 0..12),
            last in prop::sample::select(vec!["Müller", "Schmidt", "Schmied", "Weber", ""]),
            first in prop::sample::select(vec!["", "Hans", "Anna"]),
            faction in prop::option::of(-1i64..4),
        ) {
            let pool = CandidatePool::new(records, vec![]);
            let first_names: Vec<&str> = if first.is_empty() { vec![] } else { vec![first] };
            let query = ResolverQuery::new(name(&[], &first_names, last)).with_faction(faction);

            let resolver = CascadeResolver::new();
            let a = resolver.resolve(&query, &pool);
            let b = resolver.resolve(&query, &pool);
            prop_assert_eq!(a, b);

            if let Some(id) = a.person_id() {
                prop_assert!(pool.primary().iter().any(|r| r.id == id));
            }
        }
    }
}
