//! Candidate pools
//!
//! Person records of one sitting's electoral term, plus the government
//! members in office on the sitting date. Government records are drawn from
//! the whole reference table: a minister may hold office during a term in
//! which they have no parliamentary record.

use chrono::NaiveDate;

use plenar_core::{PersonRecord, RecordRole, ReferenceData};

/// Records a speaker of one sitting can resolve to
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    primary: Vec<PersonRecord>,
    government: Vec<PersonRecord>,
}

impl CandidatePool {
    pub fn new(primary: Vec<PersonRecord>, government: Vec<PersonRecord>) -> Self {
        Self {
            primary,
            government,
        }
    }

    /// Pool for a sitting of `term`
    ///
    /// Without a date, government records of `term` qualify. With a date, the
    /// tenure must cover it; records of other terms need a dated tenure.
    pub fn for_sitting(references: &ReferenceData, term: u32, date: Option<NaiveDate>) -> Self {
        let primary: Vec<PersonRecord> = references.persons_in_term(term).cloned().collect();
        let government = references
            .persons
            .iter()
            .filter(|p| p.role == RecordRole::Government)
            .filter(|p| match date {
                Some(d) => {
                    p.holds_office_on(d) && (p.electoral_term == term || p.tenure_from.is_some())
                }
                None => p.electoral_term == term,
            })
            .cloned()
            .collect();

        Self {
            primary,
            government,
        }
    }

    /// All records of the term
    pub fn primary(&self) -> &[PersonRecord] {
        &self.primary
    }

    /// Government members in office
    pub fn government(&self) -> &[PersonRecord] {
        &self.government
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.government.is_empty()
    }
}
