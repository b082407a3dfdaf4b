//! Reference tables
//!
//! Canonical factions and person records loaded from JSON arrays.

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::{Faction, PersonRecord, PlenarError, Result};

/// Read-only reference data shared by all transcripts of a batch
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub factions: Vec<Faction>,
    pub persons: Vec<PersonRecord>,
}

impl ReferenceData {
    pub fn new(factions: Vec<Faction>, persons: Vec<PersonRecord>) -> Self {
        Self { factions, persons }
    }

    /// Load both tables from JSON files
    pub fn from_files(factions: impl AsRef<Path>, persons: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            factions: load_json_array(factions.as_ref())?,
            persons: load_json_array(persons.as_ref())?,
        })
    }

    /// Numeric id for a faction abbreviation
    ///
    /// Case and a trailing period are ignored, so `DIE LINKE` finds `DIE LINKE.`.
    pub fn faction_id(&self, abbreviation: &str) -> Option<i64> {
        let needle = normalize_abbreviation(abbreviation);
        self.factions
            .iter()
            .find(|f| normalize_abbreviation(&f.abbreviation) == needle)
            .map(|f| f.id)
    }

    /// Faction by id
    pub fn faction(&self, id: i64) -> Option<&Faction> {
        self.factions.iter().find(|f| f.id == id)
    }

    /// All person records of one electoral term
    pub fn persons_in_term(&self, term: u32) -> impl Iterator<Item = &PersonRecord> {
        self.persons
            .iter()
            .filter(move |p| p.electoral_term == term)
    }
}

fn normalize_abbreviation(abbreviation: &str) -> String {
    abbreviation.trim().trim_end_matches('.').to_lowercase()
}

fn load_json_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path).map_err(|e| PlenarError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;

    serde_json::from_str(&content).map_err(|e| PlenarError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Gender, RecordRole};
    use std::io::Write;

    fn write_json(value: serde_json::Value) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{value}").unwrap();
        file
    }

    #[test]
    fn test_load_reference_files() {
        let factions = write_json(serde_json::json!([
            {"id": 4, "name": "Christlich Demokratische Union/Christlich-soziale Union", "abbreviation": "CDU/CSU"},
            {"id": 23, "name": "Sozialdemokratische Partei Deutschlands", "abbreviation": "SPD"},
            {"id": 3, "name": "Bündnis 90/Die Grünen", "abbreviation": "BÜNDNIS 90/DIE GRÜNEN"}
        ]));
        let persons = write_json(serde_json::json!([
            {"id": 11004362, "electoral_term": 19, "faction_id": 23, "first_name": "Anna",
             "last_name": "Müller", "gender": "weiblich", "constituency": "Köln I"},
            {"id": 11003000, "electoral_term": 19, "first_name": "Olaf", "last_name": "Scholz",
             "role": "government", "tenure_from": "2018-03-14"}
        ]));

        let data = ReferenceData::from_files(factions.path(), persons.path()).unwrap();
        assert_eq!(data.factions.len(), 3);
        assert_eq!(data.persons.len(), 2);
        assert_eq!(data.persons[0].gender, Gender::Female);
        assert_eq!(data.persons[1].role, RecordRole::Government);
        assert_eq!(data.persons_in_term(19).count(), 2);
        assert_eq!(data.persons_in_term(18).count(), 0);
    }

    #[test]
    fn test_faction_id_lookup() {
        let data = ReferenceData::new(
            vec![
                Faction {
                    id: 23,
                    name: "SPD".to_string(),
                    abbreviation: "SPD".to_string(),
                },
                Faction {
                    id: 3,
                    name: "Grüne".to_string(),
                    abbreviation: "BÜNDNIS 90/DIE GRÜNEN".to_string(),
                },
            ],
            vec![],
        );

        assert_eq!(data.faction_id("spd"), Some(23));
        assert_eq!(data.faction_id("Bündnis 90/Die Grünen"), Some(3));
        assert_eq!(data.faction_id("SPD."), Some(23));
        assert_eq!(data.faction_id("XYZ"), None);
        assert_eq!(data.faction(3).map(|f| f.name.as_str()), Some("Grüne"));
    }

    #[test]
    fn test_malformed_reference_file() {
        let file = write_json(serde_json::json!({"not": "an array"}));
        let err = ReferenceData::from_files(file.path(), file.path()).unwrap_err();
        assert!(matches!(err, PlenarError::ParseError { .. }));

        let err = ReferenceData::from_files("/missing.json", file.path()).unwrap_err();
        assert!(matches!(err, PlenarError::IoError { .. }));
    }
}
