//! Generated EMA data set: records per subject per group.
//!
//! Persistence is a single pretty-printed JSON document holding the frame and
//! every record, in generation order.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::frame::{EmaFrame, EmaRecord};

/// Subject id → record sequence.
pub type GroupRecords = IndexMap<String, Vec<EmaRecord>>;

/// All records of one simulated (or observed) EMA study.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmaDataSet {
    frame: EmaFrame,
    groups: IndexMap<String, GroupRecords>,
}

impl EmaDataSet {
    pub fn new(frame: EmaFrame, groups: IndexMap<String, GroupRecords>) -> Self {
        Self { frame, groups }
    }

    pub fn frame(&self) -> &EmaFrame {
        &self.frame
    }

    /// Group id → subject id → records.
    pub fn groups(&self) -> &IndexMap<String, GroupRecords> {
        &self.groups
    }

    pub fn n_groups(&self) -> usize {
        self.groups.len()
    }

    pub fn n_subjects(&self) -> usize {
        self.groups.values().map(|g| g.len()).sum()
    }

    pub fn n_records(&self) -> usize {
        self.groups
            .values()
            .flat_map(|g| g.values())
            .map(|r| r.len())
            .sum()
    }

    pub fn subject_records(&self, group: &str, subject: &str) -> Option<&[EmaRecord]> {
        self.groups
            .get(group)
            .and_then(|g| g.get(subject))
            .map(Vec::as_slice)
    }

    /// Write the data set as pretty JSON, creating parent directories.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(
            path = %path.display(),
            groups = self.n_groups(),
            subjects = self.n_subjects(),
            records = self.n_records(),
            "saved dataset"
        );
        Ok(())
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_dataset() -> EmaDataSet {
        let mut scenarios = IndexMap::new();
        scenarios.insert("Stage".to_string(), vec!["s".to_string()]);
        let mut grades = IndexMap::new();
        grades.insert("Q".to_string(), vec!["lo".to_string(), "hi".to_string()]);
        let frame = EmaFrame::new(scenarios, grades).unwrap();

        let record = |q: &str| -> EmaRecord {
            let mut r = EmaRecord::new();
            r.insert("Stage".to_string(), "s".to_string());
            r.insert("Q".to_string(), q.to_string());
            r
        };
        let mut g1 = GroupRecords::new();
        g1.insert("a_S0".to_string(), vec![record("lo"), record("hi")]);
        g1.insert("a_S1".to_string(), vec![record("hi")]);
        let mut g2 = GroupRecords::new();
        g2.insert("b_S0".to_string(), vec![]);
        let mut groups = IndexMap::new();
        groups.insert("A".to_string(), g1);
        groups.insert("B".to_string(), g2);
        EmaDataSet::new(frame, groups)
    }

    #[test]
    fn test_counts() {
        let ds = make_dataset();
        assert_eq!(ds.n_groups(), 2);
        assert_eq!(ds.n_subjects(), 3);
        assert_eq!(ds.n_records(), 3);
        assert_eq!(ds.subject_records("A", "a_S0").map(|r| r.len()), Some(2));
        assert!(ds.subject_records("A", "nobody").is_none());
    }

    #[test]
    fn test_json_keeps_order() {
        let ds = make_dataset();
        let json = serde_json::to_string(&ds).unwrap();
        let pos_a = json.find("\"a_S0\"").unwrap();
        let pos_b = json.find("\"b_S0\"").unwrap();
        assert!(pos_a < pos_b);
        let back: EmaDataSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ds);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dataset.json");
        let ds = make_dataset();
        ds.save_json(&path).unwrap();
        let back = EmaDataSet::load_json(&path).unwrap();
        assert_eq!(back, ds);
    }
}
