//! Experiment layout: scenario dimensions and attribute rating scales.
//!
//! The first scenario dimension is always the Stage. Every scenario-indexed
//! array in the simulation has shape [`EmaFrame::scenario_shape`], i.e.
//! `(n_stages, n_dim1, n_dim2, ...)`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One momentary-assessment event: variable key → chosen category label.
///
/// Keys are the scenario dimensions (Stage first) followed by the attributes,
/// both in frame order.
pub type EmaRecord = IndexMap<String, String>;

#[derive(Deserialize)]
struct RawFrame {
    scenarios: IndexMap<String, Vec<String>>,
    #[serde(default)]
    attribute_grades: IndexMap<String, Vec<String>>,
}

impl TryFrom<RawFrame> for EmaFrame {
    type Error = Error;

    fn try_from(raw: RawFrame) -> Result<Self> {
        EmaFrame::new(raw.scenarios, raw.attribute_grades)
    }
}

/// Scenario dimensions and ordinal attribute scales of one EMA study.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFrame")]
pub struct EmaFrame {
    scenarios: IndexMap<String, Vec<String>>,
    attribute_grades: IndexMap<String, Vec<String>>,
}

impl EmaFrame {
    /// Validate and build a frame.
    ///
    /// `scenarios` must hold at least the Stage dimension; no category list may
    /// be empty and no key may name both a scenario dimension and an attribute.
    pub fn new(
        scenarios: IndexMap<String, Vec<String>>,
        attribute_grades: IndexMap<String, Vec<String>>,
    ) -> Result<Self> {
        if scenarios.is_empty() {
            return Err(Error::InvalidFrame(
                "at least the stage dimension is required".to_string(),
            ));
        }
        for (key, cats) in scenarios.iter().chain(attribute_grades.iter()) {
            if cats.is_empty() {
                return Err(Error::InvalidFrame(format!("'{}' has no categories", key)));
            }
        }
        if let Some(key) = attribute_grades.keys().find(|k| scenarios.contains_key(*k)) {
            return Err(Error::InvalidFrame(format!(
                "'{}' is both a scenario dimension and an attribute",
                key
            )));
        }
        Ok(Self {
            scenarios,
            attribute_grades,
        })
    }

    /// Scenario dimension key → ordered category labels, Stage first.
    pub fn scenarios(&self) -> &IndexMap<String, Vec<String>> {
        &self.scenarios
    }

    /// Attribute key → ordered grade labels.
    pub fn attribute_grades(&self) -> &IndexMap<String, Vec<String>> {
        &self.attribute_grades
    }

    pub fn attribute_keys(&self) -> impl Iterator<Item = &str> {
        self.attribute_grades.keys().map(String::as_str)
    }

    pub fn n_attributes(&self) -> usize {
        self.attribute_grades.len()
    }

    pub fn stage_key(&self) -> &str {
        // non-empty by construction
        self.scenarios
            .get_index(0)
            .map(|(k, _)| k.as_str())
            .unwrap_or_default()
    }

    pub fn n_stages(&self) -> usize {
        self.scenario_shape()[0]
    }

    /// `(n_stages, n_dim1, ...)`.
    pub fn scenario_shape(&self) -> Vec<usize> {
        self.scenarios.values().map(Vec::len).collect()
    }

    /// Number of grades per attribute, in attribute order.
    pub fn rating_shape(&self) -> Vec<usize> {
        self.attribute_grades.values().map(Vec::len).collect()
    }

    /// Total number of scenario cells, Stage included.
    pub fn n_scenarios(&self) -> usize {
        self.scenario_shape().iter().product()
    }

    /// Scenario index tuple of a record, or `None` if any label is missing or unknown.
    pub fn scenario_index(&self, record: &EmaRecord) -> Option<Vec<usize>> {
        self.scenarios
            .iter()
            .map(|(key, cats)| {
                let label = record.get(key)?;
                cats.iter().position(|c| c == label)
            })
            .collect()
    }

    /// Grade index for every attribute, `None` where the record has no valid grade.
    pub fn rating_index(&self, record: &EmaRecord) -> Vec<Option<usize>> {
        self.attribute_grades
            .iter()
            .map(|(key, grades)| {
                record
                    .get(key)
                    .and_then(|label| grades.iter().position(|g| g == label))
            })
            .collect()
    }
}
