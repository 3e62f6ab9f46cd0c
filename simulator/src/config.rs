//! JSON experiment configuration.
//!
//! ```json
//! {
//!   "frame": {
//!     "stage": { "key": "Phase", "categories": ["pre", "post"] },
//!     "scenarios": { "Place": ["home", "work"] },
//!     "attributes": { "Comfort": ["bad", "ok", "good"] }
//!   },
//!   "populations": {
//!     "ctrl": {
//!       "scenario_prob": [[1, 2], [2, 1]],
//!       "attribute_mean": { "Comfort": [[0.0, 0.5], [0.5, 1.0]] },
//!       "attribute_std": 0.5,
//!       "response_model": "thurstone"
//!     }
//!   },
//!   "groups": { "G1": { "population": "ctrl", "n_subjects": 10 } },
//!   "min_count": 3,
//!   "max_count": 50,
//!   "seed": 42
//! }
//! ```
//!
//! Without `stage` the frame gets a single `"Stage"` dimension with one
//! category, and scenario arrays may leave out the stage axis.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use ndarray::{ArrayD, IxDyn};
use rand::Rng;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::constants::{DEFAULT_MAX_COUNT, DEFAULT_MIN_COUNT, DEFAULT_STAGE_KEY, DEFAULT_STAGE_LABEL};
use crate::error::{Error, Result};
use crate::frame::EmaFrame;
use crate::latent::ResponseModel;
use crate::simulation::{SimulatedExperiment, SimulatedPopulation};

fn default_min_count() -> usize {
    DEFAULT_MIN_COUNT
}

fn default_max_count() -> usize {
    DEFAULT_MAX_COUNT
}

fn default_stage_key() -> String {
    DEFAULT_STAGE_KEY.to_string()
}

#[derive(Clone, Debug, Deserialize)]
pub struct ExperimentConfig {
    pub frame: FrameConfig,
    pub populations: IndexMap<String, PopulationConfig>,
    pub groups: IndexMap<String, GroupConfig>,
    #[serde(default = "default_min_count")]
    pub min_count: usize,
    #[serde(default = "default_max_count")]
    pub max_count: usize,
    #[serde(default)]
    pub seed: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FrameConfig {
    #[serde(default)]
    pub stage: Option<StageConfig>,
    #[serde(default)]
    pub scenarios: IndexMap<String, Vec<String>>,
    #[serde(default)]
    pub attributes: IndexMap<String, Vec<String>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StageConfig {
    #[serde(default = "default_stage_key")]
    pub key: String,
    pub categories: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PopulationConfig {
    /// Nested arrays, proportional to conditional scenario probabilities.
    pub scenario_prob: Value,
    /// Attribute key → nested arrays of latent locations.
    #[serde(default)]
    pub attribute_mean: IndexMap<String, Value>,
    #[serde(default)]
    pub log_scenario_std: f64,
    #[serde(default)]
    pub attribute_std: f64,
    #[serde(default)]
    pub log_response_width_std: f64,
    #[serde(default)]
    pub response_model: ResponseModel,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GroupConfig {
    pub population: String,
    pub n_subjects: usize,
}

impl ExperimentConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn build_frame(&self) -> Result<EmaFrame> {
        let (key, cats) = match &self.frame.stage {
            Some(stage) => (stage.key.clone(), stage.categories.clone()),
            None => (DEFAULT_STAGE_KEY.to_string(), vec![DEFAULT_STAGE_LABEL.to_string()]),
        };
        if self.frame.scenarios.contains_key(&key) {
            return Err(Error::InvalidConfig(format!(
                "stage key '{}' repeated among scenarios",
                key
            )));
        }
        let mut scenarios = IndexMap::with_capacity(self.frame.scenarios.len() + 1);
        scenarios.insert(key, cats);
        scenarios.extend(self.frame.scenarios.clone());
        EmaFrame::new(scenarios, self.frame.attributes.clone())
    }

    /// Build every configured population for `frame`, keyed by label.
    pub fn build_populations(
        &self,
        frame: &EmaFrame,
    ) -> Result<IndexMap<String, Arc<SimulatedPopulation>>> {
        self.populations
            .iter()
            .map(|(label, pc)| -> Result<(String, Arc<SimulatedPopulation>)> {
                Ok((label.clone(), Arc::new(pc.build(label, frame)?)))
            })
            .collect()
    }

    /// Frame, populations and one drawn group per `groups` entry.
    pub fn build_experiment<R: Rng>(&self, rng: &mut R) -> Result<SimulatedExperiment> {
        let frame = self.build_frame()?;
        let populations = self.build_populations(&frame)?;
        let mut groups = IndexMap::with_capacity(self.groups.len());
        for (g_id, gc) in &self.groups {
            let pop = populations.get(&gc.population).ok_or_else(|| {
                Error::InvalidConfig(format!(
                    "group '{}' refers to unknown population '{}'",
                    g_id, gc.population
                ))
            })?;
            groups.insert(g_id.clone(), pop.draw_group(gc.n_subjects, rng));
        }
        info!(
            scenario_shape = ?frame.scenario_shape(),
            attributes = frame.n_attributes(),
            populations = populations.len(),
            groups = groups.len(),
            "built experiment"
        );
        SimulatedExperiment::new(frame, groups)
    }
}

impl PopulationConfig {
    pub fn build(&self, label: &str, frame: &EmaFrame) -> Result<SimulatedPopulation> {
        for (name, std) in [
            ("log_scenario_std", self.log_scenario_std),
            ("attribute_std", self.attribute_std),
            ("log_response_width_std", self.log_response_width_std),
        ] {
            if !(std.is_finite() && std >= 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "population '{}': {} must be finite and non-negative, got {}",
                    label, name, std
                )));
            }
        }
        let scenario_prob = nested_array(&self.scenario_prob, "scenario_prob")?;
        if scenario_prob.iter().any(|&p| !(p.is_finite() && p >= 0.0)) {
            return Err(Error::InvalidConfig(format!(
                "population '{}': scenario_prob must be finite and non-negative",
                label
            )));
        }
        let attribute_mean = self
            .attribute_mean
            .iter()
            .map(|(key, v)| -> Result<(String, ArrayD<f64>)> {
                Ok((key.clone(), nested_array(v, key)?))
            })
            .collect::<Result<IndexMap<_, _>>>()?;

        SimulatedPopulation::new(frame, scenario_prob, attribute_mean)?
            .with_label(label)
            .with_response_model(self.response_model)
            .with_log_scenario_std(self.log_scenario_std)?
            .with_attribute_std(self.attribute_std)?
            .with_log_response_width_std(self.log_response_width_std)
    }
}

/// Rectangular nested JSON arrays of numbers → `ArrayD<f64>`.
pub fn nested_array(value: &Value, what: &str) -> Result<ArrayD<f64>> {
    let mut shape = Vec::new();
    let mut cur = value;
    while let Value::Array(items) = cur {
        shape.push(items.len());
        match items.first() {
            Some(first) => cur = first,
            None => break,
        }
    }
    let mut data = Vec::with_capacity(shape.iter().product());
    flatten_into(value, &shape, &mut data, what)?;
    ArrayD::from_shape_vec(IxDyn(&shape), data)
        .map_err(|e| Error::InvalidConfig(format!("{}: {}", what, e)))
}

fn flatten_into(value: &Value, shape: &[usize], out: &mut Vec<f64>, what: &str) -> Result<()> {
    match (shape.split_first(), value) {
        (None, Value::Number(n)) => {
            let x = n
                .as_f64()
                .ok_or_else(|| Error::InvalidConfig(format!("{}: {} is not a float", what, n)))?;
            out.push(x);
            Ok(())
        }
        (Some((&len, rest)), Value::Array(items)) if items.len() == len => {
            for item in items {
                flatten_into(item, rest, out, what)?;
            }
            Ok(())
        }
        _ => Err(Error::InvalidConfig(format!(
            "{}: expected rectangular nested arrays of numbers",
            what
        ))),
    }
}
