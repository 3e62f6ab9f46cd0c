//! One simulated respondent.
//!
//! A subject's parameters are fixed for the whole study. Record generation
//! walks the stages in order; within a stage it draws a random number of
//! records, each one a scenario drawn from the stage's conditional scenario
//! probabilities followed by one graded response per attribute.

use indexmap::IndexMap;
use ndarray::{ArrayD, Axis, IxDyn};
use rand::Rng;

use crate::error::{Error, Result};
use crate::frame::{EmaFrame, EmaRecord};
use crate::latent::ResponseModel;
use crate::thresholds::{grade_index, sample_index, unravel_index};

/// Fixed parameter set of one simulated respondent.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulatedSubject {
    model: ResponseModel,
    /// Conditional scenario probabilities, normalized per stage slice.
    scenario_prob: ArrayD<f64>,
    /// Latent location per attribute, indexed by scenario.
    attribute_theta: IndexMap<String, ArrayD<f64>>,
    /// Ascending interior thresholds per attribute.
    attribute_tau: IndexMap<String, Vec<f64>>,
}

impl SimulatedSubject {
    pub fn new(
        model: ResponseModel,
        scenario_prob: ArrayD<f64>,
        attribute_theta: IndexMap<String, ArrayD<f64>>,
        attribute_tau: IndexMap<String, Vec<f64>>,
    ) -> Self {
        Self {
            model,
            scenario_prob,
            attribute_theta,
            attribute_tau,
        }
    }

    pub fn model(&self) -> ResponseModel {
        self.model
    }

    pub fn scenario_prob(&self) -> &ArrayD<f64> {
        &self.scenario_prob
    }

    pub fn attribute_theta(&self) -> &IndexMap<String, ArrayD<f64>> {
        &self.attribute_theta
    }

    pub fn attribute_tau(&self) -> &IndexMap<String, Vec<f64>> {
        &self.attribute_tau
    }

    /// Generate the subject's full record sequence, stage-major.
    ///
    /// Each stage gets a record count drawn uniformly from the half-open
    /// range `min_count..max_count`.
    pub fn generate_ema_records<R: Rng>(
        &self,
        frame: &EmaFrame,
        min_count: usize,
        max_count: usize,
        rng: &mut R,
    ) -> Result<Vec<EmaRecord>> {
        if min_count >= max_count {
            return Err(Error::InvalidRecordRange {
                min: min_count,
                max: max_count,
            });
        }
        let scenario_shape = frame.scenario_shape();
        if self.scenario_prob.shape() != scenario_shape.as_slice() {
            return Err(Error::ShapeMismatch {
                what: "scenario_prob".to_string(),
                expected: scenario_shape,
                found: self.scenario_prob.shape().to_vec(),
            });
        }
        let free_shape = &scenario_shape[1..];

        let mut records = Vec::new();
        for (stage, stage_prob) in self.scenario_prob.axis_iter(Axis(0)).enumerate() {
            // iter() is row-major, matching unravel_index
            let p: Vec<f64> = stage_prob.iter().copied().collect();
            let n_rec = rng.random_range(min_count..max_count);
            for _ in 0..n_rec {
                let mut sc = Vec::with_capacity(scenario_shape.len());
                sc.push(stage);
                sc.extend(unravel_index(sample_index(&p, rng), free_shape));

                let mut record = scenario_record(frame, &sc);
                record.extend(self.attribute_grades(frame, &sc, rng)?);
                records.push(record);
            }
        }
        Ok(records)
    }

    /// One graded response per attribute in scenario `sc`.
    fn attribute_grades<R: Rng>(
        &self,
        frame: &EmaFrame,
        sc: &[usize],
        rng: &mut R,
    ) -> Result<Vec<(String, String)>> {
        let mut grades = Vec::with_capacity(self.attribute_theta.len());
        for (key, theta) in &self.attribute_theta {
            let entry = (frame.attribute_grades().get(key), self.attribute_tau.get(key));
            let (labels, tau) = match entry {
                (Some(labels), Some(tau)) => (labels, tau),
                _ => {
                    return Err(Error::SchemaMismatch {
                        expected: frame.attribute_keys().map(String::from).collect(),
                        found: self.attribute_theta.keys().cloned().collect(),
                    })
                }
            };
            let location = *theta.get(IxDyn(sc)).ok_or_else(|| Error::ShapeMismatch {
                what: format!("attribute_theta[{}]", key),
                expected: frame.scenario_shape(),
                found: theta.shape().to_vec(),
            })?;
            let x = self.model.draw_noisy_sample(rng, location);
            let g = grade_index(x, tau).min(labels.len() - 1);
            grades.push((key.clone(), labels[g].clone()));
        }
        Ok(grades)
    }
}

/// Scenario labels for an index tuple, Stage first.
fn scenario_record(frame: &EmaFrame, sc: &[usize]) -> EmaRecord {
    frame
        .scenarios()
        .iter()
        .zip(sc.iter())
        .map(|((key, cats), &i)| (key.clone(), cats[i].clone()))
        .collect()
}
