//! Simulated population: a distribution over subject parameters.
//!
//! Each subject drawn from a population gets
//!
//! - scenario probabilities perturbed in the log domain by
//!   `log_scenario_std` and re-normalized per stage,
//! - attribute locations perturbed additively by `attribute_std`,
//! - response thresholds from log interval widths with std
//!   `log_response_width_std`.
//!
//! A zero standard deviation skips the corresponding perturbation, so a
//! population with all three at zero draws identical copies of its means.

use std::sync::Arc;

use indexmap::IndexMap;
use ndarray::{ArrayD, Axis, IxDyn};
use rand::Rng;
use rand_distr::StandardNormal;
use tracing::debug;

use crate::constants::{subject_id, DEFAULT_POPULATION_LABEL};
use crate::error::{Error, Result};
use crate::frame::EmaFrame;
use crate::latent::ResponseModel;
use crate::thresholds::interior_thresholds;

use super::group::SimulatedGroup;
use super::subject::SimulatedSubject;

/// Add the leading stage axis when the frame has a single stage and the
/// array was given without it, then require the exact scenario shape.
pub fn with_stage_axis(
    array: ArrayD<f64>,
    scenario_shape: &[usize],
    what: &str,
) -> Result<ArrayD<f64>> {
    let array = if scenario_shape.first() == Some(&1) && array.shape() == &scenario_shape[1..] {
        array.insert_axis(Axis(0))
    } else {
        array
    };
    if array.shape() != scenario_shape {
        return Err(Error::ShapeMismatch {
            what: what.to_string(),
            expected: scenario_shape.to_vec(),
            found: array.shape().to_vec(),
        });
    }
    Ok(array)
}

/// Scale every stage slice (axis 0) to unit sum.
pub fn normalize_stages(prob: &mut ArrayD<f64>) {
    for mut stage in prob.axis_iter_mut(Axis(0)) {
        let total = stage.sum();
        stage.mapv_inplace(|p| p / total);
    }
}

fn check_spread(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(Error::InvalidSpread { name, value })
    }
}

/// Parameter distribution of one (sub-)population of respondents.
#[derive(Clone, Debug)]
pub struct SimulatedPopulation {
    label: String,
    model: ResponseModel,
    scenario_shape: Vec<usize>,
    /// Attribute key → number of grades, frame order.
    rating_shape: IndexMap<String, usize>,
    scenario_prob: ArrayD<f64>,
    attribute_mean: IndexMap<String, ArrayD<f64>>,
    log_scenario_std: f64,
    attribute_std: f64,
    log_response_width_std: f64,
}

impl SimulatedPopulation {
    /// Build a homogeneous population (all standard deviations zero, BTL model).
    ///
    /// `scenario_prob` need only be proportional to the conditional scenario
    /// probabilities given each stage. `attribute_mean` must name exactly the
    /// frame's attributes. Either array may omit the stage axis when the frame
    /// has a single stage.
    pub fn new(
        frame: &EmaFrame,
        scenario_prob: ArrayD<f64>,
        attribute_mean: IndexMap<String, ArrayD<f64>>,
    ) -> Result<Self> {
        let scenario_shape = frame.scenario_shape();
        let mut scenario_prob = with_stage_axis(scenario_prob, &scenario_shape, "scenario_prob")?;
        normalize_stages(&mut scenario_prob);

        let same_keys = attribute_mean.len() == frame.n_attributes()
            && frame.attribute_keys().all(|k| attribute_mean.contains_key(k));
        if !same_keys {
            return Err(Error::SchemaMismatch {
                expected: frame.attribute_keys().map(String::from).collect(),
                found: attribute_mean.keys().cloned().collect(),
            });
        }

        // re-key in frame order
        let mut attribute_mean = attribute_mean;
        let mut ordered = IndexMap::with_capacity(attribute_mean.len());
        for key in frame.attribute_keys() {
            if let Some(mean) = attribute_mean.shift_remove(key) {
                let what = format!("attribute_mean[{}]", key);
                ordered.insert(key.to_string(), with_stage_axis(mean, &scenario_shape, &what)?);
            }
        }

        let rating_shape = frame
            .attribute_grades()
            .iter()
            .map(|(k, grades)| (k.clone(), grades.len()))
            .collect();

        Ok(Self {
            label: DEFAULT_POPULATION_LABEL.to_string(),
            model: ResponseModel::default(),
            scenario_shape,
            rating_shape,
            scenario_prob,
            attribute_mean: ordered,
            log_scenario_std: 0.0,
            attribute_std: 0.0,
            log_response_width_std: 0.0,
        })
    }

    /// Prefix of generated subject identifiers.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_response_model(mut self, model: ResponseModel) -> Self {
        self.model = model;
        self
    }

    /// Inter-individual std of log scenario probabilities.
    ///
    /// Rejects negative or non-finite values.
    pub fn with_log_scenario_std(mut self, std: f64) -> Result<Self> {
        self.log_scenario_std = check_spread("log_scenario_std", std)?;
        Ok(self)
    }

    /// Inter-individual std of attribute locations.
    pub fn with_attribute_std(mut self, std: f64) -> Result<Self> {
        self.attribute_std = check_spread("attribute_std", std)?;
        Ok(self)
    }

    /// Inter-individual std of log response-interval widths.
    pub fn with_log_response_width_std(mut self, std: f64) -> Result<Self> {
        self.log_response_width_std = check_spread("log_response_width_std", std)?;
        Ok(self)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn response_model(&self) -> ResponseModel {
        self.model
    }

    pub fn scenario_shape(&self) -> &[usize] {
        &self.scenario_shape
    }

    pub fn scenario_prob(&self) -> &ArrayD<f64> {
        &self.scenario_prob
    }

    pub fn attribute_mean(&self) -> &IndexMap<String, ArrayD<f64>> {
        &self.attribute_mean
    }

    pub fn n_attributes(&self) -> usize {
        self.attribute_mean.len()
    }

    pub fn log_scenario_std(&self) -> f64 {
        self.log_scenario_std
    }

    pub fn attribute_std(&self) -> f64 {
        self.attribute_std
    }

    pub fn log_response_width_std(&self) -> f64 {
        self.log_response_width_std
    }

    /// Check that this population was built for `frame`'s layout.
    pub fn check_frame(&self, frame: &EmaFrame) -> Result<()> {
        let scenario_shape = frame.scenario_shape();
        if scenario_shape != self.scenario_shape {
            return Err(Error::ShapeMismatch {
                what: format!("population '{}'", self.label),
                expected: scenario_shape,
                found: self.scenario_shape.clone(),
            });
        }
        let same_attributes = frame
            .attribute_grades()
            .iter()
            .map(|(k, g)| (k.as_str(), g.len()))
            .eq(self.rating_shape.iter().map(|(k, n)| (k.as_str(), *n)));
        if !same_attributes {
            return Err(Error::SchemaMismatch {
                expected: frame.attribute_keys().map(String::from).collect(),
                found: self.rating_shape.keys().cloned().collect(),
            });
        }
        Ok(())
    }

    /// Draw one subject parameter set.
    pub fn draw_subject<R: Rng>(&self, rng: &mut R) -> SimulatedSubject {
        SimulatedSubject::new(
            self.model,
            self.draw_scenario_prob(rng),
            self.draw_attribute_theta(rng),
            self.draw_attribute_tau(rng),
        )
    }

    /// Draw `n_subjects` independent subjects, named `"{label}_S{i}"`.
    pub fn draw_group<R: Rng>(self: &Arc<Self>, n_subjects: usize, rng: &mut R) -> SimulatedGroup {
        let subjects: IndexMap<String, SimulatedSubject> = (0..n_subjects)
            .map(|i| (subject_id(&self.label, i), self.draw_subject(rng)))
            .collect();
        debug!(
            population = %self.label,
            n_subjects,
            model = %self.model,
            "drew group"
        );
        SimulatedGroup::new(Arc::clone(self), subjects)
    }

    fn draw_scenario_prob<R: Rng>(&self, rng: &mut R) -> ArrayD<f64> {
        let mut prob = self.scenario_prob.clone();
        if self.log_scenario_std != 0.0 {
            let std = self.log_scenario_std;
            prob.mapv_inplace(|p| (p.ln() + std * rng.sample::<f64, _>(StandardNormal)).exp());
            normalize_stages(&mut prob);
        }
        prob
    }

    fn draw_attribute_theta<R: Rng>(&self, rng: &mut R) -> IndexMap<String, ArrayD<f64>> {
        if self.attribute_std == 0.0 || self.attribute_mean.is_empty() {
            return self.attribute_mean.clone();
        }
        // one joint draw of shape (n_attributes, *scenario_shape)
        let mut noise_shape = Vec::with_capacity(self.scenario_shape.len() + 1);
        noise_shape.push(self.n_attributes());
        noise_shape.extend_from_slice(&self.scenario_shape);
        let noise = ArrayD::<f64>::from_shape_simple_fn(IxDyn(&noise_shape), || {
            rng.sample::<f64, _>(StandardNormal)
        });

        let std = self.attribute_std;
        self.attribute_mean
            .iter()
            .zip(noise.axis_iter(Axis(0)))
            .map(|((key, mean), d)| {
                let mut theta = mean.clone();
                theta.zip_mut_with(&d, |t, &z| *t += std * z);
                (key.clone(), theta)
            })
            .collect()
    }

    fn draw_attribute_tau<R: Rng>(&self, rng: &mut R) -> IndexMap<String, Vec<f64>> {
        let std = self.log_response_width_std;
        self.rating_shape
            .iter()
            .map(|(key, &n_grades)| {
                let log_w: Vec<f64> = if std != 0.0 {
                    (0..n_grades)
                        .map(|_| std * rng.sample::<f64, _>(StandardNormal))
                        .collect()
                } else {
                    vec![0.0; n_grades]
                };
                (key.clone(), interior_thresholds(&log_w))
            })
            .collect()
    }
}
