//! # emasim: simulated Ecological Momentary Assessment data
//!
//! Generates synthetic EMA survey records for groups of simulated respondents
//! drawn from populations with specified inter-individual parameter spread.
//!
//! ## Data-generating process
//!
//! | Step | Rust item | Description |
//! |------|-----------|-------------|
//! | 1 | [`simulation::SimulatedPopulation`] | Population means plus std of log scenario probabilities, attribute locations and log response widths |
//! | 2 | [`simulation::SimulatedPopulation::draw_group`] | Perturb the means once per subject → [`simulation::SimulatedSubject`] |
//! | 3 | [`simulation::SimulatedSubject::generate_ema_records`] | Per stage: random record count, scenario draw, latent sample per attribute |
//! | 4 | [`thresholds::grade_index`] | Latent sample → ordinal grade via interior thresholds |
//! | 5 | [`simulation::SimulatedExperiment::generate_dataset`] | All groups and subjects → [`dataset::EmaDataSet`] |
//!
//! The latent variable follows either the Thurstone Case V (Gaussian) or the
//! Bradley-Terry-Luce (logistic) model, see [`latent::ResponseModel`].
//!
//! ## Layout
//!
//! Every scenario-indexed array has the frame's scenario shape
//! `(n_stages, n_dim1, ...)`; the first axis is always the Stage. Ordered maps
//! ([`indexmap::IndexMap`]) keep groups, subjects, scenario dimensions and
//! attributes in insertion order so output is reproducible from a seed.
//!
//! ## Randomness
//!
//! No global generator: every sampling call takes an explicit `&mut impl Rng`.
//! The parallel path seeds one `SmallRng` per subject.

pub mod config;
pub mod constants;
pub mod dataset;
pub mod env_config;
pub mod error;
pub mod frame;
pub mod latent;
pub mod simulation;
pub mod statistics;
pub mod thresholds;

pub use dataset::EmaDataSet;
pub use error::{Error, Result};
pub use frame::{EmaFrame, EmaRecord};
pub use latent::ResponseModel;
