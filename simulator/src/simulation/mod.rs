//! Simulated respondents, populations, groups and experiments.
//!
//! - [`subject`]: one respondent with fixed parameters; generates EMA records
//! - [`population`]: distribution of subject parameters; draws groups
//! - [`group`]: subjects drawn together from one population
//! - [`experiment`]: named groups under one frame; generates a data set

pub mod experiment;
pub mod group;
pub mod population;
pub mod subject;

// Re-export commonly used items
pub use experiment::SimulatedExperiment;
pub use group::SimulatedGroup;
pub use population::{normalize_stages, with_stage_axis, SimulatedPopulation};
pub use subject::SimulatedSubject;
