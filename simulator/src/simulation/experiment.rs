//! Simulated EMA experiment: several groups sharing one frame.
//!
//! [`SimulatedExperiment::generate_dataset`] threads one generator through
//! groups → subjects → stages → draws, so the output is fixed by the
//! generator state. [`SimulatedExperiment::generate_dataset_par`] gives each
//! subject its own `SmallRng`, seeded in subject order (across all groups)
//! from a `StdRng` seeder built from `seed`, and runs subjects on the rayon
//! pool; the result does not depend on the thread count. The seeder is a
//! different generator from `SmallRng`, so no subject stream coincides with
//! a `SmallRng::seed_from_u64(seed)` used to draw the groups.

use std::time::Instant;

use indexmap::IndexMap;
use rand::rngs::{SmallRng, StdRng};
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::constants::{DEFAULT_MAX_COUNT, DEFAULT_MIN_COUNT};
use crate::dataset::{EmaDataSet, GroupRecords};
use crate::error::{Error, Result};
use crate::frame::{EmaFrame, EmaRecord};

use super::group::SimulatedGroup;
use super::subject::SimulatedSubject;

/// Frame plus named groups of simulated subjects.
#[derive(Clone, Debug)]
pub struct SimulatedExperiment {
    frame: EmaFrame,
    groups: IndexMap<String, SimulatedGroup>,
}

impl SimulatedExperiment {
    /// Every group's population must have been built for `frame`.
    pub fn new(frame: EmaFrame, groups: IndexMap<String, SimulatedGroup>) -> Result<Self> {
        for group in groups.values() {
            group.population().check_frame(&frame)?;
        }
        Ok(Self { frame, groups })
    }

    pub fn frame(&self) -> &EmaFrame {
        &self.frame
    }

    pub fn groups(&self) -> &IndexMap<String, SimulatedGroup> {
        &self.groups
    }

    pub fn n_subjects(&self) -> usize {
        self.groups.values().map(SimulatedGroup::len).sum()
    }

    /// Generate records with the default range `[3, 50)` per stage.
    pub fn generate_default_dataset<R: Rng>(&self, rng: &mut R) -> Result<EmaDataSet> {
        self.generate_dataset(DEFAULT_MIN_COUNT, DEFAULT_MAX_COUNT, rng)
    }

    /// Generate `min_count..max_count` records per stage for every subject.
    pub fn generate_dataset<R: Rng>(
        &self,
        min_count: usize,
        max_count: usize,
        rng: &mut R,
    ) -> Result<EmaDataSet> {
        check_range(min_count, max_count)?;
        let start = Instant::now();

        let mut emd = IndexMap::with_capacity(self.groups.len());
        for (g_id, group) in &self.groups {
            let mut records = GroupRecords::with_capacity(group.len());
            for (s_id, subject) in group.subjects() {
                let r = subject.generate_ema_records(&self.frame, min_count, max_count, rng)?;
                debug!(group = %g_id, subject = %s_id, records = r.len(), "generated subject");
                records.insert(s_id.clone(), r);
            }
            emd.insert(g_id.clone(), records);
        }

        let ds = EmaDataSet::new(self.frame.clone(), emd);
        info!(
            groups = ds.n_groups(),
            subjects = ds.n_subjects(),
            records = ds.n_records(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "generated dataset"
        );
        Ok(ds)
    }

    /// Parallel variant with one independent generator per subject.
    pub fn generate_dataset_par(
        &self,
        min_count: usize,
        max_count: usize,
        seed: u64,
    ) -> Result<EmaDataSet> {
        check_range(min_count, max_count)?;
        let start = Instant::now();

        let jobs: Vec<(&str, &str, &SimulatedSubject)> = self
            .groups
            .iter()
            .flat_map(|(g_id, group)| {
                group
                    .subjects()
                    .iter()
                    .map(move |(s_id, s)| (g_id.as_str(), s_id.as_str(), s))
            })
            .collect();

        let mut seeder = StdRng::seed_from_u64(seed);
        let seeds: Vec<u64> = jobs.iter().map(|_| seeder.random()).collect();

        let results: Vec<Vec<EmaRecord>> = jobs
            .par_iter()
            .zip(&seeds)
            .map(|((_, _, subject), &subject_seed)| {
                let mut rng = SmallRng::seed_from_u64(subject_seed);
                subject.generate_ema_records(&self.frame, min_count, max_count, &mut rng)
            })
            .collect::<Result<_>>()?;

        let mut emd: IndexMap<String, GroupRecords> = self
            .groups
            .iter()
            .map(|(g_id, group)| (g_id.clone(), GroupRecords::with_capacity(group.len())))
            .collect();
        for ((g_id, s_id, _), records) in jobs.iter().zip(results) {
            if let Some(group) = emd.get_mut(*g_id) {
                group.insert(s_id.to_string(), records);
            }
        }

        let ds = EmaDataSet::new(self.frame.clone(), emd);
        info!(
            groups = ds.n_groups(),
            subjects = ds.n_subjects(),
            records = ds.n_records(),
            threads = rayon::current_num_threads(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "generated dataset in parallel"
        );
        Ok(ds)
    }
}

fn check_range(min_count: usize, max_count: usize) -> Result<()> {
    if min_count >= max_count {
        return Err(Error::InvalidRecordRange {
            min: min_count,
            max: max_count,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::SimulatedPopulation;
    use ndarray::arr2;
    use std::sync::Arc;

    fn labels(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    fn make_frame() -> EmaFrame {
        let mut scenarios = IndexMap::new();
        scenarios.insert("Stage".to_string(), labels(&["pre", "post"]));
        scenarios.insert("Place".to_string(), labels(&["home", "work"]));
        let mut grades = IndexMap::new();
        grades.insert("Q".to_string(), labels(&["1", "2", "3"]));
        EmaFrame::new(scenarios, grades).unwrap()
    }

    fn make_experiment(frame: &EmaFrame) -> SimulatedExperiment {
        let mut means = IndexMap::new();
        means.insert("Q".to_string(), arr2(&[[0.0, 1.0], [-1.0, 0.5]]).into_dyn());
        let pop_a = Arc::new(
            SimulatedPopulation::new(frame, arr2(&[[1.0, 2.0], [2.0, 1.0]]).into_dyn(), means.clone())
                .unwrap()
                .with_label("A")
                .with_attribute_std(0.5).unwrap(),
        );
        let pop_b = Arc::new(
            SimulatedPopulation::new(frame, arr2(&[[1.0, 1.0], [1.0, 1.0]]).into_dyn(), means)
                .unwrap()
                .with_label("B")
                .with_log_scenario_std(0.5).unwrap(),
        );
        let mut rng = SmallRng::seed_from_u64(42);
        let mut groups = IndexMap::new();
        groups.insert("first".to_string(), pop_a.draw_group(3, &mut rng));
        groups.insert("second".to_string(), pop_b.draw_group(2, &mut rng));
        SimulatedExperiment::new(frame.clone(), groups).unwrap()
    }

    #[test]
    fn test_dataset_layout() {
        let frame = make_frame();
        let exp = make_experiment(&frame);
        let mut rng = SmallRng::seed_from_u64(1);
        let ds = exp.generate_dataset(3, 8, &mut rng).unwrap();
        let group_ids: Vec<&str> = ds.groups().keys().map(String::as_str).collect();
        assert_eq!(group_ids, vec!["first", "second"]);
        let subject_ids: Vec<&str> = ds.groups()["first"].keys().map(String::as_str).collect();
        assert_eq!(subject_ids, vec!["A_S0", "A_S1", "A_S2"]);
        assert_eq!(ds.n_subjects(), 5);
        for records in ds.groups().values().flat_map(|g| g.values()) {
            // two stages, 3..=7 records each
            assert!((6..=14).contains(&records.len()), "len={}", records.len());
        }
    }

    #[test]
    fn test_sequential_is_reproducible() {
        let frame = make_frame();
        let exp = make_experiment(&frame);
        let a = exp.generate_dataset(3, 8, &mut SmallRng::seed_from_u64(9)).unwrap();
        let b = exp.generate_dataset(3, 8, &mut SmallRng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parallel_is_reproducible() {
        let frame = make_frame();
        let exp = make_experiment(&frame);
        let a = exp.generate_dataset_par(3, 8, 123).unwrap();
        let b = exp.generate_dataset_par(3, 8, 123).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.n_subjects(), 5);
        let subject_ids: Vec<&str> = a.groups()["second"].keys().map(String::as_str).collect();
        assert_eq!(subject_ids, vec!["B_S0", "B_S1"]);
    }

    #[test]
    fn test_default_range() {
        let frame = make_frame();
        let exp = make_experiment(&frame);
        let ds = exp
            .generate_default_dataset(&mut SmallRng::seed_from_u64(4))
            .unwrap();
        for records in ds.groups().values().flat_map(|g| g.values()) {
            assert!(records.len() >= 2 * DEFAULT_MIN_COUNT);
            assert!(records.len() <= 2 * (DEFAULT_MAX_COUNT - 1));
        }
    }

    #[test]
    fn test_empty_range_rejected() {
        let frame = make_frame();
        let exp = make_experiment(&frame);
        let mut rng = SmallRng::seed_from_u64(0);
        assert!(matches!(
            exp.generate_dataset(10, 3, &mut rng),
            Err(Error::InvalidRecordRange { min: 10, max: 3 })
        ));
        assert!(exp.generate_dataset_par(4, 4, 0).is_err());
    }

    #[test]
    fn test_foreign_population_rejected() {
        let frame = make_frame();
        let exp = make_experiment(&frame);
        let mut scenarios = IndexMap::new();
        scenarios.insert("Stage".to_string(), labels(&["pre", "post"]));
        scenarios.insert("Place".to_string(), labels(&["home", "work"]));
        let other = EmaFrame::new(scenarios, IndexMap::new()).unwrap();
        let err = SimulatedExperiment::new(other, exp.groups().clone()).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { .. }));
    }
}
