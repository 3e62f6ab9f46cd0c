//! A group of subjects drawn from one population.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::population::SimulatedPopulation;
use super::subject::SimulatedSubject;

/// Subjects drawn together from the same population. Read-only once drawn.
#[derive(Clone, Debug)]
pub struct SimulatedGroup {
    population: Arc<SimulatedPopulation>,
    subjects: IndexMap<String, SimulatedSubject>,
}

impl SimulatedGroup {
    pub fn new(
        population: Arc<SimulatedPopulation>,
        subjects: IndexMap<String, SimulatedSubject>,
    ) -> Self {
        Self {
            population,
            subjects,
        }
    }

    /// Population the subjects were drawn from.
    pub fn population(&self) -> &Arc<SimulatedPopulation> {
        &self.population
    }

    /// Subject id → subject, in draw order.
    pub fn subjects(&self) -> &IndexMap<String, SimulatedSubject> {
        &self.subjects
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

impl fmt::Display for SimulatedGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SimulatedGroup with {} simulated subjects from '{}'",
            self.subjects.len(),
            self.population.label()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::EmaFrame;
    use ndarray::arr1;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_display_and_len() {
        let mut scenarios = IndexMap::new();
        scenarios.insert("Stage".to_string(), vec!["s".to_string()]);
        scenarios.insert("Place".to_string(), vec!["a".to_string(), "b".to_string()]);
        let frame = EmaFrame::new(scenarios, IndexMap::new()).unwrap();
        let pop = Arc::new(
            SimulatedPopulation::new(&frame, arr1(&[1.0, 1.0]).into_dyn(), IndexMap::new())
                .unwrap()
                .with_label("g"),
        );
        let mut rng = SmallRng::seed_from_u64(1);
        let group = pop.draw_group(4, &mut rng);
        assert_eq!(group.len(), 4);
        assert!(!group.is_empty());
        assert_eq!(
            group.to_string(),
            "SimulatedGroup with 4 simulated subjects from 'g'"
        );
    }
}
