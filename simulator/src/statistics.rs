//! Count tables and summary statistics for EMA data sets.
//!
//! - [`count_scenarios`]: records per scenario cell, shape `scenario_shape`
//! - [`count_ratings`]: responses per grade and scenario,
//!   shape `(n_grades, *scenario_shape)` per attribute
//! - [`summarize`]: per-group overview, serializable to JSON

use std::path::Path;

use indexmap::IndexMap;
use ndarray::{ArrayD, Axis, IxDyn};
use serde::Serialize;

use crate::dataset::EmaDataSet;
use crate::error::Result;
use crate::frame::{EmaFrame, EmaRecord};
use crate::thresholds::unravel_index;

/// Number of records in each scenario cell. Records with unknown labels are skipped.
pub fn count_scenarios(records: &[EmaRecord], frame: &EmaFrame) -> ArrayD<u64> {
    let mut z = ArrayD::<u64>::zeros(IxDyn(&frame.scenario_shape()));
    for r in records {
        if let Some(sc) = frame.scenario_index(r) {
            z[IxDyn(&sc)] += 1;
        }
    }
    z
}

/// Grade counts per attribute, given the scenario of the same record.
///
/// `y[a][[l, k0, k1, ...]]` = responses at grade `l` for attribute `a` in
/// scenario `(k0, k1, ...)`. Missing grades are allowed and not counted.
pub fn count_ratings(records: &[EmaRecord], frame: &EmaFrame) -> IndexMap<String, ArrayD<u64>> {
    let scenario_shape = frame.scenario_shape();
    let mut y: Vec<ArrayD<u64>> = frame
        .rating_shape()
        .iter()
        .map(|&n| {
            let mut shape = Vec::with_capacity(scenario_shape.len() + 1);
            shape.push(n);
            shape.extend_from_slice(&scenario_shape);
            ArrayD::zeros(IxDyn(&shape))
        })
        .collect();

    for r in records {
        let Some(sc) = frame.scenario_index(r) else {
            continue;
        };
        for (y_a, level) in y.iter_mut().zip(frame.rating_index(r)) {
            if let Some(l) = level {
                let mut ix = Vec::with_capacity(sc.len() + 1);
                ix.push(l);
                ix.extend_from_slice(&sc);
                y_a[IxDyn(&ix)] += 1;
            }
        }
    }

    frame.attribute_keys().map(String::from).zip(y).collect()
}

// ── Summary ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct DatasetSummary {
    pub n_groups: usize,
    pub n_subjects: usize,
    pub n_records: usize,
    pub groups: Vec<GroupSummary>,
}

#[derive(Serialize)]
pub struct GroupSummary {
    pub id: String,
    pub n_subjects: usize,
    pub n_records: usize,
    pub records_per_subject: CountRange,
    /// Pooled scenario frequencies, one entry per scenario cell.
    pub scenarios: Vec<ScenarioEntry>,
    pub attributes: Vec<AttributeSummary>,
}

#[derive(Serialize)]
pub struct CountRange {
    pub min: usize,
    pub mean: f64,
    pub max: usize,
}

#[derive(Serialize)]
pub struct ScenarioEntry {
    /// Scenario dimension key → category label.
    pub scenario: IndexMap<String, String>,
    pub count: u64,
    pub probability: f64,
}

#[derive(Serialize)]
pub struct AttributeSummary {
    pub key: String,
    pub grades: Vec<GradeEntry>,
    /// Mean grade index (0-based) over all responses.
    pub mean_grade: f64,
}

#[derive(Serialize)]
pub struct GradeEntry {
    pub label: String,
    pub count: u64,
    pub probability: f64,
}

/// Summarize every group of a data set.
pub fn summarize(ds: &EmaDataSet) -> DatasetSummary {
    let frame = ds.frame();
    let groups = ds
        .groups()
        .iter()
        .map(|(id, subjects)| {
            let counts: Vec<usize> = subjects.values().map(Vec::len).collect();
            let pooled: Vec<EmaRecord> = subjects.values().flatten().cloned().collect();
            GroupSummary {
                id: id.clone(),
                n_subjects: subjects.len(),
                n_records: pooled.len(),
                records_per_subject: count_range(&counts),
                scenarios: scenario_entries(&count_scenarios(&pooled, frame), frame),
                attributes: attribute_summaries(&count_ratings(&pooled, frame), frame),
            }
        })
        .collect();

    DatasetSummary {
        n_groups: ds.n_groups(),
        n_subjects: ds.n_subjects(),
        n_records: ds.n_records(),
        groups,
    }
}

/// Write a summary as pretty JSON, creating parent directories.
pub fn save_summary(summary: &DatasetSummary, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn count_range(counts: &[usize]) -> CountRange {
    if counts.is_empty() {
        return CountRange {
            min: 0,
            mean: 0.0,
            max: 0,
        };
    }
    CountRange {
        min: *counts.iter().min().unwrap_or(&0),
        mean: counts.iter().sum::<usize>() as f64 / counts.len() as f64,
        max: *counts.iter().max().unwrap_or(&0),
    }
}

fn scenario_entries(z: &ArrayD<u64>, frame: &EmaFrame) -> Vec<ScenarioEntry> {
    let total: u64 = z.sum();
    let shape = z.shape().to_vec();
    z.iter()
        .enumerate()
        .map(|(linear, &count)| {
            let sc = unravel_index(linear, &shape);
            let scenario = frame
                .scenarios()
                .iter()
                .zip(sc)
                .map(|((key, cats), i)| (key.clone(), cats[i].clone()))
                .collect();
            ScenarioEntry {
                scenario,
                count,
                probability: ratio(count, total),
            }
        })
        .collect()
}

fn attribute_summaries(
    y: &IndexMap<String, ArrayD<u64>>,
    frame: &EmaFrame,
) -> Vec<AttributeSummary> {
    y.iter()
        .zip(frame.attribute_grades().values())
        .map(|((key, y_a), labels)| {
            let per_grade: Vec<u64> = y_a.axis_iter(Axis(0)).map(|g| g.sum()).collect();
            let total: u64 = per_grade.iter().sum();
            let weighted: u64 = per_grade
                .iter()
                .enumerate()
                .map(|(l, &c)| l as u64 * c)
                .sum();
            AttributeSummary {
                key: key.clone(),
                grades: labels
                    .iter()
                    .zip(per_grade.iter())
                    .map(|(label, &count)| GradeEntry {
                        label: label.clone(),
                        count,
                        probability: ratio(count, total),
                    })
                    .collect(),
                mean_grade: ratio(weighted, total),
            }
        })
        .collect()
}

#[inline]
fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}
