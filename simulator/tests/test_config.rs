//! Configuration-driven runs, as done by the `ema-simulate` binary.

use std::path::PathBuf;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use emasim::config::ExperimentConfig;
use emasim::statistics::{save_summary, summarize};
use emasim::EmaDataSet;

fn demo_config_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("configs")
        .join("two_groups.json")
}

fn demo_dataset(seed: u64) -> EmaDataSet {
    let cfg = ExperimentConfig::load(demo_config_path()).unwrap();
    let mut rng = SmallRng::seed_from_u64(seed);
    let exp = cfg.build_experiment(&mut rng).unwrap();
    exp.generate_dataset(cfg.min_count, cfg.max_count, &mut rng)
        .unwrap()
}

#[test]
fn demo_config_builds_both_groups() {
    let cfg = ExperimentConfig::load(demo_config_path()).unwrap();
    let exp = cfg
        .build_experiment(&mut SmallRng::seed_from_u64(cfg.seed))
        .unwrap();
    assert_eq!(exp.frame().scenario_shape(), vec![2, 3, 2]);
    assert_eq!(exp.frame().rating_shape(), vec![5, 3]);
    let ids: Vec<&str> = exp.groups().keys().map(String::as_str).collect();
    assert_eq!(ids, vec!["Control", "Treated"]);
    assert_eq!(exp.n_subjects(), 40);
}

#[test]
fn demo_dataset_respects_record_bounds() {
    let ds = demo_dataset(2021);
    for records in ds.groups().values().flat_map(|g| g.values()) {
        // two stages, 3..=49 records each
        assert!(records.len() >= 6 && records.len() <= 98);
        for r in records {
            assert_eq!(r.len(), 5);
        }
    }
}

#[test]
fn same_seed_same_dataset() {
    assert_eq!(demo_dataset(7), demo_dataset(7));
    assert_ne!(demo_dataset(7), demo_dataset(8));
}

#[test]
fn treated_group_rates_comfort_higher_at_followup() {
    let ds = demo_dataset(5);
    let mean_comfort = |group: &str, phase: &str| {
        let grades = &ds.frame().attribute_grades()["Comfort"];
        let xs: Vec<f64> = ds.groups()[group]
            .values()
            .flatten()
            .filter(|r| r["Phase"] == phase)
            .filter_map(|r| grades.iter().position(|g| *g == r["Comfort"]))
            .map(|g| g as f64)
            .collect();
        xs.iter().sum::<f64>() / xs.len() as f64
    };
    let control = mean_comfort("Control", "followup");
    let treated = mean_comfort("Treated", "followup");
    assert!(treated > control, "control={control:.2} treated={treated:.2}");
}

#[test]
fn dataset_and_summary_written_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let ds = demo_dataset(11);
    let data_path = dir.path().join("dataset.json");
    ds.save_json(&data_path).unwrap();
    assert_eq!(EmaDataSet::load_json(&data_path).unwrap(), ds);

    let summary = summarize(&ds);
    let summary_path = dir.path().join("summary.json");
    save_summary(&summary, &summary_path).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&summary_path).unwrap()).unwrap();
    assert_eq!(json["n_groups"], 2);
    assert_eq!(json["groups"][0]["id"], "Control");
    assert_eq!(json["n_records"].as_u64(), Some(ds.n_records() as u64));
}

#[test]
fn parallel_generation_matches_layout() {
    let cfg = ExperimentConfig::load(demo_config_path()).unwrap();
    let exp = cfg
        .build_experiment(&mut SmallRng::seed_from_u64(cfg.seed))
        .unwrap();
    let a = exp.generate_dataset_par(cfg.min_count, cfg.max_count, 3).unwrap();
    let b = exp.generate_dataset_par(cfg.min_count, cfg.max_count, 3).unwrap();
    assert_eq!(a, b);
    let ids: Vec<&str> = a.groups()["Treated"].keys().map(String::as_str).collect();
    assert_eq!(ids.first(), Some(&"treated_S0"));
    assert_eq!(ids.len(), 20);
}
