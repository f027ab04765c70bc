//! Integration test: table in, accuracy out

use floranet::prelude::*;
use polars::prelude::*;

/// Perfectly separable 4-feature, 2-class, 20-row table: class "dwarf"
/// clusters around -2, class "giant" around +2 on every feature.
fn separable_df() -> DataFrame {
    let mut f1 = Vec::new();
    let mut f2 = Vec::new();
    let mut f3 = Vec::new();
    let mut f4 = Vec::new();
    let mut species = Vec::new();

    for i in 0..10 {
        let jitter = i as f64 * 0.03;
        f1.push(-2.0 + jitter);
        f2.push(-2.2 - jitter);
        f3.push(-1.8 + jitter);
        f4.push(-2.1 - jitter);
        species.push("dwarf");

        f1.push(2.0 - jitter);
        f2.push(2.2 + jitter);
        f3.push(1.8 - jitter);
        f4.push(2.1 + jitter);
        species.push("giant");
    }

    df!(
        "f1" => &f1,
        "f2" => &f2,
        "f3" => &f3,
        "f4" => &f4,
        "species" => &species
    )
    .unwrap()
}

fn feature_names() -> Vec<String> {
    ["f1", "f2", "f3", "f4"].iter().map(|s| s.to_string()).collect()
}

fn net_config() -> MlpConfig {
    MlpConfig {
        hidden_layers: vec![8],
        learning_rate: 0.1,
        max_steps: 20_000,
        threshold: 1e-4,
        random_state: Some(7),
        ..Default::default()
    }
}

#[test]
fn test_holdout_on_separable_table_is_perfect() {
    let table = Preprocessor::new(feature_names(), "species")
        .encode(&separable_df())
        .unwrap();
    let trainer = MlpTrainer::new(net_config());

    let report = evaluate_holdout(&trainer, &table, 0.75, 42).unwrap();

    assert_eq!(report.n_train, 15);
    assert_eq!(report.n_test, 5);
    assert_eq!(report.accuracy, 1.0, "separable data must evaluate clean");
    assert_eq!(report.summary(), "held-out accuracy: 100.00% (15 train / 5 test rows)");
}

#[test]
fn test_cross_validation_on_separable_table() {
    let table = Preprocessor::new(feature_names(), "species")
        .encode(&separable_df())
        .unwrap();
    let trainer = MlpTrainer::new(net_config());

    let report = CrossValidationRunner::new(&trainer)
        .with_strategy(CvStrategy::StratifiedKFold {
            n_splits: 4,
            shuffle: true,
        })
        .with_random_state(42)
        .run(&table)
        .unwrap();

    assert_eq!(report.requested, 4);
    assert_eq!(report.completed, 4);
    assert_eq!(report.mean_accuracy, Some(1.0));
}

#[test]
fn test_starved_trainer_is_skipped_not_zeroed() {
    let table = Preprocessor::new(feature_names(), "species")
        .encode(&separable_df())
        .unwrap();
    // a one-step budget with a tiny threshold cannot converge
    let starved = MlpTrainer::new(MlpConfig {
        max_steps: 1,
        threshold: 1e-15,
        ..net_config()
    });

    let report = CrossValidationRunner::new(&starved)
        .with_strategy(CvStrategy::KFold {
            n_splits: 2,
            shuffle: true,
        })
        .with_random_state(42)
        .run(&table)
        .unwrap();

    assert_eq!(report.requested, 2);
    assert_eq!(report.completed, 0);
    assert_eq!(report.mean_accuracy, None);

    let err = CrossValidationRunner::new(&starved)
        .with_strategy(CvStrategy::KFold {
            n_splits: 2,
            shuffle: true,
        })
        .with_random_state(42)
        .with_policy(ConvergencePolicy::Abort)
        .run(&table)
        .unwrap_err();
    assert!(err.is_convergence());
}

#[test]
fn test_reports_serialize_for_machine_readers() {
    let table = Preprocessor::new(feature_names(), "species")
        .encode(&separable_df())
        .unwrap();
    let trainer = MlpTrainer::new(net_config());

    let report = evaluate_holdout(&trainer, &table, 0.75, 42).unwrap();
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"accuracy\":1.0"));
}
