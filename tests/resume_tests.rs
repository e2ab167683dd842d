mod common;

use common::{RecordingExecutor, data_rows, key, small_config};
use hybrid_sweep::{ConfigError, SweepDriver, SweepError, TrialSpec, run_trial};
use std::collections::HashSet;

#[test]
fn test_fresh_sweep_writes_every_trial() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("results.csv");
    let config = small_config(output.clone(), vec![50, 200], vec![1, 4, 16], 3);

    let report = SweepDriver::new(config).run().unwrap();
    assert_eq!(report.total, 18);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.succeeded, 18);
    assert!(report.is_success());

    let contents = std::fs::read_to_string(&output).unwrap();
    assert_eq!(
        contents.lines().next(),
        Some("n,s,t,n_compares,time_taken_s")
    );

    let rows = data_rows(&output);
    assert_eq!(rows.len(), 18);
    let keys: HashSet<(String, String, String)> = rows
        .iter()
        .map(|r| (r[0].clone(), r[1].clone(), r[2].clone()))
        .collect();
    assert_eq!(keys.len(), 18);
}

#[test]
fn test_second_run_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("results.csv");
    let config = small_config(output.clone(), vec![30, 100], vec![1, 2, 8], 2);

    let first = SweepDriver::new(config.clone()).run().unwrap();
    assert_eq!(first.executed(), 12);
    let before = std::fs::read_to_string(&output).unwrap();

    let executor = RecordingExecutor::default();
    let second = SweepDriver::new(config).run_with(&executor).unwrap();
    assert_eq!(second.total, 12);
    assert_eq!(second.skipped, 12);
    assert_eq!(second.executed(), 0);
    assert!(executor.executed().is_empty());

    let after = std::fs::read_to_string(&output).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_resume_skips_exactly_the_stored_triples() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("results.csv");
    std::fs::write(
        &output,
        "n,s,t,n_compares,time_taken_s\n\
         1000,5,0,9000,0.01\n\
         1000,5,1,9001,0.01\n\
         1000,5,2,9002,0.01\n",
    )
    .unwrap();

    let config = small_config(output.clone(), vec![1000, 64], vec![1, 5], 5);
    let executor = RecordingExecutor::default();
    let report = SweepDriver::new(config).run_with(&executor).unwrap();

    assert_eq!(report.total, 20);
    assert_eq!(report.skipped, 3);
    assert_eq!(report.executed(), 17);

    let executed = executor.executed();
    assert_eq!(executed.len(), 17);
    for t in 0..3 {
        assert!(!executed.contains(&key(1000, 5, t)));
    }
    for t in 3..5 {
        assert!(executed.contains(&key(1000, 5, t)));
    }

    // Prior rows untouched, new rows appended after them
    let rows = data_rows(&output);
    assert_eq!(rows.len(), 20);
    assert_eq!(rows[0], vec!["1000", "5", "0", "9000", "0.01"]);
    assert_eq!(rows[2], vec!["1000", "5", "2", "9002", "0.01"]);
}

#[test]
fn test_failed_trials_are_reported_and_retried() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("results.csv");
    let config = small_config(output.clone(), vec![40], vec![1, 2], 3);

    let broken = [key(40, 2, 1)];
    let executor = RecordingExecutor::failing(broken);
    let report = SweepDriver::new(config.clone()).run_with(&executor).unwrap();

    assert_eq!(report.executed(), 6);
    assert_eq!(report.succeeded, 5);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.failures[0].params, key(40, 2, 1));
    assert!(!report.is_success());
    assert_eq!(data_rows(&output).len(), 5);

    // Next run only picks up the failed triple
    let executor = RecordingExecutor::default();
    let report = SweepDriver::new(config).run_with(&executor).unwrap();
    assert_eq!(report.skipped, 5);
    assert_eq!(executor.executed(), vec![key(40, 2, 1)]);
    assert!(report.is_success());
    assert_eq!(data_rows(&output).len(), 6);
}

#[test]
fn test_legacy_store_is_resumed_in_its_own_layout() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("legacy.csv");
    std::fs::write(
        &output,
        "n,s,n_compares,time_taken_s\n16,1,40,0.001\n16,1,41,0.001\n",
    )
    .unwrap();

    let config = small_config(output.clone(), vec![16], vec![1], 3);
    let executor = RecordingExecutor::default();
    let report = SweepDriver::new(config).run_with(&executor).unwrap();

    assert_eq!(report.skipped, 2);
    assert_eq!(executor.executed(), vec![key(16, 1, 2)]);

    let rows = data_rows(&output);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2].len(), 4);
    assert_eq!(rows[2][0], "16");
    assert_eq!(rows[2][1], "1");
}

#[test]
fn test_failed_replicate_in_legacy_store_is_retried_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("legacy.csv");
    std::fs::write(&output, "n,s,n_compares,time_taken_s\n").unwrap();
    let config = small_config(output.clone(), vec![16], vec![1], 3);

    let executor = RecordingExecutor::failing([key(16, 1, 0)]);
    let report = SweepDriver::new(config.clone()).run_with(&executor).unwrap();
    assert_eq!(report.failed(), 1);
    assert_eq!(report.held_back.len(), 2);
    assert!(!report.is_success());
    // Later replicates cannot be labelled without the first one
    assert!(data_rows(&output).is_empty());

    let executor = RecordingExecutor::default();
    let report = SweepDriver::new(config).run_with(&executor).unwrap();
    assert!(report.is_success());
    assert_eq!(
        executor.executed(),
        vec![key(16, 1, 0), key(16, 1, 1), key(16, 1, 2)]
    );

    let stored: Vec<String> = data_rows(&output).into_iter().map(|r| r[2].clone()).collect();
    let expected: Vec<String> = (0..3)
        .map(|t| {
            run_trial(key(16, 1, t), &TrialSpec::default())
                .unwrap()
                .n_compares
                .to_string()
        })
        .collect();
    assert_eq!(stored, expected);

    let executor = RecordingExecutor::default();
    let report = SweepDriver::new(small_config(output, vec![16], vec![1], 3))
        .run_with(&executor)
        .unwrap();
    assert_eq!(report.skipped, 3);
    assert!(executor.executed().is_empty());
}

#[test]
fn test_store_without_final_newline_resumes() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("results.csv");
    std::fs::write(&output, "n,s,t,n_compares,time_taken_s\n16,1,0,40,0.001").unwrap();
    let config = small_config(output.clone(), vec![16], vec![1], 2);

    let first = SweepDriver::new(config.clone()).run().unwrap();
    assert_eq!(first.skipped, 1);
    assert_eq!(first.executed(), 1);

    let second = SweepDriver::new(config).run().unwrap();
    assert_eq!(second.skipped, 2);
    assert_eq!(second.executed(), 0);

    let rows = data_rows(&output);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], vec!["16", "1", "0", "40", "0.001"]);
    assert_eq!(rows[1][2], "1");
}

#[test]
fn test_malformed_store_aborts_before_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("results.csv");
    std::fs::write(&output, "n,s,t,n_compares,time_taken_s\n100,x,0,1,0.1\n").unwrap();

    let config = small_config(output.clone(), vec![100], vec![1], 1);
    let executor = RecordingExecutor::default();
    let err = SweepDriver::new(config).run_with(&executor).unwrap_err();

    assert!(matches!(
        err,
        SweepError::Config(ConfigError::MalformedStore { line: 2, .. })
    ));
    assert!(executor.executed().is_empty());
}

#[test]
fn test_invalid_threshold_aborts_before_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("results.csv");
    let config = small_config(output.clone(), vec![100], vec![0, 4], 1);

    let executor = RecordingExecutor::default();
    let err = SweepDriver::new(config).run_with(&executor).unwrap_err();
    assert!(matches!(
        err,
        SweepError::Config(ConfigError::InvalidThreshold(0))
    ));
    assert!(executor.executed().is_empty());
    assert!(!output.exists());
}

#[test]
fn test_unreadable_store_is_a_store_error() {
    let dir = tempfile::tempdir().unwrap();
    // A directory where the results file should be
    let output = dir.path().join("results.csv");
    std::fs::create_dir(&output).unwrap();

    let config = small_config(output, vec![10], vec![1], 1);
    let err = SweepDriver::new(config)
        .run_with(&RecordingExecutor::default())
        .unwrap_err();
    assert!(matches!(err, SweepError::Store(_)));
}

#[test]
fn test_seeded_runs_reproduce_comparison_counts() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.csv");
    let b = dir.path().join("b.csv");

    let mut config = small_config(a.clone(), vec![500], vec![1, 8, 32], 2);
    SweepDriver::new(config.clone()).run().unwrap();
    config.output = b.clone();
    config.workers = 1;
    SweepDriver::new(config).run().unwrap();

    let counts = |path: &std::path::Path| {
        let mut rows: Vec<(String, String, String, String)> = data_rows(path)
            .into_iter()
            .map(|r| (r[0].clone(), r[1].clone(), r[2].clone(), r[3].clone()))
            .collect();
        rows.sort();
        rows
    };
    assert_eq!(counts(&a), counts(&b));
}
