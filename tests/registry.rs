// tests/registry.rs

use std::collections::BTreeMap;

use jobmatrix::dag::JobRegistry;
use jobmatrix::errors::{JobError, JobMatrixError};
use jobmatrix::types::JobState;
use jobmatrix_test_utils::builders::{JobConfigBuilder, MatrixBuilder, job, registry};

use JobState::*;

#[test]
fn find_by_name() {
    let reg = registry(&[("A", &[], NotStarted), ("B", &["A"], NotStarted)]);

    let b = reg.find_by_name("B").expect("B is registered");
    assert_eq!(b.name(), "B");
    assert_eq!(b.dependency_names(), ["A".to_string()]);
    assert!(reg.find_by_name("C").is_none());
}

#[test]
fn filter_by_state_keeps_matrix_order() {
    let reg = registry(&[
        ("Ready1", &[], Ready),
        ("Failed", &[], Failed),
        ("Ready2", &[], Ready),
    ]);

    let names: Vec<String> = reg
        .filter_by_state(Ready)
        .iter()
        .map(|j| j.name().to_string())
        .collect();

    assert_eq!(names, vec!["Ready1".to_string(), "Ready2".to_string()]);
    assert!(reg.filter_by_state(Started).is_empty());
}

#[test]
fn count_by_state_only_lists_present_states() {
    let reg = registry(&[
        ("Ready", &[], Ready),
        ("Queued", &[], Queued),
        ("NotStarted", &[], NotStarted),
    ]);

    let expected = BTreeMap::from([(NotStarted, 1), (Ready, 1), (Queued, 1)]);
    assert_eq!(reg.count_by_state(), expected);
}

#[test]
fn all_terminal() {
    let done = registry(&[
        ("A", &[], Succeeded),
        ("B", &[], Failed),
        ("C", &[], DependencyFailed),
        ("D", &[], BadDependency),
    ]);
    assert!(done.all_terminal());

    let running = registry(&[("A", &[], Succeeded), ("B", &[], Started)]);
    assert!(!running.all_terminal());
}

#[test]
fn duplicate_names_are_rejected() {
    let res = JobRegistry::from_jobs([job("A", &[], NotStarted), job("A", &[], NotStarted)]);

    match res {
        Err(JobMatrixError::DuplicateJob(name)) => assert_eq!(name, "A"),
        other => panic!("expected DuplicateJob, got {other:?}"),
    }
}

#[test]
fn from_config_keeps_order_inputs_and_seeded_state() {
    let cfg = MatrixBuilder::new()
        .with_job(JobConfigBuilder::new("build").input("target", "x86_64").build())
        .with_job(JobConfigBuilder::new("cached").state(Succeeded).build())
        .with_job(JobConfigBuilder::new("test").after("build").build())
        .build();

    let reg = JobRegistry::from_config(&cfg).unwrap();

    let names: Vec<&str> = reg.iter().map(|j| j.name()).collect();
    assert_eq!(names, vec!["build", "cached", "test"]);

    let build = reg.find_by_name("build").unwrap();
    assert_eq!(
        build.inputs().get("target"),
        Some(&toml::Value::String("x86_64".to_string()))
    );
    assert_eq!(reg.find_by_name("cached").unwrap().state(), Succeeded);
}

#[test]
fn errors_lists_captured_causes_in_matrix_order() {
    let reg = registry(&[
        ("Fine", &[], NotStarted),
        ("Broken", &["missing"], NotStarted),
    ]);
    reg.find_by_name("Broken")
        .unwrap()
        .lock()
        .fail(
            BadDependency,
            JobError::BadDependency {
                dependency: "missing".to_string(),
            },
        )
        .unwrap();

    let errors = reg.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].job, "Broken");
}
