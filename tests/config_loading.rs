// tests/config_loading.rs

use std::io::Write;

use tempfile::NamedTempFile;

use jobmatrix::config::{load_and_validate, parse_str, MatrixFile};
use jobmatrix::errors::JobMatrixError;
use jobmatrix::types::JobState;
use jobmatrix_test_utils::builders::{JobConfigBuilder, MatrixBuilder};

fn write_matrix(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn loads_full_matrix_with_defaults() {
    let file = write_matrix(
        r#"
[[job]]
name = "build"
workflow = "make build"

[[job]]
name = "test"
workflow = "make test"
depends_on = ["build"]
[job.inputs]
target = "x86_64"
shards = 4
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.run.concurrency, 1);
    assert_eq!(cfg.run.reconcile_interval_ms, 1000);
    assert_eq!(cfg.job.len(), 2);
    assert_eq!(cfg.job[0].name, "build");
    assert_eq!(cfg.job[1].depends_on, vec!["build".to_string()]);
    assert_eq!(cfg.job[1].inputs.get("shards"), Some(&toml::Value::Integer(4)));
    assert_eq!(cfg.job[1].state, JobState::NotStarted);
    assert_eq!(JobState::default(), JobState::NotStarted);
}

#[test]
fn run_section_and_seeded_state() {
    let raw = parse_str(
        r#"
[run]
concurrency = 3
reconcile_interval_ms = 250

[[job]]
name = "done"
workflow = "true"
state = "succeeded"
"#,
    )
    .unwrap();

    let cfg = MatrixFile::try_from(raw).unwrap();
    assert_eq!(cfg.run.concurrency, 3);
    assert_eq!(cfg.run.reconcile_interval_ms, 250);
    assert_eq!(cfg.job[0].state, JobState::Succeeded);
}

#[test]
fn unknown_state_name_is_a_toml_error() {
    let res = parse_str(
        r#"
[[job]]
name = "a"
workflow = "true"
state = "Sleeping"
"#,
    );

    match res {
        Err(JobMatrixError::TomlError(e)) => {
            assert!(e.to_string().contains("does not belong to JobState values"));
        }
        other => panic!("Expected TomlError, got: {:?}", other),
    }
}

#[test]
fn cycle_returns_structured_error() {
    let file = write_matrix(
        r#"
[[job]]
name = "A"
workflow = "echo A"
depends_on = ["B"]

[[job]]
name = "B"
workflow = "echo B"
depends_on = ["A"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(JobMatrixError::DagCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains("A") || msg.contains("B"));
        }
        Err(e) => panic!("Expected DagCycle error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn unknown_dependency_is_allowed() {
    let cfg = MatrixBuilder::new()
        .with_job(JobConfigBuilder::new("X").after("missing").build())
        .build();

    assert_eq!(cfg.job[0].depends_on, vec!["missing".to_string()]);
}

#[test]
fn structural_errors() {
    let cases = [
        (MatrixBuilder::new().raw(), "at least one [[job]]"),
        (
            MatrixBuilder::new()
                .concurrency(0)
                .with_job(JobConfigBuilder::new("A").build())
                .raw(),
            "concurrency must be >= 1",
        ),
        (
            MatrixBuilder::new()
                .interval_ms(0)
                .with_job(JobConfigBuilder::new("A").build())
                .raw(),
            "reconcile_interval_ms must be >= 1",
        ),
        (
            MatrixBuilder::new()
                .with_job(JobConfigBuilder::new(" ").build())
                .raw(),
            "empty name",
        ),
        (
            MatrixBuilder::new()
                .with_job(JobConfigBuilder::new("A").after("A").build())
                .raw(),
            "cannot depend on itself",
        ),
        (
            MatrixBuilder::new()
                .with_job(JobConfigBuilder::new("A").state(JobState::Queued).build())
                .raw(),
            "cannot start the run in state Queued",
        ),
    ];

    for (raw, expected) in cases {
        match MatrixFile::try_from(raw) {
            Err(JobMatrixError::ConfigError(msg)) => {
                assert!(msg.contains(expected), "{msg:?} should contain {expected:?}")
            }
            other => panic!("Expected ConfigError containing {expected:?}, got {other:?}"),
        }
    }
}

#[test]
fn duplicate_names_are_rejected() {
    let raw = MatrixBuilder::new()
        .with_job(JobConfigBuilder::new("A").build())
        .with_job(JobConfigBuilder::new("A").build())
        .raw();

    assert!(matches!(
        MatrixFile::try_from(raw),
        Err(JobMatrixError::DuplicateJob(name)) if name == "A"
    ));
}

#[test]
fn missing_file_is_io_error() {
    let res = load_and_validate("/definitely/not/here/Jobmatrix.toml");
    assert!(matches!(res, Err(JobMatrixError::IoError(_))));
}

#[test]
fn bundled_sample_matrix_is_valid() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("Jobmatrix.toml");
    let cfg = load_and_validate(&path).unwrap();

    assert_eq!(cfg.run.concurrency, 2);
    let names: Vec<&str> = cfg.job.iter().map(|j| j.name.as_str()).collect();
    assert_eq!(names, vec!["fetch", "lint", "build", "test", "publish"]);
    assert_eq!(cfg.job[3].depends_on, vec!["build", "lint"]);
}
