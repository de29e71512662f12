// tests/property/reconciler.rs

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use proptest::prelude::*;
use tokio_util::sync::CancellationToken;

use jobmatrix::config::MatrixFile;
use jobmatrix::dag::{JobRegistry, Reconciler};
use jobmatrix::run_matrix;
use jobmatrix::types::JobState;
use jobmatrix_test_utils::builders::{JobConfigBuilder, MatrixBuilder};
use jobmatrix_test_utils::fake_runner::FakeRunner;

/// Strategy for a valid matrix. Acyclic because job N may only depend on
/// jobs 0..N-1.
fn matrix_strategy(max_jobs: usize) -> impl Strategy<Value = MatrixFile> {
    (1..=max_jobs).prop_flat_map(|num_jobs| {
        let deps_strat = proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..num_jobs),
            num_jobs,
        );

        (deps_strat, 1..=4usize).prop_map(move |(raw_deps, concurrency)| {
            let mut builder = MatrixBuilder::new().concurrency(concurrency).interval_ms(1);
            for (i, potential_deps) in raw_deps.into_iter().enumerate() {
                let name = format!("job_{i}");
                let mut job = JobConfigBuilder::new(&name);

                let mut valid_deps = HashSet::new();
                for dep_idx in potential_deps {
                    if i > 0 {
                        valid_deps.insert(dep_idx % i);
                    }
                }
                let mut valid_deps: Vec<_> = valid_deps.into_iter().collect();
                valid_deps.sort();

                for dep_idx in valid_deps {
                    job = job.after(&format!("job_{dep_idx}"));
                }
                builder = builder.with_job(job.build());
            }
            builder.build()
        })
    })
}

/// Expected final state of every job, computed directly from the graph.
fn expected_states(cfg: &MatrixFile, failing: &HashSet<String>) -> HashMap<String, JobState> {
    let mut expected = HashMap::new();

    // Matrix order is a topological order by construction.
    for job in cfg.job.iter() {
        let dep_failed = job
            .depends_on
            .iter()
            .any(|dep| expected.get(dep) != Some(&JobState::Succeeded));

        let state = if dep_failed {
            JobState::DependencyFailed
        } else if failing.contains(&job.name) {
            JobState::Failed
        } else {
            JobState::Succeeded
        };
        expected.insert(job.name.clone(), state);
    }

    expected
}

fn failing_set(cfg: &MatrixFile, indices: &[usize]) -> HashSet<String> {
    indices
        .iter()
        .filter(|&&i| i < cfg.job.len())
        .map(|&i| cfg.job[i].name.clone())
        .collect()
}

proptest! {
    /// Drive the state machine by hand: reconcile, then "execute" every
    /// Ready job synchronously. Every pass must make progress until all
    /// jobs are terminal.
    #[test]
    fn manual_stepping_reaches_expected_terminal_states(
        cfg in matrix_strategy(10),
        failing_indices in proptest::collection::vec(0..10usize, 0..5),
    ) {
        let failing = failing_set(&cfg, &failing_indices);
        let registry = JobRegistry::from_config(&cfg).unwrap();
        let reconciler = Reconciler::new(&registry);

        let mut executed = Vec::new();
        let mut passes = 0;

        while !registry.all_terminal() {
            passes += 1;
            prop_assert!(passes <= cfg.job.len() + 1, "no progress after {} passes", passes);

            reconciler.reconcile();

            for job in registry.filter_by_state(JobState::Ready) {
                let mut guard = job.lock();
                guard.transition(JobState::Queued).unwrap();
                guard.transition(JobState::Started).unwrap();
                if failing.contains(job.name()) {
                    guard
                        .fail(
                            JobState::Failed,
                            jobmatrix::errors::JobError::Execution("boom".to_string()),
                        )
                        .unwrap();
                } else {
                    guard.transition(JobState::Succeeded).unwrap();
                }
                executed.push(job.name().to_string());
            }
        }

        let expected = expected_states(&cfg, &failing);
        for job in registry.iter() {
            prop_assert_eq!(job.state(), expected[job.name()], "job {}", job.name());
        }

        // Exactly the jobs whose dependencies all succeeded were executed.
        let ran: HashSet<_> = executed.iter().cloned().collect();
        prop_assert_eq!(ran.len(), executed.len(), "a job was executed twice");
        for (name, state) in &expected {
            let should_run = matches!(state, JobState::Succeeded | JobState::Failed);
            prop_assert_eq!(ran.contains(name), should_run, "job {}", name);
        }

        // Aggregate error is present iff some job failed.
        let any_failure = expected.values().any(|s| s.is_failure());
        prop_assert_eq!(registry.errors().is_empty(), !any_failure);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// The full concurrent run agrees with the graph-level expectation.
    #[test]
    fn concurrent_run_reaches_expected_terminal_states(
        cfg in matrix_strategy(8),
        failing_indices in proptest::collection::vec(0..8usize, 0..4),
    ) {
        let failing = failing_set(&cfg, &failing_indices);
        let failing_refs: Vec<&str> = failing.iter().map(|s| s.as_str()).collect();
        let runner = FakeRunner::new().failing(&failing_refs);
        let concurrency = cfg.run.concurrency;

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();

        let report = rt.block_on(async {
            tokio::time::timeout(
                Duration::from_secs(10),
                run_matrix(&cfg, runner.clone(), CancellationToken::new()),
            )
            .await
        });
        let report = report.expect("run timed out").unwrap();

        let expected = expected_states(&cfg, &failing);
        for state in JobState::ALL {
            let n = expected.values().filter(|s| **s == state).count();
            prop_assert_eq!(report.count(state), n, "state {}", state);
        }

        let calls = runner.calls();
        let unique: HashSet<_> = calls.iter().collect();
        prop_assert_eq!(unique.len(), calls.len(), "a job was executed twice");
        prop_assert!(runner.max_in_flight() <= concurrency);
    }
}
