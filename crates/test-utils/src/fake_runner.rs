use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::bail;
use jobmatrix::dag::Inputs;
use jobmatrix::exec::{WorkflowRun, WorkflowRunner};

/// A fake runner that:
/// - records which workflows were run, in start order
/// - fails (or panics) for configured workflows and succeeds otherwise
/// - optionally sleeps to simulate work
/// - tracks the highest number of calls in flight at once
#[derive(Debug, Clone, Default)]
pub struct FakeRunner {
    state: Arc<FakeState>,
    failing: Arc<HashSet<String>>,
    panicking: Arc<HashSet<String>>,
    delay: Duration,
}

#[derive(Debug, Default)]
struct FakeState {
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, workflows: &[&str]) -> Self {
        self.failing = Arc::new(workflows.iter().map(|w| w.to_string()).collect());
        self
    }

    pub fn panicking(mut self, workflows: &[&str]) -> Self {
        self.panicking = Arc::new(workflows.iter().map(|w| w.to_string()).collect());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Workflows started so far, in start order.
    pub fn calls(&self) -> Vec<String> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }
}

impl WorkflowRunner for FakeRunner {
    fn run<'a>(&'a self, workflow: &'a str, _inputs: &'a Inputs) -> WorkflowRun<'a> {
        Box::pin(async move {
            self.state.calls.lock().unwrap().push(workflow.to_string());

            let now = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.state.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            self.state.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.panicking.contains(workflow) {
                panic!("fake runner panicked for {workflow}");
            }
            if self.failing.contains(workflow) {
                bail!("workflow {workflow} failed");
            }
            Ok(())
        })
    }
}
