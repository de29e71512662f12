use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

/// Lifecycle state of a job within a single run.
///
/// Legal transitions:
///
/// ```text
/// NotStarted -> Ready -> Queued -> Started -> Succeeded | Failed
/// NotStarted -> DependencyFailed | BadDependency
/// ```
///
/// The first set is split between the reconciler (`NotStarted -> *`), the
/// dispatcher (`Ready -> Queued`) and the worker that owns the job
/// (`Queued -> Started -> terminal`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum JobState {
    #[default]
    NotStarted = 0,
    Ready = 1,
    Queued = 2,
    Started = 3,
    Succeeded = 4,
    Failed = 5,
    DependencyFailed = 6,
    BadDependency = 7,
}

impl JobState {
    /// Every state, in declaration order.
    pub const ALL: [JobState; 8] = [
        JobState::NotStarted,
        JobState::Ready,
        JobState::Queued,
        JobState::Started,
        JobState::Succeeded,
        JobState::Failed,
        JobState::DependencyFailed,
        JobState::BadDependency,
    ];

    /// No further transition happens from a terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Succeeded
                | JobState::Failed
                | JobState::DependencyFailed
                | JobState::BadDependency
        )
    }

    /// Terminal states that count as a failure of the job.
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            JobState::Failed | JobState::DependencyFailed | JobState::BadDependency
        )
    }

    /// Whether `self -> next` is one of the transitions in the state machine.
    pub fn can_transition_to(self, next: JobState) -> bool {
        use JobState::*;

        matches!(
            (self, next),
            (NotStarted, Ready)
                | (NotStarted, DependencyFailed)
                | (NotStarted, BadDependency)
                | (Ready, Queued)
                | (Queued, Started)
                | (Started, Succeeded)
                | (Started, Failed)
        )
    }

    pub(crate) fn as_u8(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_u8(raw: u8) -> JobState {
        // Only values produced by `as_u8` are ever stored.
        Self::ALL
            .get(raw as usize)
            .copied()
            .unwrap_or(JobState::NotStarted)
    }

    fn as_str(self) -> &'static str {
        match self {
            JobState::NotStarted => "NotStarted",
            JobState::Ready => "Ready",
            JobState::Queued => "Queued",
            JobState::Started => "Started",
            JobState::Succeeded => "Succeeded",
            JobState::Failed => "Failed",
            JobState::DependencyFailed => "DependencyFailed",
            JobState::BadDependency => "BadDependency",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobState {
    type Err = String;

    /// Accepts the variant name in any case, e.g. `"Ready"` or `"dependencyfailed"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|state| state.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("{wanted} does not belong to JobState values"))
    }
}

impl<'de> Deserialize<'de> for JobState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
