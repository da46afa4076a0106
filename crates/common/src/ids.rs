//! Typed identifiers for jobs and task attempts writing through a tap.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(
    /// Raw numeric id value.
    pub u64,
);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task identifier within a job; also selects the part file number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(
    /// Raw numeric id value.
    pub u32,
);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One execution attempt of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskAttemptId {
    pub job: JobId,
    pub task: TaskId,
    pub attempt: u32,
}

impl TaskAttemptId {
    pub fn new(job: u64, task: u32, attempt: u32) -> Self {
        Self {
            job: JobId(job),
            task: TaskId(task),
            attempt,
        }
    }

    /// Part file stem for this task, e.g. `part-00003`.
    pub fn part_name(&self) -> String {
        format!("part-{:05}", self.task.0)
    }
}

impl fmt::Display for TaskAttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attempt_{}_{:05}_{}", self.job, self.task.0, self.attempt)
    }
}
