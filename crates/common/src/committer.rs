use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use crate::config::IoConfig;
use crate::error::{Result, TapError};
use crate::ids::TaskAttemptId;
use crate::metrics::global_metrics;

/// Marker written into the output directory once a job commits.
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// Files whose name starts with `_` or `.` are bookkeeping, not data.
pub fn is_hidden_file_name(name: &str) -> bool {
    name.starts_with('_') || name.starts_with('.')
}

/// Coordinates visibility of task output with the host commit protocol.
///
/// Tasks write into a private work directory returned by [`OutputCommitter::setup_task`];
/// nothing becomes visible under the output path until the task commits.
pub trait OutputCommitter: Send + Sync {
    fn name(&self) -> &'static str;

    fn setup_job(&self, output: &Path) -> Result<()>;

    /// Prepares and returns the attempt's work directory.
    fn setup_task(&self, output: &Path, attempt: &TaskAttemptId) -> Result<PathBuf>;

    fn commit_task(&self, output: &Path, attempt: &TaskAttemptId) -> Result<()>;

    fn abort_task(&self, output: &Path, attempt: &TaskAttemptId) -> Result<()>;

    fn commit_job(&self, output: &Path) -> Result<()>;

    fn abort_job(&self, output: &Path) -> Result<()>;
}

/// Directory-staging committer: `<out>/_temporary/<attempt>/` is promoted into `<out>` on
/// task commit.
#[derive(Debug, Clone, Default)]
pub struct FileOutputCommitter {
    config: IoConfig,
}

impl FileOutputCommitter {
    pub fn new(config: IoConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IoConfig {
        &self.config
    }

    pub fn temporary_root(&self, output: &Path) -> PathBuf {
        output.join(&self.config.temporary_dir_name)
    }

    pub fn task_work_dir(&self, output: &Path, attempt: &TaskAttemptId) -> PathBuf {
        self.temporary_root(output).join(attempt.to_string())
    }
}

impl OutputCommitter for FileOutputCommitter {
    fn name(&self) -> &'static str {
        "FileOutputCommitter"
    }

    fn setup_job(&self, output: &Path) -> Result<()> {
        fs::create_dir_all(self.temporary_root(output))?;
        Ok(())
    }

    fn setup_task(&self, output: &Path, attempt: &TaskAttemptId) -> Result<PathBuf> {
        let work = self.task_work_dir(output, attempt);
        if work.exists() {
            debug!(attempt = %attempt, "removing leftover attempt directory");
            fs::remove_dir_all(&work)?;
        }
        fs::create_dir_all(&work)?;
        Ok(work)
    }

    fn commit_task(&self, output: &Path, attempt: &TaskAttemptId) -> Result<()> {
        let work = self.task_work_dir(output, attempt);
        if !work.exists() {
            return Ok(());
        }
        let mut promoted = 0usize;
        for entry in fs::read_dir(&work)? {
            let entry = entry?;
            let target = output.join(entry.file_name());
            replace_file_atomically(&entry.path(), &target)?;
            promoted += 1;
        }
        fs::remove_dir_all(&work)?;
        global_metrics().inc_task_commits(self.name());
        info!(
            attempt = %attempt,
            output = %output.display(),
            files = promoted,
            "task output committed"
        );
        Ok(())
    }

    fn abort_task(&self, output: &Path, attempt: &TaskAttemptId) -> Result<()> {
        let work = self.task_work_dir(output, attempt);
        if work.exists() {
            fs::remove_dir_all(&work)?;
        }
        global_metrics().inc_task_aborts(self.name());
        warn!(attempt = %attempt, output = %output.display(), "task output aborted");
        Ok(())
    }

    fn commit_job(&self, output: &Path) -> Result<()> {
        let tmp = self.temporary_root(output);
        if tmp.exists() {
            fs::remove_dir_all(&tmp)?;
        }
        if self.config.write_success_marker {
            fs::create_dir_all(output)?;
            fs::write(output.join(SUCCESS_MARKER), b"")?;
        }
        info!(output = %output.display(), "job output committed");
        Ok(())
    }

    fn abort_job(&self, output: &Path) -> Result<()> {
        let tmp = self.temporary_root(output);
        if tmp.exists() {
            fs::remove_dir_all(&tmp)?;
        }
        warn!(output = %output.display(), "job output aborted");
        Ok(())
    }
}

fn temp_sibling_path(path: &Path, label: &str) -> PathBuf {
    let parent = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let stem = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("target");
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos());
    parent.join(format!(".taps_{label}_{stem}_{nanos}.tmp"))
}

fn replace_file_atomically(staged: &Path, target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    if !target.exists() {
        fs::rename(staged, target)?;
        return Ok(());
    }

    let backup = temp_sibling_path(target, "backup");
    fs::rename(target, &backup)?;
    match fs::rename(staged, target) {
        Ok(()) => {
            let _ = fs::remove_file(backup);
            Ok(())
        }
        Err(e) => {
            let _ = fs::rename(&backup, target);
            Err(TapError::Io(e))
        }
    }
}
