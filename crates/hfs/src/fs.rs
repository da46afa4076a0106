use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use taps_common::{Result, TapError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
    pub path: PathBuf,
    pub len: u64,
    pub is_dir: bool,
}

impl FileStatus {
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

/// Aggregate over a file or directory tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentSummary {
    /// Total bytes of all files below the path.
    pub length: u64,
    pub file_count: u64,
    pub directory_count: u64,
}

/// File-system operations taps need.
pub trait FileSystem: Send + Sync {
    fn name(&self) -> &'static str;

    /// Statuses of all paths matching a wildcard expression, sorted by path.
    /// An expression without wildcards matches itself when it exists.
    fn glob_status(&self, pattern: &str) -> Result<Vec<FileStatus>>;

    fn file_status(&self, path: &Path) -> Result<FileStatus>;

    /// Direct children of a directory, sorted by path.
    fn list_status(&self, path: &Path) -> Result<Vec<FileStatus>>;

    fn content_summary(&self, path: &Path) -> Result<ContentSummary>;

    fn exists(&self, path: &Path) -> bool;

    fn delete(&self, path: &Path, recursive: bool) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

fn io_error(path: &Path, e: io::Error) -> TapError {
    if e.kind() == io::ErrorKind::NotFound {
        TapError::NotFound(path.display().to_string())
    } else {
        TapError::Io(e)
    }
}

/// Walks a directory without following symlinked directories below it; linked files
/// count at their target's length and dangling links are skipped.
fn summarize_dir(path: &Path) -> Result<ContentSummary> {
    let mut summary = ContentSummary {
        directory_count: 1,
        ..ContentSummary::default()
    };
    for entry in fs::read_dir(path).map_err(|e| io_error(path, e))? {
        let child = entry?.path();
        let meta = fs::symlink_metadata(&child).map_err(|e| io_error(&child, e))?;
        if meta.is_dir() {
            let c = summarize_dir(&child)?;
            summary.length += c.length;
            summary.file_count += c.file_count;
            summary.directory_count += c.directory_count;
            continue;
        }
        let len = if meta.file_type().is_symlink() {
            match fs::metadata(&child) {
                Ok(target) if target.is_file() => target.len(),
                _ => continue,
            }
        } else {
            meta.len()
        };
        summary.length += len;
        summary.file_count += 1;
    }
    Ok(summary)
}

impl FileSystem for LocalFileSystem {
    fn name(&self) -> &'static str {
        "local"
    }

    fn glob_status(&self, pattern: &str) -> Result<Vec<FileStatus>> {
        let paths = glob::glob(pattern).map_err(|e| {
            TapError::InvalidConfig(format!("invalid path pattern '{pattern}': {e}"))
        })?;
        let mut out = Vec::new();
        for entry in paths {
            let path = entry.map_err(|e| TapError::Io(e.into_error()))?;
            out.push(self.file_status(&path)?);
        }
        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }

    fn file_status(&self, path: &Path) -> Result<FileStatus> {
        let meta = fs::metadata(path).map_err(|e| io_error(path, e))?;
        Ok(FileStatus {
            path: path.to_path_buf(),
            len: if meta.is_dir() { 0 } else { meta.len() },
            is_dir: meta.is_dir(),
        })
    }

    fn list_status(&self, path: &Path) -> Result<Vec<FileStatus>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(path).map_err(|e| io_error(path, e))? {
            out.push(self.file_status(&entry?.path())?);
        }
        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }

    fn content_summary(&self, path: &Path) -> Result<ContentSummary> {
        let status = self.file_status(path)?;
        if !status.is_dir {
            return Ok(ContentSummary {
                length: status.len,
                file_count: 1,
                directory_count: 0,
            });
        }
        summarize_dir(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn delete(&self, path: &Path, recursive: bool) -> Result<()> {
        let status = self.file_status(path)?;
        if !status.is_dir {
            fs::remove_file(path)?;
        } else if recursive {
            fs::remove_dir_all(path)?;
        } else {
            fs::remove_dir(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use taps_common::TapError;

    use super::{FileSystem, LocalFileSystem};

    fn temp_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("taps_fs_test_{nanos}"));
        std::fs::create_dir_all(&dir).expect("mkdir");
        dir
    }

    #[test]
    fn content_summary_recurses_into_directories() {
        let dir = temp_dir();
        std::fs::write(dir.join("a"), [0u8; 5]).expect("a");
        std::fs::create_dir_all(dir.join("sub")).expect("sub");
        std::fs::write(dir.join("sub").join("b"), [0u8; 7]).expect("b");

        let summary = LocalFileSystem.content_summary(&dir).expect("summary");
        assert_eq!(summary.length, 12);
        assert_eq!(summary.file_count, 2);
        assert_eq!(summary.directory_count, 2);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[cfg(unix)]
    #[test]
    fn content_summary_does_not_follow_directory_links() {
        let dir = temp_dir();
        std::fs::create_dir_all(dir.join("sub")).expect("sub");
        std::fs::write(dir.join("sub").join("b"), [0u8; 7]).expect("b");
        std::os::unix::fs::symlink(&dir, dir.join("sub").join("loop")).expect("loop");
        std::os::unix::fs::symlink(dir.join("sub").join("b"), dir.join("b_link")).expect("link");
        std::os::unix::fs::symlink(dir.join("gone"), dir.join("dangling")).expect("dangling");

        let summary = LocalFileSystem.content_summary(&dir).expect("summary");
        assert_eq!(summary.length, 14);
        assert_eq!(summary.file_count, 2);
        assert_eq!(summary.directory_count, 2);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn missing_paths_are_not_found() {
        let dir = temp_dir();
        let err = LocalFileSystem
            .file_status(&dir.join("nope"))
            .expect_err("missing");
        assert!(matches!(err, TapError::NotFound(_)));
        assert!(!LocalFileSystem.exists(&dir.join("nope")));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn bad_pattern_is_config_error() {
        let err = LocalFileSystem.glob_status("/tmp/[").expect_err("bad pattern");
        assert!(matches!(err, TapError::InvalidConfig(_)));
    }
}
