use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TapError};

/// IO settings shared by schemes, formats and committers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    /// Minimum distance in bytes between sync markers in sequence files.
    pub sync_interval_bytes: usize,
    /// Rows decoded/encoded per arrow batch by the parquet formats.
    pub parquet_batch_size_rows: usize,
    /// Maximum rows per parquet row group.
    pub parquet_max_row_group_rows: usize,
    /// Directory (under the output path) holding uncommitted task output.
    pub temporary_dir_name: String,
    /// Write an empty `_SUCCESS` marker on job commit.
    pub write_success_marker: bool,
    /// Write a `_common_metadata` parquet footer on job commit.
    pub write_summary_metadata: bool,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            sync_interval_bytes: 100 * 20,
            parquet_batch_size_rows: 1024,
            parquet_max_row_group_rows: 128 * 1024,
            temporary_dir_name: "_temporary".to_string(),
            write_success_marker: true,
            write_summary_metadata: true,
        }
    }
}

impl IoConfig {
    /// Defaults overridden by `TAPS_*` environment variables. Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut c = Self::default();
        if let Some(v) = env_parse::<usize>("TAPS_SYNC_INTERVAL_BYTES") {
            c.sync_interval_bytes = v.max(1);
        }
        if let Some(v) = env_parse::<usize>("TAPS_PARQUET_BATCH_SIZE_ROWS") {
            c.parquet_batch_size_rows = v.max(1);
        }
        if let Some(v) = env_parse::<usize>("TAPS_PARQUET_MAX_ROW_GROUP_ROWS") {
            c.parquet_max_row_group_rows = v.max(1);
        }
        if let Ok(v) = std::env::var("TAPS_TEMPORARY_DIR_NAME") {
            if !v.is_empty() {
                c.temporary_dir_name = v;
            }
        }
        if let Some(v) = env_parse::<bool>("TAPS_WRITE_SUCCESS_MARKER") {
            c.write_success_marker = v;
        }
        if let Some(v) = env_parse::<bool>("TAPS_WRITE_SUMMARY_METADATA") {
            c.write_summary_metadata = v;
        }
        c
    }

    /// Loads settings from a JSON document; missing keys keep their defaults.
    pub fn load_from_json(path: impl AsRef<Path>) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        serde_json::from_str(&s).map_err(|e| TapError::InvalidConfig(e.to_string()))
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}
