use taps_common::{Result, TapError};
use tracing::debug;

use crate::fs::FileSystem;

/// Total bytes under every path matching `pattern`, directories counted recursively.
///
/// A pattern matching nothing is [`TapError::NotFound`], distinct from a zero total.
/// The value is a point-in-time estimate.
pub fn get_size(fs: &dyn FileSystem, pattern: &str) -> Result<u64> {
    let statuses = fs.glob_status(pattern)?;
    if statuses.is_empty() {
        return Err(TapError::NotFound(pattern.to_string()));
    }
    let mut total = 0u64;
    for status in &statuses {
        total += fs.content_summary(&status.path)?.length;
    }
    debug!(pattern, matches = statuses.len(), bytes = total, "resolved path size");
    Ok(total)
}
