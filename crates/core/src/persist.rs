//! JSON file persistence shared by the config and task stores.

use std::path::Path;

use serde::Serialize;

use crate::error::CoreError;

/// Serialize `value` as pretty JSON and write it to `path`.
///
/// Writes to a sibling `.tmp` file first and renames it over the target so a
/// crash mid-write never leaves a truncated file behind. Parent directories
/// are created as needed.
pub async fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
