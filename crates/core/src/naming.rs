//! Artifact naming convention.
//!
//! Generates filesystem-safe torrent filenames from a task's display name
//! and language tag.

use std::path::{Path, PathBuf};

/// Extension of artifacts produced by the creation tool.
pub const ARTIFACT_EXTENSION: &str = "torrent";

/// Characters rejected by at least one common filesystem.
const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Strip characters that are illegal in file names.
///
/// Removes `< > : " / \ | ? *` and control characters, then trims
/// surrounding whitespace and trailing dots. An empty result becomes
/// `"untitled"`.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !ILLEGAL_CHARS.contains(c) && !c.is_control())
        .collect();
    let trimmed = cleaned.trim().trim_end_matches('.').trim_end();
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Build the artifact filename for a task.
///
/// Convention: `{sanitized name} [{language tag}].torrent`
///
/// # Examples
///
/// ```
/// use torrentforge_core::naming::artifact_filename;
///
/// assert_eq!(artifact_filename("Show.S01", "VOSTFR"), "Show.S01 [VOSTFR].torrent");
/// assert_eq!(artifact_filename("What? If: 2021", "MULTI"), "What If 2021 [MULTI].torrent");
/// ```
pub fn artifact_filename(name: &str, language_tag: &str) -> String {
    let tag: String = language_tag
        .chars()
        .filter(|c| !ILLEGAL_CHARS.contains(c) && !c.is_control() && *c != '[' && *c != ']')
        .collect();
    format!(
        "{} [{}].{ARTIFACT_EXTENSION}",
        sanitize_filename(name),
        tag.trim()
    )
}

/// Full destination path of a task's artifact under `output_dir`.
pub fn artifact_path(output_dir: &Path, name: &str, language_tag: &str) -> PathBuf {
    output_dir.join(artifact_filename(name, language_tag))
}
