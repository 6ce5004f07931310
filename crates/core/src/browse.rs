//! Directory picker helpers: drive roots and one-level directory listing.

use std::path::{Path, PathBuf};

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirEntry {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrowseListing {
    pub path: PathBuf,
    pub parent: Option<PathBuf>,
    pub dirs: Vec<DirEntry>,
}

/// Common mount points offered next to `/` on Unix hosts.
#[cfg(not(windows))]
const UNIX_MOUNT_POINTS: &[&str] = &["/mnt", "/media", "/data", "/srv"];

/// Starting points for the directory picker.
#[cfg(not(windows))]
pub fn list_drives() -> Vec<DirEntry> {
    std::iter::once("/")
        .chain(UNIX_MOUNT_POINTS.iter().copied())
        .map(Path::new)
        .filter(|p| p.is_dir())
        .map(|p| DirEntry {
            name: p.display().to_string(),
            path: p.to_path_buf(),
        })
        .collect()
}

/// Starting points for the directory picker (existing drive letters).
#[cfg(windows)]
pub fn list_drives() -> Vec<DirEntry> {
    (b'A'..=b'Z')
        .map(|letter| PathBuf::from(format!("{}:\\", letter as char)))
        .filter(|p| p.is_dir())
        .map(|p| DirEntry {
            name: p.display().to_string(),
            path: p,
        })
        .collect()
}

/// Immediate, non-hidden subdirectories of `path`, sorted by name.
///
/// Unreadable or missing directories produce an empty `dirs` list.
pub fn browse(path: &Path) -> BrowseListing {
    let mut dirs: Vec<DirEntry> = match std::fs::read_dir(path) {
        Ok(entries) => entries
            .flatten()
            .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter_map(|e| {
                let name = e.file_name().to_str()?.to_string();
                (!name.starts_with('.')).then(|| DirEntry {
                    name,
                    path: e.path(),
                })
            })
            .collect(),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Browse target unreadable");
            Vec::new()
        }
    };
    dirs.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    BrowseListing {
        path: path.to_path_buf(),
        parent: path.parent().map(Path::to_path_buf),
        dirs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_visible_subdirectories() {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir(dir.path().join("beta")).unwrap();
        std::fs::create_dir(dir.path().join("Alpha")).unwrap();
        std::fs::create_dir(dir.path().join(".cache")).unwrap();
        std::fs::write(dir.path().join("file.txt"), b"x").unwrap();

        let listing = browse(dir.path());
        let names: Vec<_> = listing.dirs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["Alpha", "beta"]);
        assert_eq!(listing.parent.as_deref(), dir.path().parent());
    }

    #[test]
    fn missing_directory_is_empty() {
        let listing = browse(Path::new("/definitely/not/here"));
        assert!(listing.dirs.is_empty());
    }

    #[cfg(not(windows))]
    #[test]
    fn root_is_always_a_drive() {
        let drives = list_drives();
        assert_eq!(drives[0].path, PathBuf::from("/"));
    }
}
