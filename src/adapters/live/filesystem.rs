//! Live filesystem adapter using `std::fs` and `walkdir`.

use std::path::Path;

use walkdir::WalkDir;

use crate::ports::filesystem::{FileSystem, PortError};

/// Live filesystem adapter backed by real disk I/O.
pub struct LiveFileSystem;

impl FileSystem for LiveFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, PortError> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), PortError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(std::fs::write(path, contents)?)
    }

    fn is_dir(&self, path: &Path) -> bool {
        std::fs::read_dir(path).is_ok()
    }

    fn walk_files(&self, root: &Path, skip_dirs: &[String]) -> Result<Vec<String>, PortError> {
        // Surface an unreadable root instead of an empty walk.
        std::fs::read_dir(root)?;

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    return true;
                }
                let name = entry.file_name().to_string_lossy();
                !skip_dirs.iter().any(|skip| skip == name.as_ref())
            });

        let mut files = Vec::new();
        for entry in walker {
            let Ok(entry) = entry else {
                continue;
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
            let rel = rel.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>();
            files.push(rel.join("/"));
        }
        Ok(files)
    }
}
