use crate::error::{IngestError, Result};
use std::path::{Component, Path, PathBuf};

/// Validate an upload name as a single bare file name
///
/// Separators, parent references, control bytes, and Windows drive colons
/// are all refused rather than cleaned: a name that needs cleaning is a
/// traversal attempt, not a formatting problem.
pub fn sanitize_file_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() || name == "." || name == ".." {
        return Err(IngestError::PathTraversalAttempt {
            name: name.to_string(),
        });
    }
    if name
        .chars()
        .any(|c| c == '/' || c == '\\' || c == ':' || c == '\0' || c.is_control())
    {
        return Err(IngestError::PathTraversalAttempt {
            name: name.to_string(),
        });
    }
    Ok(name)
}

/// Join a relative path onto `root`, refusing every way out
///
/// Only normal components survive; `..`, absolute paths, and drive
/// prefixes fail with [`IngestError::PathTraversalAttempt`]. The result is
/// guaranteed to live under `root` without touching the filesystem.
pub fn contained_join(root: &Path, candidate: &str) -> Result<PathBuf> {
    let relative = Path::new(candidate);
    if relative.is_absolute() {
        return Err(IngestError::PathTraversalAttempt {
            name: candidate.to_string(),
        });
    }

    let mut joined = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => joined.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(IngestError::PathTraversalAttempt {
                    name: candidate.to_string(),
                });
            }
        }
    }
    Ok(joined)
}
