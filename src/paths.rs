//! Path resolution with project-root containment.
//!
//! Every filesystem-touching operation routes a declared relative path
//! through [`resolve_in_root`]. Resolution is purely lexical: `.` and `..`
//! segments are normalized before the containment check, and no symlink
//! canonicalization happens, so targets do not need to exist yet.

use std::path::{Component, Path, PathBuf};

use crate::error::{Result, TagflowError};

/// Normalize `.`/`..` segments without touching the filesystem. A `..` that
/// would climb above the path's anchor is kept, so escapes stay visible to
/// the containment check instead of silently clamping.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last_is_normal =
                    matches!(normalized.components().next_back(), Some(Component::Normal(_)));
                if last_is_normal {
                    normalized.pop();
                } else {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Resolve a declared relative path against a project root, guaranteeing the
/// result is a prefix-descendant of the root. Fails with
/// [`TagflowError::PathEscape`] otherwise.
pub fn resolve_in_root(root: &Path, relative: &str) -> Result<PathBuf> {
    let root = normalize_lexically(root);
    let resolved = normalize_lexically(&root.join(relative));

    if resolved.starts_with(&root) {
        Ok(resolved)
    } else {
        Err(TagflowError::PathEscape {
            path: PathBuf::from(relative),
            root,
        })
    }
}
