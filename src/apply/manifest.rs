//! Result manifest for one apply pass.

use serde::{Deserialize, Serialize};

/// Structured record of what one apply pass did: which paths were written,
/// renamed, and deleted (in execution order), the requested dependencies,
/// and an aggregate error string if any step failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplyManifest {
    /// Paths written, relative to the project root
    pub written_files: Vec<String>,
    /// Rename targets (`to` paths) that were moved into place
    pub renamed_files: Vec<String>,
    /// Paths removed (files or whole directories)
    pub deleted_files: Vec<String>,
    /// Unioned dependency list across all dependency-add tags
    pub packages: Vec<String>,
    /// Joined per-operation failure messages, `None` when everything passed
    pub error: Option<String>,
    /// True iff at least one of the three path lists is non-empty,
    /// independent of the error field
    pub has_changes: bool,
}

impl ApplyManifest {
    /// Recompute the changes flag from the path lists.
    pub(crate) fn finalize(mut self, errors: Vec<String>) -> Self {
        self.has_changes =
            !self.written_files.is_empty() || !self.renamed_files.is_empty() || !self.deleted_files.is_empty();
        self.error = if errors.is_empty() { None } else { Some(errors.join("\n")) };
        self
    }
}
