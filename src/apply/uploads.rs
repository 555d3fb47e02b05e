//! Pending-upload placeholder substitution.
//!
//! Callers that attach binary files to a chat pass a map from placeholder
//! token to uploaded file. When a write tag's body, trimmed, exactly equals a
//! placeholder key, the applier writes the uploaded file's bytes instead of
//! the literal placeholder text.

use std::collections::HashMap;
use std::path::PathBuf;

/// One uploaded file referenced by a placeholder token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Where the uploaded bytes live on disk
    pub source: PathBuf,
    /// Human-readable name for diagnostics
    pub display_name: String,
}

/// Placeholder token → uploaded file. Lookup requires an exact match against
/// the trimmed write body.
pub type UploadMap = HashMap<String, UploadedFile>;

/// Look up an upload by a write tag's body.
pub fn lookup<'a>(uploads: &'a UploadMap, body: &str) -> Option<&'a UploadedFile> {
    uploads.get(body.trim())
}
