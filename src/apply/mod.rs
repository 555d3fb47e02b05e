//! Operation application against the filesystem.
//!
//! Takes a [`ParsedResult`](crate::tags::ParsedResult) and a project root and
//! executes its operations in a fixed order, producing an [`ApplyManifest`].
//! Each operation resolves its path through the root-containment check; a
//! single operation's failure never aborts the rest of the batch.

mod applier;
mod manifest;
mod uploads;

pub use applier::{ApplyOptions, Diagnostics, StderrDiagnostics, apply};
pub use manifest::ApplyManifest;
pub use uploads::{UploadMap, UploadedFile};
