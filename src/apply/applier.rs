//! Executes parsed operations against the filesystem.
//!
//! Operations run in a fixed order: delete, then rename, then write.
//! Deleting first keeps later steps from colliding with paths slated for
//! removal; renaming before writing accommodates a model renaming a file and
//! immediately emitting fresh content for the renamed target.

use std::path::Path;

use tracing::debug;

use super::manifest::ApplyManifest;
use super::uploads::{self, UploadMap};
use crate::error::Result;
use crate::paths::resolve_in_root;
use crate::tags::ParsedResult;

/// Caller-supplied diagnostic callbacks. Defaults print to stderr.
pub trait Diagnostics: Send + Sync {
    fn log(&self, message: &str) {
        eprintln!("{message}");
    }

    fn warn(&self, message: &str) {
        eprintln!("warning: {message}");
    }

    fn error(&self, message: &str) {
        eprintln!("error: {message}");
    }
}

/// Default diagnostics sink, using the trait's stderr behavior.
pub struct StderrDiagnostics;

impl Diagnostics for StderrDiagnostics {}

/// Options for one apply pass.
pub struct ApplyOptions<'a> {
    /// Placeholder token → uploaded file substitution map
    pub uploads: &'a UploadMap,
    /// Diagnostic callbacks for log/warn/error
    pub diagnostics: &'a dyn Diagnostics,
    /// Resolve and report without touching the filesystem
    pub dry_run: bool,
}

impl<'a> ApplyOptions<'a> {
    pub fn new(uploads: &'a UploadMap, diagnostics: &'a dyn Diagnostics) -> Self {
        Self {
            uploads,
            diagnostics,
            dry_run: false,
        }
    }
}

/// Apply every operation in a parsed result against a project root.
///
/// Order is fixed: delete, rename, write. A single operation's failure is
/// reported through the diagnostics callbacks and aggregated into the
/// manifest's error field; it never aborts the remaining operations.
pub async fn apply(parsed: &ParsedResult, root: &Path, options: &ApplyOptions<'_>) -> ApplyManifest {
    let mut manifest = ApplyManifest {
        packages: parsed.packages.clone(),
        ..Default::default()
    };
    let mut errors = Vec::new();

    for tag in &parsed.delete_tags {
        match apply_delete(&tag.path, root, options).await {
            Ok(true) => manifest.deleted_files.push(tag.path.clone()),
            Ok(false) => {}
            Err(err) => {
                let message = format!("Failed to delete {}: {}", tag.path, err);
                options.diagnostics.error(&message);
                errors.push(message);
            }
        }
    }

    for tag in &parsed.rename_tags {
        match apply_rename(&tag.from, &tag.to, root, options).await {
            Ok(true) => manifest.renamed_files.push(tag.to.clone()),
            Ok(false) => {}
            Err(err) => {
                let message = format!("Failed to rename {} to {}: {}", tag.from, tag.to, err);
                options.diagnostics.error(&message);
                errors.push(message);
            }
        }
    }

    for tag in &parsed.write_tags {
        match apply_write(&tag.path, &tag.content, root, options).await {
            Ok(()) => manifest.written_files.push(tag.path.clone()),
            Err(err) => {
                let message = format!("Failed to write {}: {}", tag.path, err);
                options.diagnostics.error(&message);
                errors.push(message);
            }
        }
    }

    manifest.finalize(errors)
}

/// Returns Ok(true) if the path was (or would be) removed, Ok(false) when the
/// target was absent.
async fn apply_delete(path: &str, root: &Path, options: &ApplyOptions<'_>) -> Result<bool> {
    let full_path = resolve_in_root(root, path)?;

    let Ok(metadata) = tokio::fs::metadata(&full_path).await else {
        options
            .diagnostics
            .warn(&format!("Path to delete does not exist: {path}"));
        return Ok(false);
    };

    if !options.dry_run {
        if metadata.is_dir() {
            tokio::fs::remove_dir_all(&full_path).await?;
        } else {
            tokio::fs::remove_file(&full_path).await?;
        }
    }

    debug!(path, "deleted");
    options.diagnostics.log(&format!("Deleted: {path}"));
    Ok(true)
}

/// Returns Ok(true) if the source was (or would be) moved, Ok(false) when the
/// source was absent.
async fn apply_rename(from: &str, to: &str, root: &Path, options: &ApplyOptions<'_>) -> Result<bool> {
    let from_path = resolve_in_root(root, from)?;
    let to_path = resolve_in_root(root, to)?;

    if tokio::fs::metadata(&from_path).await.is_err() {
        options
            .diagnostics
            .warn(&format!("Path to rename does not exist: {from}"));
        return Ok(false);
    }

    if !options.dry_run {
        if let Some(parent) = to_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::rename(&from_path, &to_path).await?;
    }

    debug!(from, to, "renamed");
    options.diagnostics.log(&format!("Renamed: {from} -> {to}"));
    Ok(true)
}

async fn apply_write(path: &str, content: &str, root: &Path, options: &ApplyOptions<'_>) -> Result<()> {
    let full_path = resolve_in_root(root, path)?;

    if !options.dry_run {
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // A body that is exactly a placeholder token stands in for an
        // uploaded file's bytes.
        if let Some(upload) = uploads::lookup(options.uploads, content) {
            let bytes = tokio::fs::read(&upload.source).await?;
            tokio::fs::write(&full_path, bytes).await?;
            options
                .diagnostics
                .log(&format!("Wrote uploaded file {} to {path}", upload.display_name));
        } else {
            tokio::fs::write(&full_path, content).await?;
        }
    }

    debug!(path, bytes = content.len(), "wrote");
    options.diagnostics.log(&format!("Wrote: {path}"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::UploadedFile;
    use crate::tags::{DeleteTag, RenameTag, WriteTag, parse_document};
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Diagnostics sink that records messages for assertions.
    #[derive(Default)]
    struct RecordingDiagnostics {
        warnings: Mutex<Vec<String>>,
        errors: Mutex<Vec<String>>,
    }

    impl Diagnostics for RecordingDiagnostics {
        fn log(&self, _message: &str) {}

        fn warn(&self, message: &str) {
            self.warnings.lock().unwrap().push(message.to_string());
        }

        fn error(&self, message: &str) {
            self.errors.lock().unwrap().push(message.to_string());
        }
    }

    fn options<'a>(uploads: &'a UploadMap, diagnostics: &'a RecordingDiagnostics) -> ApplyOptions<'a> {
        ApplyOptions::new(uploads, diagnostics)
    }

    #[tokio::test]
    async fn test_apply_write_creates_file_and_directories() {
        let dir = tempdir().unwrap();
        let uploads = UploadMap::new();
        let diagnostics = RecordingDiagnostics::default();

        let parsed = ParsedResult {
            write_tags: vec![WriteTag {
                path: "src/nested/mod.rs".into(),
                content: "pub fn f() {}".into(),
                description: None,
            }],
            ..Default::default()
        };

        let manifest = apply(&parsed, dir.path(), &options(&uploads, &diagnostics)).await;

        assert_eq!(manifest.written_files, vec!["src/nested/mod.rs"]);
        assert!(manifest.has_changes);
        assert_eq!(manifest.error, None);
        let written = std::fs::read_to_string(dir.path().join("src/nested/mod.rs")).unwrap();
        assert_eq!(written, "pub fn f() {}");
    }

    #[tokio::test]
    async fn test_apply_delete_file_and_directory() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("gone.txt"), "x").unwrap();
        std::fs::create_dir_all(dir.path().join("old_dir/inner")).unwrap();

        let uploads = UploadMap::new();
        let diagnostics = RecordingDiagnostics::default();
        let parsed = ParsedResult {
            delete_tags: vec![
                DeleteTag { path: "gone.txt".into() },
                DeleteTag { path: "old_dir".into() },
            ],
            ..Default::default()
        };

        let manifest = apply(&parsed, dir.path(), &options(&uploads, &diagnostics)).await;

        assert_eq!(manifest.deleted_files, vec!["gone.txt", "old_dir"]);
        assert!(!dir.path().join("gone.txt").exists());
        assert!(!dir.path().join("old_dir").exists());
    }

    #[tokio::test]
    async fn test_apply_delete_missing_warns_not_errors() {
        let dir = tempdir().unwrap();
        let uploads = UploadMap::new();
        let diagnostics = RecordingDiagnostics::default();
        let parsed = ParsedResult {
            delete_tags: vec![DeleteTag { path: "absent.txt".into() }],
            ..Default::default()
        };

        let manifest = apply(&parsed, dir.path(), &options(&uploads, &diagnostics)).await;

        assert!(manifest.deleted_files.is_empty());
        assert_eq!(manifest.error, None);
        assert!(!manifest.has_changes);
        assert_eq!(diagnostics.warnings.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_apply_rename_creates_target_directories() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("old.rs"), "content").unwrap();

        let uploads = UploadMap::new();
        let diagnostics = RecordingDiagnostics::default();
        let parsed = ParsedResult {
            rename_tags: vec![RenameTag {
                from: "old.rs".into(),
                to: "src/renamed.rs".into(),
            }],
            ..Default::default()
        };

        let manifest = apply(&parsed, dir.path(), &options(&uploads, &diagnostics)).await;

        assert_eq!(manifest.renamed_files, vec!["src/renamed.rs"]);
        assert!(!dir.path().join("old.rs").exists());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("src/renamed.rs")).unwrap(),
            "content"
        );
    }

    #[tokio::test]
    async fn test_apply_rename_missing_source_warns_and_skips() {
        let dir = tempdir().unwrap();
        let uploads = UploadMap::new();
        let diagnostics = RecordingDiagnostics::default();
        let parsed = ParsedResult {
            rename_tags: vec![RenameTag {
                from: "missing.rs".into(),
                to: "dst.rs".into(),
            }],
            ..Default::default()
        };

        let manifest = apply(&parsed, dir.path(), &options(&uploads, &diagnostics)).await;

        assert!(manifest.renamed_files.is_empty());
        assert_eq!(manifest.error, None);
        assert_eq!(diagnostics.warnings.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_apply_order_delete_rename_write() {
        // Delete a path that a rename also targets as source: the rename must
        // warn and skip, and the write must still land.
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("victim.rs"), "doomed").unwrap();

        let uploads = UploadMap::new();
        let diagnostics = RecordingDiagnostics::default();
        let parsed = ParsedResult {
            delete_tags: vec![DeleteTag { path: "victim.rs".into() }],
            rename_tags: vec![RenameTag {
                from: "victim.rs".into(),
                to: "moved.rs".into(),
            }],
            write_tags: vec![WriteTag {
                path: "moved.rs".into(),
                content: "fresh".into(),
                description: None,
            }],
            ..Default::default()
        };

        let manifest = apply(&parsed, dir.path(), &options(&uploads, &diagnostics)).await;

        assert_eq!(manifest.deleted_files, vec!["victim.rs"]);
        assert!(manifest.renamed_files.is_empty());
        assert_eq!(manifest.written_files, vec!["moved.rs"]);
        assert_eq!(manifest.error, None);
        assert_eq!(diagnostics.warnings.lock().unwrap().len(), 1);
        assert_eq!(std::fs::read_to_string(dir.path().join("moved.rs")).unwrap(), "fresh");
    }

    #[tokio::test]
    async fn test_apply_path_escape_is_captured_not_fatal() {
        let dir = tempdir().unwrap();
        let uploads = UploadMap::new();
        let diagnostics = RecordingDiagnostics::default();
        let parsed = ParsedResult {
            write_tags: vec![
                WriteTag {
                    path: "../../etc/passwd".into(),
                    content: "nope".into(),
                    description: None,
                },
                WriteTag {
                    path: "ok.txt".into(),
                    content: "fine".into(),
                    description: None,
                },
            ],
            ..Default::default()
        };

        let manifest = apply(&parsed, dir.path(), &options(&uploads, &diagnostics)).await;

        // The escape fails that single operation; the batch continues
        assert_eq!(manifest.written_files, vec!["ok.txt"]);
        assert!(manifest.error.as_deref().unwrap().contains("escapes project root"));
        assert!(manifest.has_changes);
        assert_eq!(diagnostics.errors.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_apply_upload_placeholder_substitution() {
        let dir = tempdir().unwrap();
        let upload_src = dir.path().join("uploaded.bin");
        std::fs::write(&upload_src, [0u8, 159, 146, 150]).unwrap();

        let mut uploads = UploadMap::new();
        uploads.insert(
            "TAGFLOW_UPLOAD_0".to_string(),
            UploadedFile {
                source: upload_src,
                display_name: "logo.bin".to_string(),
            },
        );
        let diagnostics = RecordingDiagnostics::default();
        let parsed = ParsedResult {
            write_tags: vec![WriteTag {
                path: "assets/logo.bin".into(),
                content: "  TAGFLOW_UPLOAD_0  ".into(),
                description: None,
            }],
            ..Default::default()
        };

        let manifest = apply(&parsed, dir.path(), &options(&uploads, &diagnostics)).await;

        assert_eq!(manifest.written_files, vec!["assets/logo.bin"]);
        let bytes = std::fs::read(dir.path().join("assets/logo.bin")).unwrap();
        assert_eq!(bytes, vec![0u8, 159, 146, 150]);
    }

    #[tokio::test]
    async fn test_apply_dry_run_touches_nothing() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("keep.txt"), "still here").unwrap();

        let uploads = UploadMap::new();
        let diagnostics = RecordingDiagnostics::default();
        let mut opts = options(&uploads, &diagnostics);
        opts.dry_run = true;

        let parsed = ParsedResult {
            delete_tags: vec![DeleteTag { path: "keep.txt".into() }],
            write_tags: vec![WriteTag {
                path: "new.txt".into(),
                content: "would write".into(),
                description: None,
            }],
            ..Default::default()
        };

        let manifest = apply(&parsed, dir.path(), &opts).await;

        assert_eq!(manifest.deleted_files, vec!["keep.txt"]);
        assert_eq!(manifest.written_files, vec!["new.txt"]);
        assert!(dir.path().join("keep.txt").exists());
        assert!(!dir.path().join("new.txt").exists());
    }

    #[tokio::test]
    async fn test_apply_carries_packages() {
        let dir = tempdir().unwrap();
        let uploads = UploadMap::new();
        let diagnostics = RecordingDiagnostics::default();
        let parsed = parse_document(
            r#"<op-add-dependency packages="react lodash"></op-add-dependency>
               <op-add-dependency packages="zod"></op-add-dependency>"#,
        );

        let manifest = apply(&parsed, dir.path(), &options(&uploads, &diagnostics)).await;

        assert_eq!(manifest.packages, vec!["react", "lodash", "zod"]);
        assert!(!manifest.has_changes);
    }

    #[tokio::test]
    async fn test_apply_is_reapplicable() {
        // Re-running apply over the same parsed result converges: deletes
        // warn on the second pass, writes overwrite with identical content.
        let dir = tempdir().unwrap();
        let uploads = UploadMap::new();
        let diagnostics = RecordingDiagnostics::default();
        let parsed = ParsedResult {
            write_tags: vec![WriteTag {
                path: "same.txt".into(),
                content: "stable".into(),
                description: None,
            }],
            ..Default::default()
        };

        let first = apply(&parsed, dir.path(), &options(&uploads, &diagnostics)).await;
        let second = apply(&parsed, dir.path(), &options(&uploads, &diagnostics)).await;

        assert_eq!(first, second);
        assert_eq!(std::fs::read_to_string(dir.path().join("same.txt")).unwrap(), "stable");
    }
}
