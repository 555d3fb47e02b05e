//! Typed operation extraction from a tagged document.
//!
//! Extraction is a pure function of the document text: the same text always
//! yields the same records, in insertion order (first character of the
//! opening marker). Dangling open markers yield no record, so extracting from
//! a streaming-in-progress document never fails.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::grammar::{TagKind, TagScanner, attribute};

/// A full-file write extracted from an `<op-write>` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteTag {
    pub path: String,
    pub content: String,
    pub description: Option<String>,
}

/// A file rename extracted from an `<op-rename>` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameTag {
    pub from: String,
    pub to: String,
}

/// A file or directory deletion extracted from an `<op-delete>` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteTag {
    pub path: String,
}

/// A patch-style edit extracted from an `<op-search-replace>` tag.
///
/// Same shape as [`WriteTag`]; downstream applies it as a patch rather than a
/// full overwrite. Only the record kind carries the distinction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchReplaceTag {
    pub path: String,
    pub content: String,
    pub description: Option<String>,
}

/// A raw query extracted from an `<op-raw-query>` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawQueryTag {
    pub query: String,
    pub description: Option<String>,
}

/// Closed set of accepted `<op-command>` types. Unknown types are dropped
/// silently during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    Rebuild,
    Restart,
    Refresh,
}

impl CommandType {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "rebuild" => Some(CommandType::Rebuild),
            "restart" => Some(CommandType::Restart),
            "refresh" => Some(CommandType::Refresh),
            _ => None,
        }
    }
}

/// A client command extracted from an `<op-command>` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandTag {
    pub command: CommandType,
}

/// Aggregate of every operation record extracted from one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedResult {
    pub write_tags: Vec<WriteTag>,
    pub rename_tags: Vec<RenameTag>,
    pub delete_tags: Vec<DeleteTag>,
    /// Flattened package list across all dependency-add tags, encounter
    /// order, duplicates preserved.
    pub packages: Vec<String>,
    pub search_replace_tags: Vec<SearchReplaceTag>,
    pub raw_query_tags: Vec<RawQueryTag>,
    pub command_tags: Vec<CommandTag>,
    /// First summary tag's body, trimmed. Later summary tags are ignored.
    pub chat_summary: Option<String>,
}

impl ParsedResult {
    /// True if applying this result could touch the filesystem.
    pub fn has_operations(&self) -> bool {
        !self.write_tags.is_empty()
            || !self.rename_tags.is_empty()
            || !self.delete_tags.is_empty()
            || !self.packages.is_empty()
    }

    /// Total record count across all kinds, for diagnostics.
    pub fn record_count(&self) -> usize {
        self.write_tags.len()
            + self.rename_tags.len()
            + self.delete_tags.len()
            + self.search_replace_tags.len()
            + self.raw_query_tags.len()
            + self.command_tags.len()
    }
}

/// Rewrite backslash separators to forward slashes so downstream consumers
/// never special-case separator style.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Strip a single leading and single trailing fenced-code delimiter line, if
/// present. Models often wrap tag bodies in decorative fences; taking them at
/// face value would corrupt the written file.
pub fn strip_fences(content: &str) -> String {
    let trimmed = content.trim_matches(['\r', '\n']);
    let mut lines: Vec<&str> = trimmed.lines().collect();

    if lines.first().is_some_and(|line| line.get(..3) == Some("```")) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|line| line.get(..3) == Some("```")) {
        lines.pop();
    }

    lines.join("\n")
}

/// Extract every recognized operation record from a document.
pub fn parse_document(document: &str) -> ParsedResult {
    ParsedResult {
        write_tags: extract_writes(document),
        rename_tags: extract_renames(document),
        delete_tags: extract_deletes(document),
        packages: extract_packages(document),
        search_replace_tags: extract_search_replaces(document),
        raw_query_tags: extract_raw_queries(document),
        command_tags: extract_commands(document),
        chat_summary: extract_summary(document),
    }
}

fn extract_writes(document: &str) -> Vec<WriteTag> {
    TagScanner::new(TagKind::Write)
        .matches(document)
        .into_iter()
        .filter_map(|m| {
            // Records with no path are dropped silently.
            let path = attribute(m.attrs, "path")?;
            Some(WriteTag {
                path: normalize_path(&path),
                content: strip_fences(m.body),
                description: attribute(m.attrs, "description"),
            })
        })
        .collect()
}

fn extract_renames(document: &str) -> Vec<RenameTag> {
    // from/to are captured straight out of the opening marker.
    let pattern = Regex::new(r#"(?s)<op-rename\s+from="([^"]*)"\s+to="([^"]*)"[^>]*>.*?</op-rename>"#)
        .expect("rename pattern is statically valid");
    pattern
        .captures_iter(document)
        .map(|caps| RenameTag {
            from: normalize_path(&caps[1]),
            to: normalize_path(&caps[2]),
        })
        .collect()
}

fn extract_deletes(document: &str) -> Vec<DeleteTag> {
    TagScanner::new(TagKind::Delete)
        .matches(document)
        .into_iter()
        .filter_map(|m| {
            let path = attribute(m.attrs, "path")?;
            Some(DeleteTag {
                path: normalize_path(&path),
            })
        })
        .collect()
}

fn extract_packages(document: &str) -> Vec<String> {
    TagScanner::new(TagKind::DependencyAdd)
        .matches(document)
        .into_iter()
        .filter_map(|m| attribute(m.attrs, "packages"))
        .flat_map(|value| {
            value
                .split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

fn extract_search_replaces(document: &str) -> Vec<SearchReplaceTag> {
    TagScanner::new(TagKind::SearchReplace)
        .matches(document)
        .into_iter()
        .filter_map(|m| {
            let path = attribute(m.attrs, "path")?;
            Some(SearchReplaceTag {
                path: normalize_path(&path),
                content: strip_fences(m.body),
                description: attribute(m.attrs, "description"),
            })
        })
        .collect()
}

fn extract_raw_queries(document: &str) -> Vec<RawQueryTag> {
    TagScanner::new(TagKind::RawQuery)
        .matches(document)
        .into_iter()
        .map(|m| RawQueryTag {
            query: strip_fences(m.body),
            description: attribute(m.attrs, "description"),
        })
        .collect()
}

fn extract_commands(document: &str) -> Vec<CommandTag> {
    TagScanner::new(TagKind::Command)
        .matches(document)
        .into_iter()
        .filter_map(|m| {
            let value = attribute(m.attrs, "type")?;
            CommandType::parse(&value).map(|command| CommandTag { command })
        })
        .collect()
}

fn extract_summary(document: &str) -> Option<String> {
    TagScanner::new(TagKind::Summary)
        .first(document)
        .map(|m| m.body.trim().to_string())
}
