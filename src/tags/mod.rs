//! Tag grammar and extraction for the streaming tag protocol.
//!
//! Model responses embed structured operations as `<op-*>` tags inside
//! otherwise free-form prose. This module owns the tag vocabulary, the
//! per-kind scanners, typed record extraction, and truncation detection.

mod extractor;
mod grammar;
mod truncation;

pub use extractor::{
    CommandTag, CommandType, DeleteTag, ParsedResult, RawQueryTag, RenameTag, SearchReplaceTag, WriteTag,
    normalize_path, parse_document, strip_fences,
};
pub use grammar::{TAG_PREFIX, TagKind, TagMatch, TagScanner, attribute};
pub use truncation::is_truncated;
