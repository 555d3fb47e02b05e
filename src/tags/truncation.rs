//! Truncation detection for streaming-in-progress documents.
//!
//! A document is truncated when the producer stopped mid-write: the last
//! write opening marker has no closing marker anywhere after it. A closed
//! write tag followed by unrelated prose is complete.

use super::grammar::TagKind;

/// True iff the last `<op-write` opening marker has no `</op-write>` at any
/// later offset. A document with no write tags is never truncated.
pub fn is_truncated(document: &str) -> bool {
    let open_prefix = TagKind::Write.open_prefix();
    let close_marker = TagKind::Write.close_marker();

    match document.rfind(&open_prefix) {
        None => false,
        Some(last_open) => !document[last_open..].contains(&close_marker),
    }
}
