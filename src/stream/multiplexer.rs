//! Folds the two-channel fragment stream into one linear tagged document.
//!
//! The multiplexer holds a single piece of state: whether the document is
//! currently inside a reasoning block. Each incoming fragment emits text per
//! the transition table in the protocol; answer text passes through verbatim,
//! reasoning text is wrapped in think markers and escaped so narration about
//! operation tags can never be extracted as a real operation.

use crate::stream::fragment::{Fragment, FragmentKind};
use crate::tags::TAG_PREFIX;

pub const THINK_OPEN: &str = "<think>";
pub const THINK_CLOSE: &str = "</think>";

/// Substitute for the tag prefix inside reasoning text: a non-breaking
/// hyphen (U+2011) in place of the ASCII hyphen. Visually similar, never
/// matched by the scanners.
const ESCAPED_PREFIX: &str = "<op\u{2011}";

/// Rewrite any literal tag-prefix occurrence in reasoning text so it cannot
/// be misparsed as an operation marker.
pub fn escape_reasoning(text: &str) -> String {
    text.replace(TAG_PREFIX, ESCAPED_PREFIX)
}

/// Stateful fold over a fragment sequence, producing the next chunk of
/// document text for each fragment.
#[derive(Debug, Default)]
pub struct Multiplexer {
    in_reasoning: bool,
}

impl Multiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a reasoning block is open.
    pub fn in_reasoning(&self) -> bool {
        self.in_reasoning
    }

    /// Apply one fragment and return the text to append to the document.
    pub fn fold(&mut self, fragment: &Fragment) -> String {
        match (self.in_reasoning, fragment.kind) {
            (false, FragmentKind::Answer) => fragment.text.clone(),
            (false, FragmentKind::Reasoning) => {
                self.in_reasoning = true;
                format!("{THINK_OPEN}{}", escape_reasoning(&fragment.text))
            }
            (true, FragmentKind::Reasoning) => escape_reasoning(&fragment.text),
            (true, FragmentKind::Answer) => {
                self.in_reasoning = false;
                format!("{THINK_CLOSE}{}", fragment.text)
            }
        }
    }

    /// Close a still-open reasoning block at end of stream so the document
    /// stays balanced. Returns the text to append, possibly empty.
    pub fn finish(&mut self) -> String {
        if self.in_reasoning {
            self.in_reasoning = false;
            THINK_CLOSE.to_string()
        } else {
            String::new()
        }
    }
}
