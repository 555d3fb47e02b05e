//! Tag vocabulary and per-kind scanners.
//!
//! Each tag kind has an opening marker `<op-kind attr="v" ...>`, an optional
//! raw-text body, and a closing marker `</op-kind>`. Markers may appear
//! anywhere in surrounding prose; the scanners never require the document to
//! be well-formed XML. A scanner only reports fully-closed tags, so running
//! one over a streaming-in-progress document is always safe.

use regex::Regex;

/// Shared prefix of every operation marker. Reasoning-channel escaping keys
/// off this exact byte sequence.
pub const TAG_PREFIX: &str = "<op-";

/// The closed set of recognized tag kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Write,
    Rename,
    Delete,
    DependencyAdd,
    SearchReplace,
    RawQuery,
    Command,
    Summary,
}

impl TagKind {
    /// Marker name as it appears on the wire, without angle brackets.
    pub fn marker(&self) -> &'static str {
        match self {
            TagKind::Write => "op-write",
            TagKind::Rename => "op-rename",
            TagKind::Delete => "op-delete",
            TagKind::DependencyAdd => "op-add-dependency",
            TagKind::SearchReplace => "op-search-replace",
            TagKind::RawQuery => "op-raw-query",
            TagKind::Command => "op-command",
            TagKind::Summary => "op-summary",
        }
    }

    /// Opening marker prefix, e.g. `<op-write`.
    pub fn open_prefix(&self) -> String {
        format!("<{}", self.marker())
    }

    /// Closing marker, e.g. `</op-write>`.
    pub fn close_marker(&self) -> String {
        format!("</{}>", self.marker())
    }
}

/// One closed-tag match within a document.
#[derive(Debug, Clone, PartialEq)]
pub struct TagMatch<'a> {
    /// Byte offset of the first character of the opening marker
    pub offset: usize,
    /// Raw attribute text from the opening marker (may be empty)
    pub attrs: &'a str,
    /// Raw body between the markers
    pub body: &'a str,
}

/// Scanner for one tag kind: produces closed-tag matches with byte offsets.
///
/// Matches are non-greedy, so adjacent tags of the same kind never merge.
pub struct TagScanner {
    kind: TagKind,
    pattern: Regex,
}

impl TagScanner {
    pub fn new(kind: TagKind) -> Self {
        let marker = kind.marker();
        let pattern = Regex::new(&format!(r"(?s)<{marker}([^>]*)>(.*?)</{marker}>"))
            .expect("tag scanner pattern is statically valid");
        Self { kind, pattern }
    }

    pub fn kind(&self) -> TagKind {
        self.kind
    }

    /// All fully-closed matches in document order. A dangling open marker
    /// with no matching close yields nothing; that is expected mid-stream
    /// state, not an error.
    pub fn matches<'a>(&self, document: &'a str) -> Vec<TagMatch<'a>> {
        self.pattern
            .captures_iter(document)
            .map(|caps| {
                let whole = caps.get(0).expect("capture group 0 always present");
                TagMatch {
                    offset: whole.start(),
                    attrs: caps.get(1).map(|m| m.as_str()).unwrap_or(""),
                    body: caps.get(2).map(|m| m.as_str()).unwrap_or(""),
                }
            })
            .collect()
    }

    /// First match only, in document order.
    pub fn first<'a>(&self, document: &'a str) -> Option<TagMatch<'a>> {
        self.matches(document).into_iter().next()
    }
}

/// Extract a double-quoted attribute value from an opening marker's attribute
/// text. Values carry no embedded `"` escaping.
pub fn attribute(attrs: &str, name: &str) -> Option<String> {
    let pattern =
        Regex::new(&format!(r#"{name}\s*=\s*"([^"]*)""#)).expect("attribute pattern is statically valid");
    pattern.captures(attrs).map(|caps| caps[1].to_string())
}
