//! Hole recognition and hole identity.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Token tag the prover puts on hole delimiters.
pub const HOLE_TAG: &str = "symbol";

static HOLE_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\?|\{!(?s:.*)!\})$").expect("valid regex"));

static HOLE_BODY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?s)(\s*\{!\s*)(.+?)(\s*!\}\s*)$").expect("valid regex")
});

/// Handle identifying one hole for the lifetime of a syntax state.
///
/// Handles survive remapping. A reset bumps the generation, so handles
/// issued before it never compare equal to handles issued after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HoleId {
    pub generation: u32,
    pub index: u32,
}

impl fmt::Display for HoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hole#{}.{}", self.generation, self.index)
    }
}

/// True when a highlighted token is a hole: the text is `?` or `{!...!}`
/// and the prover tagged it as a symbol.
pub fn is_hole<S: AsRef<str>>(text: &str, tags: &[S]) -> bool {
    tags.iter().any(|t| t.as_ref() == HOLE_TAG) && HOLE_TEXT.is_match(text)
}

/// The raw text between `{!` and `!}`, or `None` for anything else.
pub fn braced_inner(text: &str) -> Option<&str> {
    text.strip_prefix("{!")?.strip_suffix("!}")
}

/// The non-blank body of a braced hole.
///
/// `trim_before` and `trim_after` are the code-unit lengths of the delimiter
/// plus surrounding whitespace on either side, so `[from + trim_before,
/// to - trim_after)` is the body's range in the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoleContent {
    pub body: String,
    pub trim_before: usize,
    pub trim_after: usize,
}

impl HoleContent {
    pub fn parse(text: &str) -> Option<Self> {
        let caps = HOLE_BODY.captures(text)?;
        if caps.get(2)?.as_str().trim().is_empty() {
            return None;
        }
        let units = |i: usize| caps.get(i).map_or(0, |m| m.as_str().encode_utf16().count());
        Some(Self {
            body: caps.get(2)?.as_str().to_string(),
            trim_before: units(1),
            trim_after: units(3),
        })
    }
}
