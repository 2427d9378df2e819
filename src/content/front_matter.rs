//! Front-matter block parsing and serialization.
//!
//! A content page begins with a front-matter block delimited by `---` marker
//! lines, containing line-oriented `key: value` pairs:
//!
//! ```text
//! ---
//! title: Coding style
//! date: 2016-05-09
//! weight: 50
//! ---
//! body text...
//! ```
//!
//! Pairs are kept **in authored order** as raw strings, so serializing a
//! parsed block recovers the original pairs exactly. Typed interpretation
//! (dates, weights) lives in [`crate::content::PageMeta`].

use thiserror::Error;

/// Marker line delimiting the front-matter block.
pub const MARKER: &str = "---";

// ============================================================================
// Errors
// ============================================================================

/// A document whose front matter cannot be parsed.
///
/// Raised when the marker pair is missing or unterminated, or when a line
/// inside the block is not a `key: value` pair. No partial page is produced;
/// the caller excludes the document from the build and reports the error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MalformedDocument {
    #[error("document does not begin with a `{MARKER}` front matter marker")]
    MissingOpening,

    #[error("front matter block is missing its closing `{MARKER}` marker")]
    Unterminated,

    #[error("front matter line {line} is not a `key: value` pair: `{text}`")]
    InvalidPair { line: usize, text: String },
}

// ============================================================================
// FrontMatter
// ============================================================================

/// Ordered raw `key: value` pairs from a front-matter block.
///
/// Duplicate keys are preserved in order; [`FrontMatter::get`] returns the
/// first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    pairs: Vec<(String, String)>,
}

impl FrontMatter {
    /// Split `raw` into a front-matter block and the remaining body.
    ///
    /// The document must begin with a `---` marker line; pairs follow until
    /// the closing marker. Blank lines inside the block are permitted and
    /// carry no pairs.
    ///
    /// Returns the parsed block and the body as a slice of `raw`.
    pub fn parse(raw: &str) -> Result<(Self, &str), MalformedDocument> {
        let mut rest = raw;

        let opening = take_line(&mut rest);
        if opening.trim_end() != MARKER {
            return Err(MalformedDocument::MissingOpening);
        }

        let mut pairs = Vec::new();
        let mut line_no = 1;
        let mut closed = false;

        while !rest.is_empty() {
            let line = take_line(&mut rest);
            line_no += 1;

            let text = line.trim_end();
            if text == MARKER {
                closed = true;
                break;
            }
            if text.trim().is_empty() {
                continue;
            }

            let Some((key, value)) = text.split_once(':') else {
                return Err(MalformedDocument::InvalidPair {
                    line: line_no,
                    text: text.to_owned(),
                });
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(MalformedDocument::InvalidPair {
                    line: line_no,
                    text: text.to_owned(),
                });
            }
            pairs.push((key.to_owned(), value.trim().to_owned()));
        }

        if !closed {
            return Err(MalformedDocument::Unterminated);
        }

        Ok((Self { pairs }, rest))
    }

    /// Value for `key`, or `None`. First occurrence wins for duplicates.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All pairs in authored order.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Serialize back to a marker-delimited block.
    ///
    /// Round-trips with [`FrontMatter::parse`]: the parsed pairs of the
    /// output equal `self.pairs()`.
    pub fn serialize(&self) -> String {
        let mut out = String::with_capacity(self.pairs.len() * 24 + 8);
        out.push_str(MARKER);
        out.push('\n');
        for (key, value) in &self.pairs {
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
        out.push_str(MARKER);
        out.push('\n');
        out
    }

    #[cfg(test)]
    pub(crate) fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }
}

/// Take the next line off `rest`, excluding the newline.
fn take_line<'a>(rest: &mut &'a str) -> &'a str {
    match rest.find('\n') {
        Some(i) => {
            let line = &rest[..i];
            *rest = &rest[i + 1..];
            line
        }
        None => {
            let line = *rest;
            *rest = "";
            line
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
