//! Content page model: front matter, typed metadata, and body blocks.
//!
//! A page is authored once as a text artifact and never mutated at runtime:
//! parsing is a single-pass, side-effect-free transformation, so pages can
//! be processed independently and in parallel with no coordination.

pub mod block;
pub mod front_matter;

pub use block::{Block, Span, parse_blocks, parse_spans};
pub use front_matter::{FrontMatter, MalformedDocument};

use chrono::NaiveDate;

// ============================================================================
// Typed metadata
// ============================================================================

/// Typed view over the raw front-matter pairs.
///
/// `title` and `weight` are needed for correct placement in the generated
/// navigation; their absence is not a parse error, only a placement concern,
/// so all fields degrade gracefully. A non-integer `weight` or unparsable
/// `date` becomes `None`.
///
/// | Field | Source pair | Used for |
/// |-------|-------------|----------|
/// | `title` | `title:` | page `<title>`, listings |
/// | `date` | `date:` | display |
/// | `weight` | `weight:` | ascending order among sibling pages |
/// | `description` | `description:` | meta tag |
/// | `draft` | `draft:` | excluded from build when `true` |
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub weight: Option<i64>,
    pub description: Option<String>,
    pub draft: bool,
}

impl PageMeta {
    /// Interpret the raw pairs.
    pub fn from_front_matter(fm: &FrontMatter) -> Self {
        Self {
            title: fm.get("title").map(str::to_owned).filter(|t| !t.is_empty()),
            date: fm.get("date").and_then(parse_date),
            weight: fm.get("weight").and_then(|w| w.trim().parse().ok()),
            description: fm
                .get("description")
                .map(str::to_owned)
                .filter(|d| !d.is_empty()),
            draft: fm.get("draft").is_some_and(|d| d.trim() == "true"),
        }
    }
}

/// Parse a calendar date from a front-matter value.
///
/// Accepts `YYYY-MM-DD`, alone or as the date part of a full timestamp
/// (`2016-05-09T01:07:46+02:00`).
fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let date_part = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

// ============================================================================
// ContentPage
// ============================================================================

/// A parsed content page: metadata header plus ordered body blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPage {
    /// Raw front-matter pairs, in authored order.
    pub front_matter: FrontMatter,
    /// Typed interpretation of the pairs.
    pub meta: PageMeta,
    /// Body block sequence, order preserved verbatim.
    pub blocks: Vec<Block>,
}

impl ContentPage {
    /// Parse a raw document into a page.
    ///
    /// Fails with [`MalformedDocument`] when the front-matter markers are
    /// missing or unterminated, or a metadata line is not a `key: value`
    /// pair. On failure no partial page is produced. Body parsing itself
    /// never fails; unrecognized constructs pass through as raw blocks.
    pub fn parse(raw: &str) -> Result<Self, MalformedDocument> {
        let (front_matter, body) = FrontMatter::parse(raw)?;
        let meta = PageMeta::from_front_matter(&front_matter);
        let blocks = parse_blocks(body);
        Ok(Self {
            front_matter,
            meta,
            blocks,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
---
title: Coding style
date: 2016-05-09T01:07:46+02:00
weight: 50
---

# Coding style

Guidelines for contributors.

```c
int main(void) { return 0; }
```
";

    #[test]
    fn test_parse_sample() {
        let page = ContentPage::parse(SAMPLE).unwrap();

        assert_eq!(page.meta.title, Some("Coding style".into()));
        assert_eq!(page.meta.weight, Some(50));
        assert_eq!(
            page.meta.date,
            NaiveDate::from_ymd_opt(2016, 5, 9)
        );
        assert_eq!(page.blocks.len(), 3);
    }

    #[test]
    fn test_parse_malformed_propagates() {
        let result = ContentPage::parse("no front matter here\n");
        assert_eq!(result, Err(MalformedDocument::MissingOpening));
    }

    #[test]
    fn test_meta_missing_fields() {
        let page = ContentPage::parse("---\n---\nbody\n").unwrap();

        assert_eq!(page.meta.title, None);
        assert_eq!(page.meta.weight, None);
        assert!(!page.meta.draft);
    }

    #[test]
    fn test_meta_bad_weight_degrades_to_none() {
        let page = ContentPage::parse("---\nweight: heavy\n---\n").unwrap();
        assert_eq!(page.meta.weight, None);
    }

    #[test]
    fn test_meta_negative_weight() {
        let page = ContentPage::parse("---\nweight: -10\n---\n").unwrap();
        assert_eq!(page.meta.weight, Some(-10));
    }

    #[test]
    fn test_meta_draft() {
        let page = ContentPage::parse("---\ndraft: true\n---\n").unwrap();
        assert!(page.meta.draft);

        let page = ContentPage::parse("---\ndraft: false\n---\n").unwrap();
        assert!(!page.meta.draft);
    }

    #[test]
    fn test_parse_date_plain() {
        assert_eq!(parse_date("2016-05-09"), NaiveDate::from_ymd_opt(2016, 5, 9));
    }

    #[test]
    fn test_parse_date_timestamp() {
        assert_eq!(
            parse_date("2016-05-09T01:07:46+02:00"),
            NaiveDate::from_ymd_opt(2016, 5, 9)
        );
    }

    #[test]
    fn test_parse_date_invalid() {
        assert_eq!(parse_date("May 9th"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_front_matter_round_trip_through_page() {
        let page = ContentPage::parse(SAMPLE).unwrap();
        let reparsed = ContentPage::parse(&format!(
            "{}{}",
            page.front_matter.serialize(),
            "body\n"
        ))
        .unwrap();

        assert_eq!(page.front_matter.pairs(), reparsed.front_matter.pairs());
    }
}
