//! HTML rendering of body block sequences.
//!
//! Rendering preserves block count and relative order: the tag sequence of
//! the output equals the block sequence of the input. Fenced code content is
//! emitted byte-for-byte apart from markup-safe encoding of reserved
//! characters; raw passthrough blocks are emitted verbatim.

use crate::content::{Block, Span};
use std::borrow::Cow;

// ============================================================================
// Public API
// ============================================================================

/// Render a block sequence to HTML, one top-level element per block.
pub fn render_body(blocks: &[Block]) -> String {
    let mut out = String::with_capacity(blocks.len() * 64);
    for block in blocks {
        render_block(&mut out, block);
    }
    out
}

/// Escape HTML special characters.
///
/// Uses `Cow` to avoid allocation when no escaping is needed.
#[inline]
pub fn html_escape(s: &str) -> Cow<'_, str> {
    // Fast path: check if escaping is needed
    if !s.contains(['<', '>', '&', '"']) {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Fragment id for a heading: lowercase, alphanumerics kept, whitespace
/// collapsed to single dashes, everything else dropped.
pub fn heading_slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            for lower in c.to_lowercase() {
                slug.push(lower);
            }
        } else if c.is_whitespace() || c == '-' {
            pending_dash = true;
        }
    }
    slug
}

// ============================================================================
// Blocks
// ============================================================================

fn render_block(out: &mut String, block: &Block) {
    match block {
        Block::Heading { level, spans } => {
            let id = heading_slug(&spans_plain_text(spans));
            out.push_str(&format!("<h{level} id=\"{id}\">"));
            render_spans(out, spans);
            out.push_str(&format!("</h{level}>\n"));
        }
        Block::Paragraph(spans) => {
            out.push_str("<p>");
            render_spans(out, spans);
            out.push_str("</p>\n");
        }
        Block::List {
            ordered,
            start,
            items,
        } => {
            let open = match (ordered, start) {
                (false, _) => "<ul>".to_owned(),
                (true, 1) => "<ol>".to_owned(),
                (true, n) => format!("<ol start=\"{n}\">"),
            };
            out.push_str(&open);
            out.push('\n');
            for item in items {
                out.push_str("<li>");
                render_spans(out, item);
                out.push_str("</li>\n");
            }
            out.push_str(if *ordered { "</ol>\n" } else { "</ul>\n" });
        }
        Block::Quote { lines, attribution } => {
            out.push_str("<blockquote>\n");
            for line in lines {
                out.push_str("<p>");
                render_spans(out, line);
                out.push_str("</p>\n");
            }
            // Attribution is a distinct sub-element, never merged into the
            // quotation text
            if let Some(attribution) = attribution {
                out.push_str("<cite>");
                render_spans(out, attribution);
                out.push_str("</cite>\n");
            }
            out.push_str("</blockquote>\n");
        }
        Block::CodeFence { lang, literal } => {
            match lang {
                Some(lang) => out.push_str(&format!(
                    "<pre><code class=\"language-{}\">",
                    html_escape(lang)
                )),
                None => out.push_str("<pre><code>"),
            }
            out.push_str(&html_escape(literal));
            out.push_str("\n</code></pre>\n");
        }
        Block::Rule => out.push_str("<hr>\n"),
        Block::Raw(raw) => {
            out.push_str(raw);
            out.push('\n');
        }
    }
}

// ============================================================================
// Spans
// ============================================================================

fn render_spans(out: &mut String, spans: &[Span]) {
    for span in spans {
        match span {
            Span::Text(text) => out.push_str(&html_escape(text)),
            Span::Code(code) => {
                out.push_str("<code>");
                out.push_str(&html_escape(code));
                out.push_str("</code>");
            }
            Span::Strong(text) => {
                out.push_str("<strong>");
                out.push_str(&html_escape(text));
                out.push_str("</strong>");
            }
            Span::Emph(text) => {
                out.push_str("<em>");
                out.push_str(&html_escape(text));
                out.push_str("</em>");
            }
            Span::Link { text, href } => {
                out.push_str(&format!(
                    "<a href=\"{}\">{}</a>",
                    html_escape(href),
                    html_escape(text)
                ));
            }
        }
    }
}

/// Concatenated plain text of spans, for slug generation.
fn spans_plain_text(spans: &[Span]) -> String {
    let mut text = String::new();
    for span in spans {
        match span {
            Span::Text(t) | Span::Code(t) | Span::Strong(t) | Span::Emph(t) => text.push_str(t),
            Span::Link { text: t, .. } => text.push_str(t),
        }
    }
    text
}

// ============================================================================
// Tests
// ============================================================================
