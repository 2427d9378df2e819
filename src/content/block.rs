//! Body block model and parser.
//!
//! The body of a content page is an ordered sequence of block elements in a
//! lightweight markup dialect: headings via leading `#`, fenced code blocks
//! via triple backticks, block quotations via leading `>`, ordered and
//! unordered lists, thematic breaks, and paragraphs. Block order is
//! significant and preserved verbatim.
//!
//! The dialect is fail-open: constructs it does not recognize (inline HTML
//! blocks, exotic markup) become [`Block::Raw`] and pass through to the
//! renderer literally rather than being rejected. The renderer's dialect may
//! be a superset of what authors anticipate.

// ============================================================================
// Model
// ============================================================================

/// Inline span within a heading, paragraph, list item or quotation line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    /// Plain text.
    Text(String),
    /// Inline code between backticks; content kept literal.
    Code(String),
    /// Strong emphasis (`**text**`).
    Strong(String),
    /// Emphasis (`*text*` or `_text_`).
    Emph(String),
    /// Hyperlink (`[text](href)`).
    Link { text: String, href: String },
}

/// A block element of the page body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Heading with level 1..=6.
    Heading { level: u8, spans: Vec<Span> },
    /// Paragraph of consecutive plain lines.
    Paragraph(Vec<Span>),
    /// Ordered or unordered list; items stay grouped under one list.
    List {
        ordered: bool,
        start: u64,
        items: Vec<Vec<Span>>,
    },
    /// Block quotation, optionally with an attribution line.
    ///
    /// The attribution is a final quote line opening with `—` or `--`.
    /// It stays a distinct sub-element and never merges into the body lines.
    Quote {
        lines: Vec<Vec<Span>>,
        attribution: Option<Vec<Span>>,
    },
    /// Fenced code block; `literal` is preserved byte-for-byte.
    CodeFence {
        lang: Option<String>,
        literal: String,
    },
    /// Thematic break (`---`, `***`, `___`).
    Rule,
    /// Unrecognized block construct, passed through literally.
    Raw(String),
}

impl Block {
    /// Stable name of the block type, used for order-preservation checks.
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Heading { .. } => "heading",
            Self::Paragraph(_) => "paragraph",
            Self::List { .. } => "list",
            Self::Quote { .. } => "quote",
            Self::CodeFence { .. } => "code",
            Self::Rule => "rule",
            Self::Raw(_) => "raw",
        }
    }
}

// ============================================================================
// Block parsing
// ============================================================================

/// Parse a body into its ordered block sequence.
pub fn parse_blocks(body: &str) -> Vec<Block> {
    let lines: Vec<&str> = body.lines().collect();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let trimmed = line.trim_end();

        if trimmed.trim().is_empty() {
            i += 1;
            continue;
        }

        if let Some(lang) = fence_open(trimmed) {
            let (block, next) = parse_fence(&lines, i + 1, lang);
            blocks.push(block);
            i = next;
        } else if is_rule(trimmed) {
            blocks.push(Block::Rule);
            i += 1;
        } else if let Some((level, rest)) = heading_marker(trimmed) {
            blocks.push(Block::Heading {
                level,
                spans: parse_spans(rest),
            });
            i += 1;
        } else if trimmed.starts_with('>') {
            let (block, next) = parse_quote(&lines, i);
            blocks.push(block);
            i = next;
        } else if list_marker(trimmed).is_some() {
            let (block, next) = parse_list(&lines, i);
            blocks.push(block);
            i = next;
        } else if trimmed.starts_with('<') {
            let (block, next) = parse_raw(&lines, i);
            blocks.push(block);
            i = next;
        } else {
            let (block, next) = parse_paragraph(&lines, i);
            blocks.push(block);
            i = next;
        }
    }

    blocks
}

/// Opening fence: ` ``` ` optionally followed by a language tag.
fn fence_open(line: &str) -> Option<Option<String>> {
    let rest = line.strip_prefix("```")?;
    let tag = rest.trim();
    Some((!tag.is_empty()).then(|| tag.to_owned()))
}

/// Closing fence: a bare ` ``` ` line.
fn fence_close(line: &str) -> bool {
    line.trim_end() == "```"
}

/// Collect fence content until the closing marker.
///
/// An unterminated fence swallows the rest of the document as literal code
/// rather than failing.
fn parse_fence(lines: &[&str], mut i: usize, lang: Option<String>) -> (Block, usize) {
    let mut content = Vec::new();
    while i < lines.len() {
        if fence_close(lines[i]) {
            i += 1;
            break;
        }
        content.push(lines[i]);
        i += 1;
    }
    (
        Block::CodeFence {
            lang,
            literal: content.join("\n"),
        },
        i,
    )
}

/// Thematic break: three or more of the same `-`, `*` or `_`, nothing else.
fn is_rule(line: &str) -> bool {
    let line = line.trim();
    let mut chars = line.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    matches!(first, '-' | '*' | '_') && line.len() >= 3 && line.chars().all(|c| c == first)
}

/// Heading marker: 1-6 `#` characters followed by a space.
fn heading_marker(line: &str) -> Option<(u8, &str)> {
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    let rest = line[hashes..].strip_prefix(' ')?;
    Some((u8::try_from(hashes).ok()?, rest.trim()))
}

/// List marker for a line, if any.
///
/// Returns `(ordered, start_number, item_text)`.
fn list_marker(line: &str) -> Option<(bool, u64, &str)> {
    // Unordered: `- `, `* `, `+ `
    if let Some(rest) = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .or_else(|| line.strip_prefix("+ "))
    {
        return Some((false, 1, rest.trim()));
    }

    // Ordered: `1. ` or `1) `
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let after = &line[digits..];
    let rest = after
        .strip_prefix(". ")
        .or_else(|| after.strip_prefix(") "))?;
    let start = line[..digits].parse().ok()?;
    Some((true, start, rest.trim()))
}

/// Collect consecutive items of one list kind.
///
/// Indented continuation lines fold into the previous item. A blank line or
/// a line of the other list kind ends the list.
fn parse_list(lines: &[&str], mut i: usize) -> (Block, usize) {
    let (ordered, start, first) = list_marker(lines[i].trim_end()).unwrap_or((false, 1, ""));
    let mut items: Vec<String> = vec![first.to_owned()];
    i += 1;

    while i < lines.len() {
        let line = lines[i].trim_end();
        if line.trim().is_empty() {
            break;
        }
        match list_marker(line) {
            Some((kind, _, text)) if kind == ordered => {
                items.push(text.to_owned());
                i += 1;
            }
            Some(_) => break,
            None if line.starts_with(' ') || line.starts_with('\t') => {
                // continuation of the previous item
                if let Some(last) = items.last_mut() {
                    last.push(' ');
                    last.push_str(line.trim());
                }
                i += 1;
            }
            None => break,
        }
    }

    (
        Block::List {
            ordered,
            start,
            items: items.iter().map(|item| parse_spans(item)).collect(),
        },
        i,
    )
}

/// Collect consecutive `>` lines into a quotation.
///
/// A final non-empty quote line opening with `—` or `--` becomes the
/// attribution, provided at least one body line precedes it.
fn parse_quote(lines: &[&str], mut i: usize) -> (Block, usize) {
    let mut quoted: Vec<String> = Vec::new();
    while i < lines.len() {
        let line = lines[i].trim_end();
        let Some(rest) = line.strip_prefix('>') else {
            break;
        };
        quoted.push(rest.strip_prefix(' ').unwrap_or(rest).to_owned());
        i += 1;
    }

    // Drop blank quote lines at the edges, keep interior ones out entirely
    let body: Vec<&String> = quoted.iter().filter(|l| !l.trim().is_empty()).collect();

    let mut attribution = None;
    let mut end = body.len();
    if body.len() > 1 {
        if let Some(text) = attribution_text(body[body.len() - 1]) {
            attribution = Some(parse_spans(text));
            end -= 1;
        }
    }

    (
        Block::Quote {
            lines: body[..end].iter().map(|l| parse_spans(l)).collect(),
            attribution,
        },
        i,
    )
}

/// Strip the attribution dash from a quote line, if it is one.
fn attribution_text(line: &str) -> Option<&str> {
    let line = line.trim();
    let rest = line
        .strip_prefix('—')
        .or_else(|| line.strip_prefix("--"))?;
    Some(rest.trim_start_matches('-').trim())
}

/// Unrecognized block (e.g. inline HTML): pass lines through literally
/// until a blank line.
fn parse_raw(lines: &[&str], mut i: usize) -> (Block, usize) {
    let mut raw = Vec::new();
    while i < lines.len() && !lines[i].trim().is_empty() {
        raw.push(lines[i]);
        i += 1;
    }
    (Block::Raw(raw.join("\n")), i)
}

/// Consecutive plain lines form one paragraph; a blank line or the start of
/// any recognized block ends it.
fn parse_paragraph(lines: &[&str], mut i: usize) -> (Block, usize) {
    let mut text = String::new();
    while i < lines.len() {
        let line = lines[i].trim_end();
        if line.trim().is_empty()
            || fence_open(line).is_some()
            || is_rule(line)
            || heading_marker(line).is_some()
            || line.starts_with('>')
            || list_marker(line).is_some()
            || line.starts_with('<')
        {
            break;
        }
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(line.trim());
        i += 1;
    }
    (Block::Paragraph(parse_spans(&text)), i)
}

// ============================================================================
// Inline parsing
// ============================================================================

/// Parse inline spans: text, `code`, **strong**, *emphasis*, [links](url).
///
/// Unmatched delimiters fall back to literal text.
pub fn parse_spans(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut plain = String::new();
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < text.len() {
        let rest = &text[i..];

        if rest.starts_with('`') {
            if let Some(end) = rest[1..].find('`') {
                flush(&mut spans, &mut plain);
                spans.push(Span::Code(rest[1..=end].to_owned()));
                i += end + 2;
                continue;
            }
        } else if rest.starts_with("**") {
            if let Some(end) = rest[2..].find("**") {
                if end > 0 {
                    flush(&mut spans, &mut plain);
                    spans.push(Span::Strong(rest[2..2 + end].to_owned()));
                    i += end + 4;
                    continue;
                }
            }
        } else if rest.starts_with('[') {
            if let Some((text_part, href, len)) = link_parts(rest) {
                flush(&mut spans, &mut plain);
                spans.push(Span::Link {
                    text: text_part.to_owned(),
                    href: href.to_owned(),
                });
                i += len;
                continue;
            }
        } else if (rest.starts_with('*') || rest.starts_with('_')) && at_boundary(bytes, i) {
            let delim = rest.as_bytes()[0] as char;
            if let Some(end) = rest[1..].find(delim) {
                let inner = &rest[1..=end];
                if !inner.is_empty() && !inner.starts_with(' ') && !inner.ends_with(' ') {
                    flush(&mut spans, &mut plain);
                    spans.push(Span::Emph(inner.to_owned()));
                    i += end + 2;
                    continue;
                }
            }
        }

        let ch = rest.chars().next().unwrap_or('\0');
        plain.push(ch);
        i += ch.len_utf8();
    }

    flush(&mut spans, &mut plain);
    spans
}

fn flush(spans: &mut Vec<Span>, plain: &mut String) {
    if !plain.is_empty() {
        spans.push(Span::Text(std::mem::take(plain)));
    }
}

/// Emphasis may only open at the start of the text or after whitespace,
/// so identifiers like `do_not_touch` stay literal.
fn at_boundary(bytes: &[u8], i: usize) -> bool {
    i == 0 || bytes[i - 1].is_ascii_whitespace()
}

/// Split `[text](href)` at the head of `rest`.
///
/// Returns `(text, href, consumed_len)`.
fn link_parts(rest: &str) -> Option<(&str, &str, usize)> {
    let close = rest.find("](")?;
    let text = &rest[1..close];
    let after = &rest[close + 2..];
    let end = after.find(')')?;
    let href = &after[..end];
    if text.contains('[') || href.contains('(') {
        return None;
    }
    Some((text, href, close + 2 + end + 1))
}

// ============================================================================
// Tests
// ============================================================================
