//! Rendering of parsed pages to target markup.

pub mod html;

pub use html::{heading_slug, html_escape, render_body};
