//! Site building orchestration.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── collect_content_files() ──► .md files under content/
//!     │
//!     ├── process_page() (parallel)
//!     │       │
//!     │       ├── ContentPage::parse() ──► front matter + blocks
//!     │       ├── render_body() ──► HTML fragment
//!     │       └── page template + minify ──► public/<path>/index.html
//!     │
//!     └── write_section_indexes() ──► weight-ordered listings for
//!                                     directories without an authored index
//! ```
//!
//! Pages are self-contained and read-only after authoring, so they are
//! processed in any order and in parallel with no coordination. A page with
//! malformed front matter is excluded from the build; the failure is logged
//! per file and surfaced as a build error once all other pages are written.

use crate::{
    config::SiteConfig,
    content::ContentPage,
    log,
    render::{html_escape, render_body},
};
use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use rayon::prelude::*;
use std::{
    borrow::Cow,
    cmp::Ordering,
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Page shell template (embedded at compile time)
const PAGE_TEMPLATE: &str = include_str!("embed/page.html");

// ============================================================================
// Page records
// ============================================================================

/// A built page, as seen by listings and the dev server.
#[derive(Debug, Clone)]
pub struct SitePage {
    /// Relative path without extension (e.g. `guide/style`)
    pub relative: String,
    /// URL path component (e.g. `/guide/style/`)
    pub url_path: String,
    /// Display title (front matter, or file stem fallback)
    pub title: String,
    /// Ordering weight among sibling pages; unweighted pages sort last
    pub weight: Option<i64>,
    /// Authoring date for display in listings
    pub date: Option<NaiveDate>,
}

/// Collection of all pages in the site.
#[derive(Debug, Default)]
pub struct Pages {
    pub items: Vec<SitePage>,
}

impl Pages {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ============================================================================
// Build entry point
// ============================================================================

/// Build the entire site, processing content pages in parallel.
///
/// If `config.build.clean` is true, clears the output directory first.
/// Returns the collected page records, sorted by weight.
pub fn build_site(config: &'static SiteConfig) -> Result<Pages> {
    let output = &config.build.output;

    if config.build.clean && output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("Failed to clear output directory: {}", output.display()))?;
    }
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))?;

    let content_files = collect_content_files(&config.build.content);
    log!("build"; "found {} pages", content_files.len());

    let results: Vec<_> = content_files
        .par_iter()
        .map(|path| process_page(path, config))
        .collect();

    let mut pages = Vec::new();
    let mut failed = 0usize;
    for (path, result) in content_files.iter().zip(results) {
        match result {
            Ok(Some(page)) => pages.push(page),
            Ok(None) => {} // draft
            Err(err) => {
                failed += 1;
                log!("error"; "{}: {:#}", path.display(), err);
            }
        }
    }

    sort_pages(&mut pages);
    write_section_indexes(&pages, config)?;

    if failed > 0 {
        bail!("{failed} page(s) excluded from the build, see errors above");
    }

    log!("build"; "done");
    Ok(Pages { items: pages })
}

/// Collect all .md files under the content directory.
pub fn collect_content_files(content_dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(content_dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "md"))
        .collect()
}

// ============================================================================
// Single page processing
// ============================================================================

/// Parse, render and write a single content page.
///
/// Returns `Some(SitePage)` if written, `None` if the page is a draft.
fn process_page(path: &Path, config: &'static SiteConfig) -> Result<Option<SitePage>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let page = ContentPage::parse(&raw).map_err(|err| anyhow!(err))?;
    if page.meta.draft {
        return Ok(None);
    }

    let paths = page_paths(path, config)?;

    let title = match &page.meta.title {
        Some(title) => title.clone(),
        None => {
            log!("warn"; "{}: no title in front matter, using file name", paths.relative);
            file_stem_title(path)
        }
    };
    if page.meta.weight.is_none() {
        log!("warn"; "{}: no weight in front matter, page will sort last", paths.relative);
    }

    let body = render_body(&page.blocks);
    let html = fill_template(&title, &page.meta.description, &body, config);
    let html = minify(html.into_bytes(), config);

    if let Some(parent) = paths.html.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&paths.html, &*html)
        .with_context(|| format!("Failed to write {}", paths.html.display()))?;

    Ok(Some(SitePage {
        relative: paths.relative,
        url_path: paths.url_path,
        title,
        weight: page.meta.weight,
        date: page.meta.date,
    }))
}

/// Computed output locations for a content file.
struct PagePaths {
    relative: String,
    html: PathBuf,
    url_path: String,
}

/// Map a source .md file to its output HTML location.
///
/// # Path Mapping Examples
///
/// | Source | relative | html |
/// |--------|----------|------|
/// | `content/guide/style.md` | `guide/style` | `public/guide/style/index.html` |
/// | `content/guide/index.md` | `guide/index` | `public/guide/index.html` |
/// | `content/index.md` | `index` | `public/index.html` |
fn page_paths(path: &Path, config: &'static SiteConfig) -> Result<PagePaths> {
    let content_dir = &config.build.content;
    let output_dir = &config.build.output;

    let relative = path
        .strip_prefix(content_dir)
        .map_err(|_| anyhow!("File is not in content directory: {}", path.display()))?
        .to_str()
        .ok_or_else(|| anyhow!("Invalid path encoding"))?
        .strip_suffix(".md")
        .ok_or_else(|| anyhow!("Not a .md file: {}", path.display()))?
        .replace('\\', "/");

    let html = if is_index(&relative) {
        match parent_dir(&relative) {
            "" => output_dir.join("index.html"),
            dir => output_dir.join(dir).join("index.html"),
        }
    } else {
        output_dir.join(&relative).join("index.html")
    };

    let url_path = if is_index(&relative) {
        match parent_dir(&relative) {
            "" => "/".to_owned(),
            dir => format!("/{dir}/"),
        }
    } else {
        format!("/{relative}/")
    };

    Ok(PagePaths {
        relative,
        html,
        url_path,
    })
}

/// Whether a relative path names a directory index page.
fn is_index(relative: &str) -> bool {
    relative == "index" || relative.ends_with("/index")
}

/// Parent directory of a relative path, `""` at the root.
fn parent_dir(relative: &str) -> &str {
    relative.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Display title from the file stem when front matter has none.
fn file_stem_title(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().replace(['-', '_'], " "))
        .unwrap_or_else(|| "untitled".into())
}

// ============================================================================
// Ordering
// ============================================================================

/// Sort pages for listings: weight ascending, unweighted pages last,
/// ties broken by title then source path.
pub fn sort_pages(pages: &mut [SitePage]) {
    pages.sort_by(page_order);
}

fn page_order(a: &SitePage, b: &SitePage) -> Ordering {
    match (a.weight, b.weight) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.title.cmp(&b.title))
    .then_with(|| a.relative.cmp(&b.relative))
}

// ============================================================================
// Section indexes
// ============================================================================

/// Write a listing page for every content directory without an authored
/// index, linking its direct child pages in weight order.
fn write_section_indexes(pages: &[SitePage], config: &'static SiteConfig) -> Result<()> {
    // Group direct children by parent directory, in the already-sorted order
    let mut sections: BTreeMap<&str, Vec<&SitePage>> = BTreeMap::new();
    for page in pages {
        if is_index(&page.relative) {
            continue;
        }
        sections.entry(parent_dir(&page.relative)).or_default().push(page);
    }

    for (dir, children) in sections {
        let has_authored_index = pages.iter().any(|p| {
            p.relative == if dir.is_empty() { "index".to_owned() } else { format!("{dir}/index") }
        });
        if has_authored_index {
            continue;
        }

        let title = if dir.is_empty() {
            config.base.title.clone()
        } else {
            file_stem_title(Path::new(dir))
        };

        let mut listing = format!("<h1>{}</h1>\n<ul class=\"pages\">\n", html_escape(&title));
        for child in children {
            listing.push_str("<li>");
            listing.push_str(&format!(
                "<a href=\"{}\">{}</a>",
                html_escape(&child.url_path),
                html_escape(&child.title)
            ));
            if let Some(date) = child.date {
                listing.push_str(&format!(" <time>{}</time>", date.format("%Y-%m-%d")));
            }
            listing.push_str("</li>\n");
        }
        listing.push_str("</ul>\n");

        let html = fill_template(&title, &None, &listing, config);
        let html = minify(html.into_bytes(), config);

        let out = if dir.is_empty() {
            config.build.output.join("index.html")
        } else {
            config.build.output.join(dir).join("index.html")
        };
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&out, &*html)
            .with_context(|| format!("Failed to write {}", out.display()))?;
    }

    Ok(())
}

// ============================================================================
// Template and minification
// ============================================================================

/// Fill the embedded page template.
#[allow(clippy::literal_string_with_formatting_args)]
fn fill_template(
    title: &str,
    description: &Option<String>,
    content: &str,
    config: &SiteConfig,
) -> String {
    let description_meta = description.as_ref().map_or_else(String::new, |d| {
        format!("<meta name=\"description\" content=\"{}\">\n", html_escape(d))
    });

    PAGE_TEMPLATE
        .replace("{language}", &config.base.language)
        .replace("{description}", &description_meta)
        .replace("{title}", &html_escape(title))
        .replace("{content}", content)
}

/// Minify HTML output when enabled in config.
fn minify(html: Vec<u8>, config: &SiteConfig) -> Cow<'static, [u8]> {
    if !config.build.minify {
        return Cow::Owned(html);
    }
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    Cow::Owned(minify_html::minify(&html, &cfg))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn page(relative: &str, title: &str, weight: Option<i64>) -> SitePage {
        SitePage {
            relative: relative.to_owned(),
            url_path: format!("/{relative}/"),
            title: title.to_owned(),
            weight,
            date: None,
        }
    }

    // ------------------------------------------------------------------------
    // Ordering
    // ------------------------------------------------------------------------

    #[test]
    fn test_sort_weight_ascending() {
        let mut pages = vec![page("b", "B", Some(10)), page("a", "A", Some(5))];
        sort_pages(&mut pages);

        let order: Vec<_> = pages.iter().map(|p| p.relative.as_str()).collect();
        assert_eq!(order, vec!["a", "b"]);
    }

    #[test]
    fn test_sort_unweighted_last() {
        let mut pages = vec![
            page("no-weight", "Z", None),
            page("heavy", "Heavy", Some(100)),
        ];
        sort_pages(&mut pages);

        assert_eq!(pages[0].relative, "heavy");
        assert_eq!(pages[1].relative, "no-weight");
    }

    #[test]
    fn test_sort_tie_breaks_by_title() {
        let mut pages = vec![
            page("zz", "Beta", Some(5)),
            page("aa", "Alpha", Some(5)),
        ];
        sort_pages(&mut pages);

        assert_eq!(pages[0].title, "Alpha");
    }

    #[test]
    fn test_sort_negative_weight_first() {
        let mut pages = vec![page("a", "A", Some(1)), page("b", "B", Some(-3))];
        sort_pages(&mut pages);

        assert_eq!(pages[0].relative, "b");
    }

    #[test]
    fn test_sort_is_stable_total_order() {
        let mut pages = vec![
            page("same", "Same", Some(5)),
            page("same2", "Same", Some(5)),
        ];
        sort_pages(&mut pages);

        // identical weight and title fall back to path order
        assert_eq!(pages[0].relative, "same");
    }

    // ------------------------------------------------------------------------
    // Path mapping helpers
    // ------------------------------------------------------------------------

    #[test]
    fn test_is_index() {
        assert!(is_index("index"));
        assert!(is_index("guide/index"));
        assert!(!is_index("guide/style"));
        assert!(!is_index("reindex"));
    }

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir("guide/style"), "guide");
        assert_eq!(parent_dir("a/b/c"), "a/b");
        assert_eq!(parent_dir("index"), "");
    }

    #[test]
    fn test_file_stem_title() {
        assert_eq!(file_stem_title(Path::new("coding-style.md")), "coding style");
        assert_eq!(file_stem_title(Path::new("dir/some_page.md")), "some page");
    }

    // ------------------------------------------------------------------------
    // Template
    // ------------------------------------------------------------------------

    #[test]
    fn test_fill_template_title_and_content() {
        let config = SiteConfig::default();
        let html = fill_template("Coding style", &None, "<p>body</p>\n", &config);

        assert!(html.contains("<title>Coding style</title>"));
        assert!(html.contains("<p>body</p>"));
        assert!(html.contains("lang=\"en-US\""));
        assert!(!html.contains("{description}"));
    }

    #[test]
    fn test_fill_template_description_meta() {
        let config = SiteConfig::default();
        let html = fill_template("T", &Some("A \"quoted\" summary".into()), "", &config);

        assert!(html.contains("name=\"description\""));
        assert!(html.contains("&quot;quoted&quot;"));
    }

    #[test]
    fn test_fill_template_escapes_title() {
        let config = SiteConfig::default();
        let html = fill_template("a < b", &None, "", &config);

        assert!(html.contains("<title>a &lt; b</title>"));
    }

    #[test]
    fn test_minify_disabled_returns_input() {
        let mut config = SiteConfig::default();
        config.build.minify = false;

        let html = b"<p>  spaced  </p>".to_vec();
        let result = minify(html.clone(), &config);
        assert_eq!(&*result, html.as_slice());
    }

    // ------------------------------------------------------------------------
    // End-to-end builds
    // ------------------------------------------------------------------------

    fn site_config(root: &Path) -> &'static SiteConfig {
        let mut config = SiteConfig::default();
        config.base.title = "Handbook".into();
        config.build.content = root.join("content");
        config.build.output = root.join("public");
        config.build.minify = false;
        Box::leak(Box::new(config))
    }

    fn write_page(root: &Path, relative: &str, content: &str) {
        let path = root.join("content").join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_build_site_writes_pretty_urls() {
        let dir = tempfile::tempdir().unwrap();
        let config = site_config(dir.path());

        write_page(
            dir.path(),
            "index.md",
            "---\ntitle: Home\nweight: 1\n---\n\nWelcome.\n",
        );
        write_page(
            dir.path(),
            "guide/style.md",
            "---\ntitle: Coding style\nweight: 10\n---\n\n# Style\n",
        );

        let pages = build_site(config).unwrap();
        assert_eq!(pages.len(), 2);

        assert!(dir.path().join("public/index.html").is_file());
        assert!(dir.path().join("public/guide/style/index.html").is_file());

        let html =
            fs::read_to_string(dir.path().join("public/guide/style/index.html")).unwrap();
        assert!(html.contains("<title>Coding style</title>"));
        assert!(html.contains("<h1 id=\"style\">Style</h1>"));
    }

    #[test]
    fn test_build_site_section_listing_in_weight_order() {
        let dir = tempfile::tempdir().unwrap();
        let config = site_config(dir.path());

        // No authored guide/index.md, so a listing is generated
        write_page(
            dir.path(),
            "guide/setup.md",
            "---\ntitle: Setup\nweight: 20\n---\n\nSetup.\n",
        );
        write_page(
            dir.path(),
            "guide/style.md",
            "---\ntitle: Style\nweight: 10\n---\n\nStyle.\n",
        );

        build_site(config).unwrap();

        let listing =
            fs::read_to_string(dir.path().join("public/guide/index.html")).unwrap();
        let style_pos = listing.find("/guide/style/").unwrap();
        let setup_pos = listing.find("/guide/setup/").unwrap();
        assert!(style_pos < setup_pos, "weight 10 must precede weight 20");
    }

    #[test]
    fn test_build_site_authored_index_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let config = site_config(dir.path());

        write_page(
            dir.path(),
            "guide/index.md",
            "---\ntitle: Guide\nweight: 1\n---\n\nAuthored index.\n",
        );
        write_page(
            dir.path(),
            "guide/style.md",
            "---\ntitle: Style\nweight: 10\n---\n\nStyle.\n",
        );

        build_site(config).unwrap();

        let html = fs::read_to_string(dir.path().join("public/guide/index.html")).unwrap();
        assert!(html.contains("Authored index."));
        assert!(!html.contains("class=\"pages\""));
    }

    #[test]
    fn test_build_site_malformed_page_fails_build() {
        let dir = tempfile::tempdir().unwrap();
        let config = site_config(dir.path());

        write_page(
            dir.path(),
            "good.md",
            "---\ntitle: Good\nweight: 1\n---\n\nFine.\n",
        );
        write_page(dir.path(), "bad.md", "---\ntitle: Bad\nnever closed\n");

        let result = build_site(config);
        assert!(result.is_err());

        // Healthy pages are still written before the build is failed
        assert!(dir.path().join("public/good/index.html").is_file());
    }

    #[test]
    fn test_build_site_skips_drafts() {
        let dir = tempfile::tempdir().unwrap();
        let config = site_config(dir.path());

        write_page(
            dir.path(),
            "wip.md",
            "---\ntitle: WIP\ndraft: true\n---\n\nNot yet.\n",
        );
        write_page(
            dir.path(),
            "done.md",
            "---\ntitle: Done\nweight: 1\n---\n\nShipped.\n",
        );

        let pages = build_site(config).unwrap();
        assert_eq!(pages.len(), 1);
        assert!(!dir.path().join("public/wip").exists());
    }
}
