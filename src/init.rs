//! Site initialization module.
//!
//! Creates new site structure with default configuration and a sample page.

use crate::config::SiteConfig;
use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

/// Files to write ignore patterns to
const IGNORE_FILES: &[&str] = &[".gitignore", ".ignore"];

/// Default config filename
const CONFIG_FILE: &str = "quire.toml";

/// Default site directory structure
const SITE_DIRS: &[&str] = &["content"];

/// Sample page demonstrating the front-matter and body dialect
const SAMPLE_PAGE: &str = "\
---
title: Welcome
date: 2026-01-01
weight: 10
---

# Welcome

Your first content page. Front matter between the `---` markers carries
the page title, date and weight; `weight` orders sibling pages in
generated listings, ascending.

> Well begun is half done.
> — Aristotle
";

/// Create a new site with default structure
pub fn new_site(config: &'static SiteConfig, has_name: bool) -> Result<()> {
    let root = config.get_root();

    // Safety check: if no name was provided (init in current dir),
    // the directory must be completely empty
    if !has_name && !is_dir_empty(root)? {
        bail!(
            "Current directory is not empty. Use `quire init <SITE_NAME>` to create in a subdirectory."
        );
    }

    init_site_structure(root)?;
    init_default_config(root)?;
    init_ignored_files(root, &[&config.build.output])?;
    fs::write(root.join("content").join("index.md"), SAMPLE_PAGE)?;

    Ok(())
}

/// Check if a directory is completely empty
fn is_dir_empty(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Write default configuration file
fn init_default_config(root: &Path) -> Result<()> {
    let mut config = SiteConfig::default();
    // Write relative paths, not the normalized absolute ones
    config.build.root = None;
    config.build.content = "content".into();
    config.build.output = "public".into();

    let content = toml::to_string_pretty(&config)?;
    fs::write(root.join(CONFIG_FILE), content)?;
    Ok(())
}

/// Create site directory structure
fn init_site_structure(root: &Path) -> Result<()> {
    for dir in SITE_DIRS {
        let path = root.join(dir);
        if path.exists() {
            bail!(
                "Path `{}` already exists. Try `quire init <SITE_NAME>` instead.",
                path.display()
            );
        }
        fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
    }
    Ok(())
}

/// Initialize .gitignore and .ignore files with specified paths
fn init_ignored_files(root: &Path, paths: &[&Path]) -> Result<()> {
    let content = paths
        .iter()
        .filter_map(|p| p.file_name())
        .map(|name| format!("/{}", name.to_string_lossy()))
        .collect::<Vec<_>>()
        .join("\n");

    for filename in IGNORE_FILES {
        let path = root.join(filename);
        if !path.exists() {
            fs::write(&path, &content)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentPage;

    #[test]
    fn test_sample_page_parses() {
        let page = ContentPage::parse(SAMPLE_PAGE).unwrap();
        assert_eq!(page.meta.title, Some("Welcome".into()));
        assert_eq!(page.meta.weight, Some(10));
    }

    #[test]
    fn test_is_dir_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(is_dir_empty(dir.path()).unwrap());

        fs::write(dir.path().join("file"), "x").unwrap();
        assert!(!is_dir_empty(dir.path()).unwrap());
    }

    #[test]
    fn test_is_dir_empty_missing_path() {
        assert!(is_dir_empty(Path::new("/nonexistent/quire-test")).unwrap());
    }

    #[test]
    fn test_init_ignored_files() {
        let dir = tempfile::tempdir().unwrap();
        init_ignored_files(dir.path(), &[Path::new("/site/public")]).unwrap();

        let content = fs::read_to_string(dir.path().join(".gitignore")).unwrap();
        assert_eq!(content, "/public");
    }
}
