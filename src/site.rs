//! Rendering records to disk.
//!
//! [`render_record`] is the single-page path used by `render`; [`build_site`]
//! walks a directory of records and writes one `index.html` per slug.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{Locale, SiteConfig};
use crate::content::PageContent;
use crate::error::{Error, Result};
use crate::page::{render_page, PageContext};
use crate::toc;
use crate::web_assets;

/// Counts reported by [`build_site`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub rendered: usize,
    pub skipped: usize,
}

/// Output slug for a record: `fields.slug` without surrounding slashes, or
/// the record's file stem.
pub fn record_slug(page: &PageContent, record_path: &Path) -> String {
    match page.fields.slug.as_deref() {
        Some(slug) => slug.trim_matches('/').to_owned(),
        None => record_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

/// URL path a slug is served at.
pub fn slug_path(slug: &str) -> String {
    if slug.is_empty() {
        "/".to_owned()
    } else {
        format!("/{slug}/")
    }
}

/// Relative output directory for a slug.
///
/// Empty and `.` components are dropped; any `..` component is rejected so
/// output can never land outside the build directory.
pub fn slug_dir(slug: &str) -> Result<PathBuf> {
    let mut dir = PathBuf::new();
    for component in slug.split('/') {
        match component {
            "" | "." => {}
            ".." => return Err(Error::InvalidSlug(slug.to_owned())),
            name if name.contains('\\') => return Err(Error::InvalidSlug(slug.to_owned())),
            name => dir.push(name),
        }
    }
    Ok(dir)
}

/// Render one record, logging TOC anchors the content does not define.
pub fn render_record(page: &PageContent, path: &str, locale: &Locale, config: &SiteConfig) -> String {
    for anchor in toc::broken_anchors(page) {
        tracing::warn!(
            path,
            fragment = %anchor.fragment,
            "toc anchor has no matching heading"
        );
    }
    render_page(
        page,
        &PageContext {
            path,
            locale,
            config,
        },
    )
}

/// `*.json` files directly under `dir`, sorted by path.
fn record_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| Error::io(path, e))
}

/// Render every record in `input_dir` into `out_dir`.
///
/// A record that fails to load or has an invalid slug is logged and skipped.
/// Failing to list the input or to write output aborts the build.
pub fn build_site(
    input_dir: &Path,
    out_dir: &Path,
    locale: &Locale,
    config: &SiteConfig,
) -> Result<BuildSummary> {
    let mut summary = BuildSummary::default();

    for record in record_files(input_dir)? {
        let page = match PageContent::load(&record) {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(record = %record.display(), error = %e, "skipping record");
                summary.skipped += 1;
                continue;
            }
        };
        let slug = record_slug(&page, &record);
        let dir = match slug_dir(&slug) {
            Ok(dir) => dir,
            Err(e) => {
                tracing::warn!(record = %record.display(), error = %e, "skipping record");
                summary.skipped += 1;
                continue;
            }
        };

        let html = render_record(&page, &slug_path(&slug), locale, config);
        let target = out_dir.join(dir).join("index.html");
        write_file(&target, &html)?;
        tracing::info!(record = %record.display(), output = %target.display(), "rendered");
        summary.rendered += 1;
    }

    let css = out_dir.join("assets").join(web_assets::CSS_FILE);
    write_file(&css, web_assets::CSS)?;

    tracing::info!(
        rendered = summary.rendered,
        skipped = summary.skipped,
        "build complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(slug: Option<&str>, title: &str) -> String {
        let slug = match slug {
            Some(s) => format!(r#""slug": "{s}","#),
            None => String::new(),
        };
        format!(
            r##"{{
  "html": "<h2 id=\"a\">A</h2>",
  "tableOfContents": "<ul><li><a href=\"#a\">A</a></li></ul>",
  "frontmatter": {{ "title": "{title}" }},
  "fields": {{ {slug} "type": "guide" }}
}}"##
        )
    }

    #[test]
    fn slug_prefers_fields_then_stem() {
        let mut page = PageContent::default();
        assert_eq!(record_slug(&page, Path::new("in/intro.json")), "intro");
        page.fields.slug = Some("/guide/start/".to_owned());
        assert_eq!(record_slug(&page, Path::new("in/intro.json")), "guide/start");
    }

    #[test]
    fn slug_path_shapes() {
        assert_eq!(slug_path(""), "/");
        assert_eq!(slug_path("guide/start"), "/guide/start/");
    }

    #[test]
    fn slug_dir_rejects_traversal() {
        assert_eq!(slug_dir("guide/./start").unwrap(), PathBuf::from("guide/start"));
        assert!(matches!(slug_dir("../etc"), Err(Error::InvalidSlug(_))));
        assert!(matches!(slug_dir("a/../../b"), Err(Error::InvalidSlug(_))));
        assert!(matches!(slug_dir("a\\b"), Err(Error::InvalidSlug(_))));
    }

    #[test]
    fn build_writes_pages_and_stylesheet() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        fs::write(input.path().join("b.json"), record(Some("/guide/b/"), "B")).unwrap();
        fs::write(input.path().join("a.json"), record(None, "A")).unwrap();
        fs::write(input.path().join("notes.txt"), "ignored").unwrap();

        let summary = build_site(
            input.path(),
            output.path(),
            &Locale::default(),
            &SiteConfig::default(),
        )
        .unwrap();
        assert_eq!(summary, BuildSummary { rendered: 2, skipped: 0 });

        let a = fs::read_to_string(output.path().join("a/index.html")).unwrap();
        assert!(a.contains("<h1 class=\"page-title\">A</h1>"));
        let b = fs::read_to_string(output.path().join("guide/b/index.html")).unwrap();
        assert!(b.contains("<h1 class=\"page-title\">B</h1>"));
        let css = fs::read_to_string(output.path().join("assets/mdpage.css")).unwrap();
        assert_eq!(css, web_assets::CSS);
    }

    #[test]
    fn build_skips_bad_records() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        fs::write(input.path().join("good.json"), record(None, "Good")).unwrap();
        fs::write(input.path().join("broken.json"), "{ not json").unwrap();
        fs::write(input.path().join("evil.json"), record(Some("../../escape"), "Evil")).unwrap();

        let summary = build_site(
            input.path(),
            output.path(),
            &Locale::default(),
            &SiteConfig::default(),
        )
        .unwrap();
        assert_eq!(summary, BuildSummary { rendered: 1, skipped: 2 });
        assert!(output.path().join("good/index.html").exists());
        assert!(!output.path().join("escape").exists());
    }

    #[test]
    fn build_missing_input_dir_is_error() {
        let output = TempDir::new().unwrap();
        let err = build_site(
            &output.path().join("nope"),
            output.path(),
            &Locale::default(),
            &SiteConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn render_record_marks_current_sidebar_item() {
        let yaml = "sidebars:\n  guide:\n    - title: A\n      slug: /a/\n";
        let config = SiteConfig::from_yaml(yaml, Path::new("site.yml")).unwrap();
        let page = PageContent::from_json(&record(None, "A"), Path::new("a.json")).unwrap();
        let html = render_record(&page, "/a/", &Locale::default(), &config);
        assert!(html.contains("<li class=\"current\"><a href=\"/a/\">A</a></li>"));
    }
}
