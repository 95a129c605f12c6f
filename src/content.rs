//! Content data contract.
//!
//! A [`PageContent`] is one already-resolved record produced by the
//! content-query layer: pre-rendered markup plus frontmatter and derived
//! fields. Keys follow the data layer's camelCase JSON names.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// One renderable page.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageContent {
    /// Pre-rendered content markup (trusted).
    #[serde(default)]
    pub html: String,
    /// Pre-rendered TOC markup (trusted), depth-limited by the data layer.
    #[serde(default)]
    pub table_of_contents: String,
    pub frontmatter: Frontmatter,
    #[serde(default)]
    pub fields: Fields,
}

/// Author-supplied metadata.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Frontmatter {
    pub title: String,
    pub author: Option<String>,
    /// TOC panel visibility. `None` means visible.
    pub toc: Option<bool>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Fields derived by the data layer.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Fields {
    /// Category tag used to look up the sidebar.
    #[serde(rename = "type", default)]
    pub kind: String,
    pub slug: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub prev_slug: Option<String>,
    pub prev_title: Option<String>,
    pub next_slug: Option<String>,
    pub next_title: Option<String>,
}

/// A neighbouring page in reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sibling<'a> {
    pub slug: &'a str,
    /// Title, falling back to the slug when the data layer gave none.
    pub title: &'a str,
}

impl PageContent {
    /// Parse a record from its JSON text.
    pub fn from_json(text: &str, path: &Path) -> Result<Self> {
        serde_json::from_str(text).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read and parse a record file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(&text, path)
    }

    /// Creation date string; frontmatter wins over derived fields.
    pub fn created_at(&self) -> Option<&str> {
        non_empty(self.frontmatter.created_at.as_deref())
            .or_else(|| non_empty(self.fields.created_at.as_deref()))
    }

    /// Last-updated date string; frontmatter wins over derived fields.
    pub fn updated_at(&self) -> Option<&str> {
        non_empty(self.frontmatter.updated_at.as_deref())
            .or_else(|| non_empty(self.fields.updated_at.as_deref()))
    }

    pub fn author(&self) -> Option<&str> {
        non_empty(self.frontmatter.author.as_deref())
    }

    pub fn toc_visible(&self) -> bool {
        self.frontmatter.toc.unwrap_or(true)
    }

    pub fn prev(&self) -> Option<Sibling<'_>> {
        sibling(&self.fields.prev_slug, &self.fields.prev_title)
    }

    pub fn next(&self) -> Option<Sibling<'_>> {
        sibling(&self.fields.next_slug, &self.fields.next_title)
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn sibling<'a>(slug: &'a Option<String>, title: &'a Option<String>) -> Option<Sibling<'a>> {
    let slug = non_empty(slug.as_deref())?;
    let title = non_empty(title.as_deref()).unwrap_or(slug);
    Some(Sibling { slug, title })
}
