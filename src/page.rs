//! Page rendering.
//!
//! Binds one resolved [`PageContent`] record to the page layout: title,
//! byline, content, updated-date footer, sibling navigation, TOC panel, and
//! category sidebar. The content and TOC markup are pre-rendered by the data
//! layer and inserted verbatim; every other string is escaped here.
//!
//! Rendering never fails. Sections whose data is missing are left out.

use crate::config::{Locale, SidebarItem, SiteConfig, TocSettings};
use crate::content::{PageContent, Sibling};
use crate::dates::format_date;

/// Per-page rendering context.
pub struct PageContext<'a> {
    /// Root-relative URL path of the page being rendered (e.g. `/guide/`).
    pub path: &'a str,
    pub locale: &'a Locale,
    pub config: &'a SiteConfig,
}

// ---------------------------------------------------------------------------
// Private HTML helpers
// ---------------------------------------------------------------------------

/// Minimal HTML entity escaping for text content and attribute values.
pub(crate) fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// A JS string literal safe to place inside an inline `<script>`.
fn js_string(s: &str) -> String {
    serde_json::to_string(s)
        .unwrap_or_else(|_| "\"\"".to_owned())
        .replace('<', "\\u003c")
}

/// `<time>` element for a raw date string.
fn time_html(raw: &str, locale: &Locale) -> String {
    format!(
        "<time datetime=\"{}\">{}</time>",
        html_escape(raw.trim()),
        html_escape(&format_date(raw, &locale.date_format))
    )
}

/// Author and creation-date line. Empty when both are absent.
fn build_byline_html(page: &PageContent, locale: &Locale) -> String {
    let mut parts = Vec::new();
    if let Some(author) = page.author() {
        parts.push(format!(
            "<span class=\"page-author\">{}</span>",
            html_escape(author)
        ));
    }
    if let Some(created) = page.created_at() {
        parts.push(format!(
            "<span class=\"page-date\">{} {}</span>",
            html_escape(&locale.posted_at),
            time_html(created, locale)
        ));
    }
    if parts.is_empty() {
        return String::new();
    }
    format!("<p class=\"page-byline\">{}</p>\n", parts.join(" · "))
}

fn build_updated_html(page: &PageContent, locale: &Locale) -> String {
    match page.updated_at() {
        Some(updated) => format!(
            "<footer class=\"page-updated\">{} {}</footer>\n",
            html_escape(&locale.updated_at),
            time_html(updated, locale)
        ),
        None => String::new(),
    }
}

/// Alignment modifier for the sibling navigation row.
///
/// Both siblings are spaced apart; a lone next link sits on the right;
/// anything else sits on the left.
pub fn nav_alignment(has_prev: bool, has_next: bool) -> &'static str {
    match (has_prev, has_next) {
        (true, true) => "page-nav--between",
        (false, true) => "page-nav--end",
        _ => "page-nav--start",
    }
}

fn sibling_link_html(sibling: &Sibling<'_>, rel: &str, label: &str) -> String {
    format!(
        "<a class=\"page-nav-{rel}\" rel=\"{rel}\" href=\"{}\">\
<span class=\"page-nav-label\">{}</span> \
<span class=\"page-nav-title\">{}</span></a>\n",
        html_escape(sibling.slug),
        html_escape(label),
        html_escape(sibling.title),
    )
}

/// Previous/next row. Empty when the page has no siblings.
fn build_sibling_nav_html(page: &PageContent, locale: &Locale) -> String {
    let prev = page.prev();
    let next = page.next();
    if prev.is_none() && next.is_none() {
        return String::new();
    }
    let mut html = format!(
        "<nav class=\"page-nav {}\">\n",
        nav_alignment(prev.is_some(), next.is_some())
    );
    if let Some(p) = &prev {
        html.push_str(&sibling_link_html(p, "prev", &locale.previous));
    }
    if let Some(n) = &next {
        html.push_str(&sibling_link_html(n, "next", &locale.next));
    }
    html.push_str("</nav>\n");
    html
}

/// The TOC panel. Hidden pages keep the markup so the panel stays queryable.
fn build_toc_panel_html(page: &PageContent) -> String {
    let visibility = if page.toc_visible() {
        ""
    } else {
        " style=\"visibility: hidden\""
    };
    format!(
        "<nav class=\"toc\" aria-label=\"Table of contents\"{visibility}>\n{}</nav>\n",
        page.table_of_contents
    )
}

fn same_path(a: &str, b: &str) -> bool {
    a.trim_matches('/') == b.trim_matches('/')
}

fn build_sidebar_html(items: Option<&[SidebarItem]>, kind: &str, current_path: &str) -> String {
    let Some(items) = items else {
        return String::new();
    };
    let mut html = format!(
        "<aside class=\"sidebar\" data-category=\"{}\">\n<ul>\n",
        html_escape(kind)
    );
    for item in items {
        let class = if same_path(&item.slug, current_path) {
            " class=\"current\""
        } else {
            ""
        };
        html.push_str(&format!(
            "<li{class}><a href=\"{}\">{}</a></li>\n",
            html_escape(&item.slug),
            html_escape(&item.title)
        ));
    }
    html.push_str("</ul>\n</aside>\n");
    html
}

/// Module script that loads the wasm bundle and attaches TOC scroll sync.
///
/// The returned handle is kept on `window` so it lives as long as the page.
fn build_toc_script(toc: &TocSettings) -> String {
    let Some(src) = toc.script.as_deref() else {
        return String::new();
    };
    format!(
        "<script type=\"module\">\n\
import init, {{ attachToc }} from {src};\n\
init().then(() => {{\n\
  window.mdpageToc = attachToc({selector}, {offset}, {throttle}, {class});\n\
}});\n\
</script>\n",
        src = js_string(src),
        selector = js_string(&toc.selector),
        offset = toc.scroll_offset,
        throttle = toc.throttle_ms,
        class = js_string(&toc.active_class),
    )
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Render a complete HTML document for `page`.
pub fn render_page(page: &PageContent, ctx: &PageContext) -> String {
    let config = ctx.config;
    let title_raw = match page.frontmatter.title.trim() {
        "" => config.site_title.as_str(),
        t => t,
    };
    let title = html_escape(title_raw);
    let doc_title = if title_raw == config.site_title {
        title.clone()
    } else {
        format!("{title} · {}", html_escape(&config.site_title))
    };

    let byline_html = build_byline_html(page, ctx.locale);
    let updated_html = build_updated_html(page, ctx.locale);
    let nav_html = build_sibling_nav_html(page, ctx.locale);
    let toc_html = build_toc_panel_html(page);
    let sidebar_html = build_sidebar_html(
        config.sidebar(&page.fields.kind),
        &page.fields.kind,
        ctx.path,
    );
    let css_href = html_escape(&format!(
        "{}/mdpage.css",
        config.assets_base.trim_end_matches('/')
    ));
    let script_html = build_toc_script(&config.toc);
    let content_html = &page.html;

    format!(
        "<!DOCTYPE html>\n\
<html>\n\
<head>\n\
<meta charset=\"utf-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
<title>{doc_title}</title>\n\
<link rel=\"stylesheet\" href=\"{css_href}\">\n\
</head>\n\
<body>\n\
<div class=\"layout\">\n\
{sidebar_html}\
<article class=\"page\">\n\
<header class=\"page-header\">\n\
<h1 class=\"page-title\">{title}</h1>\n\
{byline_html}\
</header>\n\
<main class=\"content\">\n\
{content_html}\n\
</main>\n\
{updated_html}\
{nav_html}\
</article>\n\
{toc_html}\
</div>\n\
{script_html}\
</body>\n\
</html>\n"
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
