//! Table-of-contents inspection.
//!
//! The TOC arrives as pre-rendered markup. These helpers read it back:
//! which fragments it links to, whether the content defines those ids, and a
//! fingerprint identifying the markup for re-attach decisions.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::content::PageContent;
use crate::error::{Error, Result};

static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*?href\s*=\s*["']#([^"']*)["'][^>]*>(.*?)</a\s*>"#)
        .expect("anchor pattern is valid")
});

static ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<[a-z][a-z0-9]*(?:\s[^>]*?)?\sid\s*=\s*["']([^"']*)["']"#)
        .expect("id pattern is valid")
});

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

/// One TOC link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocAnchor {
    /// Fragment as written in the href, without `#`.
    pub fragment: String,
    /// Visible link text with inner tags stripped.
    pub text: String,
}

impl TocAnchor {
    /// The heading id this anchor targets.
    pub fn target_id(&self) -> String {
        heading_id(&self.fragment)
    }
}

/// Percent-decode a fragment identifier byte-by-byte (RFC 3986 §2.1).
///
/// Fails on a truncated `%XX` sequence, a non-hex digit, or a decoded byte
/// sequence that is not valid UTF-8.
pub fn decode_fragment(encoded: &str) -> Result<String> {
    let malformed = || Error::Fragment(encoded.to_owned());
    let bytes = encoded.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if i + 2 >= bytes.len() {
                return Err(malformed());
            }
            let hi = hex_digit(bytes[i + 1]).ok_or_else(malformed)?;
            let lo = hex_digit(bytes[i + 2]).ok_or_else(malformed)?;
            out.push((hi << 4) | lo);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| malformed())
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Heading id for a fragment: decoded when well-formed, raw otherwise.
pub fn heading_id(fragment: &str) -> String {
    decode_fragment(fragment).unwrap_or_else(|_| fragment.to_owned())
}

/// Split an href into its fragment, if it has one.
///
/// Only same-page references qualify: the href must start with `#`.
pub fn href_fragment(href: &str) -> Option<&str> {
    href.strip_prefix('#')
}

/// Undo the attribute escaping a markup generator applies to hrefs.
fn unescape_attr(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// All same-page links in the TOC markup, in document order.
pub fn toc_anchors(markup: &str) -> Vec<TocAnchor> {
    ANCHOR_RE
        .captures_iter(markup)
        .map(|caps| TocAnchor {
            fragment: unescape_attr(&caps[1]),
            text: unescape_attr(TAG_RE.replace_all(&caps[2], "").trim()),
        })
        .collect()
}

/// Every `id` attribute value defined in the content markup.
pub fn content_ids(html: &str) -> HashSet<String> {
    ID_RE
        .captures_iter(html)
        .map(|caps| unescape_attr(&caps[1]))
        .collect()
}

/// TOC anchors whose target id the content does not define.
pub fn broken_anchors(page: &PageContent) -> Vec<TocAnchor> {
    let ids = content_ids(&page.html);
    toc_anchors(&page.table_of_contents)
        .into_iter()
        .filter(|a| !ids.contains(&a.target_id()))
        .collect()
}

/// Content identity of a TOC's markup.
pub fn fingerprint(markup: &str) -> u64 {
    xxhash_rust::xxh3::xxh3_64(markup.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOC: &str = r##"<ul>
<li><a href="#intro">Intro</a></li>
<li><a class="x" href="#%EC%84%A4%EC%B9%98">설치</a>
  <ul><li><a href='#deep-dive'><code>deep</code> dive</a></li></ul>
</li>
<li><a href="/elsewhere/#intro">elsewhere</a></li>
</ul>"##;

    #[test]
    fn anchors_in_document_order() {
        let anchors = toc_anchors(TOC);
        let fragments: Vec<&str> = anchors.iter().map(|a| a.fragment.as_str()).collect();
        assert_eq!(fragments, ["intro", "%EC%84%A4%EC%B9%98", "deep-dive"]);
        assert_eq!(anchors[2].text, "deep dive");
    }

    #[test]
    fn target_id_is_decoded() {
        let anchors = toc_anchors(TOC);
        assert_eq!(anchors[1].target_id(), "설치");
    }

    #[test]
    fn decode_plain_and_encoded() {
        assert_eq!(decode_fragment("plain-id").unwrap(), "plain-id");
        assert_eq!(decode_fragment("a%20b").unwrap(), "a b");
        assert_eq!(decode_fragment("%2F%2f").unwrap(), "//");
    }

    #[test]
    fn decode_truncated_sequence_is_error() {
        assert!(decode_fragment("%2").is_err());
        assert!(decode_fragment("%").is_err());
        assert!(decode_fragment("abc%").is_err());
    }

    #[test]
    fn decode_invalid_hex_is_error() {
        assert!(decode_fragment("%zz").is_err());
    }

    #[test]
    fn decode_invalid_utf8_is_error() {
        assert!(decode_fragment("%80").is_err());
    }

    #[test]
    fn malformed_fragment_falls_back_to_raw_id() {
        assert_eq!(heading_id("100%"), "100%");
    }

    #[test]
    fn href_fragment_only_same_page() {
        assert_eq!(href_fragment("#a"), Some("a"));
        assert_eq!(href_fragment("/page#a"), None);
    }

    #[test]
    fn content_ids_collected() {
        let ids = content_ids(r#"<h2 id="intro">I</h2><p>x</p><h3 class="c" id='deep-dive'>D</h3>"#);
        assert!(ids.contains("intro"));
        assert!(ids.contains("deep-dive"));
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn broken_anchor_detection() {
        let page = PageContent {
            html: r#"<h2 id="intro">Intro</h2><h2 id="설치">설치</h2>"#.to_owned(),
            table_of_contents: TOC.to_owned(),
            ..PageContent::default()
        };
        let broken = broken_anchors(&page);
        assert_eq!(broken.len(), 1);
        assert_eq!(broken[0].fragment, "deep-dive");
    }

    #[test]
    fn fingerprint_tracks_markup_identity() {
        assert_eq!(fingerprint(TOC), fingerprint(TOC));
        assert_ne!(fingerprint(TOC), fingerprint("<ul></ul>"));
    }
}
