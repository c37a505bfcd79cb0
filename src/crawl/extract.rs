//! Page structure extraction.
//!
//! This module extracts the metrics stored for an analysed page:
//! - HTML version (HTML5 doctype or not)
//! - Page title
//! - Heading counts for `<h1>` to `<h6>`
//! - Login form presence
//! - Internal/external link classification and the link check candidates
//!
//! `scraper::Html` is not `Send`, so everything here is synchronous and the
//! document never lives across an `.await`.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::config::{HTML4_VERSION, HTML5_VERSION};

const SKIPPED_SCHEMES: [&str; 4] = ["javascript:", "mailto:", "tel:", "data:"];

fn parse_selector(css: &str) -> Option<Selector> {
    Selector::parse(css)
        .map_err(|e| log::error!("Failed to parse selector '{css}': {e}"))
        .ok()
}

static TITLE: LazyLock<Option<Selector>> = LazyLock::new(|| parse_selector("title"));
static ANCHOR: LazyLock<Option<Selector>> = LazyLock::new(|| parse_selector("a[href]"));
static FORM: LazyLock<Option<Selector>> = LazyLock::new(|| parse_selector("form"));
static INPUT: LazyLock<Option<Selector>> = LazyLock::new(|| parse_selector("input"));
static HEADINGS: [LazyLock<Option<Selector>>; 6] = [
    LazyLock::new(|| parse_selector("h1")),
    LazyLock::new(|| parse_selector("h2")),
    LazyLock::new(|| parse_selector("h3")),
    LazyLock::new(|| parse_selector("h4")),
    LazyLock::new(|| parse_selector("h5")),
    LazyLock::new(|| parse_selector("h6")),
];

/// Structure extracted from one page body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageStructure {
    pub html_version: String,
    pub title: String,
    pub heading_counts: [i64; 6],
    pub has_login_form: bool,
    pub internal_links: i64,
    pub external_links: i64,
    /// Unique absolute link targets, in first-seen order.
    pub candidates: Vec<String>,
}

/// Parses `body` and extracts its structure.
///
/// # Arguments
///
/// * `body` - The raw HTML (possibly empty or partial)
/// * `base` - The URL the page was fetched from, used to resolve relative links
pub fn analyze_html(body: &str, base: &Url) -> PageStructure {
    let document = Html::parse_document(body);
    let (internal_links, external_links, candidates) = classify_links(&document, base);

    PageStructure {
        html_version: detect_html_version(body).to_string(),
        title: extract_title(&document),
        heading_counts: count_headings(&document),
        has_login_form: has_login_form(&document),
        internal_links,
        external_links,
        candidates,
    }
}

/// Returns `"HTML5"` when the body opens with `<!DOCTYPE html>` or the legacy
/// compatible form `<!DOCTYPE html SYSTEM "about:legacy-compat">` (any case,
/// surrounding whitespace ignored), `"HTML4.01"` otherwise.
pub fn detect_html_version(body: &str) -> &'static str {
    let trimmed = body.trim_start();
    let Some(end) = trimmed.find('>') else {
        return HTML4_VERSION;
    };
    let doctype = trimmed[..end].to_ascii_lowercase();
    let Some(rest) = doctype.strip_prefix("<!doctype html") else {
        return HTML4_VERSION;
    };
    let rest = rest.split_whitespace().collect::<Vec<_>>().join(" ");
    let is_html5 = rest.is_empty()
        || rest == r#"system "about:legacy-compat""#
        || rest == "system 'about:legacy-compat'";
    if is_html5 {
        HTML5_VERSION
    } else {
        HTML4_VERSION
    }
}

fn select_all<'a>(
    root: &'a Html,
    selector: &'a LazyLock<Option<Selector>>,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    selector
        .as_ref()
        .into_iter()
        .flat_map(move |s| root.select(s))
}

fn extract_title(document: &Html) -> String {
    select_all(document, &TITLE)
        .next()
        .map(|title| title.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn count_headings(document: &Html) -> [i64; 6] {
    let mut counts = [0i64; 6];
    for (count, heading) in counts.iter_mut().zip(HEADINGS.iter()) {
        *count = select_all(document, heading).count() as i64;
    }
    counts
}

fn has_login_form(document: &Html) -> bool {
    let Some(input) = INPUT.as_ref() else {
        return false;
    };
    select_all(document, &FORM).any(|form| {
        form.select(input).any(|field| {
            let attr = |name| field.value().attr(name).unwrap_or_default();
            attr("type").eq_ignore_ascii_case("password")
                || attr("name").eq_ignore_ascii_case("password")
        })
    })
}

/// Resolves an anchor `href` against `base`, or `None` when it must be skipped.
fn resolve_href(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.contains('#') {
        return None;
    }
    let lowered = href.to_ascii_lowercase();
    if SKIPPED_SCHEMES.iter().any(|scheme| lowered.starts_with(scheme)) {
        return None;
    }
    base.join(href).ok()
}

fn classify_links(document: &Html, base: &Url) -> (i64, i64, Vec<String>) {
    let mut internal = 0;
    let mut external = 0;
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for anchor in select_all(document, &ANCHOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(resolved) = resolve_href(href, base) else {
            continue;
        };

        if resolved.host_str() == base.host_str() {
            internal += 1;
        } else {
            external += 1;
        }

        let absolute = resolved.to_string();
        if seen.insert(absolute.clone()) {
            candidates.push(absolute);
        }
    }

    (internal, external, candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/docs/index.html").unwrap()
    }

    #[test]
    fn test_detect_html5_doctype() {
        assert_eq!(detect_html_version("<!DOCTYPE html><html></html>"), "HTML5");
        assert_eq!(detect_html_version("  \n<!doctype HTML >\n<p>"), "HTML5");
    }

    #[test]
    fn test_detect_legacy_compat_doctype() {
        assert_eq!(
            detect_html_version(r#"<!DOCTYPE html SYSTEM "about:legacy-compat"><html>"#),
            "HTML5"
        );
        assert_eq!(
            detect_html_version("<!doctype HTML  system  'about:legacy-compat' >"),
            "HTML5"
        );
        assert_eq!(
            detect_html_version(r#"<!DOCTYPE html SYSTEM "http://example.com/other.dtd">"#),
            "HTML4.01"
        );
    }

    #[test]
    fn test_detect_legacy_doctype() {
        let html401 = r#"<!DOCTYPE HTML PUBLIC "-//W3C//DTD HTML 4.01//EN" "http://www.w3.org/TR/html4/strict.dtd">"#;
        assert_eq!(detect_html_version(html401), "HTML4.01");
        assert_eq!(detect_html_version("<html><body></body></html>"), "HTML4.01");
        assert_eq!(detect_html_version(""), "HTML4.01");
    }

    #[test]
    fn test_title_and_headings() {
        let html = r#"<!DOCTYPE html><html><head><title>  Hello  </title><title>Second</title></head>
            <body><h1>a</h1><h2>b</h2><h2>c</h2><h6>d</h6></body></html>"#;
        let structure = analyze_html(html, &base());

        assert_eq!(structure.title, "Hello");
        assert_eq!(structure.heading_counts, [1, 2, 0, 0, 0, 1]);
    }

    #[test]
    fn test_missing_title_is_empty() {
        let structure = analyze_html("<html><body><p>x</p></body></html>", &base());
        assert_eq!(structure.title, "");
    }

    #[test]
    fn test_login_form_by_type_or_name() {
        let by_type = r#"<form><input type="PASSWORD"></form>"#;
        let by_name = r#"<form><input type="text" name="Password"></form>"#;
        let outside_form = r#"<input type="password"><form><input name="user"></form>"#;

        assert!(analyze_html(by_type, &base()).has_login_form);
        assert!(analyze_html(by_name, &base()).has_login_form);
        assert!(!analyze_html(outside_form, &base()).has_login_form);
    }

    #[test]
    fn test_link_classification() {
        let html = r#"
            <a href="/about">About</a>
            <a href="guide.html">Guide</a>
            <a href="https://other.org/x">Other</a>
            <a href="//cdn.example.net/lib.js">CDN</a>
        "#;
        let structure = analyze_html(html, &base());

        assert_eq!(structure.internal_links, 2);
        assert_eq!(structure.external_links, 2);
        assert_eq!(
            structure.candidates,
            vec![
                "https://example.com/about",
                "https://example.com/docs/guide.html",
                "https://other.org/x",
                "https://cdn.example.net/lib.js",
            ]
        );
    }

    #[test]
    fn test_skipped_links() {
        let html = r##"
            <a href="">empty</a>
            <a href="#top">fragment</a>
            <a href="/page#section">fragment on page</a>
            <a href="javascript:void(0)">js</a>
            <a href="JavaScript:alert(1)">js upper</a>
            <a href="mailto:someone@example.com">mail</a>
            <a href="tel:+123">phone</a>
            <a>no href</a>
            <a href="/kept">kept</a>
        "##;
        let structure = analyze_html(html, &base());

        assert_eq!(structure.internal_links, 1);
        assert_eq!(structure.external_links, 0);
        assert_eq!(structure.candidates, vec!["https://example.com/kept"]);
    }

    #[test]
    fn test_duplicate_links_counted_but_probed_once() {
        let html = r#"<a href="/a">1</a><a href="/a">2</a><a href="https://example.com/a">3</a>"#;
        let structure = analyze_html(html, &base());

        assert_eq!(structure.internal_links, 3);
        assert_eq!(structure.candidates, vec!["https://example.com/a"]);
    }

    #[test]
    fn test_different_port_same_host_is_internal() {
        let base = Url::parse("http://127.0.0.1:8080/").unwrap();
        let html = r#"<a href="http://127.0.0.1:9000/x">x</a>"#;
        let structure = analyze_html(html, &base);

        assert_eq!(structure.internal_links, 1);
    }
}
