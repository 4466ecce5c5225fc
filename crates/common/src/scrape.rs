//! HTML fetching and extraction used by news ingestion.
//!
//! The job only needs a listing page's article links, an article title and
//! its paragraph text. Parsing goes through `scraper`, which also decodes
//! entities.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::{AppError, AppResult};

/// Source of raw HTML pages.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch a page and return its body.
    async fn fetch(&self, url: &str) -> AppResult<String>;
}

/// Article contents extracted from a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedArticle {
    /// Canonical article URL.
    pub url: String,
    /// Article title, when the page has one.
    pub title: Option<String>,
    /// Plain paragraph text.
    pub body: String,
}

/// Maximum response size in bytes.
const MAX_PAGE_BYTES: usize = 2 * 1024 * 1024;

/// [`PageSource`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: Client,
}

impl HttpPageSource {
    /// Create a fetcher with the given user agent and timeout.
    pub fn new(user_agent: &str, timeout_secs: u64) -> AppResult<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch(&self, url: &str) -> AppResult<String> {
        let parsed = Url::parse(url)
            .map_err(|e| AppError::BadRequest(format!("URL inválida {url}: {e}")))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(AppError::BadRequest(format!("URL não suportada: {url}")));
        }

        let mut response = self.client.get(parsed).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "Failed to fetch page");
            AppError::ExternalService(format!("fetch {url}: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            debug!(url = %url, status = %status, "Page returned non-success status");
            return Err(AppError::ExternalService(format!(
                "fetch {url}: HTTP {status}"
            )));
        }

        if response
            .content_length()
            .is_some_and(|len| len > MAX_PAGE_BYTES as u64)
        {
            return Err(AppError::ExternalService(format!(
                "fetch {url}: page larger than {MAX_PAGE_BYTES} bytes"
            )));
        }

        // Content-Length may be absent or wrong; stop reading at the cap
        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| AppError::ExternalService(format!("read {url}: {e}")))?
        {
            let room = MAX_PAGE_BYTES - bytes.len();
            if chunk.len() >= room {
                bytes.extend_from_slice(&chunk[..room]);
                debug!(url = %url, "Page truncated at size cap");
                break;
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[allow(clippy::expect_used)]
fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector must parse")
}

static OG_TITLE: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"meta[property="og:title"][content]"#));

static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));

static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| selector("p"));

static LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));

/// Build an article from its page HTML.
#[must_use]
pub fn parse_article(url: &str, html: &str, max_chars: usize) -> ScrapedArticle {
    let document = Html::parse_document(html);
    ScrapedArticle {
        url: url.to_string(),
        title: document_title(&document),
        body: truncate_chars(&document_paragraphs(&document), max_chars),
    }
}

/// Extract the page title, preferring `og:title` over `<title>`.
#[must_use]
pub fn extract_title(html: &str) -> Option<String> {
    document_title(&Html::parse_document(html))
}

fn document_title(document: &Html) -> Option<String> {
    let og = document
        .select(&OG_TITLE)
        .filter_map(|el| el.value().attr("content"))
        .map(collapse_whitespace)
        .find(|t| !t.is_empty());

    og.or_else(|| {
        document
            .select(&TITLE)
            .map(element_text)
            .find(|t| !t.is_empty())
    })
}

/// Join the text of every `<p>` element, one paragraph per line.
#[must_use]
pub fn extract_paragraphs(html: &str) -> String {
    document_paragraphs(&Html::parse_document(html))
}

fn document_paragraphs(document: &Html) -> String {
    document
        .select(&PARAGRAPH)
        .map(element_text)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract article links from a listing page.
///
/// Every `a[href]` is tested against `pattern`; the first capture group is
/// the link when the pattern has one, otherwise the whole match. Links are
/// resolved against `base`, kept in page order, and de-duplicated.
#[must_use]
pub fn extract_links(html: &str, pattern: &Regex, base: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links: Vec<String> = Vec::new();

    for el in document.select(&LINK) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        let Some(cap) = pattern.captures(href) else {
            continue;
        };
        let Some(matched) = cap.get(1).or_else(|| cap.get(0)) else {
            continue;
        };
        let Some(resolved) = resolve_url(matched.as_str(), base) else {
            continue;
        };
        if !links.contains(&resolved) {
            links.push(resolved);
        }
    }
    links
}

/// Resolve a potentially relative URL against a base URL.
#[must_use]
pub fn resolve_url(url: &str, base: &Url) -> Option<String> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Some(url.to_string())
    } else if url.starts_with("//") {
        Some(format!("{}:{}", base.scheme(), url))
    } else {
        base.join(url).ok().map(|u| u.to_string())
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max_chars` characters.
#[must_use]
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_title() {
        let html = r"<html><head><title>Test Page</title></head></html>";
        assert_eq!(extract_title(html), Some("Test Page".to_string()));
    }

    #[test]
    fn test_extract_og_title_wins() {
        let html = r#"<html><head><title>Site</title><meta property="og:title" content="BTS &amp; fãs"></head></html>"#;
        assert_eq!(extract_title(html), Some("BTS & fãs".to_string()));
    }

    #[test]
    fn test_og_title_keeps_apostrophes() {
        let html = r#"<meta property="og:title" content="Girls' Generation anuncia turnê">"#;
        assert_eq!(
            extract_title(html),
            Some("Girls' Generation anuncia turnê".to_string())
        );

        let single = r#"<meta content='Say "Hi" to IVE' property='og:title'>"#;
        assert_eq!(extract_title(single), Some(r#"Say "Hi" to IVE"#.to_string()));
    }

    #[test]
    fn test_entities_decoded_once() {
        let html = "<title>&#38;lt;script&#38;gt;</title>";
        assert_eq!(extract_title(html), Some("&lt;script&gt;".to_string()));
    }

    #[test]
    fn test_extract_title_missing() {
        assert_eq!(extract_title("<html><body>nothing</body></html>"), None);
        assert_eq!(extract_title("<title>   </title>"), None);
    }

    #[test]
    fn test_extract_paragraphs() {
        let html = r#"
            <article>
              <p class="lead">NewJeans <b>returns</b> with a new single.</p>
              <pre>code</pre>
              <p></p>
              <P>Tickets   sell out&#33;</P>
            </article>"#;
        assert_eq!(
            extract_paragraphs(html),
            "NewJeans returns with a new single.\nTickets sell out!"
        );
    }

    #[test]
    fn test_extract_links_dedupes_in_order() {
        let html = r#"
            <a href="/article/2?ref=home">b</a>
            <a href="https://news.example.com/article/1">a</a>
            <a href="/article/2">again</a>
            <a href="/about">about</a>"#;
        let pattern = Regex::new(r"^[^#?]*/article/[^#?]+").unwrap();
        let base = Url::parse("https://news.example.com/list").unwrap();

        assert_eq!(
            extract_links(html, &pattern, &base),
            vec![
                "https://news.example.com/article/2".to_string(),
                "https://news.example.com/article/1".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_links_uses_capture_group() {
        let html = r#"<a href="/go?to=/article/9">x</a>"#;
        let pattern = Regex::new(r"to=(/article/\d+)").unwrap();
        let base = Url::parse("https://news.example.com/").unwrap();

        assert_eq!(
            extract_links(html, &pattern, &base),
            vec!["https://news.example.com/article/9".to_string()]
        );
    }

    #[test]
    fn test_parse_article_truncates_on_char_boundary() {
        let html = "<title>Título</title><p>ação ação</p>";
        let article = parse_article("https://x.test/a", html, 3);
        assert_eq!(article.title.as_deref(), Some("Título"));
        assert_eq!(article.body, "açã");
    }

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://example.com/page/").unwrap();
        assert_eq!(
            resolve_url("https://other.com/a", &base),
            Some("https://other.com/a".to_string())
        );
        assert_eq!(
            resolve_url("//cdn.example.com/a", &base),
            Some("https://cdn.example.com/a".to_string())
        );
        assert_eq!(
            resolve_url("/root", &base),
            Some("https://example.com/root".to_string())
        );
        assert_eq!(
            resolve_url("rel", &base),
            Some("https://example.com/page/rel".to_string())
        );
    }

    #[test]
    fn test_truncate_chars_short_input() {
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
