use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use scraper::{ElementRef, Html, Selector};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::MonitoringConfig;
use crate::error::{PagesentryError, Result};

/// Elements whose entire subtree is page chrome rather than content;
/// removed before text extraction so the fingerprint tracks the body copy.
const STRIPPED_ELEMENTS: &[&str] = &["script", "style", "nav", "footer", "header", "noscript"];

/// Normalized text of a fetched document together with its fingerprint.
#[derive(Debug, Clone)]
pub struct FetchedContent {
    pub text: String,
    pub hash: String,
}

/// Fetch seam used by the scheduler and the trigger surface. The HTTP
/// implementation is `ContentFetcher`; tests substitute fakes.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedContent>;
}

/// Extracts plain text from PDF bytes. Extraction internals live behind
/// this seam; the shipped default rejects PDFs as unsupported content.
#[async_trait]
pub trait PdfTextExtractor: Send + Sync {
    async fn extract_text(&self, url: &str, bytes: &[u8]) -> Result<String>;
}

pub struct UnsupportedPdfExtractor;

#[async_trait]
impl PdfTextExtractor for UnsupportedPdfExtractor {
    async fn extract_text(&self, url: &str, _bytes: &[u8]) -> Result<String> {
        Err(PagesentryError::UnsupportedContent {
            url: url.to_string(),
            content_type: "application/pdf".to_string(),
        })
    }
}

/// Retrieves a URL, extracts its visible text and computes the content
/// fingerprint. Pure fetch/transform; persists nothing.
pub struct ContentFetcher {
    client: reqwest::Client,
    pdf_extractor: Box<dyn PdfTextExtractor>,
}

impl ContentFetcher {
    pub fn new(config: &MonitoringConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| PagesentryError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            pdf_extractor: Box::new(UnsupportedPdfExtractor),
        })
    }

    /// Swap in a real PDF extractor
    pub fn with_pdf_extractor(mut self, extractor: Box<dyn PdfTextExtractor>) -> Self {
        self.pdf_extractor = extractor;
        self
    }

    pub async fn fetch(&self, url: &str) -> Result<FetchedContent> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| map_request_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PagesentryError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| map_request_error(url, e))?;

        debug!(url = url, content_type = %content_type, bytes = bytes.len(), "Fetched document");

        let raw_text = if content_type.starts_with("application/pdf") {
            self.pdf_extractor.extract_text(url, &bytes).await?
        } else {
            extract_html_text(&String::from_utf8_lossy(&bytes))
        };

        let text = normalize_text(&raw_text);
        if text.is_empty() {
            return Err(PagesentryError::EmptyContent(url.to_string()));
        }

        let hash = fingerprint(&text);
        Ok(FetchedContent { text, hash })
    }
}

#[async_trait]
impl Fetcher for ContentFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedContent> {
        ContentFetcher::fetch(self, url).await
    }
}

fn map_request_error(url: &str, err: reqwest::Error) -> PagesentryError {
    if err.is_timeout() {
        PagesentryError::Timeout(url.to_string())
    } else {
        PagesentryError::Network {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

/// Collapse every whitespace run (including newlines) to a single space
/// and trim. Mandatory before hashing so formatting-only page changes
/// never alter the fingerprint.
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Hex SHA-256 digest of already-normalized text
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Visible text of an HTML document with script/style and page chrome
/// containers removed, subtrees included.
pub fn extract_html_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let body_selector = Selector::parse("body").expect("Invalid body selector");

    let mut out = String::new();
    if let Some(body) = document.select(&body_selector).next() {
        collect_visible_text(body, &mut out);
    } else {
        collect_visible_text(document.root_element(), &mut out);
    }
    out
}

fn collect_visible_text(element: ElementRef, out: &mut String) {
    if STRIPPED_ELEMENTS.contains(&element.value().name()) {
        return;
    }
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        } else if let Some(child_element) = ElementRef::wrap(child) {
            collect_visible_text(child_element, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(
            normalize_text("  Terms\n\n of \t  Service\n"),
            "Terms of Service"
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_text("a \n b\t\tc  ");
        assert_eq!(normalize_text(&once), once);
    }

    #[test]
    fn test_fingerprint_known_value() {
        assert_eq!(
            fingerprint("hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_fingerprint_insensitive_to_whitespace_changes() {
        let a = fingerprint(&normalize_text("clause one.\nclause two."));
        let b = fingerprint(&normalize_text("clause   one. clause\t\ntwo."));
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_changes_with_content() {
        assert_ne!(fingerprint("clause one"), fingerprint("clause two"));
    }

    #[test]
    fn test_extract_strips_chrome_elements() {
        let html = r#"<html><head><title>T</title><style>p { color: red }</style></head>
            <body>
              <header>Site Header</header>
              <nav>Home | About</nav>
              <script>alert("hi")</script>
              <noscript>enable js</noscript>
              <p>The actual agreement text.</p>
              <footer>Copyright 2025</footer>
            </body></html>"#;

        let text = normalize_text(&extract_html_text(html));
        assert_eq!(text, "The actual agreement text.");
    }

    #[test]
    fn test_extract_strips_nested_chrome_content() {
        let html = r#"<body><div><nav><ul><li>link one</li></ul></nav>
            <p>visible</p></div></body>"#;
        let text = normalize_text(&extract_html_text(html));
        assert_eq!(text, "visible");
    }

    #[test]
    fn test_extract_plain_fragment() {
        let text = normalize_text(&extract_html_text("just a fragment"));
        assert_eq!(text, "just a fragment");
    }
}
