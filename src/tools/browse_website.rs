//! Page-fetch tool
//!
//! Fetches a URL and returns its readable text content. HTML is converted to
//! markdown-flavored text; other content types pass through as-is.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use super::traits::{Tool, ToolResult};
use crate::config::BrowseConfig;
use crate::Result;

/// Headers that mimic a desktop browser visit; some sites refuse default
/// client agents outright.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8";

/// Page-fetch tool
pub struct BrowseWebsiteTool {
    client: Client,
    config: BrowseConfig,
}

impl BrowseWebsiteTool {
    /// Create a new page-fetch tool
    pub fn new(config: BrowseConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Fetch a URL and extract readable text
    async fn fetch(&self, url: &str) -> Result<String> {
        // Reject obviously invalid URLs before issuing a request
        let parsed = url::Url::parse(url)
            .map_err(|e| crate::Error::InvalidInput(format!("Invalid URL '{}': {}", url, e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(crate::Error::InvalidInput(format!(
                "Unsupported URL scheme '{}'",
                parsed.scheme()
            )));
        }

        let response = self
            .client
            .get(url)
            .header("Accept", ACCEPT)
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(crate::Error::Internal(format!(
                "HTTP error {} fetching {}",
                status, url
            )));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let body = response.text().await?;

        let text = if content_type.contains("text/html") {
            extract_text(&body)
        } else {
            body
        };

        Ok(truncate(&text, self.config.max_content_chars))
    }
}

/// Convert an HTML document to readable text.
pub(crate) fn extract_text(html: &str) -> String {
    match htmd::convert(html) {
        Ok(markdown) => {
            // Collapse runs of blank lines left behind by stripped elements
            let mut out = String::with_capacity(markdown.len());
            let mut blank = false;
            for line in markdown.lines() {
                let trimmed = line.trim_end();
                if trimmed.is_empty() {
                    if !blank && !out.is_empty() {
                        out.push('\n');
                    }
                    blank = true;
                } else {
                    out.push_str(trimmed);
                    out.push('\n');
                    blank = false;
                }
            }
            out.trim_end().to_string()
        }
        Err(_) => String::new(),
    }
}

/// Truncate at a char boundary, marking the cut.
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{}... [content truncated]", truncated)
}

#[async_trait]
impl Tool for BrowseWebsiteTool {
    fn name(&self) -> &str {
        "browse_website"
    }

    fn description(&self) -> &str {
        "Fetches the textual content from a given URL. Use this tool when you need to answer questions about the content of a specific webpage provided by the user or found in search results. Input must be a single, valid URL string."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The valid URL of the website to browse"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let url = args
            .get("url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| crate::Error::InvalidInput("Missing 'url' parameter".to_string()))?;

        match self.fetch(url).await {
            Ok(text) if text.is_empty() => Ok(ToolResult::success(
                "Could not extract text from the webpage.",
            )),
            Ok(text) => Ok(ToolResult::success(text)),
            Err(e) => Ok(ToolResult::failure(format!(
                "Error fetching URL {}: {}",
                url, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tool() -> BrowseWebsiteTool {
        BrowseWebsiteTool::new(BrowseConfig {
            timeout_secs: 5,
            max_content_chars: 4_000,
        })
        .unwrap()
    }

    #[test]
    fn test_extract_text_strips_markup() {
        let html = "<html><head><script>var x = 1;</script><style>p{}</style></head>\
                    <body><h1>Hello</h1><p>World</p></body></html>";
        let text = extract_text(html);
        assert!(text.contains("Hello"));
        assert!(text.contains("World"));
        assert!(!text.contains("var x"));
        assert!(!text.contains("p{}"));
    }

    #[test]
    fn test_truncate_marks_cut() {
        let long = "x".repeat(50);
        let cut = truncate(&long, 10);
        assert!(cut.starts_with("xxxxxxxxxx"));
        assert!(cut.ends_with("... [content truncated]"));
        assert_eq!(truncate("short", 10), "short");
    }

    #[tokio::test]
    async fn test_fetch_html_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html; charset=utf-8")
                    .set_body_string("<html><body><p>Readable content</p></body></html>"),
            )
            .mount(&server)
            .await;

        let result = tool()
            .execute(serde_json::json!({"url": format!("{}/page", server.uri())}))
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.to_llm_string().contains("Readable content"));
    }

    #[tokio::test]
    async fn test_fetch_plain_text_passthrough() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/plain")
                    .set_body_string("just text"),
            )
            .mount(&server)
            .await;

        let result = tool()
            .execute(serde_json::json!({"url": server.uri()}))
            .await
            .unwrap();
        assert_eq!(result.to_llm_string(), "just text");
    }

    #[tokio::test]
    async fn test_http_error_is_failure_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = tool()
            .execute(serde_json::json!({"url": server.uri()}))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.to_llm_string().contains("Error fetching URL"));
    }

    #[tokio::test]
    async fn test_invalid_url_is_failure_result() {
        let result = tool()
            .execute(serde_json::json!({"url": "not a url"}))
            .await
            .unwrap();
        assert!(!result.success);
    }
}