//! Email-read tool
//!
//! Lists messages matching a Gmail query and renders sender, subject,
//! snippet, and decoded body for each.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::auth::GmailAuth;
use crate::config::GmailConfig;
use crate::tools::traits::{Tool, ToolResult};
use crate::Result;

const DEFAULT_QUERY: &str = "is:unread";

// Gmail REST API response structures

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageList {
    messages: Option<Vec<MessageRef>>,
    result_size_estimate: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailMessage {
    #[serde(default)]
    snippet: Option<String>,
    #[serde(default)]
    payload: Option<MessagePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessagePart {
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    headers: Option<Vec<Header>>,
    #[serde(default)]
    body: Option<PartBody>,
    #[serde(default)]
    parts: Option<Vec<MessagePart>>,
}

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct PartBody {
    #[serde(default)]
    data: Option<String>,
}

/// Email-read tool
pub struct ReadEmailTool {
    client: Client,
    auth: Arc<GmailAuth>,
    config: GmailConfig,
}

impl ReadEmailTool {
    /// Create a new email-read tool
    pub fn new(config: GmailConfig, auth: Arc<GmailAuth>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            auth,
            config,
        })
    }

    async fn read_emails(&self, query: &str) -> Result<String> {
        let token = self.auth.access_token().await?;

        let list_url = format!(
            "{}/users/me/messages?q={}&maxResults={}",
            self.config.base_url,
            crate::tools::urlencoding::encode(query),
            self.config.max_messages
        );
        debug!("Listing emails with query: '{}'", query);

        let list: MessageList = self
            .api_get(&list_url, &token)
            .await
            .map_err(|e| crate::Error::Gmail(format!("Failed to list emails: {}", e)))?;

        let refs = list.messages.unwrap_or_default();
        if refs.is_empty() {
            return Ok("No emails found matching the query.".to_string());
        }

        let mut details = Vec::new();
        for msg_ref in refs.iter().take(self.config.max_messages) {
            let msg_url = format!(
                "{}/users/me/messages/{}?format=full",
                self.config.base_url, msg_ref.id
            );
            let message: GmailMessage = self
                .api_get(&msg_url, &token)
                .await
                .map_err(|e| crate::Error::Gmail(format!("Failed to fetch email: {}", e)))?;

            details.push(self.render_message(&message));
        }

        let shown = details.len() as u64;
        if let Some(estimate) = list.result_size_estimate {
            if estimate > shown {
                details.push(format!(
                    "({} more emails match the query but were not shown for brevity.)",
                    estimate - shown
                ));
            }
        }

        Ok(details.join("\n"))
    }

    async fn api_get<T: for<'de> Deserialize<'de>>(&self, url: &str, token: &str) -> Result<T> {
        let response = self.client.get(url).bearer_auth(token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(crate::Error::Gmail(format!("API error ({}): {}", status, text)));
        }

        Ok(response.json::<T>().await?)
    }

    fn render_message(&self, message: &GmailMessage) -> String {
        let headers = message
            .payload
            .as_ref()
            .and_then(|p| p.headers.as_deref())
            .unwrap_or_default();

        let header = |name: &str| {
            headers
                .iter()
                .find(|h| h.name.eq_ignore_ascii_case(name))
                .map(|h| h.value.as_str())
                .unwrap_or("N/A")
        };

        let body = message
            .payload
            .as_ref()
            .and_then(extract_body)
            .map(|b| truncate_body(&b, self.config.max_body_chars))
            .unwrap_or_else(|| "N/A".to_string());

        format!(
            "From: {}\nSubject: {}\nSnippet: {}\nBody: {}\n---",
            header("From"),
            header("Subject"),
            message.snippet.as_deref().unwrap_or("N/A"),
            body
        )
    }
}

/// Extract and decode a message body from a payload part.
///
/// Prefers `text/plain`; falls back to `text/html` stripped to text; recurses
/// into nested multiparts.
fn extract_body(part: &MessagePart) -> Option<String> {
    let mime = part.mime_type.as_deref().unwrap_or("");

    if let Some(parts) = &part.parts {
        // Multipart: prefer a plain-text part over an HTML one
        let mut html_fallback = None;
        for sub in parts {
            let sub_mime = sub.mime_type.as_deref().unwrap_or("");
            if sub_mime == "text/plain" {
                if let Some(body) = decode_part(sub) {
                    return Some(body);
                }
            } else if sub_mime == "text/html" {
                if html_fallback.is_none() {
                    html_fallback = decode_part(sub).map(|b| html_to_text(&b));
                }
            } else if sub.parts.is_some() {
                if let Some(nested) = extract_body(sub) {
                    return Some(nested);
                }
            }
        }
        return html_fallback;
    }

    if mime.starts_with("text/") {
        let decoded = decode_part(part)?;
        if mime == "text/html" {
            return Some(html_to_text(&decoded));
        }
        return Some(decoded);
    }

    None
}

fn decode_part(part: &MessagePart) -> Option<String> {
    let data = part.body.as_ref()?.data.as_deref()?;
    decode_base64url(data)
}

/// Gmail encodes bodies as base64url, sometimes without padding.
fn decode_base64url(data: &str) -> Option<String> {
    let bytes = base64::engine::general_purpose::URL_SAFE
        .decode(data)
        .or_else(|_| base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(data))
        .ok()?;
    String::from_utf8(bytes).ok()
}

fn html_to_text(html: &str) -> String {
    crate::tools::browse_website::extract_text(html)
}

fn truncate_body(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        return body.to_string();
    }
    let truncated: String = body.chars().take(max_chars).collect();
    format!("{}... (truncated)", truncated)
}

#[async_trait]
impl Tool for ReadEmailTool {
    fn name(&self) -> &str {
        "read_email"
    }

    fn description(&self) -> &str {
        "Use this tool to read emails from the user's Gmail account when they ask to check their inbox, read specific emails, or search for emails. Fetches the From, Subject, Snippet, and the main Body content (decoded plain text or stripped HTML, possibly truncated) for the most recent matching emails."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Optional Gmail query string (e.g., 'is:unread', 'subject:meeting'). Defaults to 'is:unread'."
                }
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .filter(|q| !q.is_empty())
            .unwrap_or(DEFAULT_QUERY);

        match self.read_emails(query).await {
            Ok(rendered) => Ok(ToolResult::success(rendered)),
            Err(e) => Ok(ToolResult::failure(format!("Error reading emails: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use chrono::{Duration as ChronoDuration, Utc};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn b64(s: &str) -> String {
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(s)
    }

    fn setup(server_uri: &str, dir: &std::path::Path) -> ReadEmailTool {
        let token_path = dir.join("token.json");
        std::fs::write(
            &token_path,
            serde_json::to_string(&serde_json::json!({
                "access_token": "tok",
                "refresh_token": "r",
                "client_id": "c",
                "client_secret": "s",
                "expiry": (Utc::now() + ChronoDuration::hours(1)).to_rfc3339()
            }))
            .unwrap(),
        )
        .unwrap();

        let config = GmailConfig {
            token_file: token_path,
            base_url: server_uri.to_string(),
            oauth_url: format!("{}/token", server_uri),
            ..GmailConfig::default()
        };
        let auth = Arc::new(GmailAuth::new(config.clone()).unwrap());
        ReadEmailTool::new(config, auth).unwrap()
    }

    #[test]
    fn test_decode_base64url_with_and_without_padding() {
        let padded = base64::engine::general_purpose::URL_SAFE.encode("hello");
        let unpadded = b64("hello");
        assert_eq!(decode_base64url(&padded).unwrap(), "hello");
        assert_eq!(decode_base64url(&unpadded).unwrap(), "hello");
    }

    #[test]
    fn test_extract_body_prefers_plain_text() {
        let part: MessagePart = serde_json::from_value(serde_json::json!({
            "mimeType": "multipart/alternative",
            "parts": [
                {"mimeType": "text/html", "body": {"data": b64("<p>html body</p>")}},
                {"mimeType": "text/plain", "body": {"data": b64("plain body")}}
            ]
        }))
        .unwrap();
        assert_eq!(extract_body(&part).unwrap(), "plain body");
    }

    #[test]
    fn test_extract_body_falls_back_to_html() {
        let part: MessagePart = serde_json::from_value(serde_json::json!({
            "mimeType": "multipart/alternative",
            "parts": [
                {"mimeType": "text/html", "body": {"data": b64("<p>html only</p>")}}
            ]
        }))
        .unwrap();
        assert!(extract_body(&part).unwrap().contains("html only"));
    }

    #[test]
    fn test_extract_body_recurses_nested_parts() {
        let part: MessagePart = serde_json::from_value(serde_json::json!({
            "mimeType": "multipart/mixed",
            "parts": [
                {"mimeType": "multipart/alternative", "parts": [
                    {"mimeType": "text/plain", "body": {"data": b64("nested body")}}
                ]}
            ]
        }))
        .unwrap();
        assert_eq!(extract_body(&part).unwrap(), "nested body");
    }

    #[test]
    fn test_truncate_body() {
        let long = "a".repeat(2000);
        let cut = truncate_body(&long, 1500);
        assert!(cut.ends_with("... (truncated)"));
        assert_eq!(truncate_body("short", 1500), "short");
    }

    #[tokio::test]
    async fn test_no_matches_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "resultSizeEstimate": 0
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let tool = setup(&server.uri(), dir.path());
        let result = tool.execute(serde_json::json!({})).await.unwrap();
        assert_eq!(result.to_llm_string(), "No emails found matching the query.");
    }

    #[tokio::test]
    async fn test_read_renders_messages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me/messages"))
            .and(query_param("q", "from:alice"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messages": [{"id": "m1"}],
                "resultSizeEstimate": 5
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/me/messages/m1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "snippet": "Lunch tomorrow?",
                "payload": {
                    "mimeType": "text/plain",
                    "headers": [
                        {"name": "From", "value": "alice@example.com"},
                        {"name": "Subject", "value": "Lunch"}
                    ],
                    "body": {"data": b64("Want to grab lunch tomorrow?")}
                }
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let tool = setup(&server.uri(), dir.path());
        let result = tool
            .execute(serde_json::json!({"query": "from:alice"}))
            .await
            .unwrap();
        assert!(result.success);
        let text = result.to_llm_string();
        assert!(text.contains("From: alice@example.com"));
        assert!(text.contains("Subject: Lunch"));
        assert!(text.contains("Body: Want to grab lunch tomorrow?"));
        assert!(text.contains("4 more emails match the query"));
    }

    #[tokio::test]
    async fn test_api_error_is_failure_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend error"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let tool = setup(&server.uri(), dir.path());
        let result = tool.execute(serde_json::json!({})).await.unwrap();
        assert!(!result.success);
        assert!(result.to_llm_string().contains("Error reading emails"));
    }
}
