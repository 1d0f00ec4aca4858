//! Email-send tool
//!
//! Builds an RFC 2822 text message, base64url-encodes it, and submits it to
//! the Gmail send endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::info;

use super::auth::GmailAuth;
use crate::config::GmailConfig;
use crate::tools::traits::{Tool, ToolResult};
use crate::Result;

/// Email-send tool
pub struct SendEmailTool {
    client: Client,
    auth: Arc<GmailAuth>,
    config: GmailConfig,
}

impl SendEmailTool {
    /// Create a new email-send tool
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

    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<String> {
        let token = self.auth.access_token().await?;

        let raw = encode_message(to, subject, body);
        let url = format!("{}/users/me/messages/send", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&serde_json::json!({ "raw": raw }))
            .send()
            .await
            .map_err(|e| crate::Error::Gmail(format!("Send request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(crate::Error::Gmail(format!(
                "API error ({}): {}",
                status, text
            )));
        }

        let sent: Value = response.json().await.unwrap_or_default();
        if let Some(id) = sent.get("id").and_then(|v| v.as_str()) {
            info!("Email sent successfully. Message ID: {}", id);
        }

        Ok(format!(
            "Email sent successfully to {} with subject \"{}\".",
            to, subject
        ))
    }
}

/// Build the base64url-encoded RFC 2822 message Gmail expects in `raw`.
fn encode_message(to: &str, subject: &str, body: &str) -> String {
    let message = format!(
        "To: {}\r\nSubject: {}\r\nMIME-Version: 1.0\r\nContent-Type: text/plain; charset=\"UTF-8\"\r\nContent-Transfer-Encoding: 8bit\r\n\r\n{}",
        to, subject, body
    );
    base64::engine::general_purpose::URL_SAFE.encode(message.as_bytes())
}

#[async_trait]
impl Tool for SendEmailTool {
    fn name(&self) -> &str {
        "send_email"
    }

    fn description(&self) -> &str {
        "Sends an email from the user's Gmail account. Use this when the user asks to send an email."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "to": {
                    "type": "string",
                    "description": "Recipient email address"
                },
                "subject": {
                    "type": "string",
                    "description": "Subject line of the email"
                },
                "body": {
                    "type": "string",
                    "description": "Body content of the email"
                }
            },
            "required": ["to", "subject", "body"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let to = args
            .get("to")
            .and_then(|v| v.as_str())
            .ok_or_else(|| crate::Error::InvalidInput("Missing 'to' parameter".to_string()))?;
        let subject = args
            .get("subject")
            .and_then(|v| v.as_str())
            .ok_or_else(|| crate::Error::InvalidInput("Missing 'subject' parameter".to_string()))?;
        let body = args
            .get("body")
            .and_then(|v| v.as_str())
            .ok_or_else(|| crate::Error::InvalidInput("Missing 'body' parameter".to_string()))?;

        match self.send(to, subject, body).await {
            Ok(confirmation) => Ok(ToolResult::success(confirmation)),
            Err(e) => Ok(ToolResult::failure(format!("Error sending email: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use chrono::{Duration as ChronoDuration, Utc};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn setup(server_uri: &str, dir: &std::path::Path) -> SendEmailTool {
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
        SendEmailTool::new(config, auth).unwrap()
    }

    #[test]
    fn test_encode_message_roundtrip() {
        let raw = encode_message("bob@example.com", "Hello", "Line one\nLine two");
        let decoded = String::from_utf8(
            base64::engine::general_purpose::URL_SAFE.decode(raw).unwrap(),
        )
        .unwrap();
        assert!(decoded.starts_with("To: bob@example.com\r\n"));
        assert!(decoded.contains("Subject: Hello\r\n"));
        assert!(decoded.ends_with("\r\n\r\nLine one\nLine two"));
    }

    #[tokio::test]
    async fn test_send_success_confirmation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/me/messages/send"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": "sent-1", "labelIds": ["SENT"]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let tool = setup(&server.uri(), dir.path());
        let result = tool
            .execute(serde_json::json!({
                "to": "bob@example.com",
                "subject": "Hello",
                "body": "Hi Bob"
            }))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(
            result.to_llm_string(),
            "Email sent successfully to bob@example.com with subject \"Hello\"."
        );
    }

    #[tokio::test]
    async fn test_send_api_error_is_failure_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Invalid To header"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let tool = setup(&server.uri(), dir.path());
        let result = tool
            .execute(serde_json::json!({
                "to": "not-an-address",
                "subject": "x",
                "body": "y"
            }))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.to_llm_string().contains("Error sending email"));
    }

    #[tokio::test]
    async fn test_missing_argument_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let tool = setup("http://127.0.0.1:1", dir.path());
        let err = tool
            .execute(serde_json::json!({"to": "bob@example.com"}))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::Error::InvalidInput(_)));
    }
}
