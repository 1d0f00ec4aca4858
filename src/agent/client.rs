//! Gemini API client
//!
//! Talks to Gemini through its OpenAI-compatible chat-completions endpoint,
//! so the wire format is the familiar messages + tools shape.

use crate::agent::types::*;
use crate::config::GeminiConfig;
use crate::error::{Error, Result};
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use reqwest::{header, Client};
use secrecy::ExposeSecret;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Gemini chat-completions client
#[derive(Clone)]
pub struct GeminiClient {
    /// HTTP client
    client: Client,
    /// Configuration
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();

        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", config.api_key.expose_secret()))
                .map_err(|e| Error::Config(format!("Invalid API key format: {}", e)))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(GeminiClient { client, config })
    }

    /// Get the default model
    pub fn default_model(&self) -> &str {
        &self.config.default_model
    }

    /// Create a chat completion
    pub async fn chat(
        &self,
        messages: Vec<Message>,
        options: GenerationOptions,
    ) -> Result<ChatCompletionResponse> {
        let request = ChatCompletionRequest {
            model: self.config.default_model.clone(),
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            top_p: options.top_p,
            stop: options.stop,
            stream: Some(false),
            tools: None,
            tool_choice: None,
        };

        self.send_request(request).await
    }

    /// Create a chat completion with tools/functions
    pub async fn chat_with_tools(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
        options: GenerationOptions,
    ) -> Result<ChatCompletionResponse> {
        let request = ChatCompletionRequest {
            model: self.config.default_model.clone(),
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            top_p: options.top_p,
            stop: options.stop,
            stream: Some(false),
            tools: Some(tools),
            tool_choice: Some(ToolChoice::Auto("auto".to_string())),
        };

        self.send_request(request).await
    }

    /// Send a request, retrying retryable failures with exponential backoff
    async fn send_request(&self, request: ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        let mut backoff = ExponentialBackoff {
            max_elapsed_time: None,
            ..ExponentialBackoff::default()
        };
        let mut attempts: u32 = 0;

        loop {
            match self.send_request_once(&request).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempts < self.config.max_retries => {
                    attempts += 1;
                    let delay = backoff
                        .next_backoff()
                        .unwrap_or_else(|| Duration::from_secs(1));
                    warn!(
                        "Provider request failed (attempt {}/{}): {}. Retrying in {:?}",
                        attempts, self.config.max_retries, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Send a single request to the chat-completions endpoint
    async fn send_request_once(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        let url = format!("{}/chat/completions", self.config.base_url);

        debug!("Sending request to provider: model={}", request.model);

        let response = self.client.post(&url).json(request).send().await?;
        let status = response.status();

        if status.is_success() {
            let body = response.json::<ChatCompletionResponse>().await?;

            if let Some(ref usage) = body.usage {
                info!(
                    "Provider response: model={}, tokens={}",
                    body.model, usage.total_tokens
                );
            }

            Ok(body)
        } else {
            let error_text = response.text().await.unwrap_or_default();

            match status.as_u16() {
                429 => {
                    warn!("Rate limit exceeded: {}", error_text);
                    Err(Error::RateLimit(error_text))
                }
                401 | 403 => Err(Error::Unauthorized("Invalid API key".to_string())),
                _ => Err(Error::Provider(format!(
                    "API error ({}): {}",
                    status, error_text
                ))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn test_config() -> GeminiConfig {
        GeminiConfig {
            api_key: SecretString::from("test-key"),
            default_model: "gemini-1.5-flash-latest".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            timeout_secs: 30,
            max_retries: 3,
        }
    }

    #[test]
    fn test_client_creation() {
        let client = GeminiClient::new(test_config());
        assert!(client.is_ok());
    }

    #[test]
    fn test_generation_options() {
        let precise = GenerationOptions::precise();
        assert_eq!(precise.temperature, Some(0.0));

        let balanced = GenerationOptions::balanced();
        assert_eq!(balanced.temperature, Some(0.5));
    }

    #[tokio::test]
    async fn test_unauthorized_is_not_retried() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/chat/completions"))
            .respond_with(wiremock::ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = test_config();
        config.base_url = server.uri();
        let client = GeminiClient::new(config).unwrap();

        let err = client
            .chat(vec![Message::user("hi")], GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }
}
