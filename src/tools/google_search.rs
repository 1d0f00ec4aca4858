//! Google Custom Search tool
//!
//! Web search using the Custom Search JSON API. Requires a Google API key
//! and a Custom Search Engine ID.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use super::traits::{Tool, ToolResult};
use crate::config::SearchConfig;
use crate::Result;

/// The API rejects num above 10
const MAX_RESULT_COUNT: u8 = 10;

/// Custom Search JSON API response structures
#[derive(Debug, Deserialize)]
struct CustomSearchResponse {
    items: Option<Vec<CustomSearchItem>>,
}

#[derive(Debug, Deserialize)]
struct CustomSearchItem {
    title: String,
    link: String,
    #[serde(default)]
    snippet: String,
}

/// A single search hit
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Google Custom Search tool for web searching
pub struct GoogleSearchTool {
    client: Client,
    config: SearchConfig,
}

impl GoogleSearchTool {
    /// Create a new search tool
    pub fn new(config: SearchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn is_configured(&self) -> bool {
        !self.config.api_key.expose_secret().is_empty() && !self.config.engine_id.is_empty()
    }

    /// Perform a web search
    async fn search(&self, query: &str, count: u8) -> Result<Vec<SearchResult>> {
        let url = format!(
            "{}?key={}&cx={}&q={}&num={}",
            self.config.base_url,
            self.config.api_key.expose_secret(),
            super::urlencoding::encode(&self.config.engine_id),
            super::urlencoding::encode(query),
            count.clamp(1, MAX_RESULT_COUNT)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| crate::Error::Search(format!("Search request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text: String = response.text().await.unwrap_or_default();
            return Err(crate::Error::Search(format!(
                "Search failed with status {}: {}",
                status, text
            )));
        }

        let body: CustomSearchResponse = response
            .json()
            .await
            .map_err(|e| crate::Error::Search(format!("Failed to parse search response: {}", e)))?;

        let results = body
            .items
            .map(|items| {
                items
                    .into_iter()
                    .map(|item| SearchResult {
                        title: item.title,
                        url: item.link,
                        snippet: item.snippet,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(results)
    }
}

/// Format search results for the model
pub(crate) fn format_search_results(results: &[SearchResult]) -> String {
    let mut output = String::new();

    for result in results {
        output.push_str(&format!(
            "Title: {}\nLink: {}\nSnippet: {}\n---\n",
            result.title, result.url, result.snippet
        ));
    }

    output
}

#[async_trait]
impl Tool for GoogleSearchTool {
    fn name(&self) -> &str {
        "google_search"
    }

    fn description(&self) -> &str {
        "Useful for searching the internet for information. Returns relevant web pages with titles, links, and snippets. Input should be a search query."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query to look up"
                },
                "num_results": {
                    "type": "integer",
                    "description": "Number of results to return (1-10, default: 5)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        if !self.is_configured() {
            return Ok(ToolResult::failure(
                "Google search is not configured. Set GOOGLE_API_KEY and GOOGLE_CSE_ID.",
            ));
        }

        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| crate::Error::InvalidInput("Missing 'query' parameter".to_string()))?;

        let count = args
            .get("num_results")
            .and_then(|v| v.as_u64())
            .map(|c| c as u8)
            .unwrap_or(self.config.result_count);

        match self.search(query, count).await {
            Ok(results) => {
                if results.is_empty() {
                    Ok(ToolResult::success("No results found."))
                } else {
                    Ok(ToolResult::success(format_search_results(&results)))
                }
            }
            Err(e) => Ok(ToolResult::failure(format!("Search failed: {}", e))),
        }
    }
}
