//! Concierge web front-end - single-endpoint chat server.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use concierge::agent::types::ToolDefinition;
use concierge::agent::{
    run_agent_loop, system_prompt, AgentLoopInput, ConversationManager, GeminiClient, LoopConfig,
    NoOpCallback,
};
use concierge::config::Config;
use concierge::tools::{build_registry, ToolRegistry};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Embedded chat page
const CHAT_HTML: &str = include_str!("../../static/chat.html");

/// Session used when the client does not supply one
const DEFAULT_SESSION: &str = "default";

// ---- CLI ----

#[derive(Parser)]
#[command(name = "concierge-web", about = "Concierge web chat front-end")]
struct Args {
    /// Bind address (overrides config)
    #[arg(long)]
    bind: Option<String>,

    /// Port (overrides config)
    #[arg(long, short)]
    port: Option<u16>,
}

// ---- App State ----

#[derive(Clone)]
struct AppState {
    client: GeminiClient,
    registry: Arc<ToolRegistry>,
    tool_definitions: Vec<ToolDefinition>,
    conversations: Arc<Mutex<ConversationManager>>,
    loop_config: LoopConfig,
    max_history_chars: usize,
}

// ---- Error Handling ----

struct AppError(concierge::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

impl From<concierge::Error> for AppError {
    fn from(err: concierge::Error) -> Self {
        AppError(err)
    }
}

// ---- Request / Response Types ----

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Serialize)]
struct ChatResponse {
    response_text: String,
    response_type: String,
    tool_names: Vec<String>,
}

#[derive(Deserialize, Default)]
struct ClearRequest {
    #[serde(default)]
    session_id: Option<String>,
}

// ---- Handlers ----

async fn serve_index() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        CHAT_HTML,
    )
}

async fn healthz() -> impl IntoResponse {
    concierge::VERSION
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let message = request.message.trim().to_string();
    if message.is_empty() {
        return Err(AppError(concierge::Error::InvalidInput(
            "Empty message".into(),
        )));
    }

    let session_id = request
        .session_id
        .unwrap_or_else(|| DEFAULT_SESSION.to_string());

    info!("Chat message for session '{}'", session_id);

    // Append the user message and snapshot the history; the model round-trips
    // happen outside the lock.
    let messages = {
        let mut conversations = state.conversations.lock().await;
        let conversation = conversations.get_or_create(&session_id);
        conversation.add_user_message(&message);
        conversation.truncate_to_chars(state.max_history_chars);
        conversation.get_api_messages()
    };

    let output = run_agent_loop(AgentLoopInput {
        messages,
        llm_client: &state.client,
        tools: state.registry.as_ref(),
        tool_definitions: state.tool_definitions.clone(),
        config: state.loop_config.clone(),
        callback: NoOpCallback,
    })
    .await?;

    let tool_names = output.trace.tool_names();
    let response_type = if tool_names.is_empty() {
        "general_knowledge".to_string()
    } else {
        match output.trace.last_observation() {
            Some(obs) if obs.success => "tool_success".to_string(),
            Some(_) => "tool_failure".to_string(),
            None => "general_knowledge".to_string(),
        }
    };

    {
        let mut conversations = state.conversations.lock().await;
        let conversation = conversations.get_or_create(&session_id);
        conversation.add_assistant_message(&output.response);
        conversation.add_usage(output.total_usage.total_tokens);
    }

    info!(
        "Session '{}' turn finished: type={}, tools={:?}",
        session_id, response_type, tool_names
    );

    Ok(Json(ChatResponse {
        response_text: output.response,
        response_type,
        tool_names,
    }))
}

async fn clear(
    State(state): State<AppState>,
    body: axum::body::Bytes,
) -> Json<serde_json::Value> {
    // A bodyless POST clears the default session
    let session_id = serde_json::from_slice::<ClearRequest>(&body)
        .ok()
        .and_then(|r| r.session_id)
        .unwrap_or_else(|| DEFAULT_SESSION.to_string());

    state
        .conversations
        .lock()
        .await
        .clear_conversation(&session_id);

    info!("Cleared conversation for session '{}'", session_id);
    Json(serde_json::json!({ "status": "cleared" }))
}

// ---- Router ----

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/chat", post(chat))
        .route("/clear", post(clear))
        .route("/healthz", get(healthz))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

// ---- Main ----

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "concierge=info,tower_http=warn".into()),
        )
        .init();

    let args = Args::parse();

    let config = Config::from_env()?;

    let client = GeminiClient::new(config.provider.clone())?;
    let registry = build_registry(&config)?;
    let prompt = system_prompt(&registry.names())?;

    let state = AppState {
        client,
        tool_definitions: registry.definitions(),
        registry: Arc::new(registry),
        conversations: Arc::new(Mutex::new(
            ConversationManager::new().with_system_prompt(prompt),
        )),
        loop_config: LoopConfig::web().with_limits(&config.agent),
        max_history_chars: config.agent.max_history_chars,
    };

    let app = build_router(state);

    let bind = args.bind.unwrap_or(config.web.bind);
    let port = args.port.unwrap_or(config.web.port);
    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!("Concierge web chat listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
