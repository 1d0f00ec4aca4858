//! Agent control loop.
//!
//! The decide/act cycle shared by the CLI and web front-ends: ask the model
//! whether to answer directly or invoke a tool, execute requested tools,
//! feed the results back, and repeat until the model replies with no further
//! tool calls.

use crate::agent::loop_guard::LoopGuard;
use crate::agent::types::*;
use crate::agent::GeminiClient;
use crate::config::AgentConfig;
use crate::error::Result;
use crate::tools::{ToolCall, ToolRegistry};

use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configurable limits for the agent loop.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Maximum model round-trips before the loop is forcefully stopped.
    pub max_iterations: u32,
    /// Maximum total tool calls across all iterations.
    pub max_tool_calls: u32,
    /// Generation options (temperature, max_tokens, etc.).
    pub generation_options: GenerationOptions,
    /// Fallback text returned when the loop exits without a final response.
    pub fallback_message: String,
}

impl LoopConfig {
    /// Configuration for the terminal REPL.
    pub fn cli() -> Self {
        Self {
            max_iterations: 10,
            max_tool_calls: 10,
            generation_options: GenerationOptions::precise(),
            fallback_message: "I wasn't able to finish that request. Please try a more specific request.".into(),
        }
    }

    /// Configuration for the web chat front-end.
    pub fn web() -> Self {
        Self {
            max_iterations: 10,
            max_tool_calls: 10,
            generation_options: GenerationOptions::precise(),
            fallback_message: "I wasn't able to finish that request. Please try rephrasing it.".into(),
        }
    }

    /// Apply limits from the application config.
    pub fn with_limits(mut self, agent: &AgentConfig) -> Self {
        self.max_iterations = agent.max_iterations;
        self.max_tool_calls = agent.max_tool_calls;
        self
    }
}

// ---------------------------------------------------------------------------
// Structured trace types
// ---------------------------------------------------------------------------

/// A recorded action (tool call) and its observation (result).
#[derive(Debug, Clone)]
pub struct ToolAction {
    pub tool_name: String,
    pub arguments: String,
    pub observation: ToolObservation,
}

/// The result of executing a single tool call.
#[derive(Debug, Clone)]
pub struct ToolObservation {
    pub success: bool,
    pub content: String,
    pub duration_ms: u64,
    pub loop_guard_triggered: bool,
}

/// One iteration of the agent loop.
#[derive(Debug, Clone)]
pub struct LoopStep {
    pub iteration: u32,
    /// Text content produced by the model in this iteration (may be empty).
    pub thought: String,
    /// Tool calls executed in this iteration.
    pub actions: Vec<ToolAction>,
    /// The model's finish_reason for this iteration.
    pub finish_reason: String,
    pub timestamp: Instant,
}

/// Full trace of a loop execution.
#[derive(Debug, Clone)]
pub struct LoopTrace {
    pub steps: Vec<LoopStep>,
    pub outcome: LoopOutcome,
    pub total_duration_ms: u64,
}

impl LoopTrace {
    /// Names of tools invoked during this run, in first-use order.
    pub fn tool_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for step in &self.steps {
            for action in &step.actions {
                if !names.contains(&action.tool_name) {
                    names.push(action.tool_name.clone());
                }
            }
        }
        names
    }

    /// The observation of the last tool action, if any tool ran.
    pub fn last_observation(&self) -> Option<&ToolObservation> {
        self.steps
            .iter()
            .rev()
            .flat_map(|s| s.actions.iter().rev())
            .map(|a| &a.observation)
            .next()
    }
}

/// How the loop finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopOutcome {
    /// Model replied without requesting further tools.
    Completed,
    /// Hit `max_iterations` without a final reply.
    MaxIterationsExceeded,
    /// Hit `max_tool_calls`; final response taken from a tool-free call.
    ToolLimitReached,
    /// Model returned an empty response without tool calls.
    EmptyResponse,
    /// Model API returned an error.
    LlmError(String),
}

// ---------------------------------------------------------------------------
// Callback trait
// ---------------------------------------------------------------------------

/// Trait for callers to hook into loop events (e.g. print tool activity to
/// the terminal, stream progress to a client).
#[async_trait]
pub trait LoopCallback: Send + Sync {
    /// Called at the start of each iteration, before the model call.
    async fn on_iteration_start(&self, _iteration: u32) {}
    /// Called after each individual tool has been executed.
    async fn on_tool_executed(&self, _tool_name: &str, _observation: &ToolObservation) {}
    /// Called at the end of each iteration, after all tool results are collected.
    async fn on_iteration_end(&self, _step: &LoopStep) {}
    /// Called once after the loop terminates.
    async fn on_loop_complete(&self, _trace: &LoopTrace) {}
}

/// Default no-op callback.
pub struct NoOpCallback;

impl NoOpCallback {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoOpCallback {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LoopCallback for NoOpCallback {}

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

/// Everything the loop needs to run.
pub struct AgentLoopInput<'a, C: LoopCallback> {
    /// The conversation messages (system + user + prior context).
    pub messages: Vec<Message>,
    /// Model client to call.
    pub llm_client: &'a GeminiClient,
    /// Tool registry to execute tools against.
    pub tools: &'a ToolRegistry,
    /// Pre-computed tool definitions (avoids recomputing per-iteration).
    pub tool_definitions: Vec<ToolDefinition>,
    /// Loop configuration.
    pub config: LoopConfig,
    /// Event callback.
    pub callback: C,
}

/// The result of running the agent loop.
pub struct AgentLoopOutput {
    /// The final assistant response text.
    pub response: String,
    /// Structured trace of the full execution.
    pub trace: LoopTrace,
    /// The full messages vector at the end (including tool results etc.).
    pub final_messages: Vec<Message>,
    /// Accumulated token usage across all iterations.
    pub total_usage: Usage,
}

// ---------------------------------------------------------------------------
// Core loop implementation
// ---------------------------------------------------------------------------

/// Run the agent loop.
///
/// Calls the model, executes requested tool calls, feeds results back, and
/// repeats until the model stops requesting tools or limits are hit. The
/// message vector is append-only: every tool-call request gets exactly one
/// tool message carrying its call ID, in request order.
pub async fn run_agent_loop<C: LoopCallback>(
    input: AgentLoopInput<'_, C>,
) -> Result<AgentLoopOutput> {
    let AgentLoopInput {
        mut messages,
        llm_client,
        tools,
        tool_definitions,
        config,
        callback,
    } = input;

    let loop_start = Instant::now();

    let mut iteration: u32 = 0;
    let mut tool_calls_made: u32 = 0;
    let mut final_response = String::new();
    let mut loop_guard = LoopGuard::default();
    let mut steps: Vec<LoopStep> = Vec::new();
    let mut total_usage = Usage::default();
    let outcome;

    loop {
        iteration += 1;
        let iter_start = Instant::now();
        info!("Agent loop iteration {}/{}", iteration, config.max_iterations);

        callback.on_iteration_start(iteration).await;

        // Check iteration limit
        if iteration > config.max_iterations {
            warn!("Agent loop exceeded max iterations");
            if final_response.is_empty() {
                final_response = config.fallback_message.clone();
            }
            outcome = LoopOutcome::MaxIterationsExceeded;
            break;
        }

        // Once the tool budget is spent, re-invoke without tool definitions
        // so the model has to produce text.
        let use_tools = tool_calls_made < config.max_tool_calls && !tool_definitions.is_empty();

        let response = if use_tools {
            llm_client
                .chat_with_tools(
                    messages.clone(),
                    tool_definitions.clone(),
                    config.generation_options.clone(),
                )
                .await
        } else {
            llm_client
                .chat(messages.clone(), config.generation_options.clone())
                .await
        };

        let response = match response {
            Ok(resp) => resp,
            Err(e) => {
                warn!("Model call failed: {}", e);
                if final_response.is_empty() {
                    final_response = config.fallback_message.clone();
                }
                outcome = LoopOutcome::LlmError(e.to_string());
                break;
            }
        };

        if let Some(ref usage) = response.usage {
            accumulate_usage(&mut total_usage, usage);
        }

        let choice = match response.choices.first() {
            Some(c) => c,
            None => {
                if final_response.is_empty() {
                    final_response = config.fallback_message.clone();
                }
                outcome = LoopOutcome::EmptyResponse;
                break;
            }
        };

        let finish_reason = choice
            .finish_reason
            .as_deref()
            .unwrap_or("unknown")
            .to_string();

        let requested = choice.message.requested_tool_calls();
        info!(
            "Model finish_reason: {}, has_content: {}, tool_calls: {}",
            finish_reason,
            !choice.message.content.is_empty(),
            requested.len()
        );

        // --- Tool calls requested: act, then go around again ---------------
        if use_tools && !requested.is_empty() {
            info!(
                "Model requested {} tool calls (total so far: {})",
                requested.len(),
                tool_calls_made
            );

            // Add the assistant message (with tool_calls) to context
            messages.push(choice.message.clone());

            let mut actions = Vec::new();
            let mut pending_hints = Vec::new();

            for tc in requested {
                tool_calls_made += 1;

                let tool_name = &tc.function.name;

                // Malformed argument JSON degrades to {} so the tool itself
                // reports the missing parameter.
                let args: serde_json::Value = match serde_json::from_str(&tc.function.arguments) {
                    Ok(v) => v,
                    Err(e) => {
                        warn!("Failed to parse tool arguments for {}: {}", tool_name, e);
                        serde_json::json!({})
                    }
                };

                info!(
                    "Executing tool: {} (call #{}/{})",
                    tool_name, tool_calls_made, config.max_tool_calls
                );
                debug!("Tool {} arguments: {}", tool_name, tc.function.arguments);

                let call = ToolCall {
                    id: tc.id.clone(),
                    name: tool_name.clone(),
                    arguments: args,
                };

                let tool_start = Instant::now();
                let result = tools.execute(&call).await;
                let duration_ms = tool_start.elapsed().as_millis() as u64;

                let (success, result_content) = match result {
                    Ok(r) => {
                        let s = r.to_llm_string();
                        info!("Tool {} finished, result length: {} chars", tool_name, s.len());
                        debug!("Tool {} result: {}", tool_name, snippet(&s, 1000));
                        (r.success, s)
                    }
                    Err(e) => {
                        let err = format!("Tool error: {}", e);
                        warn!("Tool {} failed: {}", tool_name, err);
                        (false, err)
                    }
                };

                // Every request gets exactly one tool message, in order.
                messages.push(Message::tool(&tc.id, &result_content));

                // Check for stuck loops
                let loop_guard_triggered = match loop_guard.record(
                    tool_name,
                    &tc.function.arguments,
                    &result_content,
                ) {
                    Some(hint) => {
                        warn!("Loop guard triggered for tool '{}', injecting hint", tool_name);
                        pending_hints.push(hint);
                        true
                    }
                    None => false,
                };

                let observation = ToolObservation {
                    success,
                    content: result_content,
                    duration_ms,
                    loop_guard_triggered,
                };

                callback.on_tool_executed(tool_name, &observation).await;

                actions.push(ToolAction {
                    tool_name: tool_name.clone(),
                    arguments: tc.function.arguments.clone(),
                    observation,
                });
            }

            // Hints go after the tool-message batch so tool_call_id pairing
            // stays intact.
            for hint in pending_hints {
                messages.push(Message::user(&hint));
            }

            let step = LoopStep {
                iteration,
                thought: choice.message.content.clone(),
                actions,
                finish_reason,
                timestamp: iter_start,
            };
            callback.on_iteration_end(&step).await;
            steps.push(step);

            // Continue loop; the model will process the tool results
            continue;
        }

        // --- No tool calls: content is the final response -------------------
        if !choice.message.content.is_empty() {
            final_response = choice.message.content.clone();
            debug!("Agent reply: {}", snippet(&final_response, 500));

            let step = LoopStep {
                iteration,
                thought: final_response.clone(),
                actions: vec![],
                finish_reason,
                timestamp: iter_start,
            };
            callback.on_iteration_end(&step).await;
            steps.push(step);

            if !use_tools && !tool_definitions.is_empty() {
                outcome = LoopOutcome::ToolLimitReached;
            } else {
                outcome = LoopOutcome::Completed;
            }
            break;
        }

        // --- Edge case: no content, no tool calls ---------------------------
        warn!("Model returned empty response, finish_reason: {}", finish_reason);
        final_response = config.fallback_message.clone();

        let step = LoopStep {
            iteration,
            thought: String::new(),
            actions: vec![],
            finish_reason,
            timestamp: iter_start,
        };
        callback.on_iteration_end(&step).await;
        steps.push(step);
        outcome = LoopOutcome::EmptyResponse;
        break;
    }

    let total_duration_ms = loop_start.elapsed().as_millis() as u64;

    let trace = LoopTrace {
        steps,
        outcome: outcome.clone(),
        total_duration_ms,
    };

    callback.on_loop_complete(&trace).await;

    info!(
        "Agent loop finished: outcome={:?}, iterations={}, tool_calls={}, duration={}ms",
        outcome,
        iteration.min(config.max_iterations),
        tool_calls_made,
        total_duration_ms,
    );

    Ok(AgentLoopOutput {
        response: final_response,
        trace,
        final_messages: messages,
        total_usage,
    })
}

/// First `max` bytes of a string, backed off to a char boundary.
fn snippet(s: &str, max: usize) -> &str {
    let mut end = s.len().min(max);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Sum token usage from one response into an accumulator.
fn accumulate_usage(total: &mut Usage, delta: &Usage) {
    total.prompt_tokens += delta.prompt_tokens;
    total.completion_tokens += delta.completion_tokens;
    total.total_tokens += delta.total_tokens;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
