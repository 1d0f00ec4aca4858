//! Conversation management

use crate::agent::types::{Message, Role};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A conversation session
#[derive(Debug, Clone)]
pub struct Conversation {
    /// Unique conversation ID
    pub id: Uuid,
    /// Session ID (e.g., web session, or "cli")
    pub session_id: String,
    /// Messages in the conversation
    pub messages: Vec<Message>,
    /// System prompt for this conversation
    pub system_prompt: Option<String>,
    /// When the conversation started
    pub created_at: DateTime<Utc>,
    /// When the conversation was last updated
    pub updated_at: DateTime<Utc>,
    /// Total tokens used
    pub total_tokens: u32,
}

impl Conversation {
    /// Create a new conversation
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Conversation {
            id: Uuid::new_v4(),
            session_id: session_id.into(),
            messages: Vec::new(),
            system_prompt: None,
            created_at: now,
            updated_at: now,
            total_tokens: 0,
        }
    }

    /// Set the system prompt
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Add a message to the conversation
    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
        self.updated_at = Utc::now();
    }

    /// Add a user message
    pub fn add_user_message(&mut self, content: impl Into<String>) {
        self.add_message(Message::user(content));
    }

    /// Add an assistant message
    pub fn add_assistant_message(&mut self, content: impl Into<String>) {
        self.add_message(Message::assistant(content));
    }

    /// Record token usage from a completed turn
    pub fn add_usage(&mut self, tokens: u32) {
        self.total_tokens += tokens;
    }

    /// Get messages formatted for an API request (system prompt first)
    pub fn get_api_messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.messages.len() + 1);

        if let Some(ref system) = self.system_prompt {
            messages.push(Message::system(system));
        }

        messages.extend(self.messages.clone());
        messages
    }

    /// Truncate conversation to fit within a character budget.
    /// Keeps the system prompt and the most recent messages.
    pub fn truncate_to_chars(&mut self, max_chars: usize) {
        let mut total_chars: usize = self.system_prompt.as_ref().map(|s| s.len()).unwrap_or(0);

        // Start from the end and keep messages that fit
        let mut keep_from = 0;
        for (i, msg) in self.messages.iter().enumerate().rev() {
            let msg_chars = msg.content.len();
            if total_chars + msg_chars > max_chars {
                keep_from = i + 1;
                break;
            }
            total_chars += msg_chars;
        }

        if keep_from > 0 {
            self.messages.drain(..keep_from);
        }
    }

    /// Clear all messages
    pub fn clear(&mut self) {
        self.messages.clear();
        self.updated_at = Utc::now();
    }

    /// Get message count
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Check if conversation is empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Get the last assistant message, if any
    pub fn last_assistant_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant)
    }
}

/// Manages conversations for the web front-end, keyed by session ID
pub struct ConversationManager {
    /// Active conversations by session ID
    conversations: std::collections::HashMap<String, Conversation>,
    /// Default system prompt
    default_system_prompt: Option<String>,
}

impl ConversationManager {
    /// Create a new conversation manager
    pub fn new() -> Self {
        ConversationManager {
            conversations: std::collections::HashMap::new(),
            default_system_prompt: None,
        }
    }

    /// Set the default system prompt
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.default_system_prompt = Some(prompt.into());
        self
    }

    /// Get or create a conversation for a session
    pub fn get_or_create(&mut self, session_id: &str) -> &mut Conversation {
        if !self.conversations.contains_key(session_id) {
            let mut conv = Conversation::new(session_id);
            if let Some(ref prompt) = self.default_system_prompt {
                conv = conv.with_system_prompt(prompt);
            }
            self.conversations.insert(session_id.to_string(), conv);
        }
        self.conversations.get_mut(session_id).unwrap()
    }

    /// Get a conversation by session ID
    pub fn get(&self, session_id: &str) -> Option<&Conversation> {
        self.conversations.get(session_id)
    }

    /// Remove a conversation
    pub fn remove(&mut self, session_id: &str) -> Option<Conversation> {
        self.conversations.remove(session_id)
    }

    /// Clear a session's conversation (but keep the entry)
    pub fn clear_conversation(&mut self, session_id: &str) {
        if let Some(conv) = self.conversations.get_mut(session_id) {
            conv.clear();
        }
    }

    /// Count active conversations
    pub fn conversation_count(&self) -> usize {
        self.conversations.len()
    }
}

impl Default for ConversationManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_creation() {
        let conv = Conversation::new("session-1");
        assert_eq!(conv.session_id, "session-1");
        assert!(conv.is_empty());
    }

    #[test]
    fn test_add_messages() {
        let mut conv = Conversation::new("session-1");
        conv.add_user_message("Hello");
        conv.add_assistant_message("Hi there!");

        assert_eq!(conv.message_count(), 2);
        assert_eq!(conv.messages[0].role, Role::User);
        assert_eq!(conv.messages[1].role, Role::Assistant);
    }

    #[test]
    fn test_api_messages_with_system() {
        let conv = Conversation::new("session-1").with_system_prompt("You are a helpful assistant.");

        let api_messages = conv.get_api_messages();
        assert_eq!(api_messages.len(), 1);
        assert_eq!(api_messages[0].role, Role::System);
    }

    #[test]
    fn test_truncation_keeps_recent() {
        let mut conv = Conversation::new("session-1");
        conv.add_user_message("a".repeat(100));
        conv.add_assistant_message("b".repeat(100));
        conv.add_user_message("c".repeat(100));

        conv.truncate_to_chars(150);
        assert_eq!(conv.message_count(), 1);
        assert!(conv.messages[0].content.starts_with('c'));
    }

    #[test]
    fn test_conversation_manager() {
        let mut manager = ConversationManager::new().with_system_prompt("Test system prompt");

        let conv = manager.get_or_create("s1");
        conv.add_user_message("Hello");

        assert!(manager.get("s1").is_some());
        assert!(manager.get("s2").is_none());
        assert_eq!(manager.conversation_count(), 1);

        manager.clear_conversation("s1");
        assert!(manager.get("s1").unwrap().is_empty());
        // System prompt survives a clear
        assert!(manager.get("s1").unwrap().system_prompt.is_some());
    }
}
