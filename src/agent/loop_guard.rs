//! Loop guard for the tool-calling loop.
//!
//! Detects when the model is stuck calling the same tool repeatedly with
//! similar arguments/results and injects a hint to force reconsideration.

use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};

/// Tracks recent tool calls and detects stuck loops.
pub struct LoopGuard {
    /// Recent (tool_name, arguments_hash, result_snippet) entries.
    recent: VecDeque<(String, u64, String)>,
    /// How many consecutive same-tool-same-result calls trigger intervention.
    threshold: usize,
}

impl LoopGuard {
    /// Create a new guard. `threshold` is how many consecutive identical
    /// results from the same tool trigger a hint (default: 3).
    pub fn new(threshold: usize) -> Self {
        Self {
            recent: VecDeque::with_capacity(threshold + 1),
            threshold,
        }
    }

    /// Record a tool call and its result. Returns `Some(hint)` if the model
    /// appears stuck and should be told to stop retrying.
    pub fn record(&mut self, tool_name: &str, arguments: &str, result: &str) -> Option<String> {
        let mut hasher = DefaultHasher::new();
        arguments.hash(&mut hasher);
        let arg_hash = hasher.finish();
        let result_snippet = Self::snippet(result);

        self.recent
            .push_back((tool_name.to_string(), arg_hash, result_snippet.clone()));

        while self.recent.len() > self.threshold {
            self.recent.pop_front();
        }

        if self.recent.len() >= self.threshold {
            let all_same = self
                .recent
                .iter()
                .all(|(name, _, snip)| name == tool_name && *snip == result_snippet);

            if all_same {
                self.recent.clear(); // don't keep firing
                return Some(format!(
                    "[SYSTEM] The tool '{}' has returned the same result {} times in a row. \
                     Do NOT call this tool again with a similar query. \
                     Instead, respond to the user with what you already know, \
                     or try a completely different approach.",
                    tool_name, self.threshold
                ));
            }
        }

        None
    }

    /// Reset the guard (e.g., between conversation turns).
    pub fn reset(&mut self) {
        self.recent.clear();
    }

    /// Take the first 200 chars of a result for comparison.
    fn snippet(s: &str) -> String {
        let mut end = s.len().min(200);
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        s[..end].to_string()
    }
}

impl Default for LoopGuard {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_trigger_on_different_results() {
        let mut guard = LoopGuard::new(3);
        assert!(guard.record("google_search", r#"{"query":"a"}"#, "result 1").is_none());
        assert!(guard.record("google_search", r#"{"query":"b"}"#, "result 2").is_none());
        assert!(guard.record("google_search", r#"{"query":"c"}"#, "result 3").is_none());
    }

    #[test]
    fn triggers_on_repeated_same_result() {
        let mut guard = LoopGuard::new(3);
        let result = "No results found.";
        assert!(guard.record("google_search", r#"{"query":"a"}"#, result).is_none());
        assert!(guard.record("google_search", r#"{"query":"b"}"#, result).is_none());
        assert!(guard.record("google_search", r#"{"query":"c"}"#, result).is_some());
    }

    #[test]
    fn different_tools_dont_trigger() {
        let mut guard = LoopGuard::new(3);
        let result = "error";
        assert!(guard.record("read_email", "{}", result).is_none());
        assert!(guard.record("send_email", "{}", result).is_none());
        assert!(guard.record("read_email", "{}", result).is_none());
    }

    #[test]
    fn resets_after_trigger() {
        let mut guard = LoopGuard::new(2);
        let result = "same";
        assert!(guard.record("t", "{}", result).is_none());
        assert!(guard.record("t", "{}", result).is_some());
        // After trigger, internal state is cleared
        assert!(guard.record("t", "{}", result).is_none());
    }

    #[test]
    fn snippet_respects_multibyte_boundaries() {
        let mut guard = LoopGuard::new(2);
        let long = "é".repeat(300);
        assert!(guard.record("t", "{}", &long).is_none());
        assert!(guard.record("t", "{}", &long).is_some());
    }
}
