//! Prompt assembly and response extraction (spec.md §4.7).
//!
//! Chat-mode and grounded (RAG) prompt assembly live in one module,
//! deliberately, so both paths share [`PromptBuilder::extract_response`]
//! (spec.md §9, "Scope boundary discipline" — the chat path predates RAG
//! and remains the free-chat fallback).

use crate::document::ScoredChunk;
use crate::error::{CoreError, Result};
use crate::tokencounter::TokenCounter;

/// Maximum accepted length, in characters, of a trimmed user message.
const MAX_MESSAGE_CHARS: usize = 2000;

/// Role prefixes stripped from the front of an extracted completion.
const ROLE_PREFIXES: [&str; 4] = ["Assistant:", "Bot:", "AI:", "GPT:"];

/// A single turn in a chat history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One chat turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Builds chat and grounded prompts, and extracts clean completions.
pub struct PromptBuilder {
    context_max_tokens: usize,
    reserve_tokens: usize,
}

impl PromptBuilder {
    pub fn new(context_max_tokens: usize, reserve_tokens: usize) -> Self {
        Self { context_max_tokens, reserve_tokens }
    }

    /// Validate a user message: non-empty after trimming, and no more than
    /// 2000 characters.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidMessage`] on violation.
    pub fn validate_message(&self, message: &str) -> Result<String> {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidMessage("message must not be empty".into()));
        }
        if trimmed.chars().count() > MAX_MESSAGE_CHARS {
            return Err(CoreError::InvalidMessage(format!(
                "message exceeds {MAX_MESSAGE_CHARS} characters"
            )));
        }
        Ok(trimmed.to_string())
    }

    /// Build a free-chat prompt from `history` plus `new_message`,
    /// truncating `history` from the front until it fits the token budget
    /// (`context_max_tokens - reserve_tokens`), always keeping at least
    /// one message.
    pub fn build_chat_prompt(
        &self,
        history: &[Message],
        new_message: &str,
        counter: &dyn TokenCounter,
    ) -> String {
        let budget = self.context_max_tokens.saturating_sub(self.reserve_tokens);
        let truncated = self.truncate_history(history, budget, counter);

        let mut prompt = String::new();
        for message in truncated {
            let line = Self::format_turn(message);
            if !prompt.is_empty() {
                prompt.push('\n');
            }
            prompt.push_str(&line);
        }
        if !prompt.is_empty() {
            prompt.push('\n');
        }
        prompt.push_str(&format!("User: {new_message}\nAssistant:"));
        prompt
    }

    /// Drop messages from the front of `history` until the estimated
    /// token count of the remainder fits `budget`, but always keep at
    /// least the most recent message.
    fn truncate_history<'a>(
        &self,
        history: &'a [Message],
        budget: usize,
        counter: &dyn TokenCounter,
    ) -> &'a [Message] {
        if history.is_empty() {
            return history;
        }
        let mut start = 0;
        while start < history.len() - 1 {
            let total: usize =
                history[start..].iter().map(|m| counter.count(&Self::format_turn(m))).sum();
            if total <= budget {
                break;
            }
            start += 1;
        }
        &history[start..]
    }

    fn format_turn(message: &Message) -> String {
        match message.role {
            Role::User => format!("User: {}", message.content),
            Role::Assistant => format!("Assistant: {}", message.content),
        }
    }

    /// Build a grounded RAG prompt: a language-agnostic header instructing
    /// the model to answer using only the provided sources, one numbered
    /// `[Source i]:` block per retrieved chunk in retrieval order, the
    /// user question, and the generation cue.
    pub fn build_rag_prompt(&self, chunks: &[ScoredChunk], question: &str) -> String {
        let mut prompt = String::from(
            "Answer the question using only the information in the numbered sources below. \
             If the sources do not contain the answer, say so.\n\n",
        );
        for (i, scored) in chunks.iter().enumerate() {
            prompt.push_str(&format!("[Source {}]:\n{}\n\n", i + 1, scored.chunk.text));
        }
        prompt.push_str(&format!("Question: {question}\nAssistant:"));
        prompt
    }

    /// Extract the clean completion from a model's raw continuation:
    /// truncate at the first `\nUser:` or `\nAssistant:`, strip a leading
    /// role prefix, and trim whitespace.
    pub fn extract_response(raw: &str) -> String {
        let mut end = raw.len();
        for marker in ["\nUser:", "\nAssistant:"] {
            if let Some(pos) = raw.find(marker) {
                end = end.min(pos);
            }
        }
        let truncated = &raw[..end];

        let mut stripped = truncated.trim_start();
        for prefix in ROLE_PREFIXES {
            if let Some(rest) = stripped.strip_prefix(prefix) {
                stripped = rest;
                break;
            }
        }
        stripped.trim().to_string()
    }
}
