// ABOUTME: Model provider abstraction for pluggable recipe-generation backends
// ABOUTME: Defines the contract recipe models implement plus the chat message types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealforge

//! # Recipe Model Service Provider Interface
//!
//! This module defines the contract a language-model backend must implement
//! to serve recipe generation. The engine only ever sees the trait: the
//! HTTP provider, and mock models in tests, are interchangeable.
//!
//! ## Example: Using a Model
//!
//! ```rust,no_run
//! use mealforge::llm::{RecipeModel, ChatMessage, ChatRequest};
//!
//! async fn example(model: &dyn RecipeModel) {
//!     let messages = vec![
//!         ChatMessage::system("You are a professional chef."),
//!         ChatMessage::user("Suggest a recipe with chicken and rice."),
//!     ];
//!
//!     let request = ChatRequest::new(messages);
//!     let response = model.complete(&request).await;
//! }
//! ```

mod openai_compatible;

pub use openai_compatible::{OpenAiCompatibleConfig, OpenAiCompatibleProvider};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

// ============================================================================
// Message Types
// ============================================================================

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instructions that set behavior
    System,
    /// Message from the user
    User,
    /// Response from the model
    Assistant,
}

impl MessageRole {
    /// Wire-format string for this role
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who authored this message
    pub role: MessageRole,
    /// Message text content
    pub content: String,
}

impl ChatMessage {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// A chat completion request
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Conversation messages, in order
    pub messages: Vec<ChatMessage>,
    /// Model to use; `None` selects the provider default
    pub model: Option<String>,
    /// Sampling temperature (0.0 to 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Create a request with the given messages and default settings
    #[must_use]
    pub const fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set the model to use
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the sampling temperature
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum tokens to generate
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Token usage statistics for a completion
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,
    /// Tokens in the completion
    pub completion_tokens: u32,
    /// Total tokens consumed
    pub total_tokens: u32,
}

/// A completed chat response
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Generated text content
    pub content: String,
    /// Model that produced the response
    pub model: String,
    /// Token usage, when the backend reports it
    pub usage: Option<TokenUsage>,
    /// Why generation stopped, when reported
    pub finish_reason: Option<String>,
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Contract for recipe-generation model backends
///
/// Implementations are stateless request/response clients. Timeout policy
/// lives in the engine, not here.
#[async_trait]
pub trait RecipeModel: Send + Sync {
    /// Short identifier for logging
    fn name(&self) -> &'static str;

    /// Model used when a request does not specify one
    fn default_model(&self) -> &str;

    /// Perform a chat completion
    ///
    /// # Errors
    ///
    /// Returns an error when the backend is unreachable, rejects the
    /// request, or returns an unparseable body.
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError>;

    /// Check whether the backend is reachable
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot be contacted at all.
    async fn health_check(&self) -> Result<bool, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let msg = ChatMessage::system("be brief");
        assert_eq!(msg.role, MessageRole::System);
        assert_eq!(msg.content, "be brief");
        assert_eq!(MessageRole::Assistant.as_str(), "assistant");
    }

    #[test]
    fn test_request_builder() {
        let request = ChatRequest::new(vec![ChatMessage::user("hi")])
            .with_model("qwen2.5:14b-instruct")
            .with_temperature(0.7)
            .with_max_tokens(2048);

        assert_eq!(request.model.as_deref(), Some("qwen2.5:14b-instruct"));
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.max_tokens, Some(2048));
    }
}
