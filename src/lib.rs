// ABOUTME: Main library entry point for the Mealforge meal-generation service
// ABOUTME: Exposes the engine, model boundary, persistence boundary, and HTTP routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealforge

// Crate-level attributes:
// - recursion_limit: Increased from default 128 to 256 for complex derive macros
//   (serde, thiserror) on deeply nested types
// - deny(unsafe_code): Zero-tolerance unsafe policy
#![recursion_limit = "256"]
#![deny(unsafe_code)]

//! # Mealforge
//!
//! A meal-generation service that turns a user's available ingredients into
//! one complete recipe via a language model, then verifies every nutrition
//! claim before anything is persisted or returned.
//!
//! ## Core guarantees
//!
//! - **Never trust the model's arithmetic**: macro totals are always
//!   recomputed from per-100g ingredient data
//! - **Always return a recipe**: malformed model output routes to a
//!   deterministic fallback generator
//! - **Ephemeral records**: generated meals expire 24 hours after creation
//!
//! ## Architecture
//!
//! - **engine**: unit normalization, quantity parsing, fuzzy matching,
//!   macro computation, prompt assembly, reconciliation, fallback
//! - **llm**: pluggable model backends behind the [`llm::RecipeModel`] trait
//! - **storage**: persistence boundary behind the [`storage::MealStore`] trait
//! - **routes**: the axum HTTP surface
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mealforge::config::GenerationConfig;
//! use mealforge::engine::MealEngine;
//! use mealforge::errors::AppResult;
//! use mealforge::llm::OpenAiCompatibleProvider;
//! use mealforge::storage::SqliteMealStore;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let store = Arc::new(SqliteMealStore::new("sqlite:mealforge.db").await?);
//!     let model = Arc::new(OpenAiCompatibleProvider::from_env()?);
//!     let engine = MealEngine::new(store, model, GenerationConfig::default());
//!     println!("engine ready, model: {}", engine.config().models.free);
//!     Ok(())
//! }
//! ```

/// Typed configuration: heuristic tables, thresholds, and model selection
pub mod config;

/// The meal-generation pipeline
pub mod engine;

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Model provider abstraction for recipe generation
pub mod llm;

/// Production logging and structured output
pub mod logging;

/// Common data models for ingredients, requests, and generated recipes
pub mod models;

/// HTTP routes for meal generation and health checks
pub mod routes;

/// Persistence boundary for users, meals, and nutrition data
pub mod storage;
