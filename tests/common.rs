// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides store seeding, request builders, and mock model backends
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealforge
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

//! Shared test utilities for `mealforge`

use async_trait::async_trait;
use std::sync::{Arc, Once};
use std::time::Duration;

use mealforge::config::SubscriptionPlan;
use mealforge::errors::AppError;
use mealforge::llm::{ChatRequest, ChatResponse, RecipeModel};
use mealforge::models::{
    GenerationMode, GenerationRequest, NormalizedIngredient, NutritionPer100g, UserProfile,
};
use mealforge::storage::SqliteMealStore;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// In-memory store seeded with a user and common nutrition rows
pub async fn create_test_store() -> (Arc<SqliteMealStore>, UserProfile) {
    init_test_logging();
    let store = SqliteMealStore::new("sqlite::memory:")
        .await
        .expect("in-memory store");

    let user_id = store
        .create_user("test-token", SubscriptionPlan::Free, Some("EUR"))
        .await
        .expect("seed user");

    store
        .upsert_nutrition("Chicken breast", chicken_nutrition())
        .await
        .expect("seed nutrition");
    store
        .upsert_nutrition("Rice", rice_nutrition())
        .await
        .expect("seed nutrition");

    let user = UserProfile {
        id: user_id,
        plan: SubscriptionPlan::Free,
        currency: Some("EUR".to_owned()),
    };
    (Arc::new(store), user)
}

pub fn chicken_nutrition() -> NutritionPer100g {
    NutritionPer100g {
        calories: 165.0,
        protein: 31.0,
        carbs: 0.0,
        fat: 3.6,
    }
}

pub fn rice_nutrition() -> NutritionPer100g {
    NutritionPer100g {
        calories: 130.0,
        protein: 2.7,
        carbs: 28.0,
        fat: 0.3,
    }
}

pub fn ingredient(name: &str, grams: u32, nutrition: NutritionPer100g) -> NormalizedIngredient {
    NormalizedIngredient {
        name: name.to_owned(),
        grams,
        nutrition,
    }
}

/// A nutri-mode request over chicken and rice
pub fn chicken_rice_request(mode: GenerationMode) -> GenerationRequest {
    GenerationRequest {
        ingredients: vec![
            ingredient("Chicken breast", 300, chicken_nutrition()),
            ingredient("Rice", 200, rice_nutrition()),
        ],
        mode,
        target_calories: Some(600),
        target_protein: Some(45),
        target_carbs: None,
        target_fats: None,
        servings: 2,
    }
}

/// A well-formed model response over chicken and rice
pub fn valid_model_response() -> String {
    r#"{
        "name": "Chicken and rice bowl",
        "ingredients": [
            {"name": "Chicken breast", "amount": "150g"},
            {"name": "Rice", "amount": "100g"}
        ],
        "preparation": "1. Cook rice. 2. Sear chicken. 3. Combine and serve.",
        "macros": {"calories": 380, "protein": 48, "carbs": 29, "fats": 6},
        "message": "Matches your targets.",
        "cooking_time_minutes": 25,
        "description": "A simple high-protein bowl."
    }"#
    .to_owned()
}

// ============================================================================
// Mock Models
// ============================================================================

/// Model that always returns the same canned content
pub struct CannedModel {
    pub content: String,
}

impl CannedModel {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

#[async_trait]
impl RecipeModel for CannedModel {
    fn name(&self) -> &'static str {
        "canned"
    }

    fn default_model(&self) -> &str {
        "canned-model"
    }

    async fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse, AppError> {
        Ok(ChatResponse {
            content: self.content.clone(),
            model: "canned-model".to_owned(),
            usage: None,
            finish_reason: Some("stop".to_owned()),
        })
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        Ok(true)
    }
}

/// Model whose transport always fails
pub struct UnreachableModel;

#[async_trait]
impl RecipeModel for UnreachableModel {
    fn name(&self) -> &'static str {
        "unreachable"
    }

    fn default_model(&self) -> &str {
        "unreachable-model"
    }

    async fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse, AppError> {
        Err(AppError::model_unavailable("connection refused"))
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        Ok(false)
    }
}

/// Model that sleeps before answering, to exercise the timeout path
pub struct SlowModel {
    pub delay: Duration,
}

#[async_trait]
impl RecipeModel for SlowModel {
    fn name(&self) -> &'static str {
        "slow"
    }

    fn default_model(&self) -> &str {
        "slow-model"
    }

    async fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse, AppError> {
        tokio::time::sleep(self.delay).await;
        Ok(ChatResponse {
            content: valid_model_response(),
            model: "slow-model".to_owned(),
            usage: None,
            finish_reason: Some("stop".to_owned()),
        })
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        Ok(true)
    }
}
