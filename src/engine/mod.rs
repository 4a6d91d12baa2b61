// ABOUTME: Meal-generation engine: orchestrates prompt, model call, reconciliation, fallback
// ABOUTME: Owns the timeout policy and the persist-before-return guarantee
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealforge

//! # Meal-Generation Engine
//!
//! One entry point, [`MealEngine::generate`], drives the whole pipeline:
//!
//! 1. validate the request (no model call for invalid input)
//! 2. snapshot the user's existing meals for duplicate avoidance and
//!    protein rotation
//! 3. assemble the prompt and call the model under a timeout
//! 4. reconcile the response, recomputing every nutrition claim
//! 5. on timeout or a malformed response, substitute the fallback recipe
//! 6. persist the result; a persistence failure is surfaced distinctly
//!
//! Transport failures from the model backend are hard errors. Content
//! failures (bad JSON, missing fields, emptied allowlist) are recovered via
//! the fallback generator: the user always gets a recipe unless the model
//! was unreachable or the store rejected the write.

pub mod amounts;
pub mod fallback;
pub mod macros;
pub mod matcher;
pub mod prompt;
pub mod reconcile;
pub mod units;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{info, warn};

use crate::config::GenerationConfig;
use crate::errors::AppError;
use crate::llm::{ChatMessage, ChatRequest, RecipeModel};
use crate::models::{
    GeneratedRecipe, GenerationMode, GenerationRequest, StoredMealSummary, UserProfile,
};
use crate::storage::MealStore;

/// Sampling temperature for recipe generation
const GENERATION_TEMPERATURE: f32 = 0.7;

/// Orchestrates one meal generation end to end
pub struct MealEngine {
    store: Arc<dyn MealStore>,
    model: Arc<dyn RecipeModel>,
    config: GenerationConfig,
}

impl MealEngine {
    /// Create an engine over the given store and model backend
    #[must_use]
    pub fn new(
        store: Arc<dyn MealStore>,
        model: Arc<dyn RecipeModel>,
        config: GenerationConfig,
    ) -> Self {
        Self {
            store,
            model,
            config,
        }
    }

    /// Engine configuration
    #[must_use]
    pub const fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Generate one meal for the user and persist it
    ///
    /// # Errors
    ///
    /// - validation errors for a malformed request
    /// - a model error when the backend is unreachable, rejects the call,
    ///   or returns an empty body
    /// - a persistence error when the recipe was produced but could not be
    ///   stored
    ///
    /// Malformed model *content* is not an error: it routes to the fallback
    /// generator.
    pub async fn generate(
        &self,
        user: &UserProfile,
        request: &GenerationRequest,
    ) -> Result<GeneratedRecipe, AppError> {
        request.validate()?;

        let existing = self.store.existing_meals(user.id).await?;
        let titles: Vec<String> = existing.iter().map(|meal| meal.title.clone()).collect();
        let used_proteins = self.recent_proteins(&existing);
        let allowlist = self.easy_allowlist(request);

        let sections = prompt::build_prompt(
            request,
            &titles,
            &used_proteins,
            allowlist.as_deref(),
            &self.config,
        );
        let chat = ChatRequest::new(vec![
            ChatMessage::system(sections.system),
            ChatMessage::user(sections.user),
        ])
        .with_model(self.config.models.for_plan(user.plan))
        .with_temperature(GENERATION_TEMPERATURE);

        let recipe = match timeout(
            Duration::from_secs(self.config.model_timeout_secs),
            self.model.complete(&chat),
        )
        .await
        {
            Err(_elapsed) => {
                warn!(
                    timeout_secs = self.config.model_timeout_secs,
                    "model call timed out; using fallback recipe"
                );
                fallback::generate_fallback(request, &self.config)
            }
            Ok(Err(model_error)) => return Err(model_error),
            Ok(Ok(response)) => {
                if response.content.trim().is_empty() {
                    return Err(AppError::model_empty_response());
                }
                match reconcile::reconcile(
                    &response.content,
                    request,
                    allowlist.as_deref(),
                    user.currency.as_deref(),
                    &self.config,
                ) {
                    Ok(recipe) => recipe,
                    Err(reason) => {
                        warn!(%reason, "model response failed reconciliation; using fallback recipe");
                        fallback::generate_fallback(request, &self.config)
                    }
                }
            }
        };

        self.store.insert_generated(user.id, &recipe).await?;

        info!(
            meal_id = %recipe.id,
            title = %recipe.title,
            calories = recipe.macros.calories,
            "meal generated and stored"
        );
        Ok(recipe)
    }

    /// Protein names used in the most recent meals, for rotation
    fn recent_proteins(&self, existing: &[StoredMealSummary]) -> Vec<String> {
        existing
            .iter()
            .take(self.config.protein_history_window)
            .flat_map(|meal| meal.ingredient_names.iter())
            .filter(|name| self.config.is_protein(name))
            .cloned()
            .collect()
    }

    /// Allowlist for easy mode: the user's ingredients plus pantry staples
    fn easy_allowlist(&self, request: &GenerationRequest) -> Option<Vec<String>> {
        if request.mode != GenerationMode::Easy {
            return None;
        }
        let mut allowlist: Vec<String> = request
            .ingredients
            .iter()
            .map(|ingredient| ingredient.name.clone())
            .collect();
        allowlist.extend(self.config.pantry_staples.iter().cloned());
        Some(allowlist)
    }
}
