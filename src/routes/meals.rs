// ABOUTME: Meal generation route handlers and request/response DTOs
// ABOUTME: Bearer-token auth, nutrition resolution, and the success/failure envelopes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealforge

//! Meal generation routes
//!
//! One endpoint does the work: `POST /api/meals/generate`. The handler
//! resolves the caller from an opaque bearer token, fills in per-100g
//! nutrition for any ingredient the caller didn't supply it for, normalizes
//! quantities to grams, and hands the request to the engine.
//!
//! Success envelope: `{"success": true, "meal": {...}, "message": "..."}`.
//! Failures use the shared `{error, timestamp, type}` envelope.

use axum::{
    extract::State,
    http::header::AUTHORIZATION,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::engine::{units, MealEngine};
use crate::errors::AppError;
use crate::models::{
    GeneratedRecipe, GenerationMode, GenerationRequest, Ingredient, IngredientUnit,
    NormalizedIngredient, NutritionPer100g, QuantityValue, UserProfile,
};
use crate::storage::MealStore;

/// Shared state for meal routes
#[derive(Clone)]
pub struct AppState {
    /// Generation engine
    pub engine: Arc<MealEngine>,
    /// Persistence boundary, for token resolution and nutrition lookup
    pub store: Arc<dyn MealStore>,
}

/// Create all meal routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/meals/generate", post(generate_meal_handler))
        .with_state(state)
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// One ingredient as supplied by the caller
#[derive(Debug, Deserialize)]
pub struct IngredientInput {
    /// Ingredient name
    pub name: String,
    /// Quantity in `unit`; number or numeric string
    #[serde(alias = "available_quantity")]
    pub quantity: QuantityValue,
    /// Unit of the quantity, defaulting to grams
    #[serde(default)]
    pub unit: IngredientUnit,
    /// Calories per 100 g, when the caller knows them
    #[serde(default, alias = "calories_per_100g")]
    pub calories: Option<f64>,
    /// Protein grams per 100 g
    #[serde(default, alias = "protein_per_100g")]
    pub protein: Option<f64>,
    /// Carbohydrate grams per 100 g
    #[serde(default, alias = "carbs_per_100g")]
    pub carbs: Option<f64>,
    /// Fat grams per 100 g
    #[serde(default, alias = "fat_per_100g")]
    pub fat: Option<f64>,
}

/// Body of `POST /api/meals/generate`
#[derive(Debug, Deserialize)]
pub struct GenerateMealRequest {
    /// Available ingredients
    pub ingredients: Vec<IngredientInput>,
    /// Generation mode, defaulting to nutri
    #[serde(default)]
    pub mode: GenerationMode,
    /// Target calories for the whole recipe (nutri mode)
    #[serde(default)]
    pub calories: Option<i64>,
    /// Target protein in grams
    #[serde(default)]
    pub protein: Option<i64>,
    /// Target carbohydrates in grams
    #[serde(default)]
    pub carbs: Option<i64>,
    /// Target fats in grams
    #[serde(default)]
    pub fats: Option<i64>,
    /// Serving count, defaulting to 1
    #[serde(default = "default_servings")]
    pub servings: u8,
}

const fn default_servings() -> u8 {
    1
}

/// Success envelope for a generated meal
#[derive(Debug, Serialize)]
pub struct GenerateMealResponse {
    /// Always `true` on this envelope
    pub success: bool,
    /// The generated meal record
    pub meal: GeneratedRecipe,
    /// Short status message
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Extract the opaque bearer token from the Authorization header
fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(AppError::auth_required)?;
    let value = header
        .to_str()
        .map_err(|_| AppError::auth_invalid("malformed Authorization header"))?;
    value
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::auth_invalid("expected a bearer token"))
}

/// Per-100g nutrition for an input ingredient
///
/// Caller-supplied values win per field; missing fields come from the
/// reference table, and failing that from the generic fallback profile so
/// totals stay plausible.
async fn resolve_nutrition(
    input: &IngredientInput,
    store: &Arc<dyn MealStore>,
) -> Result<NutritionPer100g, AppError> {
    if let (Some(calories), Some(protein), Some(carbs), Some(fat)) =
        (input.calories, input.protein, input.carbs, input.fat)
    {
        return Ok(NutritionPer100g {
            calories,
            protein,
            carbs,
            fat,
        });
    }

    let base = match store.lookup_nutrition(&input.name).await? {
        Some(found) => found,
        None => {
            debug!(name = %input.name, "no nutrition data found; using fallback profile");
            NutritionPer100g::fallback()
        }
    };
    Ok(NutritionPer100g {
        calories: input.calories.unwrap_or(base.calories),
        protein: input.protein.unwrap_or(base.protein),
        carbs: input.carbs.unwrap_or(base.carbs),
        fat: input.fat.unwrap_or(base.fat),
    })
}

async fn normalize_ingredients(
    inputs: &[IngredientInput],
    store: &Arc<dyn MealStore>,
    engine: &MealEngine,
) -> Result<Vec<NormalizedIngredient>, AppError> {
    let mut normalized = Vec::with_capacity(inputs.len());
    for input in inputs {
        let nutrition = resolve_nutrition(input, store).await?;
        let ingredient = Ingredient {
            name: input.name.clone(),
            quantity: input.quantity.clone(),
            unit: input.unit,
            nutrition,
        };
        normalized.push(units::normalize(
            &ingredient,
            &engine.config().piece_weights,
        ));
    }
    Ok(normalized)
}

async fn generate_meal_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<GenerateMealRequest>,
) -> Result<Json<GenerateMealResponse>, AppError> {
    let token = bearer_token(&headers)?;
    let user: UserProfile = state
        .store
        .resolve_token(token)
        .await?
        .ok_or_else(|| AppError::auth_invalid("unknown token"))?;

    info!(
        user_id = %user.id,
        mode = ?body.mode,
        ingredients = body.ingredients.len(),
        "meal generation requested"
    );

    let ingredients = normalize_ingredients(&body.ingredients, &state.store, &state.engine).await?;
    let request = GenerationRequest {
        ingredients,
        mode: body.mode,
        target_calories: body.calories,
        target_protein: body.protein,
        target_carbs: body.carbs,
        target_fats: body.fats,
        servings: body.servings,
    };

    let meal = state.engine.generate(&user, &request).await?;

    Ok(Json(GenerateMealResponse {
        success: true,
        meal,
        message: "Meal generated successfully".to_owned(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer tok-123"));
        assert_eq!(bearer_token(&headers).unwrap(), "tok-123");

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert!(bearer_token(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_err());
    }

    #[test]
    fn test_request_body_aliases_and_defaults() {
        let body: GenerateMealRequest = serde_json::from_str(
            r#"{
                "ingredients": [
                    {"name": "Rice", "available_quantity": "300", "unit": "grams"},
                    {"name": "Eggs", "quantity": 3, "unit": "pieces"}
                ],
                "mode": "easy"
            }"#,
        )
        .unwrap();

        assert_eq!(body.ingredients.len(), 2);
        assert_eq!(body.mode, GenerationMode::Easy);
        assert_eq!(body.servings, 1);
        assert_eq!(body.ingredients[0].quantity.parse(), Some(300.0));
        assert_eq!(body.ingredients[1].quantity.parse(), Some(3.0));
    }

    #[test]
    fn test_per_100g_field_names_are_accepted() {
        let input: IngredientInput = serde_json::from_str(
            r#"{
                "name": "Chicken breast",
                "quantity": 300,
                "unit": "grams",
                "calories_per_100g": 165,
                "protein_per_100g": 31,
                "carbs_per_100g": 0,
                "fat_per_100g": 3.6
            }"#,
        )
        .unwrap();

        assert_eq!(input.calories, Some(165.0));
        assert_eq!(input.protein, Some(31.0));
        assert_eq!(input.carbs, Some(0.0));
        assert_eq!(input.fat, Some(3.6));

        // The short field names remain accepted
        let input: IngredientInput = serde_json::from_str(
            r#"{"name": "Rice", "quantity": 200, "calories": 130, "protein": 2.7}"#,
        )
        .unwrap();
        assert_eq!(input.calories, Some(130.0));
        assert_eq!(input.protein, Some(2.7));
        assert_eq!(input.carbs, None);
    }
}
