// ABOUTME: Data models for ingredients, generation requests, and generated recipes
// ABOUTME: Defines Ingredient, NormalizedIngredient, GenerationRequest, GeneratedRecipe
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealforge

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SubscriptionPlan;
use crate::errors::{AppError, AppResult};

/// Ingredient measurement unit accepted on input
///
/// Everything is converted to grams before the engine sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IngredientUnit {
    /// Weight in grams (base unit)
    #[default]
    Grams,
    /// Weight in kilograms (1000 g)
    Kg,
    /// Weight in ounces (28.35 g)
    Ounces,
    /// Count of whole items (eggs, bananas, etc.)
    Pieces,
    /// US cups (240 ml)
    Cups,
    /// Tablespoons (15 ml)
    Tbsp,
    /// Teaspoons (5 ml)
    Tsp,
    /// Volume in milliliters
    Ml,
    /// Volume in liters (1000 ml)
    Liters,
}

/// A quantity that arrives as either a JSON number or a numeric string
///
/// Client payloads are inconsistent here; both `"quantity": 300` and
/// `"quantity": "300"` must work. Unparseable text is not an error: the
/// normalizer substitutes a default rather than failing the whole request
/// for one bad ingredient.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuantityValue {
    /// Plain numeric quantity
    Number(f64),
    /// Free-text quantity, parsed leniently
    Text(String),
}

impl QuantityValue {
    /// Parse the quantity as a float, if possible
    #[must_use]
    pub fn parse(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Number(_) => None,
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }
}

impl From<f64> for QuantityValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Per-100g nutrition facts for an ingredient
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NutritionPer100g {
    /// Calories per 100 g
    pub calories: f64,
    /// Protein grams per 100 g
    pub protein: f64,
    /// Carbohydrate grams per 100 g
    pub carbs: f64,
    /// Fat grams per 100 g
    pub fat: f64,
}

impl NutritionPer100g {
    /// Safe defaults used when the nutrition lookup fails
    ///
    /// A generic 100 kcal / 5 g protein / 15 g carbs / 2 g fat profile keeps
    /// totals plausible without pretending to precision we don't have.
    #[must_use]
    pub const fn fallback() -> Self {
        Self {
            calories: 100.0,
            protein: 5.0,
            carbs: 15.0,
            fat: 2.0,
        }
    }
}

/// Raw input ingredient, as supplied by the caller after nutrition lookup
///
/// Immutable once constructed. Quantities may be in any supported unit;
/// the unit normalizer converts to grams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    /// Ingredient name as the user typed it
    pub name: String,
    /// Raw quantity in `unit`
    pub quantity: QuantityValue,
    /// Unit of `quantity`
    pub unit: IngredientUnit,
    /// Per-100g nutrition facts
    pub nutrition: NutritionPer100g,
}

/// Ingredient with its quantity normalized to whole grams
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedIngredient {
    /// Ingredient name
    pub name: String,
    /// Quantity in grams, rounded to the nearest integer
    pub grams: u32,
    /// Per-100g nutrition facts
    pub nutrition: NutritionPer100g,
}

/// Generation mode selecting the prompt shape and validation rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// Strict ingredient allowlist, per-serving scaling, no macro targets
    Easy,
    /// Explicit calorie/macro targets with tolerances
    #[default]
    Nutri,
}

/// A validated request to generate one meal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Normalized ingredients available to the recipe
    pub ingredients: Vec<NormalizedIngredient>,
    /// Generation mode
    pub mode: GenerationMode,
    /// Target calories (required and positive in nutri mode)
    pub target_calories: Option<i64>,
    /// Target protein in grams
    pub target_protein: Option<i64>,
    /// Target carbohydrates in grams
    pub target_carbs: Option<i64>,
    /// Target fats in grams
    pub target_fats: Option<i64>,
    /// Number of servings, 1 through 10
    pub servings: u8,
}

impl GenerationRequest {
    /// Validate the request invariants
    ///
    /// # Errors
    ///
    /// Returns a validation error when the ingredient list is empty, the
    /// serving count is out of range, or nutri mode lacks a positive
    /// calorie target. No model call is made for an invalid request.
    pub fn validate(&self) -> AppResult<()> {
        if self.ingredients.is_empty() {
            return Err(AppError::invalid_input("ingredients must be non-empty"));
        }
        if !(1..=10).contains(&self.servings) {
            return Err(AppError::invalid_input("servings must be between 1 and 10"));
        }
        if self.mode == GenerationMode::Nutri {
            match self.target_calories {
                Some(calories) if calories > 0 => {}
                Some(_) => {
                    return Err(AppError::invalid_input(
                        "calories target must be a positive integer",
                    ));
                }
                None => return Err(AppError::missing_field("calories")),
            }
        }
        Ok(())
    }
}

/// One ingredient line as emitted by the model
///
/// The amount is free text ("150g", "1 tsp (optional)") and the name is not
/// guaranteed to match any known ingredient exactly; both are resolved by
/// the quantity parser and the fuzzy matcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredientLine {
    /// Ingredient name as the model wrote it
    pub name: String,
    /// Free-text amount
    pub amount: String,
}

/// Computed macro totals for a recipe
///
/// Always derived by summation over matched ingredient lines, never taken
/// verbatim from the model (zero-match escape hatch excepted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MacroResult {
    /// Total calories (kcal)
    pub calories: i64,
    /// Total protein (g)
    pub protein: i64,
    /// Total carbohydrates (g)
    pub carbs: i64,
    /// Total fats (g)
    pub fats: i64,
}

impl MacroResult {
    /// True when every value is exactly zero, the signal that ingredient
    /// matching failed entirely
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        self.calories == 0 && self.protein == 0 && self.carbs == 0 && self.fats == 0
    }
}

/// Price estimate attached by the model, parsed defensively
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceEstimate {
    /// Estimated restaurant price, if the model supplied a parseable number
    pub restaurant: Option<f64>,
    /// Estimated homemade cost, if the model supplied a parseable number
    pub homemade: Option<f64>,
    /// Currency code; falls back to the user's stored currency
    pub currency: String,
}

/// The persisted output record of one generation call
///
/// Created once per call, persisted immediately, and expired by the storage
/// layer `record_ttl_hours` after creation unless promoted to a permanent
/// saved record by explicit user action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedRecipe {
    /// Record identifier
    pub id: Uuid,
    /// Recipe title
    pub title: String,
    /// Ingredient lines as persisted (post-filtering in easy mode)
    pub ingredients: Vec<RecipeIngredientLine>,
    /// Preparation instructions
    pub preparation_method: String,
    /// Computed macro totals
    pub macros: MacroResult,
    /// Estimated cooking time in minutes
    pub cooking_time_minutes: u32,
    /// Short human-readable description
    pub description: String,
    /// Warning when computed calories diverge from the model's claim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calorie_warning: Option<String>,
    /// Warning when computed macros diverge from the model's claim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macro_warning: Option<String>,
    /// Serving count the recipe was generated for
    pub servings: u8,
    /// Categorization tags
    pub tags: Vec<String>,
    /// Price estimate, when the model supplied one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_estimate: Option<PriceEstimate>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Expiry timestamp, always `created_at` plus the configured TTL
    pub expires_at: DateTime<Utc>,
}

impl GeneratedRecipe {
    /// Create a new record with creation and expiry timestamps set
    #[must_use]
    pub fn new(title: impl Into<String>, servings: u8, ttl_hours: i64) -> Self {
        let created_at = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            ingredients: Vec::new(),
            preparation_method: String::new(),
            macros: MacroResult::default(),
            cooking_time_minutes: 30,
            description: String::new(),
            calorie_warning: None,
            macro_warning: None,
            servings,
            tags: Vec::new(),
            price_estimate: None,
            created_at,
            expires_at: created_at + Duration::hours(ttl_hours),
        }
    }

    /// Add a tag
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// Caller identity resolved from the opaque bearer credential
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// User identifier
    pub id: Uuid,
    /// Subscription plan, used for model selection
    pub plan: SubscriptionPlan,
    /// Preferred currency for price estimates
    pub currency: Option<String>,
}

/// Summary of an existing meal, for duplicate avoidance and protein history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMealSummary {
    /// Meal title
    pub title: String,
    /// Names of the meal's ingredients
    pub ingredient_names: Vec<String>,
    /// When the meal was created, newest first in listings
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_value_parsing() {
        assert_eq!(QuantityValue::Number(300.0).parse(), Some(300.0));
        assert_eq!(QuantityValue::Text("300".into()).parse(), Some(300.0));
        assert_eq!(QuantityValue::Text(" 2.5 ".into()).parse(), Some(2.5));
        assert_eq!(QuantityValue::Text("a few".into()).parse(), None);
        assert_eq!(QuantityValue::Number(f64::NAN).parse(), None);
    }

    #[test]
    fn test_request_validation() {
        let ingredient = NormalizedIngredient {
            name: "Rice".into(),
            grams: 200,
            nutrition: NutritionPer100g::fallback(),
        };

        let mut request = GenerationRequest {
            ingredients: vec![ingredient],
            mode: GenerationMode::Nutri,
            target_calories: Some(600),
            target_protein: None,
            target_carbs: None,
            target_fats: None,
            servings: 2,
        };
        assert!(request.validate().is_ok());

        request.target_calories = None;
        assert!(request.validate().is_err());

        request.mode = GenerationMode::Easy;
        assert!(request.validate().is_ok());

        request.servings = 11;
        assert!(request.validate().is_err());

        request.servings = 2;
        request.ingredients.clear();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_expiry_is_ttl_after_creation() {
        let recipe = GeneratedRecipe::new("Test", 2, 24);
        assert_eq!(recipe.expires_at - recipe.created_at, Duration::hours(24));
    }

    #[test]
    fn test_degenerate_macros() {
        assert!(MacroResult::default().is_degenerate());
        assert!(!MacroResult {
            calories: 1,
            ..MacroResult::default()
        }
        .is_degenerate());
    }
}
