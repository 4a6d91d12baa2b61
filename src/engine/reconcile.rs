// ABOUTME: Parses and validates model responses, recomputing all nutrition claims
// ABOUTME: Model macros are never trusted; computed totals win unless matching failed
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealforge

//! # Reconciliation & Validation
//!
//! Takes the raw model response text and produces the final persisted
//! record. The model's self-reported macros are treated as a claim to be
//! verified: totals are always recomputed from the ingredient data, and the
//! claim is only used as a last resort when recomputation degenerates to
//! all zeros (the signal that ingredient matching failed entirely).
//!
//! Any parse or shape failure is a [`ReconcileError`]; the engine routes
//! those to the fallback generator so the user still receives a valid
//! recipe.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::macros::compute_macros;
use crate::config::GenerationConfig;
use crate::models::{
    GeneratedRecipe, GenerationMode, GenerationRequest, MacroResult, PriceEstimate,
    RecipeIngredientLine,
};

/// Default cooking time when the model omits one
const DEFAULT_COOKING_TIME_MINS: u32 = 30;

/// Shape failures that route to the fallback generator
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Response body was not valid JSON
    #[error("model response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// A field the mode requires is missing or empty
    #[error("model response is missing required field: {0}")]
    MissingField(&'static str),
    /// Easy-mode allowlist filtering removed every ingredient line
    #[error("no ingredient line survived allowlist filtering")]
    AllowlistEmpty,
}

// ============================================================================
// Model response shape (parsed leniently)
// ============================================================================

#[derive(Debug, Deserialize)]
struct ModelRecipe {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    ingredients: Option<Vec<ModelLine>>,
    #[serde(default)]
    preparation: Option<String>,
    #[serde(default)]
    macros: Option<ModelMacros>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    cooking_time_minutes: Option<Value>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    price_estimate: Option<ModelPrice>,
}

#[derive(Debug, Deserialize)]
struct ModelLine {
    name: String,
    #[serde(default)]
    amount: Option<Value>,
}

#[derive(Debug, Deserialize, Default)]
struct ModelMacros {
    #[serde(default)]
    calories: Option<Value>,
    #[serde(default)]
    protein: Option<Value>,
    #[serde(default)]
    carbs: Option<Value>,
    #[serde(default)]
    fats: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ModelPrice {
    #[serde(default)]
    restaurant: Option<Value>,
    #[serde(default)]
    homemade: Option<Value>,
    #[serde(default)]
    currency: Option<String>,
}

// ============================================================================
// Lenient value parsing
// ============================================================================

/// Extract the JSON object from a response that may be fenced or padded
///
/// Models routinely wrap their JSON in markdown fences or add a polite
/// sentence around it despite instructions. Taking the outermost braces
/// recovers the object in both cases.
fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => trimmed,
    }
}

/// Parse a numeric value that may arrive as a number or a decorated string
/// ("~12.50 EUR" -> 12.50). Returns `None` when nothing numeric remains.
fn lenient_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let digits: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            digits.parse::<f64>().ok()
        }
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn lenient_integer(value: Option<&Value>) -> i64 {
    value
        .and_then(lenient_number)
        .map_or(0, |n| n.round().max(0.0) as i64)
}

fn reported_macros(macros: &ModelMacros) -> MacroResult {
    MacroResult {
        calories: lenient_integer(macros.calories.as_ref()),
        protein: lenient_integer(macros.protein.as_ref()),
        carbs: lenient_integer(macros.carbs.as_ref()),
        fats: lenient_integer(macros.fats.as_ref()),
    }
}

fn amount_text(amount: Option<&Value>) -> String {
    match amount {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

// ============================================================================
// Allowlist
// ============================================================================

/// Easy-mode allowlist predicate
///
/// A line passes when its name equals or substring-overlaps an allowed
/// name, or when it is salt or pepper (the standing exception).
#[must_use]
pub fn allowlist_permits(name: &str, allowlist: &[String]) -> bool {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return false;
    }
    if needle.contains("salt") || needle.contains("pepper") {
        return true;
    }
    allowlist.iter().any(|allowed| {
        let allowed = allowed.to_lowercase();
        allowed == needle || allowed.contains(&needle) || needle.contains(&allowed)
    })
}

// ============================================================================
// Reconciliation
// ============================================================================

fn require<'a>(field: Option<&'a str>, name: &'static str) -> Result<&'a str, ReconcileError> {
    match field {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ReconcileError::MissingField(name)),
    }
}

fn has_warning_marker(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("warning")
        || lower.contains("not match")
        || lower.contains("no match")
        || message.contains('\u{26a0}')
}

fn discrepancy_warning(
    computed: MacroResult,
    reported: MacroResult,
    config: &GenerationConfig,
) -> Option<String> {
    let thresholds = &config.discrepancy;
    let over = (computed.calories - reported.calories).abs() > thresholds.calories
        || (computed.protein - reported.protein).abs() > thresholds.protein
        || (computed.carbs - reported.carbs).abs() > thresholds.carbs
        || (computed.fats - reported.fats).abs() > thresholds.fats;

    over.then(|| {
        format!(
            "Nutrition recomputed from ingredient data ({} kcal, {}g protein, \
             {}g carbs, {}g fats) differs from the model's estimate ({} kcal, \
             {}g protein, {}g carbs, {}g fats).",
            computed.calories,
            computed.protein,
            computed.carbs,
            computed.fats,
            reported.calories,
            reported.protein,
            reported.carbs,
            reported.fats
        )
    })
}

fn parse_price(
    price: Option<&ModelPrice>,
    user_currency: Option<&str>,
    config: &GenerationConfig,
) -> Option<PriceEstimate> {
    let price = price?;
    let currency = price
        .currency
        .as_deref()
        .filter(|c| c.len() == 3 && c.chars().all(|ch| ch.is_ascii_alphabetic()))
        .map(str::to_uppercase)
        .or_else(|| user_currency.map(str::to_owned))
        .unwrap_or_else(|| config.default_currency.clone());

    Some(PriceEstimate {
        restaurant: price.restaurant.as_ref().and_then(lenient_number),
        homemade: price.homemade.as_ref().and_then(lenient_number),
        currency,
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_cooking_time(value: Option<&Value>) -> u32 {
    value
        .and_then(lenient_number)
        .filter(|mins| *mins > 0.0)
        .map_or(DEFAULT_COOKING_TIME_MINS, |mins| mins.round() as u32)
}

/// Reconcile a model response into the final persisted record
///
/// # Errors
///
/// Returns [`ReconcileError`] on invalid JSON, missing required fields for
/// the request's mode, or an easy-mode ingredient list emptied by allowlist
/// filtering. Callers route these to the fallback generator.
pub fn reconcile(
    response_text: &str,
    request: &GenerationRequest,
    allowlist: Option<&[String]>,
    user_currency: Option<&str>,
    config: &GenerationConfig,
) -> Result<GeneratedRecipe, ReconcileError> {
    let parsed: ModelRecipe = serde_json::from_str(extract_json(response_text))?;

    let title = require(parsed.name.as_deref(), "name")?.to_owned();
    let preparation = require(parsed.preparation.as_deref(), "preparation")?.to_owned();

    let raw_lines = parsed
        .ingredients
        .as_deref()
        .filter(|lines| !lines.is_empty())
        .ok_or(ReconcileError::MissingField("ingredients"))?;

    if request.mode == GenerationMode::Nutri && parsed.macros.is_none() {
        return Err(ReconcileError::MissingField("macros"));
    }

    let mut lines: Vec<RecipeIngredientLine> = raw_lines
        .iter()
        .map(|line| RecipeIngredientLine {
            name: line.name.clone(),
            amount: amount_text(line.amount.as_ref()),
        })
        .collect();

    if request.mode == GenerationMode::Easy {
        if let Some(list) = allowlist {
            let before = lines.len();
            lines.retain(|line| allowlist_permits(&line.name, list));
            if lines.len() < before {
                debug!(
                    dropped = before - lines.len(),
                    "dropped ingredient lines outside the easy-mode allowlist"
                );
            }
            if lines.is_empty() {
                return Err(ReconcileError::AllowlistEmpty);
            }
        }
    }

    // Macros are always recomputed from ingredient data, in both modes.
    // The model's claim only survives when matching failed entirely.
    let computed = compute_macros(&lines, &request.ingredients, config);
    let reported = parsed.macros.as_ref().map(reported_macros);

    let (macros, mut warning) = match (computed.is_degenerate(), reported) {
        (true, Some(claimed)) => {
            warn!("computed macros degenerate; trusting model self-report");
            (claimed, None)
        }
        (_, Some(claimed)) => (computed, discrepancy_warning(computed, claimed, config)),
        (_, None) => (computed, None),
    };

    let message = parsed.message.clone().unwrap_or_default();
    if warning.is_some() && has_warning_marker(&message) {
        // The model already flagged the mismatch in its own message
        warning = None;
    }

    let mut recipe = GeneratedRecipe::new(title, request.servings, config.record_ttl_hours)
        .with_tag("ai-generated");
    if request.mode == GenerationMode::Easy {
        recipe = recipe
            .with_tag("easy-mode")
            .with_tag(format!("Serves {}", request.servings));
    }

    recipe.ingredients = lines;
    recipe.preparation_method = preparation;
    recipe.macros = macros;
    recipe.cooking_time_minutes = parse_cooking_time(parsed.cooking_time_minutes.as_ref());
    recipe.description = parsed
        .description
        .filter(|d| !d.trim().is_empty())
        .unwrap_or(message);
    recipe.calorie_warning = warning.clone();
    recipe.macro_warning = warning;
    recipe.price_estimate = parse_price(parsed.price_estimate.as_ref(), user_currency, config);

    Ok(recipe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NormalizedIngredient, NutritionPer100g};

    fn request(mode: GenerationMode) -> GenerationRequest {
        GenerationRequest {
            ingredients: vec![
                NormalizedIngredient {
                    name: "Chicken breast".into(),
                    grams: 300,
                    nutrition: NutritionPer100g {
                        calories: 165.0,
                        protein: 31.0,
                        carbs: 0.0,
                        fat: 3.6,
                    },
                },
                NormalizedIngredient {
                    name: "Rice".into(),
                    grams: 200,
                    nutrition: NutritionPer100g {
                        calories: 130.0,
                        protein: 2.7,
                        carbs: 28.0,
                        fat: 0.3,
                    },
                },
            ],
            mode,
            target_calories: Some(600),
            target_protein: None,
            target_carbs: None,
            target_fats: None,
            servings: 2,
        }
    }

    fn response(macros: &str) -> String {
        format!(
            r#"{{
                "name": "Chicken and rice bowl",
                "ingredients": [
                    {{"name": "Chicken breast", "amount": "150g"}},
                    {{"name": "Rice", "amount": "100g"}}
                ],
                "preparation": "1. Cook rice. 2. Sear chicken. 3. Combine.",
                "macros": {macros},
                "message": "Matches your targets."
            }}"#
        )
    }

    #[test]
    fn test_computed_macros_override_model_claim() {
        let config = GenerationConfig::default();
        let body = response(r#"{"calories": 380, "protein": 48, "carbs": 29, "fats": 6}"#);
        let recipe = reconcile(&body, &request(GenerationMode::Nutri), None, None, &config)
            .expect("valid response");

        assert_eq!(recipe.macros.calories, 378);
        assert_eq!(recipe.macros.protein, 49);
        // Deltas within thresholds: no warning
        assert!(recipe.calorie_warning.is_none());
        assert!(recipe.macro_warning.is_none());
    }

    #[test]
    fn test_discrepancy_boundary_is_strict() {
        let config = GenerationConfig::default();

        // Computed calories are 378. A claim of 428 is a delta of exactly
        // 50 and must not warn; 429 is 51 over and must.
        let at_threshold = response(r#"{"calories": 428, "protein": 49, "carbs": 28, "fats": 6}"#);
        let recipe = reconcile(
            &at_threshold,
            &request(GenerationMode::Nutri),
            None,
            None,
            &config,
        )
        .unwrap();
        assert!(recipe.calorie_warning.is_none());

        let over_threshold =
            response(r#"{"calories": 429, "protein": 49, "carbs": 28, "fats": 6}"#);
        let recipe = reconcile(
            &over_threshold,
            &request(GenerationMode::Nutri),
            None,
            None,
            &config,
        )
        .unwrap();
        assert!(recipe.calorie_warning.is_some());
        assert!(recipe.macro_warning.is_some());
    }

    #[test]
    fn test_protein_threshold_boundary() {
        let config = GenerationConfig::default();

        // Computed protein is 49; claims of 59 and 60 straddle the 10 g line
        let at = response(r#"{"calories": 378, "protein": 59, "carbs": 28, "fats": 6}"#);
        assert!(reconcile(&at, &request(GenerationMode::Nutri), None, None, &config)
            .unwrap()
            .macro_warning
            .is_none());

        let over = response(r#"{"calories": 378, "protein": 60, "carbs": 28, "fats": 6}"#);
        assert!(reconcile(&over, &request(GenerationMode::Nutri), None, None, &config)
            .unwrap()
            .macro_warning
            .is_some());
    }

    #[test]
    fn test_carbs_threshold_boundary() {
        let config = GenerationConfig::default();

        // Computed carbs are 28; claims of 38 and 39 straddle the 10 g line
        let at = response(r#"{"calories": 378, "protein": 49, "carbs": 38, "fats": 6}"#);
        assert!(reconcile(&at, &request(GenerationMode::Nutri), None, None, &config)
            .unwrap()
            .macro_warning
            .is_none());

        let over = response(r#"{"calories": 378, "protein": 49, "carbs": 39, "fats": 6}"#);
        assert!(reconcile(&over, &request(GenerationMode::Nutri), None, None, &config)
            .unwrap()
            .macro_warning
            .is_some());
    }

    #[test]
    fn test_fats_threshold_boundary() {
        let config = GenerationConfig::default();

        // Computed fats are 6; claims of 11 and 12 straddle the 5 g line
        let at = response(r#"{"calories": 378, "protein": 49, "carbs": 28, "fats": 11}"#);
        assert!(reconcile(&at, &request(GenerationMode::Nutri), None, None, &config)
            .unwrap()
            .macro_warning
            .is_none());

        let over = response(r#"{"calories": 378, "protein": 49, "carbs": 28, "fats": 12}"#);
        assert!(reconcile(&over, &request(GenerationMode::Nutri), None, None, &config)
            .unwrap()
            .macro_warning
            .is_some());
    }

    #[test]
    fn test_degenerate_computation_trusts_model() {
        let config = GenerationConfig::default();
        let body = r#"{
            "name": "Mystery bowl",
            "ingredients": [{"name": "Tofu", "amount": "150g"}],
            "preparation": "Cook it.",
            "macros": {"calories": 250, "protein": 20, "carbs": 10, "fats": 12},
            "message": "Done."
        }"#;
        let recipe =
            reconcile(body, &request(GenerationMode::Nutri), None, None, &config).unwrap();

        // Tofu matches nothing; computed macros are all zero, so the
        // model's claim is used as the last resort
        assert_eq!(recipe.macros.calories, 250);
        assert_eq!(recipe.macros.protein, 20);
    }

    #[test]
    fn test_missing_required_fields_fail() {
        let config = GenerationConfig::default();
        let no_name = r#"{"ingredients": [{"name": "Rice", "amount": "100g"}], "preparation": "x"}"#;
        assert!(matches!(
            reconcile(no_name, &request(GenerationMode::Easy), None, None, &config),
            Err(ReconcileError::MissingField("name"))
        ));

        let no_macros = r#"{
            "name": "Bowl",
            "ingredients": [{"name": "Rice", "amount": "100g"}],
            "preparation": "x"
        }"#;
        assert!(matches!(
            reconcile(no_macros, &request(GenerationMode::Nutri), None, None, &config),
            Err(ReconcileError::MissingField("macros"))
        ));
        // The same body is fine in easy mode
        assert!(reconcile(no_macros, &request(GenerationMode::Easy), None, None, &config).is_ok());
    }

    #[test]
    fn test_invalid_json_fails() {
        let config = GenerationConfig::default();
        assert!(matches!(
            reconcile("not json at all", &request(GenerationMode::Nutri), None, None, &config),
            Err(ReconcileError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_fenced_json_is_recovered() {
        let config = GenerationConfig::default();
        let body = format!(
            "```json\n{}\n```",
            response(r#"{"calories": 378, "protein": 49, "carbs": 28, "fats": 6}"#)
        );
        assert!(reconcile(&body, &request(GenerationMode::Nutri), None, None, &config).is_ok());
    }

    #[test]
    fn test_easy_mode_filters_allowlist_and_recomputes() {
        let config = GenerationConfig::default();
        let allowlist = vec!["rice".to_owned(), "chicken breast".to_owned()];
        let body = r#"{
            "name": "Fried rice",
            "ingredients": [
                {"name": "Rice", "amount": "100g"},
                {"name": "olive oil", "amount": "2 tbsp"},
                {"name": "salt", "amount": "to taste (optional)"}
            ],
            "preparation": "Fry the rice."
        }"#;
        let recipe = reconcile(
            body,
            &request(GenerationMode::Easy),
            Some(&allowlist),
            None,
            &config,
        )
        .unwrap();

        assert!(recipe
            .ingredients
            .iter()
            .all(|line| line.name != "olive oil"));
        // salt passes the standing exception
        assert!(recipe.ingredients.iter().any(|line| line.name == "salt"));
        // Macros recomputed even though easy mode has no targets
        assert_eq!(recipe.macros.calories, 130);
        assert!(recipe.tags.contains(&"easy-mode".to_owned()));
        assert!(recipe.tags.contains(&"Serves 2".to_owned()));
        assert!(recipe.tags.contains(&"ai-generated".to_owned()));
    }

    #[test]
    fn test_easy_mode_empty_after_filter_fails() {
        let config = GenerationConfig::default();
        let allowlist = vec!["rice".to_owned()];
        let body = r#"{
            "name": "Oil soup",
            "ingredients": [{"name": "olive oil", "amount": "2 tbsp"}],
            "preparation": "Pour."
        }"#;
        assert!(matches!(
            reconcile(
                body,
                &request(GenerationMode::Easy),
                Some(&allowlist),
                None,
                &config
            ),
            Err(ReconcileError::AllowlistEmpty)
        ));
    }

    #[test]
    fn test_price_parsed_defensively() {
        let config = GenerationConfig::default();
        let body = r#"{
            "name": "Bowl",
            "ingredients": [{"name": "Rice", "amount": "100g"}],
            "preparation": "Cook.",
            "macros": {"calories": 130, "protein": 3, "carbs": 28, "fats": 0},
            "price_estimate": {"restaurant": "~14.50 EUR", "homemade": "abc", "currency": "usd"}
        }"#;
        let recipe = reconcile(
            body,
            &request(GenerationMode::Nutri),
            None,
            Some("SEK"),
            &config,
        )
        .unwrap();

        let price = recipe.price_estimate.unwrap();
        assert_eq!(price.restaurant, Some(14.5));
        assert_eq!(price.homemade, None);
        assert_eq!(price.currency, "USD");
    }

    #[test]
    fn test_invalid_currency_falls_back_to_user() {
        let config = GenerationConfig::default();
        let body = r#"{
            "name": "Bowl",
            "ingredients": [{"name": "Rice", "amount": "100g"}],
            "preparation": "Cook.",
            "macros": {"calories": 130, "protein": 3, "carbs": 28, "fats": 0},
            "price_estimate": {"restaurant": 12, "currency": "euros!"}
        }"#;
        let recipe = reconcile(
            body,
            &request(GenerationMode::Nutri),
            None,
            Some("SEK"),
            &config,
        )
        .unwrap();
        assert_eq!(recipe.price_estimate.unwrap().currency, "SEK");
    }

    #[test]
    fn test_model_warning_marker_suppresses_duplicate() {
        let config = GenerationConfig::default();
        let body = r#"{
            "name": "Bowl",
            "ingredients": [
                {"name": "Chicken breast", "amount": "150g"},
                {"name": "Rice", "amount": "100g"}
            ],
            "preparation": "Cook.",
            "macros": {"calories": 800, "protein": 49, "carbs": 28, "fats": 6},
            "message": "Warning: the recipe does not match the calorie target."
        }"#;
        let recipe =
            reconcile(body, &request(GenerationMode::Nutri), None, None, &config).unwrap();

        // Huge calorie delta, but the model already flagged it
        assert!(recipe.calorie_warning.is_none());
        assert_eq!(recipe.macros.calories, 378);
    }

    #[test]
    fn test_expiry_set_24_hours_out() {
        let config = GenerationConfig::default();
        let body = response(r#"{"calories": 378, "protein": 49, "carbs": 28, "fats": 6}"#);
        let recipe =
            reconcile(&body, &request(GenerationMode::Nutri), None, None, &config).unwrap();
        assert_eq!(
            recipe.expires_at - recipe.created_at,
            chrono::Duration::hours(24)
        );
    }
}
