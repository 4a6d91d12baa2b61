// ABOUTME: Deterministic fallback recipe when the model call fails or misbehaves
// ABOUTME: Builds a simple protein/vegetable/starch plate from the user's ingredients
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealforge

//! # Fallback Generator
//!
//! When the model times out, returns malformed output, or produces a recipe
//! that fails reconciliation, the user still gets a valid recipe. The
//! fallback composes a plain plate from whatever the user has on hand, with
//! fixed generic preparation steps and honestly recomputed macros.

use tracing::info;

use super::macros::compute_macros;
use crate::config::GenerationConfig;
use crate::models::{
    GeneratedRecipe, GenerationMode, GenerationRequest, MacroResult, RecipeIngredientLine,
};

const FALLBACK_PREPARATION: &str = "1. Season the protein and sear it in a hot pan until cooked \
through.\n2. Add the vegetables and cook until just tender.\n3. Combine with the starch.\n4. \
Season with salt and pepper to taste.\n5. Let rest for two minutes and serve.";

fn classify_portion(name: &str, config: &GenerationConfig) -> f64 {
    let portions = &config.fallback;
    if config.is_protein(name) {
        portions.protein_grams
    } else if config.is_starch(name) {
        portions.starch_grams
    } else if config.is_fat(name) {
        portions.fat_grams
    } else {
        portions.other_grams
    }
}

/// Macro envelope used when nothing in the pantry has usable nutrition data
///
/// A plausible single-plate meal: the configured envelope calories split
/// across protein, carbs, and fat by the configured ratios, converted to
/// grams at 4/4/9 kcal per gram.
#[allow(clippy::cast_possible_truncation)]
fn envelope_macros(config: &GenerationConfig) -> MacroResult {
    let calories = config.fallback.envelope_calories;
    let (protein_share, carb_share, fat_share) = config.fallback.envelope_split;
    MacroResult {
        calories: calories.round() as i64,
        protein: (calories * protein_share / 4.0).round() as i64,
        carbs: (calories * carb_share / 4.0).round() as i64,
        fats: (calories * fat_share / 9.0).round() as i64,
    }
}

/// Build the fallback recipe for a request
///
/// Never fails. Portion sizes follow the category caps but are clamped to
/// what the user actually has. Nutri-mode fallbacks always carry a warning
/// that targets were not matched; easy-mode fallbacks carry none.
#[must_use]
pub fn generate_fallback(request: &GenerationRequest, config: &GenerationConfig) -> GeneratedRecipe {
    info!(mode = ?request.mode, "generating fallback recipe");

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lines: Vec<RecipeIngredientLine> = request
        .ingredients
        .iter()
        .filter(|ingredient| ingredient.grams > 0)
        .map(|ingredient| {
            let cap = classify_portion(&ingredient.name, config);
            let portion = cap.min(f64::from(ingredient.grams)).round() as u32;
            RecipeIngredientLine {
                name: ingredient.name.clone(),
                amount: format!("{portion}g"),
            }
        })
        .collect();

    let computed = compute_macros(&lines, &request.ingredients, config);
    let macros = if computed.is_degenerate() {
        envelope_macros(config)
    } else {
        computed
    };

    let warning = match request.mode {
        GenerationMode::Nutri => Some(
            "No exact match found for your nutrition targets; this is a simple \
             recipe from your available ingredients."
                .to_owned(),
        ),
        GenerationMode::Easy => None,
    };

    let mut recipe = GeneratedRecipe::new(
        "Simple pan-cooked plate".to_owned(),
        request.servings,
        config.record_ttl_hours,
    )
    .with_tag("ai-generated")
    .with_tag("fallback");
    if request.mode == GenerationMode::Easy {
        recipe = recipe
            .with_tag("easy-mode")
            .with_tag(format!("Serves {}", request.servings));
    }

    recipe.ingredients = lines;
    recipe.preparation_method = FALLBACK_PREPARATION.to_owned();
    recipe.macros = macros;
    recipe.cooking_time_minutes = 25;
    recipe.description =
        "A straightforward plate built from your available ingredients.".to_owned();
    recipe.calorie_warning = warning.clone();
    recipe.macro_warning = warning;
    recipe
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NormalizedIngredient, NutritionPer100g};

    fn ingredient(name: &str, grams: u32, nutrition: NutritionPer100g) -> NormalizedIngredient {
        NormalizedIngredient {
            name: name.into(),
            grams,
            nutrition,
        }
    }

    fn request(ingredients: Vec<NormalizedIngredient>, mode: GenerationMode) -> GenerationRequest {
        GenerationRequest {
            ingredients,
            mode,
            target_calories: Some(600),
            target_protein: None,
            target_carbs: None,
            target_fats: None,
            servings: 1,
        }
    }

    #[test]
    fn test_portions_follow_category_caps() {
        let chicken = NutritionPer100g {
            calories: 165.0,
            protein: 31.0,
            carbs: 0.0,
            fat: 3.6,
        };
        let request = request(
            vec![
                ingredient("Chicken breast", 500, chicken),
                ingredient("Rice", 500, NutritionPer100g::fallback()),
                ingredient("Olive oil", 500, NutritionPer100g::fallback()),
                ingredient("Broccoli", 500, NutritionPer100g::fallback()),
            ],
            GenerationMode::Nutri,
        );
        let recipe = generate_fallback(&request, &GenerationConfig::default());

        let amount_of = |name: &str| {
            recipe
                .ingredients
                .iter()
                .find(|line| line.name == name)
                .map(|line| line.amount.clone())
                .unwrap()
        };
        assert_eq!(amount_of("Chicken breast"), "150g");
        assert_eq!(amount_of("Rice"), "120g");
        assert_eq!(amount_of("Olive oil"), "20g");
        assert_eq!(amount_of("Broccoli"), "100g");
    }

    #[test]
    fn test_portion_clamped_to_available() {
        let request = request(
            vec![ingredient(
                "Chicken breast",
                80,
                NutritionPer100g::fallback(),
            )],
            GenerationMode::Nutri,
        );
        let recipe = generate_fallback(&request, &GenerationConfig::default());
        assert_eq!(recipe.ingredients[0].amount, "80g");
    }

    #[test]
    fn test_nutri_fallback_always_warns() {
        let request = request(
            vec![ingredient("Rice", 200, NutritionPer100g::fallback())],
            GenerationMode::Nutri,
        );
        let recipe = generate_fallback(&request, &GenerationConfig::default());
        assert!(recipe.calorie_warning.is_some());
        assert!(recipe.macro_warning.is_some());
        assert!(recipe.tags.contains(&"fallback".to_owned()));
    }

    #[test]
    fn test_easy_fallback_has_no_warning() {
        let request = request(
            vec![ingredient("Rice", 200, NutritionPer100g::fallback())],
            GenerationMode::Easy,
        );
        let recipe = generate_fallback(&request, &GenerationConfig::default());
        assert!(recipe.calorie_warning.is_none());
        assert!(recipe.tags.contains(&"easy-mode".to_owned()));
        assert!(recipe.tags.contains(&"Serves 1".to_owned()));
    }

    #[test]
    fn test_envelope_when_no_usable_nutrition() {
        let zero = NutritionPer100g {
            calories: 0.0,
            protein: 0.0,
            carbs: 0.0,
            fat: 0.0,
        };
        let request = request(
            vec![ingredient("Mystery item", 200, zero)],
            GenerationMode::Nutri,
        );
        let recipe = generate_fallback(&request, &GenerationConfig::default());

        // 550 kcal split 25/45/30 at 4/4/9 kcal per gram
        assert_eq!(recipe.macros.calories, 550);
        assert_eq!(recipe.macros.protein, 34);
        assert_eq!(recipe.macros.carbs, 62);
        assert_eq!(recipe.macros.fats, 18);
    }

    #[test]
    fn test_zero_gram_ingredients_excluded() {
        let request = request(
            vec![
                ingredient("Rice", 200, NutritionPer100g::fallback()),
                ingredient("Salt", 0, NutritionPer100g::fallback()),
            ],
            GenerationMode::Easy,
        );
        let recipe = generate_fallback(&request, &GenerationConfig::default());
        assert_eq!(recipe.ingredients.len(), 1);
        assert_eq!(recipe.ingredients[0].name, "Rice");
    }
}
