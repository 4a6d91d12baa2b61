// ABOUTME: Deterministic macro computation for recipe ingredient lines
// ABOUTME: Matches lines to known ingredients and sums per-100g contributions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealforge

//! # Macro Calculator
//!
//! Computes total calories/protein/carbs/fats for a recipe from its
//! ingredient lines and the known per-100g nutrition data. This is the
//! source of truth the reconciler trusts over the model's self-report.
//!
//! Pure and deterministic: identical inputs always produce identical
//! outputs. Contributions are summed at full f64 precision; only the final
//! totals are rounded.

use tracing::debug;

use super::amounts::parse_amount_to_grams;
use super::matcher::match_ingredient;
use crate::config::GenerationConfig;
use crate::models::{MacroResult, NormalizedIngredient, RecipeIngredientLine};

/// A condiment line marked optional contributes nothing
///
/// Salt "to taste (optional)" and friends carry negligible macros; counting
/// them would only add noise from whatever nutrition row happens to match.
fn is_optional_condiment(line: &RecipeIngredientLine, config: &GenerationConfig) -> bool {
    let marked_optional = line.amount.to_lowercase().contains("optional")
        || line.name.to_lowercase().contains("optional");
    marked_optional && config.is_condiment(&line.name)
}

/// Compute macro totals for the given recipe lines
///
/// Unmatched lines and lines with unparseable amounts contribute zero.
/// Never fails: a recipe where nothing matches yields all-zero totals,
/// which the reconciler treats as a matching-failure signal.
#[must_use]
pub fn compute_macros(
    lines: &[RecipeIngredientLine],
    known: &[NormalizedIngredient],
    config: &GenerationConfig,
) -> MacroResult {
    let mut calories = 0.0_f64;
    let mut protein = 0.0_f64;
    let mut carbs = 0.0_f64;
    let mut fats = 0.0_f64;

    for line in lines {
        if is_optional_condiment(line, config) {
            debug!(name = %line.name, "skipping optional condiment line");
            continue;
        }

        let Some(matched) = match_ingredient(&line.name, known) else {
            debug!(name = %line.name, "no known ingredient matched; line contributes zero");
            continue;
        };

        let grams = parse_amount_to_grams(&line.amount, &matched.name, &config.piece_weights);
        let scale = grams / 100.0;

        calories += matched.nutrition.calories * scale;
        protein += matched.nutrition.protein * scale;
        carbs += matched.nutrition.carbs * scale;
        fats += matched.nutrition.fat * scale;
    }

    MacroResult {
        calories: round_total(calories),
        protein: round_total(protein),
        carbs: round_total(carbs),
        fats: round_total(fats),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn round_total(value: f64) -> i64 {
    value.round().max(0.0) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NutritionPer100g;

    fn chicken_and_rice() -> Vec<NormalizedIngredient> {
        vec![
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
        ]
    }

    fn line(name: &str, amount: &str) -> RecipeIngredientLine {
        RecipeIngredientLine {
            name: name.into(),
            amount: amount.into(),
        }
    }

    #[test]
    fn test_weighted_sum_rounds_only_final_totals() {
        let known = chicken_and_rice();
        let lines = vec![line("Chicken breast", "150g"), line("Rice", "100g")];
        let result = compute_macros(&lines, &known, &GenerationConfig::default());

        // 247.5 + 130 = 377.5 -> 378; 46.5 + 2.7 = 49.2 -> 49
        assert_eq!(result.calories, 378);
        assert_eq!(result.protein, 49);
        assert_eq!(result.carbs, 28);
        assert_eq!(result.fats, 6); // 5.4 + 0.3 = 5.7 -> 6
    }

    #[test]
    fn test_determinism() {
        let known = chicken_and_rice();
        let lines = vec![line("chicken", "200g"), line("rice (steamed)", "1 cup")];
        let config = GenerationConfig::default();

        let first = compute_macros(&lines, &known, &config);
        for _ in 0..10 {
            assert_eq!(compute_macros(&lines, &known, &config), first);
        }
    }

    #[test]
    fn test_optional_condiment_contributes_zero() {
        let mut known = chicken_and_rice();
        // Even with absurd nutrition data attached to salt, the optional
        // condiment line must contribute exactly nothing.
        known.push(NormalizedIngredient {
            name: "salt".into(),
            grams: 100,
            nutrition: NutritionPer100g {
                calories: 9000.0,
                protein: 500.0,
                carbs: 500.0,
                fat: 500.0,
            },
        });

        let with_salt = vec![
            line("Chicken breast", "150g"),
            line("salt", "to taste (optional)"),
        ];
        let without_salt = vec![line("Chicken breast", "150g")];

        let config = GenerationConfig::default();
        assert_eq!(
            compute_macros(&with_salt, &known, &config),
            compute_macros(&without_salt, &known, &config)
        );
    }

    #[test]
    fn test_zero_match_returns_zeros() {
        let known = chicken_and_rice();
        let lines = vec![line("tofu", "150g"), line("seitan", "80g")];
        let result = compute_macros(&lines, &known, &GenerationConfig::default());
        assert!(result.is_degenerate());
    }

    #[test]
    fn test_empty_lines_return_zeros() {
        let known = chicken_and_rice();
        let result = compute_macros(&[], &known, &GenerationConfig::default());
        assert!(result.is_degenerate());
    }
}
