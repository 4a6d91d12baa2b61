// ABOUTME: Free-text recipe amount parsing back into grams
// ABOUTME: Handles "150g", "1 tsp", "2 cups (optional)" and bare numeric amounts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealforge

//! # Quantity-String Parser
//!
//! Parses the free-text amounts the model emits in its ingredient lines back
//! into grams so the macro calculator can verify the recipe. Recognized
//! forms, in priority order: a gram suffix ("150g"), teaspoons, tablespoons,
//! cups, then a bare leading number (interpreted through the piece-weight
//! table when the ingredient is countable, otherwise as grams).
//!
//! An amount with no numeric content parses to 0 grams: the line then
//! contributes nothing to the totals. Guessing here would silently corrupt
//! the computed macros, which defeats the point of recomputing them.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::PieceWeights;

/// Grams per recognized volume unit
const GRAMS_PER_TSP: f64 = 5.0;
const GRAMS_PER_TBSP: f64 = 15.0;
const GRAMS_PER_CUP: f64 = 240.0;

static GRAM_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    // "150g", "150 g"; "1 kg" cannot match because the 'k' intervenes
    Regex::new(r"(\d+(?:\.\d+)?)\s*g(?:\b|$)").expect("valid regex")
});

static TSP_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*tsp").expect("valid regex"));

static TBSP_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*tbsp").expect("valid regex"));

static CUP_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*cups?").expect("valid regex"));

static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)").expect("valid regex"));

fn captured_number(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Parse a free-text recipe amount into grams
///
/// `ingredient_name` drives the piece-weight interpretation of bare numbers
/// ("2" next to "egg" means two eggs, not two grams). Returns 0 when the
/// text carries no usable quantity.
#[must_use]
pub fn parse_amount_to_grams(
    amount_text: &str,
    ingredient_name: &str,
    piece_weights: &PieceWeights,
) -> f64 {
    let cleaned = amount_text.to_lowercase().replace("(optional)", "");
    let cleaned = cleaned.trim();

    // An explicit gram suffix wins over any volume unit in the same text
    if let Some(grams) = captured_number(&GRAM_SUFFIX, cleaned) {
        return grams;
    }
    if let Some(tsp) = captured_number(&TSP_AMOUNT, cleaned) {
        return tsp * GRAMS_PER_TSP;
    }
    if let Some(tbsp) = captured_number(&TBSP_AMOUNT, cleaned) {
        return tbsp * GRAMS_PER_TBSP;
    }
    if let Some(cups) = captured_number(&CUP_AMOUNT, cleaned) {
        return cups * GRAMS_PER_CUP;
    }

    if let Some(number) = captured_number(&FIRST_NUMBER, cleaned) {
        return match piece_weights.lookup(ingredient_name) {
            Some(grams_per_piece) => number * grams_per_piece,
            None => number,
        };
    }

    0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(amount: &str, name: &str) -> f64 {
        parse_amount_to_grams(amount, name, &PieceWeights::default())
    }

    #[test]
    fn test_gram_suffix() {
        assert!((parse("150g", "chicken") - 150.0).abs() < f64::EPSILON);
        assert!((parse("150 g", "chicken") - 150.0).abs() < f64::EPSILON);
        assert!((parse("2.5g", "salt") - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_volume_units() {
        assert!((parse("1 tsp", "salt") - 5.0).abs() < f64::EPSILON);
        assert!((parse("2 tbsp", "oil") - 30.0).abs() < f64::EPSILON);
        assert!((parse("1 cup", "rice") - 240.0).abs() < f64::EPSILON);
        assert!((parse("2 cups", "milk") - 480.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_optional_annotation_stripped() {
        assert!((parse("2 cups (optional)", "milk") - 480.0).abs() < f64::EPSILON);
        assert!((parse("10g (optional)", "parsley") - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bare_number_uses_piece_table() {
        // "2" eggs -> 100 g; bare number for non-countable -> grams
        assert!((parse("2", "egg") - 100.0).abs() < f64::EPSILON);
        assert!((parse("2", "eggs") - 100.0).abs() < f64::EPSILON);
        assert!((parse("150", "chicken breast") - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_no_number_yields_zero() {
        assert!((parse("to taste", "salt")).abs() < f64::EPSILON);
        assert!((parse("a pinch (optional)", "pepper")).abs() < f64::EPSILON);
        assert!((parse("", "anything")).abs() < f64::EPSILON);
    }

    #[test]
    fn test_priority_order() {
        // A gram suffix wins over a trailing cup mention
        assert!((parse("100g (about 0.5 cups)", "rice") - 100.0).abs() < f64::EPSILON);
        // tsp wins over a bare number fallback
        assert!((parse("1 tsp", "onion") - 5.0).abs() < f64::EPSILON);
    }
}
