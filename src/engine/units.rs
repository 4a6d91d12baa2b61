// ABOUTME: Unit normalization for input ingredients
// ABOUTME: Converts arbitrary cooking units (kg, cups, pieces, ...) to whole grams
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealforge

//! # Unit Normalizer
//!
//! Converts heterogeneous ingredient quantities to canonical grams. Volume
//! units use water-equivalent densities; countable items use the configured
//! piece-weight table. A quantity that fails to parse falls back to 100 g
//! rather than failing the request: one bad ingredient must never sink the
//! whole generation.

use crate::config::PieceWeights;
use crate::models::{Ingredient, IngredientUnit, NormalizedIngredient};

/// Volume conversion constants (to milliliters, 1 ml ~= 1 g)
const ML_PER_CUP: f64 = 240.0;
const ML_PER_TBSP: f64 = 15.0;
const ML_PER_TSP: f64 = 5.0;

/// Weight conversion constants (to grams)
const GRAMS_PER_OZ: f64 = 28.35;
const GRAMS_PER_KG: f64 = 1000.0;
const GRAMS_PER_LITER: f64 = 1000.0;

/// Grams assumed when the raw quantity cannot be parsed
const DEFAULT_QUANTITY: f64 = 100.0;

/// Multiplicative grams-per-unit factor for non-countable units
const fn unit_factor(unit: IngredientUnit) -> Option<f64> {
    match unit {
        IngredientUnit::Grams | IngredientUnit::Ml => Some(1.0),
        IngredientUnit::Kg => Some(GRAMS_PER_KG),
        IngredientUnit::Ounces => Some(GRAMS_PER_OZ),
        IngredientUnit::Cups => Some(ML_PER_CUP),
        IngredientUnit::Tbsp => Some(ML_PER_TBSP),
        IngredientUnit::Tsp => Some(ML_PER_TSP),
        IngredientUnit::Liters => Some(GRAMS_PER_LITER),
        IngredientUnit::Pieces => None,
    }
}

/// Convert an ingredient to its gram-normalized form
///
/// The result unit is always grams, rounded to the nearest integer.
/// Countable units resolve through `piece_weights` by case-insensitive
/// substring containment on the ingredient name.
#[must_use]
pub fn normalize(ingredient: &Ingredient, piece_weights: &PieceWeights) -> NormalizedIngredient {
    let quantity = ingredient.quantity.parse().unwrap_or(DEFAULT_QUANTITY);

    let factor = unit_factor(ingredient.unit)
        .unwrap_or_else(|| piece_weights.grams_per_piece(&ingredient.name));

    let grams = (quantity * factor).round().max(0.0);
    // u32::MAX grams is ~4300 tonnes; saturate instead of wrapping
    let grams = if grams >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        grams as u32
    };

    NormalizedIngredient {
        name: ingredient.name.clone(),
        grams,
        nutrition: ingredient.nutrition,
    }
}
