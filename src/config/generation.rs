// ABOUTME: Typed configuration for the meal-generation engine
// ABOUTME: Piece-weight tables, keyword classes, thresholds, tolerances, and model selection
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealforge

//! Generation Engine Configuration
//!
//! Every heuristic table the engine relies on is declared here with a
//! `Default` implementation matching production values. The engine receives
//! a [`GenerationConfig`] by reference and never reaches for globals, which
//! keeps the reconciliation logic a pure function of its inputs.

use serde::{Deserialize, Serialize};

/// Average weight in grams of one piece of a countable ingredient
///
/// Lookup is case-insensitive substring containment on the ingredient name,
/// so "red onion" matches the "onion" entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PieceWeights {
    /// (name fragment, grams per piece) pairs, checked in order
    pub entries: Vec<(String, f64)>,
    /// Grams assumed for a piece of anything not in the table
    pub default_grams: f64,
}

impl Default for PieceWeights {
    fn default() -> Self {
        let entries = [
            ("onion", 100.0),
            ("egg", 50.0),
            ("apple", 150.0),
            ("banana", 120.0),
            ("tomato", 100.0),
            ("potato", 150.0),
            ("carrot", 75.0),
            ("lemon", 60.0),
            ("orange", 150.0),
            ("avocado", 200.0),
        ];
        Self {
            entries: entries
                .iter()
                .map(|(name, grams)| ((*name).to_owned(), *grams))
                .collect(),
            default_grams: 100.0,
        }
    }
}

impl PieceWeights {
    /// Grams per piece for the given ingredient name
    ///
    /// Falls back to `default_grams` when no table entry matches.
    #[must_use]
    pub fn grams_per_piece(&self, ingredient_name: &str) -> f64 {
        self.lookup(ingredient_name).unwrap_or(self.default_grams)
    }

    /// Table lookup without the default, for callers that need to know
    /// whether the ingredient is countable at all
    #[must_use]
    pub fn lookup(&self, ingredient_name: &str) -> Option<f64> {
        let normalized = ingredient_name.to_lowercase();
        self.entries
            .iter()
            .find(|(fragment, _)| normalized.contains(fragment.as_str()))
            .map(|(_, grams)| *grams)
    }
}

/// Discrepancy thresholds between computed and model-reported macros
///
/// A warning is attached when any delta strictly exceeds its threshold.
/// Exactly at the threshold does not warn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DiscrepancyThresholds {
    /// Maximum tolerated calorie delta (kcal)
    pub calories: i64,
    /// Maximum tolerated protein delta (g)
    pub protein: i64,
    /// Maximum tolerated carbohydrate delta (g)
    pub carbs: i64,
    /// Maximum tolerated fat delta (g)
    pub fats: i64,
}

impl Default for DiscrepancyThresholds {
    fn default() -> Self {
        Self {
            calories: 50,
            protein: 10,
            carbs: 10,
            fats: 5,
        }
    }
}

/// Numeric tolerances emitted in the nutri-mode prompt target section
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TargetTolerances {
    /// Calorie tolerance (kcal) the model is told to hit
    pub calories: i64,
    /// Per-macro tolerance (g) the model is told to hit
    pub macros: i64,
}

impl Default for TargetTolerances {
    fn default() -> Self {
        Self {
            calories: 30,
            macros: 5,
        }
    }
}

/// Portion caps for the fallback generator, by ingredient class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackPortions {
    /// Cap for protein-like ingredients (g)
    pub protein_grams: f64,
    /// Cap for starch-like ingredients (g)
    pub starch_grams: f64,
    /// Cap for fat-like ingredients (g)
    pub fat_grams: f64,
    /// Cap for everything else (g)
    pub other_grams: f64,
    /// Calorie envelope used when computed macros degenerate to zero (kcal)
    pub envelope_calories: f64,
    /// Envelope split as calorie fractions (protein, carbs, fat)
    pub envelope_split: (f64, f64, f64),
}

impl Default for FallbackPortions {
    fn default() -> Self {
        Self {
            protein_grams: 150.0,
            starch_grams: 120.0,
            fat_grams: 20.0,
            other_grams: 100.0,
            envelope_calories: 550.0,
            envelope_split: (0.25, 0.45, 0.30),
        }
    }
}

/// Subscription plan of the calling user, resolved by the persistence boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    /// Free tier
    #[default]
    Free,
    /// Paid tier
    Premium,
}

/// Model selection by subscription plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSelection {
    /// Model identifier for free-plan users
    pub free: String,
    /// Model identifier for premium-plan users
    pub premium: String,
}

impl Default for ModelSelection {
    fn default() -> Self {
        Self {
            free: "qwen2.5:14b-instruct".to_owned(),
            premium: "qwen2.5:32b-instruct".to_owned(),
        }
    }
}

impl ModelSelection {
    /// Model identifier for the given plan
    #[must_use]
    pub fn for_plan(&self, plan: SubscriptionPlan) -> &str {
        match plan {
            SubscriptionPlan::Free => &self.free,
            SubscriptionPlan::Premium => &self.premium,
        }
    }
}

/// Complete configuration for the meal-generation engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Piece-to-grams table for countable ingredients
    pub piece_weights: PieceWeights,
    /// Name fragments identifying condiments excluded from macro totals
    pub condiment_keywords: Vec<String>,
    /// Name fragments identifying protein sources, for rotation
    pub protein_keywords: Vec<String>,
    /// Name fragments identifying starch-like ingredients (fallback portioning)
    pub starch_keywords: Vec<String>,
    /// Name fragments identifying fat-like ingredients (fallback portioning)
    pub fat_keywords: Vec<String>,
    /// Pantry staples permitted on the easy-mode allowlist beside user ingredients
    pub pantry_staples: Vec<String>,
    /// Computed-vs-reported macro warning thresholds
    pub discrepancy: DiscrepancyThresholds,
    /// Tolerances emitted in nutri-mode prompt targets
    pub tolerances: TargetTolerances,
    /// Fallback generator portion caps and calorie envelope
    pub fallback: FallbackPortions,
    /// Model selection by subscription plan
    pub models: ModelSelection,
    /// How many recent meals feed the protein-rotation history
    pub protein_history_window: usize,
    /// Timeout for the model call in seconds; elapse routes to fallback
    pub model_timeout_secs: u64,
    /// Hours a generated meal lives before expiring
    pub record_ttl_hours: i64,
    /// Default currency when the user has none stored
    pub default_currency: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            piece_weights: PieceWeights::default(),
            condiment_keywords: to_owned_vec(&[
                "salt",
                "pepper",
                "herbs",
                "spices",
                "lemon juice",
                "vinegar",
            ]),
            protein_keywords: to_owned_vec(&[
                "chicken", "beef", "pork", "fish", "turkey", "lamb",
            ]),
            starch_keywords: to_owned_vec(&["rice", "pasta", "bread"]),
            fat_keywords: to_owned_vec(&["oil", "butter"]),
            pantry_staples: to_owned_vec(&[
                "salt",
                "pepper",
                "olive oil",
                "garlic",
                "onion",
                "butter",
                "flour",
                "sugar",
                "water",
            ]),
            discrepancy: DiscrepancyThresholds::default(),
            tolerances: TargetTolerances::default(),
            fallback: FallbackPortions::default(),
            models: ModelSelection::default(),
            protein_history_window: 5,
            model_timeout_secs: 60,
            record_ttl_hours: 24,
            default_currency: "EUR".to_owned(),
        }
    }
}

impl GenerationConfig {
    /// Check whether an ingredient name names a condiment
    #[must_use]
    pub fn is_condiment(&self, name: &str) -> bool {
        let normalized = name.to_lowercase();
        self.condiment_keywords
            .iter()
            .any(|kw| normalized.contains(kw.as_str()))
    }

    /// Check whether an ingredient name names a protein source
    #[must_use]
    pub fn is_protein(&self, name: &str) -> bool {
        let normalized = name.to_lowercase();
        self.protein_keywords
            .iter()
            .any(|kw| normalized.contains(kw.as_str()))
    }

    /// Check whether an ingredient name names a starch
    #[must_use]
    pub fn is_starch(&self, name: &str) -> bool {
        let normalized = name.to_lowercase();
        self.starch_keywords
            .iter()
            .any(|kw| normalized.contains(kw.as_str()))
    }

    /// Check whether an ingredient name names a cooking fat
    #[must_use]
    pub fn is_fat(&self, name: &str) -> bool {
        let normalized = name.to_lowercase();
        self.fat_keywords
            .iter()
            .any(|kw| normalized.contains(kw.as_str()))
    }
}

fn to_owned_vec(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}
