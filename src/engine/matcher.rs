// ABOUTME: Fuzzy ingredient-name matching between model output and known ingredients
// ABOUTME: Tiered strategy: exact equality, token overlap, then substring containment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealforge

//! # Ingredient Matcher
//!
//! The model writes ingredient names freely ("Diced chicken breast") while
//! the nutrition data is keyed by the user's names ("Chicken breast").
//! Matching is a tiered strategy, from strict to tolerant:
//!
//! 1. exact case-insensitive equality
//! 2. token overlap: tokens longer than 2 chars, equal or one containing
//!    the other (containment requires length > 3 to avoid trivial hits)
//! 3. substring containment of the full names
//!
//! The first known ingredient that matches wins. No match means the line
//! contributes zero to the totals.

use crate::models::NormalizedIngredient;

/// Minimum token length considered at all
const MIN_TOKEN_LEN: usize = 3;

/// Minimum token length for containment (vs. exact) token matches
const MIN_CONTAINMENT_LEN: usize = 4;

fn tokenize(name: &str) -> Vec<String> {
    name.split(|c: char| c.is_whitespace() || matches!(c, '(' | ')' | ','))
        .filter(|token| token.len() >= MIN_TOKEN_LEN)
        .map(str::to_lowercase)
        .collect()
}

fn tokens_overlap(a: &[String], b: &[String]) -> bool {
    for left in a {
        for right in b {
            if left == right {
                return true;
            }
            let longest = left.len().max(right.len());
            if longest >= MIN_CONTAINMENT_LEN && (left.contains(right.as_str()) || right.contains(left.as_str()))
            {
                return true;
            }
        }
    }
    false
}

/// Match a recipe-line name against the known ingredients
///
/// Returns the first known ingredient accepted by any tier, or `None`.
#[must_use]
pub fn match_ingredient<'a>(
    line_name: &str,
    known: &'a [NormalizedIngredient],
) -> Option<&'a NormalizedIngredient> {
    let needle = line_name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    // Tier 1: exact case-insensitive equality
    if let Some(found) = known.iter().find(|k| k.name.to_lowercase() == needle) {
        return Some(found);
    }

    // Tier 2: token overlap
    let needle_tokens = tokenize(&needle);
    if !needle_tokens.is_empty() {
        if let Some(found) = known
            .iter()
            .find(|k| tokens_overlap(&needle_tokens, &tokenize(&k.name)))
        {
            return Some(found);
        }
    }

    // Tier 3: full-name substring containment
    known.iter().find(|k| {
        let candidate = k.name.to_lowercase();
        candidate.contains(&needle) || needle.contains(&candidate)
    })
}
