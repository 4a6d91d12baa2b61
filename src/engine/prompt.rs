// ABOUTME: Prompt assembly for the recipe-generation model call
// ABOUTME: Targets, duplicate avoidance, protein rotation, allowlist, and output contract
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealforge

//! # Prompt Assembler
//!
//! Builds the structured instruction set sent to the language model. The
//! output-format contract is loaded at compile time from a markdown file so
//! it can be maintained without touching code.
//!
//! The protein-rotation hint and duplicate-avoidance list are soft steering,
//! not hard constraints: the model may deviate, and the reconciler never
//! assumes it didn't.

use rand::seq::SliceRandom;

use crate::config::GenerationConfig;
use crate::models::{GenerationMode, GenerationRequest};

/// Fixed output-format contract appended to every prompt
const RECIPE_CONTRACT: &str = include_str!("prompts/recipe_contract.md");

/// Assembled prompt, split into system and user sections
#[derive(Debug, Clone)]
pub struct PromptSections {
    /// Role and output-contract instructions
    pub system: String,
    /// Request-specific instructions: ingredients, targets, avoidance
    pub user: String,
}

/// Pick the protein to suggest, honoring the rotation policy
///
/// With more than one protein available, prefer one not recently used;
/// when everything has been used recently, pick pseudo-randomly among the
/// available set. A single available protein is suggested as-is.
#[must_use]
pub fn rotate_protein(
    request: &GenerationRequest,
    used_proteins: &[String],
    config: &GenerationConfig,
) -> Option<String> {
    let available: Vec<&str> = request
        .ingredients
        .iter()
        .filter(|ingredient| config.is_protein(&ingredient.name))
        .map(|ingredient| ingredient.name.as_str())
        .collect();

    match available.as_slice() {
        [] => None,
        [only] => Some((*only).to_owned()),
        _ => {
            let used_lower: Vec<String> =
                used_proteins.iter().map(|p| p.to_lowercase()).collect();
            let fresh: Vec<&str> = available
                .iter()
                .copied()
                .filter(|name| {
                    let name_lower = name.to_lowercase();
                    !used_lower
                        .iter()
                        .any(|used| used.contains(&name_lower) || name_lower.contains(used.as_str()))
                })
                .collect();

            if let Some(first_fresh) = fresh.first() {
                Some((*first_fresh).to_owned())
            } else {
                available
                    .choose(&mut rand::thread_rng())
                    .map(|name| (*name).to_owned())
            }
        }
    }
}

fn ingredient_inventory(request: &GenerationRequest) -> String {
    let mut section = String::from("Available ingredients (name, grams on hand):\n");
    for ingredient in &request.ingredients {
        section.push_str(&format!("- {}: {}g\n", ingredient.name, ingredient.grams));
    }
    section
}

fn duplicate_avoidance(existing_titles: &[String]) -> String {
    if existing_titles.is_empty() {
        return "The user has no previous meals; any recipe is acceptable.\n".to_owned();
    }

    let mut section = String::from(
        "The user already has these meals. Do not repeat their names, \
         cooking methods, or flavor profiles:\n",
    );
    for title in existing_titles {
        section.push_str(&format!("- {title}\n"));
    }
    section
}

fn target_section(request: &GenerationRequest, config: &GenerationConfig) -> String {
    match request.mode {
        GenerationMode::Nutri => {
            let mut section = String::from("Nutrition targets for the whole recipe:\n");
            if let Some(calories) = request.target_calories {
                section.push_str(&format!(
                    "- Calories: {calories} kcal (within ±{} kcal)\n",
                    config.tolerances.calories
                ));
            }
            for (label, target) in [
                ("Protein", request.target_protein),
                ("Carbs", request.target_carbs),
                ("Fats", request.target_fats),
            ] {
                if let Some(grams) = target {
                    section.push_str(&format!(
                        "- {label}: {grams}g (within ±{}g)\n",
                        config.tolerances.macros
                    ));
                }
            }
            section.push_str(
                "In the \"message\" field, state explicitly whether the recipe \
                 matches these targets or not.\n",
            );
            section
        }
        GenerationMode::Easy => format!(
            "Do not worry about calorie or macro targets. The recipe must \
             serve exactly {} and every ingredient amount must be scaled \
             for {} servings.\n",
            request.servings, request.servings
        ),
    }
}

fn allowlist_section(allowlist: &[String]) -> String {
    let mut section = String::from(
        "STRICT ingredient allowlist. You may only use the ingredients \
         below. Do not introduce anything else, with salt and pepper as the \
         sole exception:\n",
    );
    for item in allowlist {
        section.push_str(&format!("- {item}\n"));
    }
    section
}

/// Build the full prompt for one generation request
#[must_use]
pub fn build_prompt(
    request: &GenerationRequest,
    existing_titles: &[String],
    used_proteins: &[String],
    allowlist: Option<&[String]>,
    config: &GenerationConfig,
) -> PromptSections {
    let system = format!(
        "You are a professional chef and nutritionist. Create one realistic, \
         cookable recipe from the user's available ingredients.\n\n{RECIPE_CONTRACT}"
    );

    let mut user = String::new();
    user.push_str(&ingredient_inventory(request));
    user.push('\n');
    user.push_str(&target_section(request, config));
    user.push('\n');
    user.push_str(&duplicate_avoidance(existing_titles));

    if let Some(protein) = rotate_protein(request, used_proteins, config) {
        user.push_str(&format!(
            "\nPrefer {protein} as the main protein for variety.\n"
        ));
    }

    if let Some(list) = allowlist {
        user.push('\n');
        user.push_str(&allowlist_section(list));
    }

    PromptSections { system, user }
}
