// ABOUTME: Core data models for meal generation and reconciliation
// ABOUTME: Re-exports Ingredient, GenerationRequest, GeneratedRecipe and related types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealforge

//! # Data Models
//!
//! Core data structures flowing through the generation pipeline: raw
//! ingredients in, normalized ingredients through the engine, a persisted
//! [`GeneratedRecipe`] out. All types are plain serde structs; validation
//! lives on [`GenerationRequest::validate`].

mod meal;

pub use meal::{
    GeneratedRecipe, GenerationMode, GenerationRequest, Ingredient, IngredientUnit, MacroResult,
    NormalizedIngredient, NutritionPer100g, PriceEstimate, QuantityValue, RecipeIngredientLine,
    StoredMealSummary, UserProfile,
};
