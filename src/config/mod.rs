// ABOUTME: Configuration module exposing typed, injectable generation settings
// ABOUTME: Keyword tables, thresholds, and model selection live here, not inline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealforge

//! Configuration Module
//!
//! All tables and thresholds the generation engine consults are explicit,
//! serializable configuration structs rather than inline literals, so they
//! can be versioned and tested independently of the reconciliation logic.

pub mod generation;

pub use generation::{
    DiscrepancyThresholds, FallbackPortions, GenerationConfig, ModelSelection, PieceWeights,
    SubscriptionPlan, TargetTolerances,
};
