// ABOUTME: Route module organization for the Mealforge HTTP endpoints
// ABOUTME: Centralized route definitions organized by domain with shared middleware
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealforge

//! Route module for the Mealforge server
//!
//! This module organizes all HTTP routes by domain. Each domain module
//! contains route definitions and thin handler functions that delegate to
//! the engine and the persistence boundary.

/// Health check and system status routes
pub mod health;
/// Meal generation routes
pub mod meals;

pub use health::HealthRoutes;
pub use meals::{AppState, GenerateMealRequest, GenerateMealResponse, IngredientInput};

use axum::Router;
use tower_http::trace::TraceLayer;

/// Assemble the full application router
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(HealthRoutes::routes())
        .merge(meals::routes(state))
        .layer(TraceLayer::new_for_http())
}
