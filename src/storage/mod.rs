// ABOUTME: Persistence boundary for users, stored meals, and nutrition reference data
// ABOUTME: Defines the MealStore trait the engine and routes depend on
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealforge

//! # Persistence Boundary
//!
//! The engine and the HTTP layer never touch the database directly; they
//! depend on [`MealStore`]. The production implementation is
//! [`SqliteMealStore`]; tests substitute in-memory instances or mock
//! implementations.

mod sqlite;

pub use sqlite::SqliteMealStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{GeneratedRecipe, NutritionPer100g, StoredMealSummary, UserProfile};

/// Storage operations the meal-generation pipeline requires
#[async_trait]
pub trait MealStore: Send + Sync {
    /// Resolve an API token to the owning user, or `None` when unknown
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the lookup itself fails.
    async fn resolve_token(&self, token: &str) -> Result<Option<UserProfile>, AppError>;

    /// Non-expired meals for a user, newest first
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the query fails.
    async fn existing_meals(&self, user_id: Uuid) -> Result<Vec<StoredMealSummary>, AppError>;

    /// Per-100g nutrition for an ingredient name
    ///
    /// Tries an exact case-insensitive match first, then substring
    /// containment in either direction.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the query fails.
    async fn lookup_nutrition(&self, name: &str) -> Result<Option<NutritionPer100g>, AppError>;

    /// Store a generated meal for a user
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the insert fails. The caller
    /// surfaces this distinctly: the recipe was produced but not stored.
    async fn insert_generated(
        &self,
        user_id: Uuid,
        recipe: &GeneratedRecipe,
    ) -> Result<(), AppError>;

    /// Delete meals past their expiry timestamp, returning how many
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the delete fails.
    async fn purge_expired(&self) -> Result<u64, AppError>;
}
