// ABOUTME: SQLite implementation of the meal store on sqlx
// ABOUTME: Idempotent migrations, token resolution, meal history, and nutrition lookup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealforge

//! SQLite meal store
//!
//! Stores users keyed by API token, generated meals with their full JSON
//! payload and an expiry timestamp, and a per-100g nutrition reference
//! table. Works against file databases and `sqlite::memory:` alike.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Row, Sqlite, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use super::MealStore;
use crate::config::SubscriptionPlan;
use crate::errors::AppError;
use crate::models::{GeneratedRecipe, NutritionPer100g, StoredMealSummary, UserProfile};

/// SQLite-backed meal store
#[derive(Clone)]
pub struct SqliteMealStore {
    pool: Pool<Sqlite>,
}

impl SqliteMealStore {
    /// Connect and run migrations
    ///
    /// SQLite file databases are created when missing.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the connection or a migration fails.
    pub async fn new(database_url: &str) -> Result<Self, AppError> {
        // Ensure SQLite creates file databases that don't exist yet
        let connection_options =
            if database_url.starts_with("sqlite:") && !database_url.contains("memory") {
                format!("{database_url}?mode=rwc")
            } else {
                database_url.to_owned()
            };

        let pool = SqlitePool::connect(&connection_options).await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Get a reference to the connection pool
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Create tables when missing; safe to run repeatedly
    ///
    /// # Errors
    ///
    /// Returns a persistence error when a statement fails.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                token TEXT NOT NULL UNIQUE,
                plan TEXT NOT NULL DEFAULT 'free',
                currency TEXT,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS meals (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                ingredient_names TEXT NOT NULL,
                payload TEXT NOT NULL,
                created_at DATETIME NOT NULL,
                expires_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_meals_user_expiry ON meals(user_id, expires_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS nutrition (
                name TEXT PRIMARY KEY COLLATE NOCASE,
                calories REAL NOT NULL,
                protein REAL NOT NULL,
                carbs REAL NOT NULL,
                fat REAL NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        debug!("meal store migrations complete");
        Ok(())
    }

    /// Create a user with the given token and plan, returning the new id
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the insert fails (including a
    /// duplicate token).
    pub async fn create_user(
        &self,
        token: &str,
        plan: SubscriptionPlan,
        currency: Option<&str>,
    ) -> Result<Uuid, AppError> {
        let id = Uuid::new_v4();
        let plan_str = match plan {
            SubscriptionPlan::Free => "free",
            SubscriptionPlan::Premium => "premium",
        };
        sqlx::query("INSERT INTO users (id, token, plan, currency) VALUES (?, ?, ?, ?)")
            .bind(id.to_string())
            .bind(token)
            .bind(plan_str)
            .bind(currency)
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    /// Insert or replace a nutrition reference row
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the upsert fails.
    pub async fn upsert_nutrition(
        &self,
        name: &str,
        nutrition: NutritionPer100g,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT OR REPLACE INTO nutrition (name, calories, protein, carbs, fat) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(name)
        .bind(nutrition.calories)
        .bind(nutrition.protein)
        .bind(nutrition.carbs)
        .bind(nutrition.fat)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn parse_plan(plan: &str) -> SubscriptionPlan {
        match plan {
            "premium" => SubscriptionPlan::Premium,
            _ => SubscriptionPlan::Free,
        }
    }
}

#[async_trait]
impl MealStore for SqliteMealStore {
    async fn resolve_token(&self, token: &str) -> Result<Option<UserProfile>, AppError> {
        let row = sqlx::query("SELECT id, plan, currency FROM users WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let id: String = row.get("id");
        let id = Uuid::parse_str(&id)
            .map_err(|e| AppError::persistence(format!("corrupt user id: {e}")))?;
        let plan: String = row.get("plan");

        Ok(Some(UserProfile {
            id,
            plan: Self::parse_plan(&plan),
            currency: row.get("currency"),
        }))
    }

    async fn existing_meals(&self, user_id: Uuid) -> Result<Vec<StoredMealSummary>, AppError> {
        let rows = sqlx::query(
            "SELECT title, ingredient_names, created_at FROM meals \
             WHERE user_id = ? AND expires_at > ? ORDER BY created_at DESC",
        )
        .bind(user_id.to_string())
        .bind(Utc::now())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let names_json: String = row.get("ingredient_names");
                let ingredient_names: Vec<String> = serde_json::from_str(&names_json)
                    .map_err(|e| AppError::persistence(format!("corrupt meal row: {e}")))?;
                let created_at: DateTime<Utc> = row.get("created_at");
                Ok(StoredMealSummary {
                    title: row.get("title"),
                    ingredient_names,
                    created_at,
                })
            })
            .collect()
    }

    async fn lookup_nutrition(&self, name: &str) -> Result<Option<NutritionPer100g>, AppError> {
        let exact = sqlx::query(
            "SELECT calories, protein, carbs, fat FROM nutrition WHERE name = ? COLLATE NOCASE",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        let row = if let Some(row) = exact {
            Some(row)
        } else {
            // Substring containment in either direction, shortest key first
            // so "rice" beats "fried rice mix" for the needle "basmati rice"
            sqlx::query(
                "SELECT calories, protein, carbs, fat FROM nutrition \
                 WHERE instr(LOWER(?1), LOWER(name)) > 0 OR instr(LOWER(name), LOWER(?1)) > 0 \
                 ORDER BY LENGTH(name) ASC LIMIT 1",
            )
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
        };

        Ok(row.map(|row| NutritionPer100g {
            calories: row.get("calories"),
            protein: row.get("protein"),
            carbs: row.get("carbs"),
            fat: row.get("fat"),
        }))
    }

    async fn insert_generated(
        &self,
        user_id: Uuid,
        recipe: &GeneratedRecipe,
    ) -> Result<(), AppError> {
        let ingredient_names: Vec<&str> = recipe
            .ingredients
            .iter()
            .map(|line| line.name.as_str())
            .collect();
        let names_json = serde_json::to_string(&ingredient_names)
            .map_err(|e| AppError::persistence(format!("serialize meal names: {e}")))?;
        let payload = serde_json::to_string(recipe)
            .map_err(|e| AppError::persistence(format!("serialize meal payload: {e}")))?;

        sqlx::query(
            "INSERT INTO meals (id, user_id, title, ingredient_names, payload, created_at, expires_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(recipe.id.to_string())
        .bind(user_id.to_string())
        .bind(&recipe.title)
        .bind(names_json)
        .bind(payload)
        .bind(recipe.created_at)
        .bind(recipe.expires_at)
        .execute(&self.pool)
        .await?;

        debug!(meal_id = %recipe.id, "stored generated meal");
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM meals WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        let purged = result.rows_affected();
        if purged > 0 {
            info!(purged, "purged expired meals");
        }
        Ok(purged)
    }
}
