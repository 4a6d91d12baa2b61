// ABOUTME: Production server binary for the Mealforge meal-generation API
// ABOUTME: Wires the store, model provider, engine, and axum router together
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealforge

#![recursion_limit = "256"]

//! # Mealforge Server Binary
//!
//! Starts the HTTP API: bearer-token authentication, meal generation against
//! a configured model backend, and SQLite persistence.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use mealforge::config::GenerationConfig;
use mealforge::engine::MealEngine;
use mealforge::llm::{OpenAiCompatibleProvider, RecipeModel};
use mealforge::logging;
use mealforge::routes::{self, AppState};
use mealforge::storage::{MealStore, SqliteMealStore};

#[derive(Parser)]
#[command(name = "mealforge-server")]
#[command(about = "Mealforge - ingredient-driven meal generation API")]
pub struct Args {
    /// Address to bind the HTTP server to
    #[arg(long, default_value = "0.0.0.0:8080")]
    bind: String,

    /// Database URL (SQLite)
    #[arg(long, default_value = "sqlite:mealforge.db", env = "DATABASE_URL")]
    database_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    info!("Starting Mealforge server");

    let store = Arc::new(SqliteMealStore::new(&args.database_url).await?);
    info!("Database initialized: {}", args.database_url);

    let purged = store.purge_expired().await?;
    if purged > 0 {
        info!(purged, "expired meals removed at startup");
    }

    let model = Arc::new(OpenAiCompatibleProvider::from_env()?);
    info!(
        "Model provider ready: {} (default model {})",
        model.name(),
        model.default_model()
    );

    let config = GenerationConfig::default();
    let engine = Arc::new(MealEngine::new(store.clone(), model, config));

    let app = routes::router(AppState {
        engine,
        store: store as Arc<dyn MealStore>,
    });

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    info!("Listening on {}", args.bind);
    axum::serve(listener, app).await?;

    Ok(())
}
