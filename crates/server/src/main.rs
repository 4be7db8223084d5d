//! Simple test harness for the recommendation service.
//!
//! Boots the service from `RECS_*` environment variables and runs one
//! search, one recommendation and one like end to end.

use std::env;

use anyhow::{Context, Result};
use tracing::info;

use server::{RecommendationService, ServiceConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("info,server=debug,sources=debug,pipeline=debug")
                }),
        )
        .init();

    info!("Starting ReelRecs server test harness");

    let config = ServiceConfig::from_env()?;
    info!("Loading models from {}", config.models_dir.display());
    let service = RecommendationService::from_config(&config).await?;

    let query = env::args().nth(1).unwrap_or_else(|| "toy story".to_string());
    let movie = service
        .search(&query)
        .await
        .with_context(|| format!("No match for {:?}", query))?;
    info!("Matched {:?} to {} (id {})", query, movie.title, movie.id);

    let recommendations = service.recommend(movie.id).await?;
    info!("Collaborative Filtering:");
    for (i, item) in recommendations.cf.iter().enumerate() {
        info!("{}. {} [{}]", i + 1, item.title, item.id);
    }
    info!("Content-based Filtering:");
    for (i, item) in recommendations.cbf.iter().enumerate() {
        info!("{}. {} [{}]", i + 1, item.title, item.id);
    }

    if let Some(first) = recommendations.cf.first() {
        let outcome = service.like("cf", first.id).await?;
        info!(
            "Liked {} via {}: cf={:.1} cbf={:.1} (adjusted: {})",
            outcome.title, outcome.model, outcome.cf_weight, outcome.cbf_weight, outcome.adjusted
        );
    }

    Ok(())
}
