use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{MovieId, MovieRef, RecommendationItem};
use server::{HybridRecommendations, LikeOutcome, RecommendationService, ServiceConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Semaphore;

/// ReelRecs - Hybrid Movie Recommendation Engine
#[derive(Parser)]
#[command(name = "reel-recs")]
#[command(about = "Movie recommendations blending collaborative and content-based filtering", long_about = None)]
struct Cli {
    /// Directory holding cf_model.json and cbf_model.json (overrides RECS_MODELS_DIR)
    #[arg(short, long)]
    models_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the movie whose title best matches a query
    Search {
        /// Free-text title, typos allowed
        #[arg(long)]
        title: String,
    },

    /// Get hybrid recommendations for a movie
    Recommend {
        /// Movie id
        #[arg(long, conflicts_with = "title", required_unless_present = "title")]
        id: Option<MovieId>,

        /// Free-text title, resolved by fuzzy match
        #[arg(long)]
        title: Option<String>,

        /// Print the response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Neighbors from a single model
    Similar {
        /// Model to query: "cf" or "cbf"
        #[arg(long)]
        model: String,

        /// Movie id
        #[arg(long)]
        id: MovieId,

        /// Number of similar movies to return
        #[arg(long, default_value = "6")]
        count: usize,
    },

    /// Look up the title of a movie id
    Title {
        #[arg(long)]
        id: MovieId,
    },

    /// Interactive session: recommend, like, and watch the blend move
    Session,

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = ServiceConfig::from_env()?;
    if let Some(models_dir) = cli.models_dir {
        config.models_dir = models_dir;
    }

    // Load both models (this may take a moment)
    println!("Loading models from {}...", config.models_dir.display());
    let start = Instant::now();
    let service = RecommendationService::from_config(&config)
        .await
        .context("Failed to load recommendation models")?;
    println!("{} Loaded models in {:?}", "✓".green(), start.elapsed());

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Search { title } => handle_search(&service, title).await?,
        Commands::Recommend { id, title, json } => {
            let movie_ref = match (id, title) {
                (Some(id), _) => MovieRef::Id(id),
                (None, Some(title)) => MovieRef::Title(title),
                (None, None) => bail!("Pass either --id or --title"),
            };
            handle_recommend(&service, movie_ref, json).await?
        }
        Commands::Similar { model, id, count } => {
            handle_similar(&service, &model, id, count).await?
        }
        Commands::Title { id } => handle_title(&service, id).await?,
        Commands::Session => handle_session(&service).await?,
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(service, requests, concurrent).await?,
    }

    Ok(())
}

/// Handle the 'search' command
async fn handle_search(service: &RecommendationService, title: String) -> Result<()> {
    let movie = service.search(&title).await?;
    println!("{}", format!("Best match for '{}':", title).bold().blue());
    println!("{}: {}", movie.id.to_string().green(), movie.title);
    Ok(())
}

/// Handle the 'recommend' command
async fn handle_recommend(
    service: &RecommendationService,
    movie_ref: MovieRef,
    json: bool,
) -> Result<()> {
    let recommendations = service.recommend(movie_ref).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&recommendations)?);
    } else {
        print_recommendations(&recommendations);
    }
    Ok(())
}

/// Handle the 'similar' command
async fn handle_similar(
    service: &RecommendationService,
    model: &str,
    id: MovieId,
    count: usize,
) -> Result<()> {
    let similar = service.model_recommendations(model, id, count).await?;
    println!(
        "{}",
        format!("Movies similar to {}:", similar.title).bold().blue()
    );
    print_items(similar.model.display_name(), &similar.recommendations);
    Ok(())
}

/// Handle the 'title' command
async fn handle_title(service: &RecommendationService, id: MovieId) -> Result<()> {
    let movie = service.get_title(id).await?;
    println!("{}: {}", movie.id.to_string().green(), movie.title);
    Ok(())
}

/// Handle the 'session' command
///
/// Reads one command per line from stdin until EOF or `quit`.
async fn handle_session(service: &RecommendationService) -> Result<()> {
    println!("{}", "Commands:".bold().blue());
    println!("  recommend <title or id>");
    println!("  like <cf|cbf> <id>");
    println!("  search <title>");
    println!("  title <id>");
    println!("  weights");
    println!("  quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }
        // Request errors are reported and the session continues
        if let Err(e) = handle_session_line(service, line).await {
            println!("{} {}", "✗".red(), e);
        }
    }
    Ok(())
}

async fn handle_session_line(service: &RecommendationService, line: &str) -> Result<()> {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    match command {
        "recommend" => {
            let movie_ref = match rest.parse::<MovieId>() {
                Ok(id) => MovieRef::Id(id),
                Err(_) => MovieRef::Title(rest.to_string()),
            };
            print_recommendations(&service.recommend(movie_ref).await?);
        }
        "like" => {
            let (model, id) = rest
                .split_once(' ')
                .ok_or_else(|| anyhow!("Usage: like <cf|cbf> <id>"))?;
            let id: MovieId = id.trim().parse().context("Movie id must be a number")?;
            print_like(&service.like(model, id).await?);
        }
        "search" => handle_search(service, rest.to_string()).await?,
        "title" => {
            let id: MovieId = rest.parse().context("Movie id must be a number")?;
            handle_title(service, id).await?
        }
        "weights" => {
            let weights = service.weights().await;
            println!(
                "cf {:.1} / cbf {:.1}",
                weights.cf_weight(),
                weights.cbf_weight()
            );
        }
        other => bail!("Unknown command: {}", other),
    }
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    service: RecommendationService,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    let movies = service.blender().source(data_loader::ModelKind::Cbf).catalog().movies();

    // Random movie ids from the catalog
    let movie_ids: Vec<MovieId> = (0..requests)
        .map(|_| movies[rand::random::<u32>() as usize % movies.len()].id)
        .collect();

    // Use tokio::spawn to make concurrent requests, at most `concurrent` in flight
    let permits = Arc::new(Semaphore::new(concurrent.max(1)));
    let wall_clock = Instant::now();
    let mut handles = vec![];
    for movie_id in movie_ids {
        let service = service.clone();
        let permits = Arc::clone(&permits);
        let handle = tokio::spawn(async move {
            let _permit = permits.acquire_owned().await?;
            let start = Instant::now();
            service.recommend(movie_id).await?;
            Ok::<_, anyhow::Error>(start.elapsed())
        });
        handles.push(handle);
    }

    // Wait for all tasks to complete and collect timings
    let mut timings = vec![];
    for handle in handles {
        let elapsed = handle.await??;
        timings.push(elapsed);
    }
    if timings.is_empty() {
        println!("No requests made");
        return Ok(());
    }

    let total_time = wall_clock.elapsed();
    let latency_sum: std::time::Duration = timings.iter().sum();
    let avg_latency = latency_sum / (timings.len() as u32);
    timings.sort();
    let p50 = timings[timings.len() / 2];
    let p95 = timings[((timings.len() as f32 * 0.95) as usize).min(timings.len() - 1)];
    let p99 = timings[((timings.len() as f32 * 0.99) as usize).min(timings.len() - 1)];
    let throughput = requests as f32 / total_time.as_secs_f32();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", p50);
    println!("P95 latency: {:?}", p95);
    println!("P99 latency: {:?}", p99);
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Helper function to format and print recommendations
fn print_recommendations(recommendations: &HybridRecommendations) {
    println!(
        "{}",
        format!("Recommendations for {}:", recommendations.title)
            .bold()
            .blue()
    );
    print_items("Collaborative Filtering", &recommendations.cf);
    print_items("Content-based Filtering", &recommendations.cbf);
}

fn print_items(heading: &str, items: &[RecommendationItem]) {
    println!("{}", heading.bold());
    for (rank, item) in items.iter().enumerate() {
        println!(
            "{}. {} [{}]",
            (rank + 1).to_string().green(),
            item.title,
            item.id
        );
    }
}

fn print_like(outcome: &LikeOutcome) {
    let marker = if outcome.adjusted {
        "✓".green()
    } else {
        "·".yellow()
    };
    println!(
        "{} Liked {} via {}: cf {:.1} / cbf {:.1}",
        marker, outcome.title, outcome.model, outcome.cf_weight, outcome.cbf_weight
    );
}
