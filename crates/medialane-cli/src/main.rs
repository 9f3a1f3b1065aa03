//! Medialane CLI: resolve references, inspect fallback candidates and
//! administer the media cache.
//!
//! Configuration comes from the environment (and `.env`). Use
//! MEDIALANE_DURABLE_BACKEND=file with MEDIALANE_CACHE_DIR so cache state
//! persists between invocations.

use anyhow::Context;
use bytes::Bytes;
use clap::{Parser, Subcommand};
use medialane_cli::{init_tracing, PayloadView};
use medialane_core::{AppError, Config, Environment, MediaCategory};
use medialane_services::{
    HttpLoader, LoadFailureEvent, MediaPipeline, PathResolver, Prefetcher, RenderContext,
};
use serde::Serialize;
use std::sync::Arc;

const PREVIEW_LEN: usize = 120;

#[derive(Parser)]
#[command(name = "medialane", about = "Media resolution and cache CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a media reference to its retrieval path
    Resolve {
        reference: String,
        /// Category hint, e.g. calendar, banner, vendor
        #[arg(long)]
        category: Option<MediaCategory>,
        /// Override the configured environment: development or production
        #[arg(long)]
        env: Option<Environment>,
    },
    /// List the fallback paths tried when a reference fails to load
    Candidates {
        reference: String,
        #[arg(long)]
        category: Option<MediaCategory>,
        /// Caller fallback tried after every candidate
        #[arg(long)]
        fallback: Option<String>,
        /// Render on a detail page (cache-busted vendor candidates)
        #[arg(long)]
        detail_page: bool,
    },
    /// Cache operations
    Cache {
        #[command(subcommand)]
        sub: CacheCommands,
    },
    /// Run one eviction pass over the durable tier
    Evict,
    /// Resolve and load references into the cache
    Prefetch {
        #[arg(required = true)]
        references: Vec<String>,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Read a cached payload
    Get { key: String },
    /// Write a payload, either inline or from a file
    Set {
        key: String,
        /// Payload text
        #[arg(long, conflicts_with = "file")]
        value: Option<String>,
        /// Read the payload from this file
        #[arg(long)]
        file: Option<std::path::PathBuf>,
    },
    /// Check the volatile tier for a key
    Has { key: String },
    /// Remove a key from both tiers
    Remove { key: String },
    /// Tier occupancy
    Stats,
}

#[derive(Serialize)]
struct CandidatesView {
    reference: String,
    category: MediaCategory,
    candidates: Vec<String>,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    run(cli).await.map_err(|e| {
        e.log();
        anyhow::Error::new(e)
    })
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = Config::from_env().map_err(|e| AppError::Config(format!("{:#}", e)))?;
    config
        .validate()
        .map_err(|e| AppError::Config(format!("{:#}", e)))?;

    let loader = Arc::new(HttpLoader::from_config(&config)?);
    let pipeline = MediaPipeline::from_config(&config, loader.clone()).await?;

    match cli.command {
        Commands::Resolve {
            reference,
            category,
            env,
        } => {
            let resolution = match env {
                Some(env) => PathResolver::new(config.resolver().clone().with_environment(env))
                    .resolve_detailed(&reference, category),
                None => pipeline.resolver().resolve_detailed(&reference, category),
            };
            print_json(&resolution)?;
        }
        Commands::Candidates {
            reference,
            category,
            fallback,
            detail_page,
        } => {
            let mut event = LoadFailureEvent::new(reference.clone());
            event.category_hint = category;
            event.fallback = fallback;
            if detail_page {
                event.context = RenderContext::DetailPage;
            }
            let engine = pipeline.engine();
            print_json(&CandidatesView {
                reference,
                category: engine.generator().category_for(&event),
                candidates: engine.plan(&event).planned().to_vec(),
            })?;
        }
        Commands::Cache { sub } => {
            let cache = pipeline.cache();
            match sub {
                CacheCommands::Get { key } => {
                    let payload = cache.get(&key).await;
                    print_json(&serde_json::json!({
                        "key": key,
                        "hit": payload.is_some(),
                        "payload": payload.as_ref().map(|p| PayloadView::new(p, PREVIEW_LEN)),
                    }))?;
                }
                CacheCommands::Set { key, value, file } => {
                    let payload = match (value, file) {
                        (Some(value), _) => Bytes::from(value),
                        (None, Some(path)) => {
                            Bytes::from(tokio::fs::read(&path).await.map_err(|e| {
                                AppError::InvalidInput(format!(
                                    "Failed to read {}: {}",
                                    path.display(),
                                    e
                                ))
                            })?)
                        }
                        (None, None) => {
                            return Err(AppError::InvalidInput(
                                "Provide --value or --file".to_string(),
                            ))
                        }
                    };
                    let outcome = cache.set(&key, payload).await;
                    print_json(&serde_json::json!({ "key": key, "outcome": outcome }))?;
                }
                CacheCommands::Has { key } => {
                    let present = cache.has(&key).await;
                    print_json(&serde_json::json!({ "key": key, "volatile": present }))?;
                }
                CacheCommands::Remove { key } => {
                    let removed = cache.remove(&key).await;
                    print_json(&serde_json::json!({ "key": key, "removed": removed }))?;
                }
                CacheCommands::Stats => {
                    print_json(&cache.stats().await)?;
                }
            }
        }
        Commands::Evict => {
            let removed = pipeline.cache().evict().await;
            print_json(&serde_json::json!({ "removed": removed }))?;
        }
        Commands::Prefetch { references } => {
            let prefetcher = Prefetcher::new(
                pipeline.resolver().clone(),
                pipeline.cache().clone(),
                loader,
                config.prefetch_concurrency(),
            );
            let report = prefetcher.prefetch(&references).await;
            print_json(&report)?;
        }
    }

    Ok(())
}
