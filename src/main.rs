use std::time::Duration;

use serde::Serialize;
use tracing_subscriber::EnvFilter;

mod ai;
mod analysis;
mod config;
mod db;
mod error;
mod feed;
mod models;
mod pipeline;
mod services;

use config::Config;
use db::Repository;
use error::{AppError, Result};
use feed::{FeedFetcher, FeedReader};
use pipeline::{BatchReport, Pipeline};

const USAGE: &str = "\
Usage: newsguard <command>

  --analyze <url>      analyse an article and store the verdict
  --classify <url>     analyse an article without storing anything
  --refresh            analyse the newest items of all configured feeds once
  --watch              like --refresh, repeated every refresh_interval_minutes
  --preview            classify feed teasers without fetching the articles
  --history <url>      stored verdicts for an article, newest first
  --recent [n]         the n most recent verdicts (default 20)
  --trending [days]    most frequent confident categories (default 3 days)";

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn required_arg<'a>(args: &'a [String], flag: &str) -> Result<&'a str> {
    args.get(2)
        .map(String::as_str)
        .ok_or_else(|| AppError::Config(format!("{flag} needs a URL")))
}

fn numeric_arg<T: std::str::FromStr>(args: &[String], default: T) -> T {
    args.get(2).and_then(|s| s.parse().ok()).unwrap_or(default)
}

async fn refresh(
    pipeline: &Pipeline<services::ContentFetcher, ai::HttpLlmGateway>,
    config: &Config,
    repository: &Repository,
) -> Result<BatchReport> {
    let reader = FeedFetcher::new()?;
    Ok(pipeline
        .run_batch(
            &reader,
            &config.feeds,
            config.items_per_feed,
            config.max_concurrent_analyses,
            repository,
        )
        .await)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Crate logs at info, dependencies at warn, unless RUST_LOG says otherwise
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,newsguard=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1).map(String::as_str) else {
        println!("{USAGE}");
        return Ok(());
    };

    let config = Config::load()?;
    let pipeline = Pipeline::from_config(&config)?;

    match command {
        "--classify" => {
            let url = required_arg(&args, command)?;
            print_json(&pipeline.classify_from_url(url).await?)?;
        }
        "--analyze" => {
            let url = required_arg(&args, command)?;
            let repository = Repository::new(&config.db_path).await?;
            print_json(&pipeline.run_and_store(url, &repository).await?)?;
        }
        "--refresh" => {
            let repository = Repository::new(&config.db_path).await?;
            let report = refresh(&pipeline, &config, &repository).await?;
            println!(
                "Analyzed {}, skipped {}, failed {} ({} articles stored)",
                report.analyzed,
                report.skipped,
                report.failed,
                repository.count_articles().await?
            );
        }
        "--watch" => {
            let repository = Repository::new(&config.db_path).await?;
            let minutes = u64::from(config.refresh_interval_minutes.max(1));
            let mut ticker = tokio::time::interval(Duration::from_secs(minutes * 60));
            tracing::info!(minutes, "Watching feeds");
            loop {
                ticker.tick().await;
                if let Err(e) = refresh(&pipeline, &config, &repository).await {
                    tracing::warn!(error = %e, "Feed refresh failed");
                }
            }
        }
        "--preview" => {
            let reader = FeedFetcher::new()?;
            for source in &config.feeds {
                let items = match reader.fetch_items(source, config.items_per_feed).await {
                    Ok(items) => items,
                    Err(e) => {
                        tracing::warn!(feed = %source.name, error = %e, "Feed could not be read");
                        continue;
                    }
                };
                for item in items {
                    let link = item.link.as_deref().unwrap_or(&source.url);
                    let text = item.summary.as_deref().unwrap_or_default();
                    let result = pipeline.classify_text(&item.title, link, text).await;
                    println!(
                        "[{}] {} ({} / {}%): {}",
                        source.name,
                        item.title,
                        result.category.as_str(),
                        result.confidence,
                        link
                    );
                }
            }
        }
        "--history" => {
            let url = required_arg(&args, command)?;
            let repository = Repository::new(&config.db_path).await?;
            match repository.get_article_by_url(url).await? {
                Some(article) => print_json(&repository.analyses_for_article(article.id).await?)?,
                None => println!("No analyses stored for {url}"),
            }
        }
        "--recent" => {
            let repository = Repository::new(&config.db_path).await?;
            print_json(&repository.recent_analyses(numeric_arg(&args, 20)).await?)?;
        }
        "--trending" => {
            let repository = Repository::new(&config.db_path).await?;
            print_json(&repository.trending_categories(numeric_arg(&args, 3), 70, 10).await?)?;
        }
        _ => {
            eprintln!("Unknown command: {command}\n\n{USAGE}");
        }
    }

    Ok(())
}
