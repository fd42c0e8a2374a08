//! metarsearch - fetch, cache and render METAR report tables
//!
//! Runs a render pass for the configured stations and prints the resulting
//! template tags, or keeps refreshing them with `--watch`.

use std::process::ExitCode;

use chrono::{Duration, Utc};
use clap::Parser;

use metarsearch::cli::{Cli, OutputFormat};
use metarsearch::refresh::{RefreshConfig, RefreshHandle, RefreshMessage};
use metarsearch::{MetarSearch, SearchListExtension, TimeSpan};

/// Prints the tags in the requested format
fn print_tags(tags: &SearchListExtension, format: OutputFormat) -> Result<(), serde_json::Error> {
    match format {
        OutputFormat::Html => {
            for (name, html) in tags {
                println!("<!-- {} -->", name);
                println!("{}", html);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(tags)?);
        }
    }
    Ok(())
}

async fn watch(search: MetarSearch<metarsearch::data::MetarClient>, format: OutputFormat) {
    let mut handle = RefreshHandle::spawn(search, RefreshConfig::default());

    loop {
        tokio::select! {
            message = handle.recv() => {
                match message {
                    Some(RefreshMessage::Refreshed { summary, tags }) => {
                        log::info!(
                            "Refreshed {}/{} stations",
                            summary.generated,
                            summary.stations
                        );
                        if let Err(e) = print_tags(&tags, format) {
                            log::error!("Failed to print tags: {}", e);
                        }
                    }
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    handle.shutdown().await;
}

#[tokio::main]
async fn main() -> ExitCode {
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::init_from_env(env);

    let cli = Cli::parse();
    let config = match cli.to_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    log::info!(
        "Reporting on {} station(s), refresh every {} minute(s), cache in {}",
        config.stations.len(),
        config.refresh_interval,
        config.cache_dir.display()
    );

    let mut search = MetarSearch::from_config(&config);

    if cli.watch {
        watch(search, cli.format).await;
        return ExitCode::SUCCESS;
    }

    let now = Utc::now();
    let timespan = TimeSpan::new(now - Duration::hours(1), now);
    let list = search.get_extension_list(&timespan, |_| ()).await;

    for tags in &list {
        if let Err(e) = print_tags(tags, cli.format) {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
