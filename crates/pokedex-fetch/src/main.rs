mod config;
mod error;

use std::io::Write;

use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use pokedex_common::catalog::CatalogClient;
use pokedex_common::enrich::get_enriched_page;
use pokedex_common::model::PokemonEntry;

use config::Config;
use error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// One page of summaries enriched into detail records.
    Page,
    /// Total number of Pokémon in the catalog.
    Count,
    /// The list of Pokémon types.
    Types,
}

impl Command {
    fn parse(arg: Option<&str>) -> Result<Self, AppError> {
        match arg {
            None | Some("page") => Ok(Self::Page),
            Some("count") => Ok(Self::Count),
            Some("types") => Ok(Self::Types),
            Some(other) => Err(AppError::UnknownCommand(other.to_string())),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the JSON result.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let command = Command::parse(std::env::args().nth(1).as_deref())?;

    let config = Config::from_env()?;
    info!(
        base_url = %config.catalog.base_url,
        timeout_ms = config.catalog.default_timeout.as_millis(),
        max_retries = config.catalog.max_retries,
        limit = config.limit,
        offset = config.offset,
        concurrency = config.options.concurrency,
        ignore_errors = config.options.ignore_errors,
        "configuration loaded"
    );

    let client = CatalogClient::new(config.catalog.clone())?;
    run(command, &client, &config).await.inspect_err(|e| {
        tracing::error!(error = %e, ?command, "pokedex-fetch failed");
    })?;
    Ok(())
}

async fn run(command: Command, client: &CatalogClient, config: &Config) -> Result<(), AppError> {
    match command {
        Command::Page => {
            let page = get_enriched_page(client, config.limit, config.offset, &config.options).await?;
            for entry in &page.results {
                debug!("{}", summary_line(entry));
            }
            write_json(&page)
        }
        Command::Count => {
            let count = client.count().await?;
            write_json(&serde_json::json!({ "count": count }))
        }
        Command::Types => {
            let types = client.list_types().await?;
            write_json(&types)
        }
    }
}

/// One-line description of an entry for logs: id, name, types, hp and sprite.
fn summary_line(entry: &PokemonEntry) -> String {
    let id = entry.id().map_or_else(|| "?".to_string(), |id| id.to_string());
    let name = entry.name().unwrap_or("?");
    let sprite = entry.sprite().unwrap_or_else(|| "-".to_string());
    match entry.as_detail() {
        Some(detail) => {
            let hp = detail
                .base_stat("hp")
                .map_or_else(|| "?".to_string(), |hp| hp.to_string());
            format!(
                "#{id} {name} [{}] hp={hp} sprite={sprite}",
                detail.type_names().join("/")
            )
        }
        None => format!("#{id} {name} (degraded) sprite={sprite}"),
    }
}

fn write_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}
