use std::str::FromStr;

use pokedex_common::catalog::CatalogClientConfig;
use pokedex_common::enrich::{EnrichOptions, DEFAULT_CONCURRENCY, DEFAULT_LIMIT, DEFAULT_OFFSET};

use crate::error::AppError;

/// Runtime configuration loaded from environment variables.
///
/// The catalog client section is read by [`CatalogClientConfig::from_lookup`]; the page
/// selection and enrichment options are read here. Unlike the client settings, invalid
/// values here are rejected rather than defaulted.
#[derive(Debug, Clone)]
pub struct Config {
    pub catalog: CatalogClientConfig,
    pub limit: u32,
    pub offset: u32,
    pub options: EnrichOptions,
}

impl Config {
    /// Optional:
    /// - `POKEDEX_LIMIT` (default: 50)
    /// - `POKEDEX_OFFSET` (default: 0)
    /// - `POKEDEX_CONCURRENCY` (default: 8, must be greater than zero)
    /// - `POKEDEX_IGNORE_ERRORS` (default: true; true/false/1/0/yes/no)
    /// - `POKEAPI_*` client settings
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let limit = parse_var(&lookup, "POKEDEX_LIMIT", DEFAULT_LIMIT)?;
        let offset = parse_var(&lookup, "POKEDEX_OFFSET", DEFAULT_OFFSET)?;

        let concurrency = parse_var(&lookup, "POKEDEX_CONCURRENCY", DEFAULT_CONCURRENCY)?;
        if concurrency == 0 {
            return Err(AppError::Config(
                "POKEDEX_CONCURRENCY must be greater than zero".to_string(),
            ));
        }

        let ignore_errors = match lookup("POKEDEX_IGNORE_ERRORS") {
            None => true,
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                AppError::Config(format!("POKEDEX_IGNORE_ERRORS is not a boolean: {raw}"))
            })?,
        };

        Ok(Self {
            catalog: CatalogClientConfig::from_lookup(&lookup),
            limit,
            offset,
            options: EnrichOptions {
                concurrency,
                ignore_errors,
            },
        })
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::Config(format!("{key} is not a valid number: {raw}"))),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
