use pokedex_common::catalog::CatalogClientError;
use pokedex_common::error::CommonError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Common(#[from] CommonError),

    #[error(transparent)]
    Client(#[from] CatalogClientError),

    #[error("config error: {0}")]
    Config(String),

    #[error("unknown command: {0} (expected one of: page, count, types)")]
    UnknownCommand(String),

    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}
