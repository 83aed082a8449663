use connectors::error::ServiceError;
use engine_config::settings::error::SettingsError;
use engine_processing::error::ReaderError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid reader settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("Failed to load the result fixture: {0}")]
    Fixture(#[from] ServiceError),

    #[error("Failed to read query results: {0}")]
    Reader(#[from] ReaderError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Shutdown requested")]
    ShutdownRequested,
}
