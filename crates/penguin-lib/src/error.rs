use crate::command::CommandError;
use crate::download::RpcError;
use crate::fetch::FetchError;
use crate::system::SystemError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PenguinError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {details}")]
    ConfigValidation { details: String },

    #[error("Invalid command-line arguments: {details}")]
    CliArgumentValidation { details: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory creation failed at {path}: {reason}")]
    DirectoryCreation { path: PathBuf, reason: String },

    #[error("Command failed: {0}")]
    Command(#[from] CommandError),

    #[error("Download manager error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Package fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("System preparation failed: {0}")]
    System(#[from] SystemError),

    #[error("Unexpected error: {0}")]
    Unexpected(#[from] eyre::Report),
}
