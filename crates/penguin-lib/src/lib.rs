pub mod build;
pub mod cli;
pub mod command;
pub mod config;
pub mod download;
pub mod error;
pub mod fetch;
pub mod system;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::PenguinError;
