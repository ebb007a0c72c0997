use super::Config;
use super::validation::validate_config;
use crate::error::PenguinError;
use config::{Config as ConfigBuilder, FileFormat};

pub fn load_config(config_path: &str) -> Result<Config, PenguinError> {
    let config_builder = ConfigBuilder::builder()
        .add_source(config::File::new(config_path, FileFormat::Json))
        .build()?;

    let config: Config = config_builder.try_deserialize()?;
    validate_config(&config)?;
    Ok(config)
}
