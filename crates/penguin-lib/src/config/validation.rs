use super::model::{Config, PackageSpec, PartitionType};
use crate::error::PenguinError;
use std::path::{Component, Path};
use url::Url;

fn invalid(details: String) -> PenguinError {
    PenguinError::ConfigValidation { details }
}

fn validate_packages(packages: &[PackageSpec]) -> Result<(), PenguinError> {
    for package in packages {
        Url::parse(&package.source).map_err(|e| {
            invalid(format!(
                "Package {} has an invalid source {:?}: {}",
                package.display_name(),
                package.source,
                e
            ))
        })?;

        if let Some(directory_name) = &package.directory_name
            && directory_name.trim().is_empty()
        {
            return Err(invalid(format!(
                "Package {} has an empty directory name",
                package.display_name()
            )));
        }

        if let Some(directory_name) = &package.directory_name
            && !Path::new(directory_name)
                .components()
                .all(|component| matches!(component, Component::Normal(_)))
        {
            return Err(invalid(format!(
                "Package {} has directory name {:?} outside of its parent directory",
                package.display_name(),
                directory_name
            )));
        }

        validate_packages(&package.required_packages)?;
    }
    Ok(())
}

pub fn validate_config(config: &Config) -> Result<(), PenguinError> {
    if config.short_name.is_empty() || config.short_name.contains('/') {
        return Err(invalid(format!(
            "Short name {:?} cannot be used as a mount point name",
            config.short_name
        )));
    }

    let root_partitions = config
        .partitions
        .iter()
        .filter(|partition| partition.partition_type == PartitionType::Root)
        .count();
    if root_partitions > 1 {
        return Err(invalid(format!(
            "Only one Root partition can be defined, found {root_partitions}"
        )));
    }

    validate_packages(&config.first_build_pass.packages)
}
