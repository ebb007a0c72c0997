use crate::build::{ManagerSettings, ToolchainLayout};
use crate::cli::args::{Command, DownloadArgs};
use crate::cli::params::{BuildParams, ExecutionOptions, FetchParams, PartitionParams};
use crate::config::{Config, load_config};
use crate::error::PenguinError;
use crate::fetch::FetchOptions;
use crate::system::resolve_file_system;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum ResolvedCommand {
    Build(BuildParams),
    Partition(PartitionParams),
    Fetch(FetchParams),
}

fn resolve_download_args(
    download: DownloadArgs,
) -> Result<(ManagerSettings, FetchOptions), PenguinError> {
    for (name, value) in [
        ("rpc-port", u64::from(download.rpc_port)),
        ("poll-interval-ms", download.poll_interval_ms),
        ("download-timeout", download.download_timeout_secs),
    ] {
        if value == 0 {
            return Err(PenguinError::CliArgumentValidation {
                details: format!("{name} must be greater than 0."),
            });
        }
    }

    Ok((
        ManagerSettings {
            rpc_port: download.rpc_port,
            rpc_secret: download.rpc_secret,
            startup_delay: Duration::from_millis(download.manager_startup_delay_ms),
        },
        FetchOptions {
            poll_interval: Duration::from_millis(download.poll_interval_ms),
            timeout: Some(Duration::from_secs(download.download_timeout_secs)),
        },
    ))
}

/// Device and partition layout a disk-touching command needs.
fn resolve_disk(app_config: &Config) -> Result<String, PenguinError> {
    let device = app_config
        .device
        .as_ref()
        .map(|device| device.path.clone())
        .ok_or_else(|| PenguinError::ConfigValidation {
            details: "No device provided. Configure device.path.".to_string(),
        })?;

    if app_config.partitions.is_empty() {
        return Err(PenguinError::ConfigValidation {
            details: "No partitions defined in config".to_string(),
        });
    }

    for partition in &app_config.partitions {
        resolve_file_system(partition).map_err(|e| PenguinError::ConfigValidation {
            details: e.to_string(),
        })?;
    }

    Ok(device)
}

pub fn resolve_command(
    command: Command,
    execution: ExecutionOptions,
) -> Result<ResolvedCommand, PenguinError> {
    match command {
        Command::Build {
            config_path,
            download,
        } => {
            let (manager, fetch) = resolve_download_args(download)?;
            let app_config = load_config(&config_path)?;
            let device = resolve_disk(&app_config)?;

            Ok(ResolvedCommand::Build(BuildParams {
                app_config,
                device,
                execution,
                manager,
                fetch,
            }))
        }
        Command::Partition { config_path } => {
            let app_config = load_config(&config_path)?;
            let device = resolve_disk(&app_config)?;

            Ok(ResolvedCommand::Partition(PartitionParams {
                app_config,
                device,
                execution,
            }))
        }
        Command::Fetch {
            config_path,
            output_dir,
            download,
        } => {
            let (manager, fetch) = resolve_download_args(download)?;
            let app_config = load_config(&config_path)?;

            if output_dir.is_empty() {
                return Err(PenguinError::CliArgumentValidation {
                    details: "No output directory provided. Pass --output-dir.".to_string(),
                });
            }
            // aria2c daemonizes into `/`, so relative download paths would not resolve.
            let output_dir = std::path::absolute(PathBuf::from(&output_dir)).map_err(|e| {
                PenguinError::CliArgumentValidation {
                    details: format!("Cannot resolve output directory {output_dir:?}: {e}"),
                }
            })?;
            let first_build_pass = app_config.first_build_pass;

            Ok(ResolvedCommand::Fetch(FetchParams {
                layout: ToolchainLayout {
                    installation_dir: output_dir.join(&first_build_pass.installation_directory),
                    packages_dir: output_dir.join(&first_build_pass.packages_directory),
                },
                packages: first_build_pass.packages,
                execution,
                manager,
                fetch,
            }))
        }
    }
}
