use crate::build::{ManagerSettings, ToolchainLayout};
use crate::config::{Config, PackageSpec};
use crate::fetch::FetchOptions;

/// Process-wide switches, passed explicitly to every step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// Stream the output of external commands.
    pub verbose: bool,
    /// Suppress everything but errors.
    pub quiet: bool,
    /// Skip confirmation prompts.
    pub force: bool,
}

#[derive(Debug, Clone)]
pub struct BuildParams {
    pub app_config: Config,
    pub device: String,
    pub execution: ExecutionOptions,
    pub manager: ManagerSettings,
    pub fetch: FetchOptions,
}

#[derive(Debug, Clone)]
pub struct PartitionParams {
    pub app_config: Config,
    pub device: String,
    pub execution: ExecutionOptions,
}

#[derive(Debug, Clone)]
pub struct FetchParams {
    pub packages: Vec<PackageSpec>,
    pub layout: ToolchainLayout,
    pub execution: ExecutionOptions,
    pub manager: ManagerSettings,
    pub fetch: FetchOptions,
}
