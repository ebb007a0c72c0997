mod args;
mod build;
mod fetch;
mod params;
mod partition;
mod resolved_command;

pub use args::{Args, Command, DownloadArgs, parse_args};
pub use build::run_build;
pub use fetch::run_fetch;
pub use params::{BuildParams, ExecutionOptions, FetchParams, PartitionParams};
pub use partition::run_partition;
pub use resolved_command::{ResolvedCommand, resolve_command};
