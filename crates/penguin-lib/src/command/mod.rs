mod runner;
mod types;

pub use runner::{CommandError, CommandRunner, SystemCommandRunner, require_tool};
pub use types::{CommandOutput, ShellCommand};
