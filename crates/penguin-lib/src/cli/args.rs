use crate::cli::params::ExecutionOptions;
use crate::download::DEFAULT_RPC_PORT;
use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber;

#[derive(Debug, Clone)]
pub enum Command {
    Build {
        config_path: String,
        download: DownloadArgs,
    },
    Partition {
        config_path: String,
    },
    Fetch {
        config_path: String,
        output_dir: String,
        download: DownloadArgs,
    },
}

pub struct Args {
    pub command: Command,
    pub log_level: Level,
    pub execution: ExecutionOptions,
}

/// Tuning of the download manager and of the polling loop.
#[derive(Debug, Clone, ClapArgs)]
pub struct DownloadArgs {
    #[arg(
        long = "rpc-port",
        value_name = "PORT",
        help = "Port the download manager listens on for RPC calls",
        default_value_t = DEFAULT_RPC_PORT
    )]
    pub rpc_port: u16,

    #[arg(
        long = "rpc-secret",
        value_name = "SECRET",
        help = "Secret token required by the download manager's RPC interface"
    )]
    pub rpc_secret: Option<String>,

    #[arg(
        long = "poll-interval-ms",
        value_name = "MS",
        help = "Delay between download status checks",
        default_value_t = 1000
    )]
    pub poll_interval_ms: u64,

    #[arg(
        long = "download-timeout",
        value_name = "SECONDS",
        help = "Maximum time a single package may take to download",
        default_value_t = 3600
    )]
    pub download_timeout_secs: u64,

    #[arg(
        long = "manager-startup-delay-ms",
        value_name = "MS",
        help = "Time given to the download manager to start listening",
        default_value_t = 2000
    )]
    pub manager_startup_delay_ms: u64,
}

impl Default for DownloadArgs {
    fn default() -> Self {
        Self {
            rpc_port: DEFAULT_RPC_PORT,
            rpc_secret: None,
            poll_interval_ms: 1000,
            download_timeout_secs: 3600,
            manager_startup_delay_ms: 2000,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "penguin",
    version,
    author = "Dmitrii Toksaitov",
    about = "Builds custom Linux systems from a JSON description"
)]
struct Cli {
    #[arg(
        short = 'v',
        long = "verbose",
        help = "Verbose output from all commands (repeat for more logging)",
        action = ArgAction::Count,
        global = true
    )]
    verbose: u8,

    #[arg(
        short = 'q',
        long = "quiet",
        help = "Only report errors",
        global = true
    )]
    quiet: bool,

    #[arg(
        short = 'f',
        long = "force",
        help = "Do not ask for confirmation before destructive disk operations",
        global = true
    )]
    force: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Partition the disk, prepare the build user and environment, and fetch the toolchain
    Build {
        #[arg(
            short = 'c',
            long = "config",
            value_name = "FILE",
            help = "A JSON file with the description of a system to build",
            default_value = "penguin.json"
        )]
        config: String,

        #[command(flatten)]
        download: DownloadArgs,
    },

    /// Only partition, format and mount the disk
    Partition {
        #[arg(
            short = 'c',
            long = "config",
            value_name = "FILE",
            help = "A JSON file with the description of a system to build",
            default_value = "penguin.json"
        )]
        config: String,
    },

    /// Only fetch and unpack the toolchain packages into a directory
    Fetch {
        #[arg(
            short = 'c',
            long = "config",
            value_name = "FILE",
            help = "A JSON file with the description of a system to build",
            default_value = "penguin.json"
        )]
        config: String,

        #[arg(
            short = 'o',
            long = "output-dir",
            value_name = "DIR",
            help = "Directory that stands in for the root mount point"
        )]
        output_dir: String,

        #[command(flatten)]
        download: DownloadArgs,
    },
}

pub fn parse_args() -> Args {
    let cli = Cli::parse();

    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::INFO,
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy()
                .add_directive("hyper_util=warn".parse().unwrap()),
        )
        .init();

    let command = match cli.command {
        CliCommand::Build { config, download } => Command::Build {
            config_path: config,
            download,
        },
        CliCommand::Partition { config } => Command::Partition {
            config_path: config,
        },
        CliCommand::Fetch {
            config,
            output_dir,
            download,
        } => Command::Fetch {
            config_path: config,
            output_dir,
            download,
        },
    };

    Args {
        command,
        log_level,
        execution: ExecutionOptions {
            verbose: cli.verbose > 0,
            quiet: cli.quiet,
            force: cli.force,
        },
    }
}
