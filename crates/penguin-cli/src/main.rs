use penguin_lib::cli::{
    ResolvedCommand, parse_args, resolve_command, run_build, run_fetch, run_partition,
};
use penguin_lib::error::PenguinError;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), PenguinError> {
    color_eyre::install()?;

    let args = parse_args();
    let command = resolve_command(args.command, args.execution)?;

    match command {
        ResolvedCommand::Build(params) => run_build(params).await?,
        ResolvedCommand::Partition(params) => run_partition(params).await?,
        ResolvedCommand::Fetch(params) => run_fetch(params).await?,
    }

    Ok(())
}
