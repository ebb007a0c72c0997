use crate::build::run_toolchain_step;
use crate::cli::FetchParams;
use crate::command::SystemCommandRunner;
use crate::error::PenguinError;

pub async fn run_fetch(params: FetchParams) -> Result<(), PenguinError> {
    let FetchParams {
        packages,
        layout,
        execution,
        manager,
        fetch,
    } = params;

    let runner = SystemCommandRunner::new(execution.verbose, execution.quiet);
    run_toolchain_step(&runner, &layout, &packages, &manager, &fetch).await?;

    tracing::info!(
        "Packages fetched successfully into {}",
        layout.packages_dir.display()
    );
    Ok(())
}
