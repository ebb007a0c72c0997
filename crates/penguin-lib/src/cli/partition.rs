use crate::cli::PartitionParams;
use crate::command::SystemCommandRunner;
use crate::error::PenguinError;
use crate::system::{confirm_destructive_operation, ensure_root, partition_disk};

pub async fn run_partition(params: PartitionParams) -> Result<(), PenguinError> {
    let PartitionParams {
        app_config,
        device,
        execution,
    } = params;

    ensure_root()?;
    {
        let mut input = std::io::stdin().lock();
        confirm_destructive_operation(&device, execution.force, &mut input, &mut std::io::stderr())?;
    }

    let runner = SystemCommandRunner::new(execution.verbose, execution.quiet);
    let mount_point = app_config.root_mount_point();
    partition_disk(&runner, &device, &app_config.partitions, &mount_point).await?;

    tracing::info!(
        "Disk \"{}\" partitioned, root file system mounted at \"{}\"",
        device,
        mount_point.display()
    );
    Ok(())
}
