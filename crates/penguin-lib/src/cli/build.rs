use crate::build::{ToolchainLayout, prepare_directories, run_toolchain_step};
use crate::cli::BuildParams;
use crate::command::SystemCommandRunner;
use crate::error::PenguinError;
use crate::system::{
    PASSWD_PATH, build_environment, confirm_destructive_operation, drop_privileges, ensure_root,
    get_or_create_user, hand_over, partition_disk, prepare_environment,
};
use std::path::Path;

pub async fn run_build(params: BuildParams) -> Result<(), PenguinError> {
    let BuildParams {
        app_config,
        device,
        execution,
        manager,
        fetch,
    } = params;

    ensure_root()?;
    {
        let mut input = std::io::stdin().lock();
        confirm_destructive_operation(&device, execution.force, &mut input, &mut std::io::stderr())?;
    }

    let mount_point = app_config.root_mount_point();
    let runner = SystemCommandRunner {
        verbose: execution.verbose,
        quiet: execution.quiet,
        envs: build_environment(&mount_point),
    };

    partition_disk(&runner, &device, &app_config.partitions, &mount_point).await?;

    let layout = ToolchainLayout {
        installation_dir: app_config.installation_directory(),
        packages_dir: app_config.packages_directory(),
    };
    prepare_directories(&layout).await?;

    let build_user = match &app_config.build_user {
        Some(user) => Some(get_or_create_user(&runner, Path::new(PASSWD_PATH), user).await?),
        None => None,
    };
    if let Some(ids) = build_user {
        hand_over(
            &[layout.installation_dir.as_path(), layout.packages_dir.as_path()],
            ids,
        )?;
    }

    prepare_environment(&mount_point)?;
    if let Some(ids) = build_user {
        drop_privileges(ids)?;
    }

    run_toolchain_step(
        &runner,
        &layout,
        &app_config.first_build_pass.packages,
        &manager,
        &fetch,
    )
    .await?;

    tracing::info!("First build pass completed successfully");
    Ok(())
}
