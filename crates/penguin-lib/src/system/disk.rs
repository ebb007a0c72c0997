use super::SystemError;
use crate::command::{CommandRunner, ShellCommand};
use crate::config::{PartitionConfig, PartitionType};
use std::io::{BufRead, Write};
use std::path::Path;

/// Space left free after every partition except the ESP, for system
/// software that manipulates the partition map.
const PARTITION_GAP_MIB: u64 = 128;

/// End of a partition that spans the rest of the disk, leaving room for the
/// secondary GPT header and table.
const END_OF_DISK: &str = "-34s";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileSystemKind {
    Fat32,
    LinuxSwap,
    Ext4,
    Btrfs,
}

impl FileSystemKind {
    /// File system type as `parted mkpart` names it.
    pub fn parted_name(self) -> &'static str {
        match self {
            Self::Fat32 => "fat32",
            Self::LinuxSwap => "linux-swap",
            Self::Ext4 => "ext4",
            Self::Btrfs => "btrfs",
        }
    }

    /// Type passed to `mount --types`, for file systems that can be mounted.
    pub fn mount_type(self) -> Option<&'static str> {
        match self {
            Self::Ext4 => Some("ext4"),
            Self::Btrfs => Some("btrfs"),
            Self::Fat32 => Some("vfat"),
            Self::LinuxSwap => None,
        }
    }

    fn format_commands(self, partition_device: &str) -> [ShellCommand; 2] {
        let (program, args, check, explanation): (&str, &[&str], &str, String) = match self {
            Self::Fat32 => (
                "mkfs.vfat",
                &["-F", "32"],
                "Checking if \"mkdosfs\" is installed.",
                format!("Creating VFAT file system on device \"{partition_device}\"."),
            ),
            Self::LinuxSwap => (
                "mkswap",
                &[],
                "Checking if \"util-linux\" package is installed and mkswap is present.",
                format!("Setting up the Linux swap partition on device \"{partition_device}\"."),
            ),
            Self::Ext4 => (
                "mkfs.ext4",
                &[],
                "Checking if \"e2fsprogs\" package is installed and \"mkfs.ext4\" is present.",
                format!("Creating Ext4 file system on device \"{partition_device}\"."),
            ),
            Self::Btrfs => (
                "mkfs.btrfs",
                &[],
                "Checking if \"btrfs-tools\" package is installed and \"mkfs.btrfs\" is present.",
                format!("Creating BTRFS file system on device \"{partition_device}\"."),
            ),
        };

        [
            ShellCommand::tool_check(program, check),
            ShellCommand::new(program)
                .args(args.iter().copied())
                .arg(partition_device)
                .explain(explanation),
        ]
    }
}

impl PartitionType {
    /// GPT partition name.
    pub fn label(self) -> &'static str {
        match self {
            Self::Esp => "EFI System partition",
            Self::BiosBoot => "BIOS Boot partition",
            Self::Swap => "Swap partition",
            Self::Root => "Linux filesystem data",
        }
    }

    pub fn flag(self) -> Option<&'static str> {
        match self {
            Self::Esp => Some("boot"),
            Self::BiosBoot => Some("bios_grub"),
            Self::Swap | Self::Root => None,
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            Self::Esp => "ESP",
            Self::BiosBoot => "BIOS Boot",
            Self::Swap => "Swap",
            Self::Root => "Root",
        }
    }
}

/// File system a partition is created with. Only the Root partition lets the
/// configuration choose.
pub fn resolve_file_system(partition: &PartitionConfig) -> Result<FileSystemKind, SystemError> {
    match partition.partition_type {
        PartitionType::Esp | PartitionType::BiosBoot => Ok(FileSystemKind::Fat32),
        PartitionType::Swap => Ok(FileSystemKind::LinuxSwap),
        PartitionType::Root => match partition.file_system.as_deref() {
            None => Err(SystemError::MissingFileSystem),
            Some(file_system) => match file_system.to_lowercase().as_str() {
                "ext4" => Ok(FileSystemKind::Ext4),
                "btrfs" => Ok(FileSystemKind::Btrfs),
                _ => Err(SystemError::UnsupportedFileSystem {
                    file_system: file_system.to_string(),
                }),
            },
        },
    }
}

/// Device node of partition `number` on `device`.
pub fn partition_device(device: &str, number: usize) -> String {
    if device.ends_with(|c: char| c.is_ascii_digit()) {
        format!("{device}p{number}")
    } else {
        format!("{device}{number}")
    }
}

/// Commands that lay out `partitions` on a fresh GPT label on `device`,
/// format them and mount the Root partition at `mount_point`.
pub fn plan_partitioning(
    device: &str,
    partitions: &[PartitionConfig],
    mount_point: &Path,
) -> Result<Vec<ShellCommand>, SystemError> {
    let mut plan = vec![
        ShellCommand::tool_check("parted", "Checking if GNU parted is installed."),
        ShellCommand::new("parted")
            .args(["--script", device, "mklabel", "gpt"])
            .explain(format!(
                "Creating the GPT partition scheme on \"{device}\"."
            )),
    ];

    let mut position: u64 = 0;
    for (index, partition) in partitions.iter().enumerate() {
        let number = index + 1;
        let partition_type = partition.partition_type;
        let file_system = resolve_file_system(partition)?;

        let start = format!("{position}MiB");
        let end = match partition.size {
            Some(size) => format!("{}MiB", position + size),
            None => END_OF_DISK.to_string(),
        };

        let mkpart = format!(
            "mkpart \"{}\" {} {} {}",
            partition_type.label(),
            file_system.parted_name(),
            start,
            end
        );
        plan.push(
            ShellCommand::new("parted")
                .args(["--script", "--align", "optimal", device, mkpart.as_str()])
                .explain(format!(
                    "Creating partition #{number} of type \"{}\" with name \"{}\".",
                    partition_type.display_name(),
                    partition_type.label()
                )),
        );

        if let Some(size) = partition.size {
            position += size;
        }

        if let Some(flag) = partition_type.flag() {
            plan.push(
                ShellCommand::new("parted")
                    .args(["--script", device, "set"])
                    .arg(number.to_string())
                    .args([flag, "on"])
                    .explain(format!("Setting flag \"{flag}\" on partition #{number}.")),
            );
        }

        let device_node = partition_device(device, number);
        plan.extend(file_system.format_commands(&device_node));

        if partition_type == PartitionType::Root
            && let Some(mount_type) = file_system.mount_type()
        {
            plan.push(
                ShellCommand::new("mkdir")
                    .args(["--parents", "--verbose"])
                    .path_arg(mount_point)
                    .explain(format!(
                        "Creating a directory for the root file system mount point at \"{}\".",
                        mount_point.display()
                    )),
            );
            plan.push(
                ShellCommand::new("mount")
                    .args(["--types", mount_type, device_node.as_str()])
                    .path_arg(mount_point)
                    .explain(format!(
                        "Mounting the root file system at \"{}\".",
                        mount_point.display()
                    )),
            );
        }

        if partition_type != PartitionType::Esp {
            position += PARTITION_GAP_MIB;
        }
    }

    Ok(plan)
}

/// Repartitions `device`, formats every partition and mounts the Root one.
pub async fn partition_disk<R: CommandRunner>(
    runner: &R,
    device: &str,
    partitions: &[PartitionConfig],
    mount_point: &Path,
) -> Result<(), SystemError> {
    let plan = plan_partitioning(device, partitions, mount_point)?;

    tracing::info!("Trying to partition the disk \"{}\".", device);
    for command in &plan {
        runner.execute(command).await?;
    }
    Ok(())
}

/// Asks the operator to confirm repartitioning `device` by typing `Continue`.
/// Skipped entirely when `force` is set.
pub fn confirm_destructive_operation<I, O>(
    device: &str,
    force: bool,
    input: &mut I,
    output: &mut O,
) -> Result<(), SystemError>
where
    I: BufRead,
    O: Write,
{
    if force {
        return Ok(());
    }

    write!(
        output,
        "This script will try to repartition the disk \"{device}\".\n\
         Confirm that this is what you want by typing \"Continue\" and pressing Enter: "
    )
    .and_then(|()| output.flush())
    .map_err(SystemError::Prompt)?;

    let mut confirmation = String::new();
    input
        .read_line(&mut confirmation)
        .map_err(SystemError::Prompt)?;

    if confirmation.trim() != "Continue" {
        return Err(SystemError::NotConfirmed {
            device: device.to_string(),
        });
    }
    Ok(())
}
