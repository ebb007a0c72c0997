use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One entry of a package list: an archive to fetch and unpack, and the
/// packages that must be unpacked inside it afterwards.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PackageSpec {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        rename = "directory name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub directory_name: Option<String>,
    #[serde(
        rename = "required packages",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub required_packages: Vec<PackageSpec>,
}

impl PackageSpec {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            name: None,
            directory_name: None,
            required_packages: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn into_directory(mut self, directory_name: impl Into<String>) -> Self {
        self.directory_name = Some(directory_name.into());
        self
    }

    pub fn requiring(mut self, required_packages: Vec<PackageSpec>) -> Self {
        self.required_packages = required_packages;
        self
    }

    /// Label used in status messages and errors; falls back to the source.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.source)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum PartitionType {
    #[serde(rename = "ESP")]
    Esp,
    #[serde(rename = "BIOS Boot")]
    BiosBoot,
    Swap,
    Root,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PartitionConfig {
    #[serde(rename = "type")]
    pub partition_type: PartitionType,
    /// Size in MiB; absent means the rest of the disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(
        rename = "file system",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub file_system: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    pub path: String,
}

fn default_installation_directory() -> PathBuf {
    PathBuf::from("tools")
}

fn default_packages_directory() -> PathBuf {
    PathBuf::from("sources")
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FirstBuildPass {
    /// Relative to the root mount point.
    #[serde(
        rename = "installation directory",
        default = "default_installation_directory"
    )]
    pub installation_directory: PathBuf,
    /// Relative to the root mount point.
    #[serde(
        rename = "packages directory",
        default = "default_packages_directory"
    )]
    pub packages_directory: PathBuf,
    pub packages: Vec<PackageSpec>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(rename = "short name")]
    pub short_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partitions: Vec<PartitionConfig>,
    #[serde(rename = "build user", default, skip_serializing_if = "Option::is_none")]
    pub build_user: Option<String>,
    #[serde(rename = "first build pass")]
    pub first_build_pass: FirstBuildPass,
}

impl Config {
    pub fn root_mount_point(&self) -> PathBuf {
        PathBuf::from("/mnt").join(&self.short_name)
    }

    pub fn installation_directory(&self) -> PathBuf {
        self.root_mount_point()
            .join(&self.first_build_pass.installation_directory)
    }

    pub fn packages_directory(&self) -> PathBuf {
        self.root_mount_point()
            .join(&self.first_build_pass.packages_directory)
    }
}
