mod loader;
mod model;
mod validation;

pub use loader::load_config;
pub use model::{
    Config, DeviceConfig, FirstBuildPass, PackageSpec, PartitionConfig, PartitionType,
};
pub use validation::validate_config;
