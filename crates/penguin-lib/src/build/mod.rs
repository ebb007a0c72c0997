mod toolchain;

pub use toolchain::{
    ManagerSettings, ToolchainLayout, fetch_with_manager, prepare_directories,
    run_toolchain_step,
};
