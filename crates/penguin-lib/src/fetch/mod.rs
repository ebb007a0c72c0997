mod archive;
mod fetcher;

pub use archive::{derive_directory_name, extraction_command};
pub use fetcher::{FetchError, FetchMode, FetchOptions, fetch_packages};
