pub(crate) mod backend;
pub(crate) mod cleanup;
pub(crate) mod engine;
pub(crate) mod manifest;
pub(crate) mod process;
pub(crate) mod repo;
pub(crate) mod temp_path;
pub(crate) mod version;

pub mod cli;

pub(crate) type Result<T, E = Box<dyn std::error::Error + Send + Sync + 'static>> =
    std::result::Result<T, E>;
