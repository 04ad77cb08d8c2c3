use std::path::PathBuf;

use clap::Args;
use constcat::concat;
use log::{debug, info};

use crate::{
    backend::{self, HookBackend},
    engine::Engine,
    repo::RepoCheckout,
    Result,
};

#[derive(Debug, Args)]
pub struct InstallArgs {
    /// Path to the hook repository checkout to install.
    #[arg(long = "repo", value_name = "DIR")]
    pub repo: PathBuf,

    #[arg(long = "language-version", default_value = backend::DEFAULT_VERSION, help = concat!("Version requested by the hook configuration. Container environments only support \"", backend::DEFAULT_VERSION, "\"."))]
    pub language_version: String,
}

pub fn install(engine: &Engine, args: InstallArgs) -> Result<()> {
    let InstallArgs {
        repo,
        language_version,
    } = args;

    let checkout = RepoCheckout::open(repo)?;
    let language_backend = &backend::DockerBackend { engine } as &dyn HookBackend;
    let output = language_backend.install_environment(backend::InstallArgs {
        checkout: &checkout,
        language_version: &language_version,
    })?;

    debug!("image id: {id}", id = output.image_id);
    info!(
        "installed environment at {path}",
        path = output.environment_dir.display()
    );

    Ok(())
}
