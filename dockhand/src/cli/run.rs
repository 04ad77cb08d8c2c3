use std::{
    io::{self, Write},
    path::PathBuf,
};

use clap::Args;
use itertools::Itertools;
use log::{info, warn};

use crate::{
    backend::{self, HookBackend, RebuildPolicy},
    engine::Engine,
    manifest,
    repo::RepoCheckout,
    Result,
};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Path to the hook repository checkout to run from.
    #[arg(long = "repo", value_name = "DIR")]
    pub repo: PathBuf,

    /// Identifier of the hook to run, as listed in the repository manifest.
    #[arg(long = "hook", value_name = "ID")]
    pub hook: String,

    #[arg(long = "rebuild", value_enum, default_value_t)]
    pub rebuild: RebuildPolicy,

    /// Host directory mounted into the container as its working directory.
    /// Defaults to the current directory.
    #[arg(long = "work-dir", value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Files the hook should check, relative to the work directory.
    #[arg(last = true, value_name = "FILE")]
    pub files: Vec<String>,
}

pub fn run(engine: &Engine, args: RunArgs) -> Result<i32> {
    let RunArgs {
        repo,
        hook,
        rebuild,
        work_dir,
        files,
    } = args;

    let checkout = RepoCheckout::open(repo)?;
    let hooks = manifest::load(&checkout)?;
    let Some(hook) = manifest::find(&hooks, &hook) else {
        return Err(format!(
            "no hook {hook:?} in {manifest} (available: {available})",
            manifest = manifest::MANIFEST_FILE,
            available = hooks.iter().map(|hook| hook.id.as_str()).join(", "),
        )
        .into());
    };

    let work_dir = match work_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    let language_backend = &backend::DockerBackend { engine } as &dyn HookBackend;
    let output = language_backend.run_hook(backend::RunArgs {
        checkout: &checkout,
        hook,
        files: &files,
        work_dir: &work_dir,
        rebuild,
    })?;

    io::stdout().write_all(&output.output)?;
    if output.code == 0 {
        info!("hook {id} passed", id = hook.id);
    } else {
        warn!(
            "hook {id} exited with code {code}",
            id = hook.id,
            code = output.code
        );
    }

    Ok(output.code)
}
