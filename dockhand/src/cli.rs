mod clean;
mod install;
mod list;
mod run;

use clap::{Parser, Subcommand};

use crate::{engine::Engine, Result};

#[derive(Debug, Parser)]
#[command(version = crate::version::VERSION, about)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Container engine executable to drive. Any engine with a Docker
    /// compatible command line works, for example podman.
    #[arg(long = "engine", global = true, default_value = "docker")]
    engine: String,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build a hook repository's container image and mark its environment installed
    #[command(arg_required_else_help = true)]
    Install(install::InstallArgs),

    /// Run a hook from a repository's manifest against a batch of files
    #[command(arg_required_else_help = true)]
    Run(run::RunArgs),

    /// List the hook images built by this tool
    List,
    /// Remove the hook images built by this tool
    Clean,
}

impl Cli {
    /// Returns the process exit code. Hook failures are reported through the
    /// code, not as errors.
    pub fn run(self) -> Result<i32> {
        let Cli {
            command,
            engine: program,
        } = self;
        let engine = Engine::new(&program);

        match command {
            Commands::Install(args) => {
                install::install(&engine, args)?;
                Ok(0)
            }
            Commands::Run(args) => run::run(&engine, args),
            Commands::List => {
                list::list(&engine)?;
                Ok(0)
            }
            Commands::Clean => {
                clean::clean(&engine)?;
                Ok(0)
            }
        }
    }
}
