use clap::Parser;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match dockhand::cli::Cli::parse().run() {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            const BOLD_RED: &str = "\x1b[1;31m";
            const BOLD: &str = "\x1b[1m";
            const RESET: &str = "\x1b[0m";
            eprintln!("{BOLD_RED}error{RESET}{BOLD}:{RESET} {error}");
            std::process::exit(1);
        }
    }
}
