use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::{Env, Target};
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;

mod demo;
mod projects;
mod sync;
mod tui;

#[derive(Parser)]
#[command(name = "partdb")]
#[command(about = "Synchronize KiCad footprints with a PartDB inventory", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Group a board's footprints and fill in storage locations from PartDB
    #[command(alias = "s")]
    Sync(sync::SyncArgs),

    /// Grouping demo over built-in dummy footprints
    Demo(demo::DemoArgs),

    /// Pick a PartDB project
    #[command(alias = "p")]
    Projects(projects::ProjectsArgs),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "Error:".red());
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match cli.command {
        Commands::Sync(args) => sync::execute(args),
        Commands::Demo(args) => demo::execute(args),
        Commands::Projects(args) => projects::execute(args),
    }
}

/// Default level depends on --debug (overridden by RUST_LOG). Output goes to
/// `plugin.log` next to the configuration so it stays out of the TUI; if that
/// file cannot be opened, log records are discarded.
fn init_logging(debug: bool) {
    let env = if debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("error")
    };
    env_logger::Builder::from_env(env)
        .target(log_target(partdb_sync::config::log_path().ok()))
        .init();
}

fn log_target(path: Option<PathBuf>) -> Target {
    let log_file = path.and_then(|path| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });
    match log_file {
        Some(file) => Target::Pipe(Box::new(file)),
        None => Target::Pipe(Box::new(io::sink())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unopenable_log_file_is_discarded_not_printed() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing").join("plugin.log");
        assert!(matches!(log_target(Some(missing)), Target::Pipe(_)));
        assert!(matches!(log_target(None), Target::Pipe(_)));
    }

    #[test]
    fn log_file_is_created_on_demand() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plugin.log");
        assert!(matches!(log_target(Some(path.clone())), Target::Pipe(_)));
        assert!(path.exists());
    }
}
