use crate::tui::{self, SyncScreen};
use anyhow::{Context, Result};
use clap::Args;
use partdb_sync::{BoardDocument, Config, config};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Path to the `.kicad_pcb` file
    #[arg(value_name = "BOARD")]
    pub board: PathBuf,
}

pub fn execute(args: SyncArgs) -> Result<()> {
    let board = BoardDocument::open(&args.board)
        .with_context(|| format!("Failed to open board {}", args.board.display()))?;
    let config_path = config::config_path().context("Failed to locate configuration")?;
    let config = Config::load_from(&config_path);

    let mut screen = SyncScreen::new(board, &config, config_path);
    tui::run(&mut screen)
}
