use crate::tui::{self, DemoScreen};
use anyhow::Result;
use clap::Args;

#[derive(Args, Debug)]
pub struct DemoArgs {}

pub fn execute(_args: DemoArgs) -> Result<()> {
    tui::run(&mut DemoScreen::new())
}
