use crate::tui::{self, ProjectsScreen};
use anyhow::{Context, Result};
use clap::Args;
use partdb_api::PartDb;
use partdb_sync::{Config, ProjectPicker};

#[derive(Args, Debug)]
pub struct ProjectsArgs {
    /// PartDB API URL; defaults to the saved configuration
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// PartDB API token; defaults to the saved configuration
    #[arg(long, value_name = "TOKEN")]
    pub token: Option<String>,
}

pub fn execute(args: ProjectsArgs) -> Result<()> {
    let saved = Config::load();
    let config = Config::new(
        args.url.as_deref().unwrap_or(&saved.api_url),
        args.token.as_deref().unwrap_or(&saved.token),
    );
    let partdb = PartDb::new(&config.api_url, &config.token)
        .context("Failed to create PartDB client")?;

    let projects = partdb.list_projects();
    log::info!("Fetched {} projects", projects.len());
    let mut screen = ProjectsScreen::new(ProjectPicker::from_projects(&projects));
    tui::run(&mut screen)
}
