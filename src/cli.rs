use clap::Parser;
use std::path::PathBuf;

/// viewbind - render a state-described component tree headlessly
#[derive(Parser, Debug)]
#[command(name = "viewbind")]
#[command(about = "Load views from an application state, bind and render them")]
#[command(version)]
pub struct Cli {
    /// Application state JSON file
    #[arg(long)]
    pub state: PathBuf,

    /// Engine configuration TOML file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Render only this view and its descendants
    #[arg(long)]
    pub root: Option<String>,

    /// Rebuild vnodes from templates
    #[arg(long)]
    pub force: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}
