use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "podcast-state",
    version,
    about = "Inspect and edit persisted podcast favourites, listening progress and theme"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Summary of the stored state
    Status,
    /// List favourite episodes
    Favourites {
        /// Group episodes by show
        #[arg(long)]
        group: bool,
    },
    /// Favourite an episode from a catalog file
    Favourite {
        #[arg(long)]
        catalog: PathBuf,
        #[arg(long)]
        show: String,
        /// 1-based season number
        #[arg(long)]
        season: usize,
        /// 1-based episode number
        #[arg(long)]
        episode: usize,
    },
    /// Remove a favourite by episode id
    Unfavourite { episode_id: String },
    /// List saved listening progress
    Progress,
    /// Wipe all saved listening progress
    ClearProgress,
    /// Show the colour theme, optionally switching it
    Theme {
        #[arg(long)]
        toggle: bool,
    },
}
