//! Command line definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stemdeck")]
#[command(about = "Play separated stems with per-stem volume, speed and pitch")]
pub struct Cli {
    /// Config file (defaults to ~/.config/stemdeck/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a song's stems and open the interactive player
    Play {
        /// Path to the song; its stems are looked up by file stem
        song: PathBuf,

        /// Initial speed in percent (50-200)
        #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u32).range(50..=200))]
        speed: u32,

        /// Initial pitch shift in semitones (-12..12)
        #[arg(long, default_value_t = 0, allow_hyphen_values = true, value_parser = clap::value_parser!(i32).range(-12..=12))]
        pitch: i32,

        /// Output device name, overrides the config
        #[arg(long)]
        device: Option<String>,

        /// Start playing right after loading
        #[arg(long, short)]
        autoplay: bool,
    },
    /// Two decks with a crossfader, one output stream per deck
    Dual {
        /// Song on deck A
        deck_a: PathBuf,

        /// Song on deck B
        deck_b: PathBuf,

        /// Output device name for both decks, overrides the config
        #[arg(long)]
        device: Option<String>,

        /// Start both decks right after loading
        #[arg(long, short)]
        autoplay: bool,
    },
    /// List output devices
    Devices,
}
