use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rand::Rng as _;
use wallyfit_engine::{GameConfig, GameSeed};

use self::{play::PlayArg, simulate::SimulateArg};
use crate::{logging, util};

mod play;
mod simulate;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Play the annotation game in the terminal
    Play(#[clap(flatten)] PlayArg),
    /// Run a scripted player without a terminal UI and report each level
    Simulate(#[clap(flatten)] SimulateArg),
}

/// Options shared by every mode.
#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct GameArg {
    /// Seed for the image sets (32 hex digits); random when omitted
    #[clap(long)]
    seed: Option<GameSeed>,
    /// Path to a JSON file overriding the game rules
    #[clap(long)]
    config: Option<PathBuf>,
}

impl GameArg {
    pub(crate) fn seed(&self) -> GameSeed {
        self.seed.unwrap_or_else(|| rand::rng().random())
    }

    pub(crate) fn load_config(&self) -> anyhow::Result<GameConfig> {
        util::read_config_file(self.config.as_ref())
    }
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode.unwrap_or(Mode::Play(PlayArg::default())) {
        Mode::Play(arg) => {
            logging::init_file(arg.log_file())?;
            play::run(&arg)?;
        }
        Mode::Simulate(arg) => {
            logging::init_stderr()?;
            simulate::run(&arg)?;
        }
    }
    Ok(())
}
