mod burrow;
mod reference;
mod simulate;

use clap::{Parser, Subcommand};

use crate::cli::{burrow::BurrowArgs, simulate::SimulateArgs};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: forecast the scenarios and compare their annual balances.
    #[clap(name = "simulate")]
    Simulate(Box<SimulateArgs>),

    /// Development tools.
    #[clap(name = "burrow")]
    Burrow(Box<BurrowArgs>),
}
