//! modelpack CLI: assemble deployable model packs.
//!
//! Combines a concept database, the default configuration overlay and a
//! vocabulary into a single distributable bundle.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
