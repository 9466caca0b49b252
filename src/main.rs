mod app;
mod cli;
mod config;
mod http;
mod logger;
mod paths;

#[cfg(test)]
mod testing;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    app::run(cli)
}
