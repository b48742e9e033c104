mod app;
mod asset;
mod cli;
mod config;
mod convert;
mod effects;
mod grid;
mod logging;
mod palette;
mod term;

use anyhow::Result;

fn main() -> Result<()> {
    app::run()
}
