//! Tessera command line renderer.
//!
//! Loads an OBJ model, renders it with the rasterizer or one of the ray
//! tracing modes, and writes a PNG.

mod render;
mod settings;

use anyhow::Result;
use clap::Parser;

use settings::Settings;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::parse();
    log::debug!("{:?}", settings);

    render::run(&settings)
}
