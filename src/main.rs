// ticketdrop - a decorative drag-and-drop concert ticket view for Wayland
// Drop any file onto the window; after a fixed delay a ticket appears
// over a continuously animated backdrop

mod assets;
mod background;
mod cli;
mod render;
mod scene;
mod state;
mod text;
mod uri;
mod wayland;
mod wgpu_renderer;

use anyhow::Result;
use log::info;

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse command line arguments
    let config = cli::parse_args()?;

    info!(
        "Starting ticketdrop {}x{}, reveal delay {:.0?} (GPU: {})",
        config.width, config.height, config.delay, config.use_gpu
    );

    wayland::run(config)
}
