//! rawfb-demo
//!
//! Renders a small animated immediate-mode UI straight onto a Linux
//! framebuffer, without any windowing system. Stops cleanly on Ctrl-C.

mod app;
mod assets;
mod cli;
mod config;
mod error;
mod platform;
mod rotate;
mod session;
#[cfg(test)]
mod testing;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use std::process;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use app::{FrameDriver, ThreadPacer};
use cli::Cli;
use config::{FrameConfig, LABEL_FONT_PX, SCRATCH_CAPACITY};
use error::StartupError;
use platform::fbdev::FbDevice;
use session::Session;
use ui::rawfb::RawFbUi;

/// Main entry point
fn main() {
    let cli = Cli::parse();
    if cli.wants_usage() {
        let exe = std::env::args().next().unwrap_or_else(|| "rawfb-demo".to_string());
        eprint!("{}", cli::usage(&exe));
        process::exit(0);
    }

    // The screen belongs to the framebuffer, so logs go to stderr.
    tracing_subscriber::fmt::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .init();

    info!("rawfb-demo starting...");
    if !cli.ignored.is_empty() {
        debug!("Ignoring extra arguments: {:?}", cli.ignored);
    }

    match run(&cli) {
        Ok(()) => {
            info!("rawfb-demo exiting cleanly");
            process::exit(0);
        }
        Err(e) => {
            error!("Fatal error: {:#}", e);
            eprintln!("\nFATAL ERROR: {:#}", e);
            process::exit(error::exit_code_for(&e));
        }
    }
}

/// Main application logic
fn run(cli: &Cli) -> Result<()> {
    let icon = assets::load_icon().map_err(StartupError::Asset)?;
    let font = assets::load_label_font(&config::font_path(), LABEL_FONT_PX);

    let mut session: Session<FbDevice, RawFbUi<_>> =
        Session::acquire(FbDevice::new(), &cli.device(), Vec::with_capacity(SCRATCH_CAPACITY))
            .context("Failed to acquire display")?;

    let stop = platform::signal::install_stop_handler().context("Failed to install SIGINT handler")?;

    let mut driver = FrameDriver::new(icon, &assets::LABELS, FrameConfig::default());
    let ui = session.ui_mut().context("Display released before the render loop")?;
    if let Some(font) = font {
        ui.set_label_font(font);
    }
    let frames = driver.run(ui, stop, &mut ThreadPacer);
    info!("Render loop {} after {} frames", driver.state(), frames);

    info!("Cleaning up...");
    session.release();

    Ok(())
}
