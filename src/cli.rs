// cli.rs - Command-line interface configuration
use clap::Parser;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use crate::config::DEFAULT_DEVICE;

/// `rawfb-demo [-h | DEVICE] [IGNORED...]`
///
/// Only the first argument means anything. Everything else, dashes included,
/// is taken as written, so an unknown option ends up as a device path.
#[derive(Parser, Debug, Clone)]
#[command(name = "rawfb-demo")]
#[command(about = "Animated UI demo on a raw framebuffer", long_about = None)]
#[command(disable_help_flag = true)]
pub struct Cli {
    /// Framebuffer device node, or -h to print usage
    #[arg(value_name = "DEVICE", allow_hyphen_values = true)]
    target: Option<OsString>,

    #[arg(hide = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub ignored: Vec<OsString>,
}

impl Cli {
    /// True when the first argument is exactly `-h`.
    pub fn wants_usage(&self) -> bool {
        self.target.as_deref() == Some(OsStr::new("-h"))
    }

    pub fn device(&self) -> PathBuf {
        self.target
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DEVICE))
    }
}

/// The one-line usage text printed for `-h`.
pub fn usage(exe: &str) -> String {
    format!("Usage:\n\t{exe} <device>\n")
}
