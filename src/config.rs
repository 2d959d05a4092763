//! Compile-time defaults for the demo

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::RgbColor;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Framebuffer node used when no device is given on the command line.
pub const DEFAULT_DEVICE: &str = "/dev/fb0";

/// TrueType fallback for labels outside Latin and Cyrillic.
pub const DEFAULT_FONT: &str = "/usr/etc/fonts/050-DroidSansFallback.ttf";

/// Overrides [`DEFAULT_FONT`].
pub const FONT_ENV: &str = "RAWFB_DEMO_FONT";

/// Pixel height labels are rasterised at.
pub const LABEL_FONT_PX: f32 = 16.0;

/// Where to look for the label font.
pub fn font_path() -> PathBuf {
    env::var_os(FONT_ENV).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFAULT_FONT))
}

/// Bytes handed to the UI backend for its staging buffer.
///
/// Sized for large panels; a 4K 32bpp frame needs ~32 MiB.
pub const SCRATCH_CAPACITY: usize = 1024 * 32768;

/// Layout and pacing of a single animation frame.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Inset of the window from every surface edge, in pixels.
    pub margin: i32,
    pub row_height: u32,
    pub icon_slot: u32,
    pub label_slot: u32,
    pub progress_height: u32,
    pub progress_max: usize,
    /// Radians added to the icon angle every frame.
    pub angle_step: f32,
    /// Frames each label stays on screen.
    pub frames_per_label: u64,
    pub frame_interval: Duration,
    pub background: Rgb888,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            margin: 5,
            row_height: 30,
            icon_slot: 30,
            label_slot: 110,
            progress_height: 15,
            progress_max: 100,
            // 15 degrees
            angle_step: 0.263,
            frames_per_label: 100,
            frame_interval: Duration::from_millis(90),
            background: Rgb888::BLACK,
        }
    }
}
