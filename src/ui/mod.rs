//! Immediate-mode UI rendering module
//!
//! The frame driver re-declares the whole widget tree every frame through
//! [`UiBackend`]; the backend turns those calls into pixels on its surface.

pub mod font;
pub mod rawfb;
pub mod surface;

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::Size;
use embedded_graphics::primitives::Rectangle;
use std::ops::BitOr;
use thiserror::Error;

use crate::rotate::Bitmap;
use surface::Surface;

/// Window behaviour flags.
///
/// `RawFbUi` never draws scrollbars or reads input, so `NO_SCROLLBAR` and
/// `NO_INPUT` only describe the window to backends that do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowFlags(u8);

impl WindowFlags {
    pub const BORDER: Self = Self(1);
    pub const NO_SCROLLBAR: Self = Self(1 << 1);
    /// Widgets never react to input.
    pub const NO_INPUT: Self = Self(1 << 2);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for WindowFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    #[allow(dead_code)]
    Left,
    Centered,
    #[allow(dead_code)]
    Right,
}

/// A failed [`UiBackend::init`]. The surface comes back so its memory can be
/// released.
#[derive(Debug)]
pub struct InitFailure<M> {
    pub error: UiInitError,
    pub surface: Surface<M>,
}

#[derive(Debug, Error)]
pub enum UiInitError {
    #[error("scratch buffer holds {capacity} bytes, a frame needs {needed}")]
    ScratchTooSmall { needed: usize, capacity: usize },

    #[error("staging buffer: {0}")]
    Staging(#[from] surface::SurfaceError),
}

/// Capability object for an immediate-mode UI bound to one surface.
///
/// Calls between `begin` and `end` describe the window content for the
/// current frame only; `render` resolves them onto the surface.
pub trait UiBackend: Sized {
    /// Memory type of the surface this backend draws on.
    type Memory: AsRef<[u8]> + AsMut<[u8]>;

    /// Bind a new context to `surface`. `scratch` is the only large
    /// allocation the backend may use for rasterisation.
    fn init(surface: Surface<Self::Memory>, scratch: Vec<u8>) -> Result<Self, InitFailure<Self::Memory>>;

    /// Size of the bound surface in pixels.
    fn size(&self) -> Size;

    /// Open a window. Returns false when nothing inside it would be visible.
    fn begin(&mut self, title: &str, bounds: Rectangle, flags: WindowFlags) -> bool;

    fn end(&mut self);

    /// Start a row of `columns` cells whose widths are pushed one by one.
    fn row_begin_static(&mut self, height: u32, columns: usize);

    /// Width of the next cell in a static row.
    fn row_push(&mut self, width: u32);

    fn row_end(&mut self);

    /// A row of `columns` cells sharing the window width equally.
    fn row_dynamic(&mut self, height: u32, columns: usize);

    fn image(&mut self, bitmap: &Bitmap);

    fn label(&mut self, text: &str, align: TextAlign);

    /// Progress bar. With `modifiable` false the value is display-only.
    fn progress(&mut self, value: usize, max: usize, modifiable: bool);

    /// Clear to `background`, draw everything issued since the last render and
    /// present it on the surface.
    fn render(&mut self, background: Rgb888);

    /// Fill the surface with a colour right away, outside any frame.
    fn clear(&mut self, color: Rgb888);

    /// Release the context and hand the surface back.
    fn shutdown(self) -> Surface<Self::Memory>;
}
