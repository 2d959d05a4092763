//! Display acquisition and guaranteed teardown

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::RgbColor;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{DeviceInfoError, StartupError};
use crate::platform::DisplayDevice;
use crate::ui::surface::Surface;
use crate::ui::UiBackend;

/// An open display with a UI context bound to its mapped memory.
///
/// Teardown (clear, release UI, unmap, close) happens exactly once, either
/// through [`Session::release`] or when the session is dropped.
pub struct Session<D: DisplayDevice, U: UiBackend<Memory = D::Memory>> {
    device: D,
    ui: Option<U>,
    path: PathBuf,
}

impl<D, U> Session<D, U>
where
    D: DisplayDevice,
    U: UiBackend<Memory = D::Memory>,
{
    /// Open `path`, map its pixels and bind a UI context to them.
    ///
    /// Stops at the first failing step and undoes the ones before it.
    pub fn acquire(mut device: D, path: &Path, scratch: Vec<u8>) -> Result<Self, StartupError> {
        device
            .open(path)
            .map_err(|source| StartupError::DeviceOpen { path: path.to_path_buf(), source })?;

        let geometry = match device.geometry().map_err(DeviceInfoError::from).and_then(|geometry| {
            geometry.validate()?;
            Ok(geometry)
        }) {
            Ok(geometry) => geometry,
            Err(e) => {
                abandon(&mut device, None);
                return Err(e.into());
            }
        };

        let memory = match device.map(&geometry) {
            Ok(memory) => memory,
            Err(e) => {
                abandon(&mut device, None);
                return Err(StartupError::MemoryMap(e));
            }
        };

        let surface = match Surface::try_new(memory, geometry) {
            Ok(surface) => surface,
            Err((e, memory)) => {
                abandon(&mut device, Some(memory));
                return Err(DeviceInfoError::from(e).into());
            }
        };

        let ui = match U::init(surface, scratch) {
            Ok(ui) => ui,
            Err(failure) => {
                abandon(&mut device, Some(failure.surface.into_memory()));
                return Err(failure.error.into());
            }
        };

        info!("Display {} acquired", path.display());
        Ok(Self { device, ui: Some(ui), path: path.to_path_buf() })
    }

    /// The UI context, until the session is released.
    pub fn ui_mut(&mut self) -> Option<&mut U> {
        self.ui.as_mut()
    }

    /// Clear the screen, release the UI context, unmap and close.
    pub fn release(&mut self) {
        let Some(mut ui) = self.ui.take() else {
            return;
        };

        info!("Releasing display {}", self.path.display());
        ui.clear(Rgb888::BLACK);
        let surface = ui.shutdown();
        if let Err(e) = self.device.unmap(surface.into_memory()) {
            warn!("Failed to unmap framebuffer: {}", e);
        }
        self.device.close();
    }
}

/// Undo a partial acquisition.
fn abandon<D: DisplayDevice>(device: &mut D, memory: Option<D::Memory>) {
    if let Some(memory) = memory {
        if let Err(e) = device.unmap(memory) {
            warn!("Failed to unmap framebuffer: {}", e);
        }
    }
    device.close();
}

impl<D, U> Drop for Session<D, U>
where
    D: DisplayDevice,
    U: UiBackend<Memory = D::Memory>,
{
    fn drop(&mut self) {
        self.release();
    }
}
