//! Platform-specific operations
//!
//! Display device access and process signal handling.

pub mod fbdev;
pub mod signal;

use std::io;
use std::path::Path;

use crate::ui::surface::Geometry;

/// A display whose pixel memory can be mapped into the process.
///
/// Calls arrive in lifecycle order: `open`, `geometry`, `map`, then later
/// `unmap` and `close`.
pub trait DisplayDevice {
    type Memory: AsRef<[u8]> + AsMut<[u8]>;

    fn open(&mut self, path: &Path) -> io::Result<()>;

    /// Dimensions, depth, stride and mappable size of the pixel memory.
    fn geometry(&mut self) -> io::Result<Geometry>;

    fn map(&mut self, geometry: &Geometry) -> io::Result<Self::Memory>;

    fn unmap(&mut self, memory: Self::Memory) -> io::Result<()>;

    fn close(&mut self);
}
