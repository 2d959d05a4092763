//! Linux framebuffer device (`/dev/fbN`)

use nix::libc::c_ulong;
use nix::sys::mman::{mmap, munmap, MapFlags, ProtFlags};
use std::ffi::c_void;
use std::fs::{File, OpenOptions};
use std::io;
use std::num::NonZeroUsize;
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::ptr::NonNull;
use tracing::{debug, info};

use super::DisplayDevice;
use crate::ui::surface::{Bitfield, Geometry, PixelFormat};

/// Linux framebuffer fixed screen info
#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
pub(crate) struct FbFixScreeninfo {
    id: [u8; 16],
    smem_start: c_ulong,
    smem_len: u32,
    type_: u32,
    type_aux: u32,
    visual: u32,
    xpanstep: u16,
    ypanstep: u16,
    ywrapstep: u16,
    line_length: u32,
    mmio_start: c_ulong,
    mmio_len: u32,
    accel: u32,
    capabilities: u16,
    reserved: [u16; 2],
}

/// Linux framebuffer variable screen info
#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
pub(crate) struct FbVarScreeninfo {
    xres: u32,
    yres: u32,
    xres_virtual: u32,
    yres_virtual: u32,
    xoffset: u32,
    yoffset: u32,
    bits_per_pixel: u32,
    grayscale: u32,
    red: FbBitfield,
    green: FbBitfield,
    blue: FbBitfield,
    transp: FbBitfield,
    nonstd: u32,
    activate: u32,
    height: u32,
    width: u32,
    accel_flags: u32,
    pixclock: u32,
    left_margin: u32,
    right_margin: u32,
    upper_margin: u32,
    lower_margin: u32,
    hsync_len: u32,
    vsync_len: u32,
    sync: u32,
    vmode: u32,
    rotate: u32,
    colorspace: u32,
    reserved: [u32; 4],
}

#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
pub(crate) struct FbBitfield {
    offset: u32,
    length: u32,
    msb_right: u32,
}

impl From<FbBitfield> for Bitfield {
    fn from(field: FbBitfield) -> Self {
        Bitfield::new(field.offset, field.length)
    }
}

nix::ioctl_read_bad!(fbioget_vscreeninfo, 0x4600, FbVarScreeninfo);
nix::ioctl_read_bad!(fbioget_fscreeninfo, 0x4602, FbFixScreeninfo);

fn geometry_from(var: &FbVarScreeninfo, fix: &FbFixScreeninfo) -> Geometry {
    let id_len = fix.id.iter().position(|&b| b == 0).unwrap_or(fix.id.len());
    let frame_len = fix.line_length as usize * var.yres as usize;
    Geometry {
        id: String::from_utf8_lossy(&fix.id[..id_len]).into_owned(),
        width: var.xres,
        height: var.yres,
        bits_per_pixel: var.bits_per_pixel,
        stride: fix.line_length,
        // some drivers leave smem_len empty
        size: if fix.smem_len == 0 { frame_len } else { fix.smem_len as usize },
        format: PixelFormat {
            red: var.red.into(),
            green: var.green.into(),
            blue: var.blue.into(),
            transp: var.transp.into(),
        }
        .or_default_for(var.bits_per_pixel),
    }
}

/// Shared read/write mapping of framebuffer memory.
///
/// Not unmapped on drop; hand it back to [`FbDevice::unmap`].
pub struct MappedRegion {
    ptr: NonNull<u8>,
    len: usize,
}

impl AsRef<[u8]> for MappedRegion {
    fn as_ref(&self) -> &[u8] {
        // SAFETY: ptr/len come from a successful mmap that lives until unmap consumes self.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl AsMut<[u8]> for MappedRegion {
    fn as_mut(&mut self) -> &mut [u8] {
        // SAFETY: as above; &mut self guarantees exclusive access.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

/// Framebuffer device node accessed through ioctl and mmap.
#[derive(Default)]
pub struct FbDevice {
    file: Option<File>,
}

impl FbDevice {
    pub fn new() -> Self {
        Self::default()
    }

    fn file(&self) -> io::Result<&File> {
        self.file
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "framebuffer device is not open"))
    }
}

impl DisplayDevice for FbDevice {
    type Memory = MappedRegion;

    fn open(&mut self, path: &Path) -> io::Result<()> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        debug!("Opened {}", path.display());
        self.file = Some(file);
        Ok(())
    }

    fn geometry(&mut self) -> io::Result<Geometry> {
        let fd = self.file()?.as_raw_fd();

        // SAFETY: both structs are plain C data; the kernel fills them in.
        let mut var: FbVarScreeninfo = unsafe { std::mem::zeroed() };
        unsafe { fbioget_vscreeninfo(fd, &mut var) }?;
        let mut fix: FbFixScreeninfo = unsafe { std::mem::zeroed() };
        unsafe { fbioget_fscreeninfo(fd, &mut fix) }?;

        let geometry = geometry_from(&var, &fix);
        info!("FB settings:");
        info!("\tID: {}", geometry.id);
        info!("\tresolution: {}x{}@{}", geometry.width, geometry.height, geometry.bits_per_pixel);
        info!("\tstride: {} bytes", geometry.stride);
        info!("\tsize: {} bytes", geometry.size);
        Ok(geometry)
    }

    fn map(&mut self, geometry: &Geometry) -> io::Result<MappedRegion> {
        let file = self.file()?;
        let len = NonZeroUsize::new(geometry.size)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "framebuffer size is zero"))?;

        // SAFETY: fresh shared mapping of a device we hold open; nothing else aliases it in-process.
        let ptr = unsafe {
            mmap(None, len, ProtFlags::PROT_READ | ProtFlags::PROT_WRITE, MapFlags::MAP_SHARED, file, 0)
        }?;
        debug!("Mapped {} bytes at {:p}", geometry.size, ptr);
        Ok(MappedRegion { ptr: ptr.cast(), len: geometry.size })
    }

    fn unmap(&mut self, memory: MappedRegion) -> io::Result<()> {
        // SAFETY: the region came from map() and no slice of it outlives `memory`.
        unsafe { munmap(memory.ptr.cast::<c_void>(), memory.len) }?;
        debug!("Unmapped {} bytes", memory.len);
        Ok(())
    }

    fn close(&mut self) {
        if self.file.take().is_some() {
            debug!("Closed framebuffer device");
        }
    }
}
