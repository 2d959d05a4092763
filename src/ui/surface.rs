//! Linear pixel memory with a known geometry
//!
//! A `Surface` wraps either the mapped framebuffer or an ordinary heap buffer
//! laid out the same way, and implements the `embedded-graphics` draw target
//! so primitives, text and images can land on it directly.

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use std::convert::Infallible;
use thiserror::Error;

/// Position and width of one colour channel inside a pixel word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bitfield {
    pub offset: u32,
    pub length: u32,
}

impl Bitfield {
    pub const fn new(offset: u32, length: u32) -> Self {
        Self { offset, length }
    }

    fn encode(self, value: u8) -> u32 {
        if self.length == 0 {
            return 0;
        }
        let bits = self.length.min(8);
        (u32::from(value) >> (8 - bits)) << self.offset
    }

    fn all_ones(self) -> u32 {
        if self.length == 0 {
            return 0;
        }
        ((1u32 << self.length.min(31)) - 1) << self.offset
    }
}

/// Channel layout of a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormat {
    pub red: Bitfield,
    pub green: Bitfield,
    pub blue: Bitfield,
    pub transp: Bitfield,
}

impl PixelFormat {
    /// 32bpp, stored B, G, R, A in memory.
    pub const ARGB8888: Self = Self {
        red: Bitfield::new(16, 8),
        green: Bitfield::new(8, 8),
        blue: Bitfield::new(0, 8),
        transp: Bitfield::new(24, 8),
    };

    /// 24bpp, stored B, G, R in memory.
    pub const RGB888: Self = Self {
        red: Bitfield::new(16, 8),
        green: Bitfield::new(8, 8),
        blue: Bitfield::new(0, 8),
        transp: Bitfield::new(0, 0),
    };

    pub const RGB565: Self = Self {
        red: Bitfield::new(11, 5),
        green: Bitfield::new(5, 6),
        blue: Bitfield::new(0, 5),
        transp: Bitfield::new(0, 0),
    };

    /// Usual layout for a depth, for drivers that report empty bitfields.
    pub fn for_depth(bits_per_pixel: u32) -> Option<Self> {
        match bits_per_pixel {
            16 => Some(Self::RGB565),
            24 => Some(Self::RGB888),
            32 => Some(Self::ARGB8888),
            _ => None,
        }
    }

    fn is_empty(&self) -> bool {
        self.red.length == 0 && self.green.length == 0 && self.blue.length == 0
    }

    /// This layout, or the usual one for `bits_per_pixel` if no channels are described.
    pub fn or_default_for(self, bits_per_pixel: u32) -> Self {
        if self.is_empty() {
            Self::for_depth(bits_per_pixel).unwrap_or(self)
        } else {
            self
        }
    }

    /// Pack a colour into a pixel word. Alpha, when present, is opaque.
    pub fn encode(&self, color: Rgb888) -> u32 {
        self.red.encode(color.r())
            | self.green.encode(color.g())
            | self.blue.encode(color.b())
            | self.transp.all_ones()
    }
}

/// What the display device reports about its pixel memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Geometry {
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u32,
    /// Bytes per row, may include padding.
    pub stride: u32,
    /// Total bytes of the memory region to map.
    pub size: usize,
    pub format: PixelFormat,
}

impl Geometry {
    pub fn bytes_per_pixel(&self) -> usize {
        (self.bits_per_pixel / 8) as usize
    }

    /// Bytes covered by the visible rows.
    pub fn frame_len(&self) -> usize {
        self.stride as usize * self.height as usize
    }

    pub fn validate(&self) -> Result<(), SurfaceError> {
        if self.width == 0 || self.height == 0 {
            return Err(SurfaceError::Empty);
        }
        if !matches!(self.bits_per_pixel, 16 | 24 | 32) {
            return Err(SurfaceError::UnsupportedDepth(self.bits_per_pixel));
        }
        let min = self.width as usize * self.bytes_per_pixel();
        if (self.stride as usize) < min {
            return Err(SurfaceError::StrideTooSmall { stride: self.stride, min });
        }
        if self.size < self.frame_len() {
            return Err(SurfaceError::MemoryTooSmall { len: self.size, needed: self.frame_len() });
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("surface has no visible pixels")]
    Empty,

    #[error("unsupported pixel depth: {0} bpp")]
    UnsupportedDepth(u32),

    #[error("stride {stride} is smaller than a row ({min} bytes)")]
    StrideTooSmall { stride: u32, min: usize },

    #[error("pixel memory is {len} bytes, need at least {needed}")]
    MemoryTooSmall { len: usize, needed: usize },
}

/// Pixel memory plus the geometry that describes it.
#[derive(Debug)]
pub struct Surface<M> {
    memory: M,
    geometry: Geometry,
}

impl<M: AsRef<[u8]>> Surface<M> {
    pub fn new(memory: M, geometry: Geometry) -> Result<Self, SurfaceError> {
        Self::try_new(memory, geometry).map_err(|(e, _)| e)
    }

    /// Like [`Surface::new`], but hands the memory back on failure.
    pub fn try_new(memory: M, geometry: Geometry) -> Result<Self, (SurfaceError, M)> {
        if let Err(e) = geometry.validate() {
            return Err((e, memory));
        }
        let len = memory.as_ref().len();
        if len < geometry.frame_len() {
            return Err((SurfaceError::MemoryTooSmall { len, needed: geometry.frame_len() }, memory));
        }
        Ok(Self { memory, geometry })
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn bytes(&self) -> &[u8] {
        self.memory.as_ref()
    }

    /// Give the memory back, e.g. to unmap it.
    pub fn into_memory(self) -> M {
        self.memory
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.geometry.width || y >= self.geometry.height {
            return None;
        }
        Some(y as usize * self.geometry.stride as usize + x as usize * self.geometry.bytes_per_pixel())
    }

    /// Read back the pixel word at (x, y).
    #[allow(dead_code)]
    pub fn pixel_word(&self, x: u32, y: u32) -> Option<u32> {
        let offset = self.offset(x, y)?;
        let bpp = self.geometry.bytes_per_pixel();
        let mut word = [0u8; 4];
        word[..bpp].copy_from_slice(&self.bytes()[offset..offset + bpp]);
        Some(u32::from_le_bytes(word))
    }
}

impl<M: AsRef<[u8]> + AsMut<[u8]>> Surface<M> {
    /// Fill every visible pixel with one colour.
    pub fn fill(&mut self, color: Rgb888) {
        let bpp = self.geometry.bytes_per_pixel();
        let word = self.geometry.format.encode(color).to_le_bytes();
        let stride = self.geometry.stride as usize;
        let row_len = self.geometry.width as usize * bpp;
        let frame_len = self.geometry.frame_len();

        for row in self.memory.as_mut()[..frame_len].chunks_exact_mut(stride) {
            for pixel in row[..row_len].chunks_exact_mut(bpp) {
                pixel.copy_from_slice(&word[..bpp]);
            }
        }
    }

    /// Copy the visible rows of `other`, which must share this geometry.
    pub fn copy_from<N: AsRef<[u8]>>(&mut self, other: &Surface<N>) {
        debug_assert_eq!(self.geometry.stride, other.geometry.stride);
        let len = self.geometry.frame_len().min(other.geometry.frame_len());
        self.memory.as_mut()[..len].copy_from_slice(&other.bytes()[..len]);
    }

    fn put_pixel(&mut self, x: u32, y: u32, color: Rgb888) {
        let Some(offset) = self.offset(x, y) else {
            return;
        };
        let bpp = self.geometry.bytes_per_pixel();
        let word = self.geometry.format.encode(color).to_le_bytes();
        self.memory.as_mut()[offset..offset + bpp].copy_from_slice(&word[..bpp]);
    }
}

impl<M: AsRef<[u8]> + AsMut<[u8]>> DrawTarget for Surface<M> {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(Point { x, y }, color) in pixels {
            if x < 0 || y < 0 {
                continue;
            }
            self.put_pixel(x as u32, y as u32, color);
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill(color);
        Ok(())
    }
}

impl<M> OriginDimensions for Surface<M> {
    fn size(&self) -> Size {
        Size::new(self.geometry.width, self.geometry.height)
    }
}
