//! Fake-3D spin of a greyscale bitmap
//!
//! Source pixels are forward-mapped: each one is moved into a centred
//! cartesian frame, yawed about the vertical axis, projected back and added
//! onto the destination. The source is flat (z = 0), so the yaw reduces to a
//! horizontal squash by `cos(angle)`; that squash is the animation.

use image::GrayImage;

/// Single-channel 8-bit image, rows `pitch` bytes apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub pitch: u32,
}

impl Bitmap {
    /// All-black bitmap with tightly packed rows.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: vec![0; width as usize * height as usize],
            width,
            height,
            pitch: width,
        }
    }

    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        assert_eq!(pixels.len(), width as usize * height as usize, "pixel count mismatch");
        Self { pixels, width, height, pitch: width }
    }

    /// Same dimensions, zeroed.
    pub fn blank_like(&self) -> Self {
        Self::new(self.width, self.height)
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.pixels[(y * self.pitch + x) as usize]
    }

    #[allow(dead_code)]
    pub fn sum(&self) -> u64 {
        self.pixels.iter().map(|&p| u64::from(p)).sum()
    }
}

impl From<GrayImage> for Bitmap {
    fn from(img: GrayImage) -> Self {
        let (width, height) = img.dimensions();
        Self::from_pixels(width, height, img.into_raw())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Point3 {
    x: i32,
    y: i32,
    z: i32,
}

impl Point3 {
    /// Yaw: rotation about the y axis, truncated back onto the integer grid.
    fn rotate_y(self, angle: f32) -> Self {
        let (sn, cs) = angle.sin_cos();
        let (x, z) = (self.x as f32, self.z as f32);
        Self {
            x: (cs * x + sn * z) as i32,
            y: self.y,
            z: (cs * z - sn * x) as i32,
        }
    }
}

/// Redraw `dst` as `src` spun by `angle` radians about the vertical axis.
///
/// `dst` is cleared first. Pixels landing on the same spot add up, saturating
/// at white: near edge-on angles whole rows collapse onto a few columns, and a
/// wrapping 8-bit sum would turn those bright columns dark. Targets outside the
/// bitmap are dropped.
///
/// # Panics
///
/// If the bitmaps differ in size or either has padded rows.
pub fn rotate(dst: &mut Bitmap, src: &Bitmap, angle: f32) {
    assert!(
        dst.width == src.width && dst.height == src.height && dst.pitch == src.pitch,
        "rotate: bitmap geometry mismatch ({}x{}/{} vs {}x{}/{})",
        dst.width,
        dst.height,
        dst.pitch,
        src.width,
        src.height,
        src.pitch
    );
    assert_eq!(src.pitch, src.width, "rotate: bitmaps must be single-channel and tightly packed");

    dst.pixels.fill(0);

    let width = src.width as i32;
    let height = src.height as i32;
    let pitch = src.pitch as i32;

    for i in 0..height {
        for j in 0..width {
            // to cartesian coords
            let sample = Point3 { x: j - width / 2, y: height / 2 - i, z: 0 };
            let r = sample.rotate_y(angle);

            // back to screen coords
            let (row, col) = (height / 2 - r.y, r.x + width / 2);
            if !(0..height).contains(&row) || !(0..width).contains(&col) {
                continue;
            }

            let value = src.pixels[(i * pitch + j) as usize];
            let out = &mut dst.pixels[(row * pitch + col) as usize];
            *out = out.saturating_add(value);
        }
    }
}
