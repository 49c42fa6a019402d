//! # Frame Geometry
//!
//! The remote store holds fixed 320×240 frames of 8-bit grayscale pixels,
//! addressed linearly in row-major order (`address = y * 320 + x`). Everything
//! the region engine keeps on the host side is either a whole [`Frame`] or the
//! row-major pixels of one [`Region`].

use std::fmt;

use zoom_kernels::FRAME;

use crate::error::{ZoomError, ZoomResult};

pub const FRAME_WIDTH: u32 = FRAME.w;
pub const FRAME_HEIGHT: u32 = FRAME.h;
pub const FRAME_PIXELS: usize = FRAME.pixel_count();

/// Number of zoom levels a region session can visit (levels `0..REGION_LEVELS`).
pub const REGION_LEVELS: usize = 3;

/// Bank selector of the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bank {
    /// Bank 0: the frame that is written by the host and displayed.
    Primary = 0,
    /// Bank 1: where resampling passes deposit their output.
    Secondary = 1,
}

impl Bank {
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bank::Primary => write!(f, "primary (0)"),
            Bank::Secondary => write!(f, "secondary (1)"),
        }
    }
}

/// Allocate a zeroed pixel buffer, reporting failure instead of aborting.
pub fn alloc_pixels(len: usize, what: &'static str) -> ZoomResult<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| ZoomError::allocation(what, len))?;
    buf.resize(len, 0);
    Ok(buf)
}

/// A rectangle of the frame, `(x, y)` being its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build the rectangle spanned by two opposite corners, in any order.
    ///
    /// The corners are the two clicks of an area selection; the rectangle
    /// starts at the smaller coordinate and spans `|x2 - x1|` by `|y2 - y1|`.
    pub fn from_corners(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self {
            x: x1.min(x2),
            y: y1.min(y2),
            width: x1.abs_diff(x2),
            height: y1.abs_diff(y2),
        }
    }

    /// Reject empty rectangles and rectangles that leave the frame.
    pub fn validate(&self) -> ZoomResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ZoomError::boundary(*self, "selected area is empty"));
        }
        let right = self.x as u64 + self.width as u64;
        let bottom = self.y as u64 + self.height as u64;
        if right > FRAME_WIDTH as u64 || bottom > FRAME_HEIGHT as u64 {
            return Err(ZoomError::boundary(
                *self,
                format!("area exceeds the {}x{} frame", FRAME_WIDTH, FRAME_HEIGHT),
            ));
        }
        Ok(())
    }

    /// Bytes held by one cached copy of this region.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x - self.x < self.width && y - self.y < self.height
    }

    /// Linear frame addresses covered by the region, row by row.
    ///
    /// The n-th address corresponds to the n-th byte of a cached region buffer.
    pub fn addresses(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.height).flat_map(move |row| {
            let base = (self.y + row) * FRAME_WIDTH + self.x;
            base..base + self.width
        })
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) {}x{}",
            self.x, self.y, self.width, self.height
        )
    }
}

/// One whole grayscale frame held on the host.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    pixels: Vec<u8>,
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("len", &self.pixels.len())
            .finish()
    }
}

impl Frame {
    /// A black frame.
    pub fn new(what: &'static str) -> ZoomResult<Self> {
        Ok(Self {
            pixels: alloc_pixels(FRAME_PIXELS, what)?,
        })
    }

    pub fn from_pixels(pixels: Vec<u8>) -> ZoomResult<Self> {
        if pixels.len() != FRAME_PIXELS {
            return Err(ZoomError::config(
                "frame",
                pixels.len().to_string(),
                format!("a frame holds exactly {} pixels", FRAME_PIXELS),
            ));
        }
        Ok(Self { pixels })
    }

    /// Horizontal gradient, black on the left edge to white on the right.
    pub fn gradient() -> ZoomResult<Self> {
        let mut frame = Self::new("gradient frame")?;
        for (addr, pixel) in frame.pixels.iter_mut().enumerate() {
            let x = addr as u32 % FRAME_WIDTH;
            *pixel = (x * 255 / (FRAME_WIDTH - 1)) as u8;
        }
        Ok(frame)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.pixels
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// If `(x, y)` lies outside the 320×240 frame.
    pub fn pixel(&self, x: u32, y: u32) -> u8 {
        assert!(x < FRAME_WIDTH && y < FRAME_HEIGHT, "pixel ({}, {}) outside frame", x, y);
        self.pixels[(y * FRAME_WIDTH + x) as usize]
    }

    /// # Panics
    ///
    /// If `(x, y)` lies outside the 320×240 frame.
    pub fn set_pixel(&mut self, x: u32, y: u32, value: u8) {
        assert!(x < FRAME_WIDTH && y < FRAME_HEIGHT, "pixel ({}, {}) outside frame", x, y);
        self.pixels[(y * FRAME_WIDTH + x) as usize] = value;
    }

    /// Copy the region's pixels out, row-major.
    pub fn extract(&self, region: &Region) -> ZoomResult<Vec<u8>> {
        let mut out = alloc_pixels(region.pixel_count(), "region buffer")?;
        for (dst, addr) in out.iter_mut().zip(region.addresses()) {
            *dst = self.pixels[addr as usize];
        }
        Ok(out)
    }

    /// Write row-major region pixels back at the region's coordinates.
    pub fn overlay(&mut self, region: &Region, pixels: &[u8]) {
        debug_assert_eq!(pixels.len(), region.pixel_count());
        for (&value, addr) in pixels.iter().zip(region.addresses()) {
            self.pixels[addr as usize] = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_corners_normalises_order() {
        let region = Region::from_corners(60, 50, 10, 10);
        assert_eq!(region, Region::new(10, 10, 50, 40));
        assert_eq!(region.pixel_count(), 2000);
    }

    #[test]
    fn validate_rejects_empty_and_out_of_bounds() {
        assert!(Region::new(10, 10, 0, 5).validate().is_err());
        assert!(Region::new(10, 10, 5, 0).validate().is_err());
        assert!(Region::new(300, 10, 21, 5).validate().is_err());
        assert!(Region::new(0, 200, 10, 41).validate().is_err());
        assert!(Region::new(u32::MAX, 0, 2, 2).validate().is_err());
        assert!(Region::new(0, 0, 320, 240).validate().is_ok());
        assert!(Region::new(310, 230, 10, 10).validate().is_ok());
    }

    #[test]
    fn addresses_are_row_major() {
        let region = Region::new(2, 1, 3, 2);
        let addrs: Vec<u32> = region.addresses().collect();
        assert_eq!(addrs, vec![322, 323, 324, 642, 643, 644]);
    }

    #[test]
    fn extract_then_overlay_moves_region_pixels() {
        let source = Frame::gradient().unwrap();
        let region = Region::new(100, 20, 8, 4);
        let pixels = source.extract(&region).unwrap();
        assert_eq!(pixels[0], source.pixel(100, 20));
        assert_eq!(pixels[31], source.pixel(107, 23));

        let mut target = Frame::new("test").unwrap();
        target.overlay(&region, &pixels);
        assert_eq!(target.pixel(100, 20), source.pixel(100, 20));
        assert_eq!(target.pixel(99, 20), 0);
        assert!(region.contains(107, 23));
        assert!(!region.contains(108, 23));
    }

    #[test]
    fn gradient_spans_full_range() {
        let frame = Frame::gradient().unwrap();
        assert_eq!(frame.pixel(0, 0), 0);
        assert_eq!(frame.pixel(319, 239), 255);
    }

    #[test]
    #[should_panic(expected = "outside frame")]
    fn pixel_past_row_end_panics() {
        // Would otherwise wrap onto the next row.
        Frame::gradient().unwrap().pixel(320, 0);
    }

    #[test]
    fn from_pixels_checks_length() {
        assert!(Frame::from_pixels(vec![0; 10]).is_err());
        assert!(Frame::from_pixels(vec![0; FRAME_PIXELS]).is_ok());
    }
}
