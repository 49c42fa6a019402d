// SPDX-License-Identifier: MIT
//! # Resampling Plans
//!
//! Every pass the frame store runs maps a whole frame onto a whole frame, so a
//! plan only has to say which window of the source is read and which window of
//! the destination is written:
//!
//! | Algorithm          | Opcode | Source window      | Destination window |
//! |--------------------|--------|--------------------|--------------------|
//! | `NearestNeighbor`  | 3      | centred half-size  | full frame         |
//! | `PixelReplication` | 4      | centred half-size  | full frame         |
//! | `BlockAveraging`   | 5      | full frame         | centred half-size  |
//! | `Decimation`       | 6      | full frame         | centred half-size  |
//!
//! Pixels of the destination outside its window are black.

/// Represents a 2D size with width and height in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    /// Number of 8-bit pixels in a frame of this size.
    pub const fn pixel_count(self) -> usize {
        (self.w as usize) * (self.h as usize)
    }
}

/// The fixed frame geometry of the store: 320×240, one byte per pixel.
pub const FRAME: Size = Size { w: 320, h: 240 };

/// A sub-rectangle of a frame, `(x, y)` being its top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Window {
    /// The window covering the whole of `size`.
    pub const fn full(size: Size) -> Self {
        Self {
            x: 0,
            y: 0,
            w: size.w,
            h: size.h,
        }
    }

    /// The half-size window centred in `size`.
    pub const fn centred_half(size: Size) -> Self {
        Self {
            x: size.w / 4,
            y: size.h / 4,
            w: size.w / 2,
            h: size.h / 2,
        }
    }
}

/// The four resampling passes implemented by the frame store.
///
/// The hardware only learns the opcode; the pass itself is started by an enable
/// pulse and signals completion through the done flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Algorithm {
    /// Zoom in: each output pixel takes the closest source sample.
    #[clap(name = "nearest")]
    NearestNeighbor,
    /// Zoom in: each source pixel is repeated into a 2×2 block.
    #[clap(name = "replicate")]
    PixelReplication,
    /// Zoom out: keeps every second pixel of every second row.
    #[clap(name = "decimate")]
    Decimation,
    /// Zoom out: each output pixel is the rounded mean of a 2×2 block.
    #[clap(name = "average")]
    BlockAveraging,
}

impl Algorithm {
    pub const ALL: [Algorithm; 4] = [
        Algorithm::NearestNeighbor,
        Algorithm::PixelReplication,
        Algorithm::Decimation,
        Algorithm::BlockAveraging,
    ];

    /// Opcode written to the store's instruction register.
    pub const fn opcode(self) -> u8 {
        match self {
            Algorithm::NearestNeighbor => 3,
            Algorithm::PixelReplication => 4,
            Algorithm::BlockAveraging => 5,
            Algorithm::Decimation => 6,
        }
    }

    /// Inverse of [`Algorithm::opcode`].
    pub fn from_opcode(opcode: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.opcode() == opcode)
    }

    pub const fn is_zoom_in(self) -> bool {
        matches!(self, Algorithm::NearestNeighbor | Algorithm::PixelReplication)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Algorithm::NearestNeighbor => "NearestNeighbor",
            Algorithm::PixelReplication => "PixelReplication",
            Algorithm::Decimation => "Decimation",
            Algorithm::BlockAveraging => "BlockAveraging",
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Complete plan for one resampling pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZoomPlan {
    pub algorithm: Algorithm,
    /// Geometry shared by source and destination frames.
    pub frame: Size,
    /// Part of the source frame that is read.
    pub src_window: Window,
    /// Part of the destination frame that is written; the rest is cleared.
    pub dst_window: Window,
}

/// Compute the source and destination windows of `algorithm` on a `frame`-sized
/// buffer pair.
pub fn build_plan(algorithm: Algorithm, frame: Size) -> ZoomPlan {
    let (src_window, dst_window) = if algorithm.is_zoom_in() {
        (Window::centred_half(frame), Window::full(frame))
    } else {
        (Window::full(frame), Window::centred_half(frame))
    };
    ZoomPlan {
        algorithm,
        frame,
        src_window,
        dst_window,
    }
}
