// SPDX-License-Identifier: MIT
//! # zoom-kernels: Frame-Store Resampling Kernels
//!
//! Software renditions of the four resampling passes a dual-bank frame store
//! performs in hardware. Each pass reads one whole 320×240 grayscale frame and
//! writes one whole frame of the same size:
//!
//! - [`Algorithm::NearestNeighbor`] and [`Algorithm::PixelReplication`] magnify the
//!   centred half-size window by 2× (zoom in).
//! - [`Algorithm::Decimation`] and [`Algorithm::BlockAveraging`] shrink the full
//!   frame by 2× into the centred half-size window over a black canvas (zoom out).
//!
//! ## Key Components
//!
//! - [`plan`]: algorithm identities and the source/destination windows of each pass
//! - [`cpu`]: execution, with nearest-neighbour sampling on `fast_image_resize`
//!
//! ## Usage Example
//!
//! ```rust
//! use zoom_kernels::cpu::KernelRunner;
//! use zoom_kernels::plan::{build_plan, Algorithm, FRAME};
//!
//! let src = vec![128u8; FRAME.pixel_count()];
//! let mut dst = vec![0u8; FRAME.pixel_count()];
//!
//! let plan = build_plan(Algorithm::PixelReplication, FRAME);
//! KernelRunner::new().run(&plan, &src, &mut dst).unwrap();
//! assert!(dst.iter().all(|&p| p == 128));
//! ```

pub mod cpu;
pub mod plan;

pub use cpu::{KernelError, KernelRunner};
pub use plan::{build_plan, Algorithm, Size, Window, ZoomPlan, FRAME};
