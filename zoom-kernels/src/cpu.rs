// SPDX-License-Identifier: MIT
// CPU kernels for the frame store's resampling passes.
// Gray8 in → Gray8 out, direct write into caller-provided dst buffer.

use fast_image_resize as fir;
use fir::images::{TypedImage, TypedImageRef};
use fir::pixels::U8;
use fir::{ResizeAlg, ResizeOptions, Resizer};

use crate::plan::{Algorithm, Window, ZoomPlan};

#[derive(Debug)]
pub enum KernelError {
    SizeMismatch { expected: usize, actual: usize },
    Fir(fir::ResizeError),
    ImageBuf(fir::ImageBufferError),
}

impl From<fir::ResizeError> for KernelError { fn from(e: fir::ResizeError) -> Self { Self::Fir(e) } }
impl From<fir::ImageBufferError> for KernelError { fn from(e: fir::ImageBufferError) -> Self { Self::ImageBuf(e) } }

impl std::fmt::Display for KernelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KernelError::SizeMismatch { expected, actual } => {
                write!(f, "Frame buffer has {} bytes, expected {}", actual, expected)
            }
            KernelError::Fir(e) => write!(f, "Fast image resize error: {}", e),
            KernelError::ImageBuf(e) => write!(f, "Image buffer error: {}", e),
        }
    }
}

impl std::error::Error for KernelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            KernelError::Fir(e) => Some(e),
            KernelError::ImageBuf(e) => Some(e),
            _ => None,
        }
    }
}

/// Runs resampling plans. Holds the resizer so its scratch survives across passes.
pub struct KernelRunner {
    resizer: Resizer,
}

impl Default for KernelRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelRunner {
    pub fn new() -> Self {
        Self { resizer: Resizer::new() }
    }

    /// Main entry point.
    /// `src` and `dst` must both be exactly `plan.frame.pixel_count()` bytes.
    pub fn run(&mut self, plan: &ZoomPlan, src: &[u8], dst: &mut [u8]) -> Result<(), KernelError> {
        let expected = plan.frame.pixel_count();
        for actual in [src.len(), dst.len()] {
            if actual != expected {
                return Err(KernelError::SizeMismatch { expected, actual });
            }
        }

        match plan.algorithm {
            Algorithm::NearestNeighbor => self.nearest(plan, src, dst)?,
            Algorithm::PixelReplication => replicate(plan, src, dst),
            Algorithm::Decimation => {
                dst.fill(0);
                shrink(plan, src, dst, |a, _, _, _| a);
            }
            Algorithm::BlockAveraging => {
                dst.fill(0);
                shrink(plan, src, dst, |a, b, c, d| {
                    ((a as u16 + b as u16 + c as u16 + d as u16 + 2) / 4) as u8
                });
            }
        }
        Ok(())
    }

    fn nearest(&mut self, plan: &ZoomPlan, src: &[u8], dst: &mut [u8]) -> Result<(), KernelError> {
        let Window { x, y, w, h } = plan.src_window;
        let src_view = TypedImageRef::<U8>::from_buffer(plan.frame.w, plan.frame.h, src)?;
        let mut dst_image = TypedImage::<U8>::from_buffer(plan.frame.w, plan.frame.h, dst)?;

        let opts = ResizeOptions::new()
            .resize_alg(ResizeAlg::Nearest)
            .crop(x as f64, y as f64, w as f64, h as f64);

        self.resizer.resize_typed::<U8>(&src_view, &mut dst_image, &opts)?;
        Ok(())
    }
}

/// 2× magnification by repeating each source pixel into a 2×2 block.
fn replicate(plan: &ZoomPlan, src: &[u8], dst: &mut [u8]) {
    let stride = plan.frame.w as usize;
    let sw = plan.src_window;
    let dw = plan.dst_window;
    for row in 0..dw.h as usize {
        let sy = sw.y as usize + row / 2;
        let d = (dw.y as usize + row) * stride + dw.x as usize;
        for col in 0..dw.w as usize {
            let sx = sw.x as usize + col / 2;
            dst[d + col] = src[sy * stride + sx];
        }
    }
}

/// 2× reduction; `reduce` receives the top-left, top-right, bottom-left and
/// bottom-right samples of each 2×2 block.
#[inline]
fn shrink(plan: &ZoomPlan, src: &[u8], dst: &mut [u8], reduce: impl Fn(u8, u8, u8, u8) -> u8) {
    let stride = plan.frame.w as usize;
    let sw = plan.src_window;
    let dw = plan.dst_window;
    for row in 0..dw.h as usize {
        let top = (sw.y as usize + row * 2) * stride + sw.x as usize;
        let bottom = top + stride;
        let d = (dw.y as usize + row) * stride + dw.x as usize;
        for col in 0..dw.w as usize {
            let c = col * 2;
            dst[d + col] = reduce(src[top + c], src[top + c + 1], src[bottom + c], src[bottom + c + 1]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{build_plan, FRAME};

    fn frame_from(f: impl Fn(usize, usize) -> u8) -> Vec<u8> {
        let mut buf = vec![0u8; FRAME.pixel_count()];
        for y in 0..FRAME.h as usize {
            for x in 0..FRAME.w as usize {
                buf[y * FRAME.w as usize + x] = f(x, y);
            }
        }
        buf
    }

    fn at(buf: &[u8], x: usize, y: usize) -> u8 {
        buf[y * FRAME.w as usize + x]
    }

    #[test]
    fn rejects_wrong_buffer_size() {
        let plan = build_plan(Algorithm::Decimation, FRAME);
        let src = vec![0u8; 10];
        let mut dst = vec![0u8; FRAME.pixel_count()];
        let err = KernelRunner::new().run(&plan, &src, &mut dst).unwrap_err();
        assert!(matches!(err, KernelError::SizeMismatch { actual: 10, .. }));
    }

    #[test]
    fn replication_repeats_window_pixels() {
        let src = frame_from(|x, y| ((x + y) % 251) as u8);
        let mut dst = vec![0u8; FRAME.pixel_count()];
        let plan = build_plan(Algorithm::PixelReplication, FRAME);
        KernelRunner::new().run(&plan, &src, &mut dst).unwrap();

        assert_eq!(at(&dst, 0, 0), at(&src, 80, 60));
        assert_eq!(at(&dst, 1, 1), at(&src, 80, 60));
        assert_eq!(at(&dst, 2, 0), at(&src, 81, 60));
        assert_eq!(at(&dst, 319, 239), at(&src, 239, 179));
    }

    #[test]
    fn nearest_samples_only_inside_window() {
        // Centre window is 200, the border is 10: a 2x zoom must only show 200.
        let src = frame_from(|x, y| {
            if (80..240).contains(&x) && (60..180).contains(&y) { 200 } else { 10 }
        });
        let mut dst = vec![0u8; FRAME.pixel_count()];
        let plan = build_plan(Algorithm::NearestNeighbor, FRAME);
        KernelRunner::new().run(&plan, &src, &mut dst).unwrap();
        assert!(dst.iter().all(|&p| p == 200));
    }

    #[test]
    fn decimation_keeps_even_samples_and_blackens_border() {
        let src = frame_from(|x, _| (x % 2 * 100 + 50) as u8);
        let mut dst = vec![255u8; FRAME.pixel_count()];
        let plan = build_plan(Algorithm::Decimation, FRAME);
        KernelRunner::new().run(&plan, &src, &mut dst).unwrap();

        assert_eq!(at(&dst, 80, 60), 50);
        assert_eq!(at(&dst, 239, 179), 50);
        assert_eq!(at(&dst, 0, 0), 0);
        assert_eq!(at(&dst, 240, 60), 0);
    }

    #[test]
    fn block_averaging_rounds_mean() {
        // Columns alternate 0 / 3, so every 2x2 block averages 1.5 -> 2.
        let src = frame_from(|x, _| if x % 2 == 0 { 0 } else { 3 });
        let mut dst = vec![0u8; FRAME.pixel_count()];
        let plan = build_plan(Algorithm::BlockAveraging, FRAME);
        KernelRunner::new().run(&plan, &src, &mut dst).unwrap();

        assert_eq!(at(&dst, 100, 100), 2);
        assert_eq!(at(&dst, 10, 10), 0);
    }
}
