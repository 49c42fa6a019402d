//! Whole-frame and region transfers plus the completion protocol, on top of
//! a [`FrameStore`].

use std::thread;
use std::time::Duration;

use tracing::{debug, error, trace};

use crate::config::ZoomConfig;
use crate::core::frame::{alloc_pixels, Bank, Frame, Region, FRAME_PIXELS};
use crate::device::{Algorithm, FrameStore};
use crate::error::{ZoomError, ZoomResult};

fn pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}

/// Adapter driving a [`FrameStore`] with the configured protocol timing.
#[derive(Debug)]
pub struct RemoteLink<S> {
    store: S,
    config: ZoomConfig,
}

impl<S: FrameStore> RemoteLink<S> {
    pub fn new(store: S, config: ZoomConfig) -> ZoomResult<Self> {
        config.validate().map_err(|reason| {
            ZoomError::config("zoom config", format!("{:?}", config), reason)
        })?;
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &ZoomConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Reset followed by the enable pulse and the settle delay.
    pub fn hard_reset(&mut self) {
        trace!("hard reset");
        self.store.reset();
        self.store.pulse_enable();
        pause(self.config.pulse_delay);
    }

    /// Commit pending writes and wait for the display to settle.
    pub fn commit(&mut self) {
        trace!("commit");
        self.store.refresh();
        pause(self.config.refresh_delay);
    }

    /// Write a whole frame, pixel by pixel in address order.
    pub fn write_frame(&mut self, frame: &Frame, bank: Bank) -> ZoomResult<()> {
        for (address, &value) in frame.as_slice().iter().enumerate() {
            let address = address as u32;
            self.store.store(address, value, bank).map_err(|e| {
                ZoomError::hardware("frame write", e)
                    .with_metadata("bank", bank.index().to_string())
                    .with_metadata("address", address.to_string())
            })?;
        }
        debug!(%bank, pixels = FRAME_PIXELS, "frame written");
        Ok(())
    }

    pub fn read_frame(&mut self, bank: Bank) -> ZoomResult<Frame> {
        let mut frame = Frame::new("frame read buffer")?;
        for (address, pixel) in frame.as_mut_slice().iter_mut().enumerate() {
            let address = address as u32;
            *pixel = self.store.load(address, bank).map_err(|e| {
                ZoomError::hardware("frame read", e)
                    .with_metadata("bank", bank.index().to_string())
                    .with_metadata("address", address.to_string())
            })?;
        }
        debug!(%bank, pixels = FRAME_PIXELS, "frame read");
        Ok(frame)
    }

    /// Read the region's pixels row-major.
    pub fn read_region(&mut self, region: &Region, bank: Bank) -> ZoomResult<Vec<u8>> {
        let mut pixels = alloc_pixels(region.pixel_count(), "region read buffer")?;
        for (pixel, address) in pixels.iter_mut().zip(region.addresses()) {
            *pixel = self.store.load(address, bank).map_err(|e| {
                ZoomError::hardware("region read", e)
                    .with_metadata("address", address.to_string())
            })?;
        }
        Ok(pixels)
    }

    /// Write row-major region pixels at the region's coordinates.
    pub fn overlay_region(&mut self, region: &Region, pixels: &[u8], bank: Bank) -> ZoomResult<()> {
        for (&value, address) in pixels.iter().zip(region.addresses()) {
            self.store.store(address, value, bank).map_err(|e| {
                ZoomError::hardware("region overlay", e)
                    .with_metadata("address", address.to_string())
            })?;
        }
        Ok(())
    }

    /// Run one resampling pass to completion.
    ///
    /// The done flag is read at most `max_poll_attempts` times with
    /// `poll_interval` between reads. After completion the error flag is checked
    /// and the pass is acknowledged with an enable pulse.
    pub fn run_algorithm(&mut self, algorithm: Algorithm) -> ZoomResult<()> {
        let attempts = self.config.max_poll_attempts;
        self.store.trigger_algorithm(algorithm);
        debug!(%algorithm, opcode = algorithm.opcode(), "pass started");

        let mut done_after = None;
        for attempt in 1..=attempts {
            if self.store.get_flag_done() {
                done_after = Some(attempt);
                break;
            }
            pause(self.config.poll_interval);
        }

        let Some(polls) = done_after else {
            let waited = self.config.poll_budget().as_millis() as u64;
            error!(%algorithm, attempts, waited_ms = waited, "pass timed out");
            return Err(ZoomError::hardware_timeout(algorithm, attempts, waited));
        };

        if self.store.get_flag_error() {
            error!(%algorithm, "pass finished with the error flag raised");
            return Err(ZoomError::hardware_flag(algorithm));
        }

        self.store.pulse_enable();
        debug!(%algorithm, polls, "pass acknowledged");
        Ok(())
    }

    pub fn max_zoom_reached(&mut self) -> bool {
        self.store.get_flag_max_zoom()
    }

    pub fn min_zoom_reached(&mut self) -> bool {
        self.store.get_flag_min_zoom()
    }
}
