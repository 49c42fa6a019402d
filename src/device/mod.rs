//! # Frame Store Access
//!
//! [`FrameStore`] is the operation-level contract of the remote dual-bank pixel
//! store: single-pixel transfers into either bank, a commit, a hard reset, the
//! enable pulse, algorithm triggers and four status flags. [`RemoteLink`] layers
//! whole-frame and region transfers plus the asynchronous completion protocol on
//! top of it. [`SimulatedStore`] is an in-process store for the binary and tests.

pub mod link;
pub mod simulated;

pub use link::RemoteLink;
pub use simulated::{Fault, SimulatedStore};
pub use zoom_kernels::Algorithm;

use crate::core::frame::Bank;
use crate::error::HwError;

/// Operations exposed by the frame-store driver.
///
/// Pixel transfers are synchronous. A resampling pass is asynchronous: after
/// [`trigger_algorithm`](FrameStore::trigger_algorithm) the caller polls the done
/// flag, checks the error flag, then acknowledges with
/// [`pulse_enable`](FrameStore::pulse_enable).
pub trait FrameStore {
    /// Write one pixel at a linear address (`0..76800`).
    fn store(&mut self, address: u32, value: u8, bank: Bank) -> Result<(), HwError>;

    /// Read one pixel at a linear address (`0..76800`).
    fn load(&mut self, address: u32, bank: Bank) -> Result<u8, HwError>;

    /// Commit pending writes to the display.
    fn refresh(&mut self);

    /// Hard reset of the store's control state. Pixel memory is kept.
    fn reset(&mut self);

    /// Synchronisation pulse, required after every state-changing command.
    fn pulse_enable(&mut self);

    /// Start a resampling pass.
    fn trigger_algorithm(&mut self, algorithm: Algorithm);

    fn get_flag_done(&mut self) -> bool;
    fn get_flag_error(&mut self) -> bool;
    fn get_flag_max_zoom(&mut self) -> bool;
    fn get_flag_min_zoom(&mut self) -> bool;
}

impl<S: FrameStore + ?Sized> FrameStore for &mut S {
    fn store(&mut self, address: u32, value: u8, bank: Bank) -> Result<(), HwError> {
        (**self).store(address, value, bank)
    }

    fn load(&mut self, address: u32, bank: Bank) -> Result<u8, HwError> {
        (**self).load(address, bank)
    }

    fn refresh(&mut self) {
        (**self).refresh()
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn pulse_enable(&mut self) {
        (**self).pulse_enable()
    }

    fn trigger_algorithm(&mut self, algorithm: Algorithm) {
        (**self).trigger_algorithm(algorithm)
    }

    fn get_flag_done(&mut self) -> bool {
        (**self).get_flag_done()
    }

    fn get_flag_error(&mut self) -> bool {
        (**self).get_flag_error()
    }

    fn get_flag_max_zoom(&mut self) -> bool {
        (**self).get_flag_max_zoom()
    }

    fn get_flag_min_zoom(&mut self) -> bool {
        (**self).get_flag_min_zoom()
    }
}
