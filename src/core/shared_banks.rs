//! # Memory-Mapped Bank Storage
//!
//! Backing memory for the simulated frame store: both banks live back to back
//! in one memory-mapped file, bank 0 first.
//!
//! ```text
//! offset 0                76800               153600
//! ┌───────────────────────┬───────────────────────┐
//! │   bank 0 (primary)    │  bank 1 (secondary)   │
//! └───────────────────────┴───────────────────────┘
//! ```
//!
//! The anonymous variant maps an unlinked temporary file. The path variant maps a
//! named file so another process (a viewer) can map the same banks and watch
//! the composites appear.

use std::fs::OpenOptions;
use std::path::Path;

use memmap2::{MmapMut, MmapOptions};

use crate::core::frame::{Bank, FRAME_PIXELS};
use crate::error::{ZoomError, ZoomResult};

const BANK_COUNT: usize = 2;

/// Two frame banks in one shared mapping.
#[derive(Debug)]
pub struct SharedBanks {
    map: MmapMut,
}

impl SharedBanks {
    /// Map both banks over an unlinked temporary file.
    pub fn anonymous() -> ZoomResult<Self> {
        let file = tempfile::tempfile().map_err(|e| ZoomError::io("create bank file", e))?;
        file.set_len((FRAME_PIXELS * BANK_COUNT) as u64)
            .map_err(|e| ZoomError::io("size bank file", e))?;

        // SAFETY: the file is unlinked and only reachable through this mapping.
        let map = unsafe { MmapOptions::new().map_mut(&file) }
            .map_err(|e| ZoomError::io("map bank file", e))?;
        Ok(Self { map })
    }

    /// Map both banks over `path`, creating or resizing the file as needed.
    ///
    /// Existing content within the first two frames is kept, so a store can be
    /// reopened on the banks a previous run left behind.
    pub fn open(path: impl AsRef<Path>) -> ZoomResult<Self> {
        let path = path.as_ref();
        let operation = format!("open bank file {}", path.display());
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| ZoomError::io(operation.clone(), e))?;
        file.set_len((FRAME_PIXELS * BANK_COUNT) as u64)
            .map_err(|e| ZoomError::io(operation.clone(), e))?;

        // SAFETY: other mappings of this file are readers; the mapping is only
        // written through `&mut self`.
        let map = unsafe { MmapOptions::new().map_mut(&file) }
            .map_err(|e| ZoomError::io(operation, e))?;
        Ok(Self { map })
    }

    pub fn bank(&self, bank: Bank) -> &[u8] {
        let start = bank.index() * FRAME_PIXELS;
        &self.map[start..start + FRAME_PIXELS]
    }

    pub fn bank_mut(&mut self, bank: Bank) -> &mut [u8] {
        let start = bank.index() * FRAME_PIXELS;
        &mut self.map[start..start + FRAME_PIXELS]
    }

    /// Borrow one bank for reading and the other for writing.
    ///
    /// Resampling passes read one bank and write the other in place.
    pub fn split(&mut self, read: Bank) -> (&[u8], &mut [u8]) {
        let (primary, secondary) = self.map.split_at_mut(FRAME_PIXELS);
        match read {
            Bank::Primary => (primary, secondary),
            Bank::Secondary => (secondary, primary),
        }
    }

    /// Push the mapping to the backing file.
    pub fn flush(&self) -> ZoomResult<()> {
        self.map
            .flush()
            .map_err(|e| ZoomError::io("flush bank file", e))
    }
}
