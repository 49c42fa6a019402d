//! # Region Sessions
//!
//! A [`RegionSession`] holds everything one regional zoom episode owns: the
//! selected rectangle, a snapshot of the frame that was on display, and one
//! cache slot per zoom level with the region's pixels at that level.
//!
//! ```text
//! slot:   [0]          [1]          [2]
//!         original     2x region    4x region
//!         (always)     (lazy)       (lazy)
//! ```
//!
//! Slot 0 is filled from the snapshot when the session is captured and stays
//! filled until teardown. Deeper slots are filled by the engine the first time
//! their level is computed and are kept for the rest of the session.

use tracing::{debug, info};

use crate::core::frame::{Bank, Frame, Region, REGION_LEVELS};
use crate::device::{FrameStore, RemoteLink};
use crate::error::{ZoomError, ZoomResult};
use crate::global::GlobalZoomLevel;

#[derive(Debug)]
pub struct RegionSession {
    region: Region,
    source_bank: Bank,
    background: Frame,
    /// Bank 0 as it was before the session, when the background came from bank 1.
    primary_before: Option<Frame>,
    slots: [Option<Vec<u8>>; REGION_LEVELS],
    level: usize,
    /// Whether the engine has written a composite to bank 0 yet.
    composited: bool,
}

impl RegionSession {
    /// Validate `region`, snapshot the frame on display and seed slot 0.
    ///
    /// The background is read from bank 1 when `global` is zoomed in, else from
    /// bank 0. The store is only read; nothing is written.
    pub fn capture<S: FrameStore>(
        link: &mut RemoteLink<S>,
        region: Region,
        global: GlobalZoomLevel,
    ) -> ZoomResult<Self> {
        region.validate()?;

        let source_bank = global.source_bank();
        let background = link.read_frame(source_bank)?;
        let primary_before = match source_bank {
            Bank::Secondary => Some(link.read_frame(Bank::Primary)?),
            Bank::Primary => None,
        };
        let original = background.extract(&region)?;

        info!(%region, %global, %source_bank, "region session captured");
        Ok(Self {
            region,
            source_bank,
            background,
            primary_before,
            slots: [Some(original), None, None],
            level: 0,
            composited: false,
        })
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn source_bank(&self) -> Bank {
        self.source_bank
    }

    pub fn background(&self) -> &Frame {
        &self.background
    }

    pub fn slot(&self, level: usize) -> Option<&[u8]> {
        self.slots.get(level)?.as_deref()
    }

    /// Occupancy of every cache slot, indexed by level.
    pub fn populated(&self) -> [bool; REGION_LEVELS] {
        std::array::from_fn(|level| self.slots[level].is_some())
    }

    /// Bank holding the frame currently on display.
    pub fn live_bank(&self) -> Bank {
        if self.composited {
            Bank::Primary
        } else {
            self.source_bank
        }
    }

    /// Like [`slot`](Self::slot), but an empty slot is a broken invariant.
    pub(crate) fn expect_slot(&self, level: usize) -> ZoomResult<&[u8]> {
        self.slot(level)
            .ok_or_else(|| ZoomError::cache_slot_missing(level))
    }

    /// Store `pixels` at `level` unless the slot is already filled.
    pub(crate) fn fill_slot(&mut self, level: usize, pixels: Vec<u8>) {
        debug_assert_eq!(pixels.len(), self.region.pixel_count());
        if self.slots[level].is_none() {
            debug!(level, bytes = pixels.len(), "cache slot filled");
            self.slots[level] = Some(pixels);
        }
    }

    pub(crate) fn set_level(&mut self, level: usize) {
        self.level = level;
    }

    pub(crate) fn mark_composited(&mut self) {
        self.composited = true;
    }

    /// Put the store back to the frames it held before the session.
    ///
    /// Hard reset, restore bank 0, restore bank 1 when the background was read
    /// from it, commit. Consumes the session, so the snapshot and every slot
    /// are released whatever the outcome.
    pub fn teardown<S: FrameStore>(self, link: &mut RemoteLink<S>) -> ZoomResult<()> {
        link.hard_reset();
        let primary = self.primary_before.as_ref().unwrap_or(&self.background);
        link.write_frame(primary, Bank::Primary)?;
        if self.source_bank == Bank::Secondary {
            link.write_frame(&self.background, Bank::Secondary)?;
        }
        link.commit();
        info!(region = %self.region, level = self.level, "region session torn down");
        Ok(())
    }
}
