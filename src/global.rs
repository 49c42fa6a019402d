//! # Whole-Frame Zoom
//!
//! The whole-frame zoom level lives outside the region engine. It starts at 0
//! when a frame is presented, moves one step per whole-frame pass and stays in
//! `[-3, 3]`. A region session only reads it once, at construction, to learn
//! which bank holds the frame being looked at.

use std::fmt;

use tracing::{info, warn};

use crate::core::frame::{Bank, Frame};
use crate::device::{Algorithm, FrameStore, RemoteLink};
use crate::error::{ZoomError, ZoomResult};

/// Whole-frame zoom level in `[-3, 3]`; positive is zoomed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct GlobalZoomLevel(i8);

impl GlobalZoomLevel {
    pub const MIN: i8 = -3;
    pub const MAX: i8 = 3;
    pub const ZERO: Self = Self(0);

    pub fn new(level: i8) -> ZoomResult<Self> {
        if !(Self::MIN..=Self::MAX).contains(&level) {
            return Err(ZoomError::config(
                "global zoom level",
                level.to_string(),
                format!("must be between {} and {}", Self::MIN, Self::MAX),
            ));
        }
        Ok(Self(level))
    }

    pub fn value(self) -> i8 {
        self.0
    }

    /// Bank holding the frame on display at this level.
    ///
    /// A zoom-in result lives in bank 1. Level 0 and zoomed-out levels are read
    /// from bank 0.
    pub fn source_bank(self) -> Bank {
        if self.0 > 0 {
            Bank::Secondary
        } else {
            Bank::Primary
        }
    }
}

impl fmt::Display for GlobalZoomLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}", self.0)
    }
}

/// Result of a whole-frame zoom request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalStep {
    Applied { level: GlobalZoomLevel },
    /// Refused: the level or the store's max/min flag is at its limit.
    AtLimit,
}

/// Tracks the whole-frame zoom level across passes.
#[derive(Debug, Default)]
pub struct GlobalZoomTracker {
    level: GlobalZoomLevel,
}

impl GlobalZoomTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self) -> GlobalZoomLevel {
        self.level
    }

    pub fn source_bank(&self) -> Bank {
        self.level.source_bank()
    }

    /// Write `frame` to bank 0 and show it unzoomed.
    pub fn present<S: FrameStore>(&mut self, link: &mut RemoteLink<S>, frame: &Frame) -> ZoomResult<()> {
        link.hard_reset();
        link.write_frame(frame, Bank::Primary)?;
        link.commit();
        self.level = GlobalZoomLevel::ZERO;
        info!("frame presented");
        Ok(())
    }

    /// One whole-frame zoom-in step with a zoom-in algorithm.
    pub fn zoom_in<S: FrameStore>(
        &mut self,
        link: &mut RemoteLink<S>,
        algorithm: Algorithm,
    ) -> ZoomResult<GlobalStep> {
        if !algorithm.is_zoom_in() {
            return Err(ZoomError::config(
                "algorithm",
                algorithm.name(),
                "zoom-in needs NearestNeighbor or PixelReplication",
            ));
        }
        if self.level.0 >= GlobalZoomLevel::MAX || link.max_zoom_reached() {
            warn!(level = %self.level, "whole-frame zoom-in limit reached");
            return Ok(GlobalStep::AtLimit);
        }
        self.step(link, algorithm, 1)
    }

    /// One whole-frame zoom-out step with a zoom-out algorithm.
    pub fn zoom_out<S: FrameStore>(
        &mut self,
        link: &mut RemoteLink<S>,
        algorithm: Algorithm,
    ) -> ZoomResult<GlobalStep> {
        if algorithm.is_zoom_in() {
            return Err(ZoomError::config(
                "algorithm",
                algorithm.name(),
                "zoom-out needs Decimation or BlockAveraging",
            ));
        }
        if self.level.0 <= GlobalZoomLevel::MIN || link.min_zoom_reached() {
            warn!(level = %self.level, "whole-frame zoom-out limit reached");
            return Ok(GlobalStep::AtLimit);
        }
        self.step(link, algorithm, -1)
    }

    fn step<S: FrameStore>(
        &mut self,
        link: &mut RemoteLink<S>,
        algorithm: Algorithm,
        delta: i8,
    ) -> ZoomResult<GlobalStep> {
        link.run_algorithm(algorithm)
            .map_err(|e| e.with_operation("whole-frame zoom"))?;
        self.level = GlobalZoomLevel(self.level.0 + delta);
        info!(%algorithm, level = %self.level, "whole-frame zoom applied");
        Ok(GlobalStep::Applied { level: self.level })
    }

    /// Hard-reset the store and return to level 0.
    pub fn reset<S: FrameStore>(&mut self, link: &mut RemoteLink<S>) {
        link.hard_reset();
        self.level = GlobalZoomLevel::ZERO;
        info!("whole-frame zoom reset");
    }

    /// Record that the store was hard-reset by someone else (a region teardown).
    pub fn acknowledge_device_reset(&mut self) {
        self.level = GlobalZoomLevel::ZERO;
    }
}
