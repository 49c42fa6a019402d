//! # Zoom Cache Engine
//!
//! Drives regional zoom over a frame store that only knows whole frames.
//! Every transition rebuilds bank 0 as background plus region overlay, so the
//! store never shows a half-composited frame to a viewer.
//!
//! ## Transitions
//!
//! | From level | Direction | Slot of target | Work                                         |
//! |------------|-----------|----------------|----------------------------------------------|
//! | 0          | Out       | n/a            | none                                         |
//! | 2          | In        | n/a            | none                                         |
//! | z > 0      | Out       | filled         | composite slot `z-1`                         |
//! | z < 2      | In        | filled         | composite slot `z+1`                         |
//! | z < 2      | In        | empty          | run NearestNeighbor, harvest, composite      |
//!
//! Slots are never evicted during a session, so revisiting a level replays the
//! cached pixels instead of running the hardware again.
//!
//! ## Sessions
//!
//! One session is active at a time. [`ZoomCacheEngine::begin_session`] hands out
//! a [`SessionHandle`]; [`ZoomCacheEngine::guard`] wraps the same thing in a
//! [`RegionGuard`] that tears the session down when dropped.
//!
//! ```rust
//! use regional_zoom::config::ZoomConfig;
//! use regional_zoom::core::{Frame, Region};
//! use regional_zoom::device::{RemoteLink, SimulatedStore};
//! use regional_zoom::engine::{Direction, ZoomCacheEngine};
//! use regional_zoom::global::GlobalZoomTracker;
//!
//! # fn main() -> Result<(), regional_zoom::error::ZoomError> {
//! let mut link = RemoteLink::new(SimulatedStore::new()?, ZoomConfig::immediate())?;
//! let mut tracker = GlobalZoomTracker::new();
//! tracker.present(&mut link, &Frame::gradient()?)?;
//!
//! let mut engine = ZoomCacheEngine::new(link);
//! let mut guard = engine.guard(Region::new(10, 10, 50, 40), tracker.level())?;
//! guard.apply(Direction::In)?;
//! assert_eq!(guard.status()?.level, 1);
//! guard.finish()?;
//! tracker.acknowledge_device_reset();
//! # Ok(())
//! # }
//! ```

use std::fmt;

use tracing::{debug, info, warn};

use crate::core::frame::{Bank, Region, REGION_LEVELS};
use crate::device::{Algorithm, FrameStore, RemoteLink};
use crate::error::{ErrorSeverity, ZoomError, ZoomResult};
use crate::global::GlobalZoomLevel;
use crate::session::RegionSession;

/// Pass used to compute a deeper region level.
pub const REGION_ALGORITHM: Algorithm = Algorithm::NearestNeighbor;

/// Names the active region session of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle(u64);

impl SessionHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::In => f.write_str("in"),
            Direction::Out => f.write_str("out"),
        }
    }
}

/// Where the pixels of the new level came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelSource {
    CacheHit,
    Computed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Transitioned {
        from: usize,
        to: usize,
        source: LevelSource,
    },
    /// Already at the outermost or innermost level; nothing was touched.
    AtLimit,
}

/// Snapshot of a session for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub handle: SessionHandle,
    pub region: Region,
    pub level: usize,
    pub populated: [bool; REGION_LEVELS],
    pub source_bank: Bank,
}

impl SessionStatus {
    /// Cache occupancy as `[0 *1* _]`: filled levels by number, the current
    /// level starred, empty levels as `_`.
    pub fn cache_map(&self) -> String {
        let cells: Vec<String> = self
            .populated
            .iter()
            .enumerate()
            .map(|(level, &filled)| match (filled, level == self.level) {
                (_, true) => format!("*{}*", level),
                (true, false) => level.to_string(),
                (false, false) => "_".to_string(),
            })
            .collect();
        format!("[{}]", cells.join(" "))
    }
}

struct ActiveSession {
    handle: SessionHandle,
    session: RegionSession,
}

/// Owns the store link and at most one region session.
pub struct ZoomCacheEngine<S> {
    link: RemoteLink<S>,
    active: Option<ActiveSession>,
    next_id: u64,
}

impl<S: FrameStore> ZoomCacheEngine<S> {
    pub fn new(link: RemoteLink<S>) -> Self {
        Self {
            link,
            active: None,
            next_id: 1,
        }
    }

    pub fn link(&self) -> &RemoteLink<S> {
        &self.link
    }

    /// Direct store access, for whole-frame work between sessions.
    pub fn link_mut(&mut self) -> &mut RemoteLink<S> {
        &mut self.link
    }

    pub fn into_link(self) -> RemoteLink<S> {
        self.link
    }

    pub fn active_session(&self) -> Option<SessionHandle> {
        self.active.as_ref().map(|a| a.handle)
    }

    /// Capture a region session over the frame on display.
    ///
    /// Fails with `SessionActive` while another session is open, and with
    /// `BoundaryViolation` for empty or out-of-frame regions.
    pub fn begin_session(&mut self, region: Region, global: GlobalZoomLevel) -> ZoomResult<SessionHandle> {
        if let Some(active) = &self.active {
            return Err(ZoomError::session_active(active.handle.0));
        }
        let session = RegionSession::capture(&mut self.link, region, global)
            .map_err(|e| e.with_operation("begin region session"))?;

        let handle = SessionHandle(self.next_id);
        self.next_id += 1;
        self.active = Some(ActiveSession { handle, session });
        info!(%handle, %region, "region session started");
        Ok(handle)
    }

    /// Begin a session wrapped in a guard that tears it down on drop.
    pub fn guard(&mut self, region: Region, global: GlobalZoomLevel) -> ZoomResult<RegionGuard<'_, S>> {
        let handle = self.begin_session(region, global)?;
        Ok(RegionGuard {
            engine: self,
            handle,
            finished: false,
        })
    }

    pub fn session(&self, handle: SessionHandle) -> ZoomResult<&RegionSession> {
        match &self.active {
            Some(active) if active.handle == handle => Ok(&active.session),
            _ => Err(ZoomError::unknown_session(handle.0)),
        }
    }

    pub fn session_status(&self, handle: SessionHandle) -> ZoomResult<SessionStatus> {
        let session = self.session(handle)?;
        Ok(SessionStatus {
            handle,
            region: *session.region(),
            level: session.level(),
            populated: session.populated(),
            source_bank: session.source_bank(),
        })
    }

    /// Move the session one level in or out.
    ///
    /// On failure the level is unchanged. A failure after the store was reset
    /// may leave bank 0 without the region overlay; applying again or ending
    /// the session brings it back to a consistent frame.
    pub fn apply(&mut self, handle: SessionHandle, direction: Direction) -> ZoomResult<ApplyOutcome> {
        let (link, session) = match self.active.as_mut() {
            Some(active) if active.handle == handle => (&mut self.link, &mut active.session),
            _ => return Err(ZoomError::unknown_session(handle.0)),
        };
        let operation = format!("regional zoom {}", direction);
        let outcome = match direction {
            Direction::Out => zoom_out(link, session),
            Direction::In => zoom_in(link, session),
        }
        .map_err(|e| e.with_operation(operation))?;

        if let ApplyOutcome::Transitioned { from, to, source } = outcome {
            info!(%handle, from, to, ?source, "region level changed");
        }
        Ok(outcome)
    }

    /// Tear the session down and restore the frames it replaced.
    ///
    /// The session is released even when the restore fails.
    pub fn end_session(&mut self, handle: SessionHandle) -> ZoomResult<()> {
        match self.active.take() {
            Some(active) if active.handle == handle => active
                .session
                .teardown(&mut self.link)
                .map_err(|e| e.with_operation("end region session")),
            other => {
                self.active = other;
                Err(ZoomError::unknown_session(handle.0))
            }
        }
    }
}

/// Background to bank 0, region pixels over it, commit.
fn composite<S: FrameStore>(
    link: &mut RemoteLink<S>,
    session: &RegionSession,
    pixels: &[u8],
) -> ZoomResult<()> {
    link.hard_reset();
    link.write_frame(session.background(), Bank::Primary)?;
    link.overlay_region(session.region(), pixels, Bank::Primary)?;
    link.commit();
    Ok(())
}

fn zoom_out<S: FrameStore>(link: &mut RemoteLink<S>, session: &mut RegionSession) -> ZoomResult<ApplyOutcome> {
    let from = session.level();
    if from == 0 {
        debug!("region already at its original size");
        return Ok(ApplyOutcome::AtLimit);
    }
    let to = from - 1;

    composite(link, session, session.expect_slot(to)?)?;
    session.mark_composited();
    session.set_level(to);
    Ok(ApplyOutcome::Transitioned {
        from,
        to,
        source: LevelSource::CacheHit,
    })
}

fn zoom_in<S: FrameStore>(link: &mut RemoteLink<S>, session: &mut RegionSession) -> ZoomResult<ApplyOutcome> {
    let from = session.level();
    if from + 1 >= REGION_LEVELS {
        debug!("region zoom limit reached");
        return Ok(ApplyOutcome::AtLimit);
    }
    let to = from + 1;

    if let Some(cached) = session.slot(to) {
        composite(link, session, cached)?;
        session.mark_composited();
        session.set_level(to);
        return Ok(ApplyOutcome::Transitioned {
            from,
            to,
            source: LevelSource::CacheHit,
        });
    }

    let region = *session.region();

    // Keep the departing level so zooming back out can replay it exactly.
    let live = link.read_frame(session.live_bank())?;
    if session.slot(from).is_none() {
        session.fill_slot(from, live.extract(&region)?);
    }

    link.hard_reset();
    link.write_frame(&live, Bank::Primary)?;
    link.commit();
    session.mark_composited();
    drop(live);

    if let Err(e) = link.run_algorithm(REGION_ALGORITHM) {
        warn!(level = from, error = %e, "region pass failed, level kept");
        return Err(e);
    }

    let zoomed = link
        .read_region(&region, Bank::Secondary)
        .map_err(store_already_rewritten)?;
    // Cache first so a failed composite does not cost another pass.
    session.fill_slot(to, zoomed);
    composite(link, session, session.expect_slot(to)?)?;
    session.set_level(to);
    Ok(ApplyOutcome::Transitioned {
        from,
        to,
        source: LevelSource::Computed,
    })
}

/// Allocation failures after bank 0 was rewritten leave the session suspect.
fn store_already_rewritten(error: ZoomError) -> ZoomError {
    match error {
        ZoomError::Allocation { .. } => error.with_severity(ErrorSeverity::Critical),
        other => other,
    }
}

/// A region session that is torn down when the guard goes out of scope.
///
/// Use [`finish`](RegionGuard::finish) to observe the teardown result; a drop
/// without `finish` logs a failed teardown instead.
pub struct RegionGuard<'a, S: FrameStore> {
    engine: &'a mut ZoomCacheEngine<S>,
    handle: SessionHandle,
    finished: bool,
}

impl<S: FrameStore> RegionGuard<'_, S> {
    pub fn handle(&self) -> SessionHandle {
        self.handle
    }

    pub fn apply(&mut self, direction: Direction) -> ZoomResult<ApplyOutcome> {
        self.engine.apply(self.handle, direction)
    }

    pub fn status(&self) -> ZoomResult<SessionStatus> {
        self.engine.session_status(self.handle)
    }

    pub fn session(&self) -> ZoomResult<&RegionSession> {
        self.engine.session(self.handle)
    }

    pub fn link(&self) -> &RemoteLink<S> {
        self.engine.link()
    }

    pub fn finish(mut self) -> ZoomResult<()> {
        self.finished = true;
        self.engine.end_session(self.handle)
    }
}

impl<S: FrameStore> Drop for RegionGuard<'_, S> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.engine.end_session(self.handle) {
            warn!(handle = %self.handle, error = %e, "region teardown on drop failed");
        }
    }
}
