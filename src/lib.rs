//! # Regional Zoom Library
//!
//! Independent zoom of a user-selected rectangle on a remote 320×240 grayscale
//! frame store that only understands two whole-frame banks.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//! - `core`: frame geometry, fallible buffers and memory-mapped bank storage
//! - `device`: the frame-store contract, the polling link and a simulated store
//! - `session`: the per-episode region state and its cache slots
//! - `engine`: zoom-in/zoom-out transitions, session handles and guards
//! - `global`: the whole-frame zoom level kept outside the region engine
//! - `config`: protocol timing
//! - `error`: error type and classification
//!
//! ## Example
//!
//! ```rust
//! use regional_zoom::{
//!     Direction, Frame, GlobalZoomTracker, Region, RemoteLink, SimulatedStore, ZoomCacheEngine,
//!     ZoomConfig,
//! };
//!
//! # fn main() -> Result<(), regional_zoom::ZoomError> {
//! let mut link = RemoteLink::new(SimulatedStore::new()?, ZoomConfig::immediate())?;
//! let mut tracker = GlobalZoomTracker::new();
//! tracker.present(&mut link, &Frame::gradient()?)?;
//!
//! let mut engine = ZoomCacheEngine::new(link);
//! let handle = engine.begin_session(Region::new(100, 80, 64, 48), tracker.level())?;
//! engine.apply(handle, Direction::In)?;
//! engine.apply(handle, Direction::Out)?;
//! engine.end_session(handle)?;
//! tracker.acknowledge_device_reset();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod device;
pub mod engine;
pub mod error;
pub mod global;
pub mod session;

/// Re-export error types for convenience
pub use error::{
    HasRecoverySuggestion, HasSeverity, HwError, Recoverable, Retryable, ZoomError, ZoomResult,
};

pub use config::ZoomConfig;
pub use self::core::{Bank, Frame, Region};
pub use device::{Algorithm, Fault, FrameStore, RemoteLink, SimulatedStore};
pub use engine::{
    ApplyOutcome, Direction, LevelSource, RegionGuard, SessionHandle, SessionStatus,
    ZoomCacheEngine,
};
pub use global::{GlobalStep, GlobalZoomLevel, GlobalZoomTracker};
pub use session::RegionSession;
