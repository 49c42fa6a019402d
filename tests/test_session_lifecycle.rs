//! Integration tests for region session lifecycle
//!
//! Construction checks, one-session-at-a-time, teardown on every exit path
//! and restoration of both banks.

mod common;

use common::fixtures::{bank, engine_showing, presented, test_link};
use common::recording_store::Call;
use common::test_frames::{create_checkerboard_frame, create_pattern_frame, create_solid_frame};
use regional_zoom::core::SharedBanks;
use regional_zoom::error::classify;
use regional_zoom::{
    Algorithm, Bank, Direction, Fault, GlobalZoomLevel, HwError, Recoverable, Region, RemoteLink,
    SimulatedStore, ZoomCacheEngine, ZoomConfig, ZoomError, ZoomResult,
};

#[test]
fn test_boundary_violations_create_no_session() {
    let mut engine = engine_showing(&create_pattern_frame());
    for region in [
        Region::new(0, 0, 0, 10),
        Region::new(0, 0, 10, 0),
        Region::new(311, 0, 10, 10),
        Region::new(0, 231, 10, 10),
        Region::from_corners(50, 50, 50, 80),
    ] {
        let err = engine
            .begin_session(region, GlobalZoomLevel::ZERO)
            .unwrap_err();
        assert!(
            matches!(err, ZoomError::BoundaryViolation { .. }),
            "{} should be rejected, got {}",
            region,
            err
        );
        assert!(err.is_recoverable());
    }
    assert_eq!(engine.active_session(), None);
    assert!(engine.link().store().calls().is_empty());
}

#[test]
fn test_region_touching_frame_edges_is_accepted() {
    let mut engine = engine_showing(&create_pattern_frame());
    let handle = engine
        .begin_session(Region::new(0, 0, 320, 240), GlobalZoomLevel::ZERO)
        .unwrap();
    engine.apply(handle, Direction::In).unwrap();
    engine.end_session(handle).unwrap();

    let handle = engine
        .begin_session(Region::new(319, 239, 1, 1), GlobalZoomLevel::ZERO)
        .unwrap();
    engine.apply(handle, Direction::In).unwrap();
    engine.end_session(handle).unwrap();
}

#[test]
fn test_only_one_session_at_a_time() {
    let mut engine = engine_showing(&create_pattern_frame());
    let first = engine
        .begin_session(Region::new(0, 0, 8, 8), GlobalZoomLevel::ZERO)
        .unwrap();

    let err = engine
        .begin_session(Region::new(20, 20, 8, 8), GlobalZoomLevel::ZERO)
        .unwrap_err();
    assert_eq!(err.category(), "session_active");
    assert_eq!(engine.session_status(first).unwrap().region, Region::new(0, 0, 8, 8));

    engine.end_session(first).unwrap();
    let second = engine
        .begin_session(Region::new(20, 20, 8, 8), GlobalZoomLevel::ZERO)
        .unwrap();
    assert_ne!(first, second);
    assert!(matches!(
        engine.session_status(first),
        Err(ZoomError::UnknownSession { .. })
    ));
}

#[test]
fn test_teardown_restores_frame_after_zooming() {
    let frame = create_checkerboard_frame();
    let mut engine = engine_showing(&frame);
    let handle = engine
        .begin_session(Region::new(40, 30, 100, 80), GlobalZoomLevel::ZERO)
        .unwrap();
    engine.apply(handle, Direction::In).unwrap();
    engine.apply(handle, Direction::In).unwrap();
    assert_ne!(bank(&engine, Bank::Primary), frame.as_slice());

    engine.link_mut().store_mut().clear();
    engine.end_session(handle).unwrap();

    assert_eq!(bank(&engine, Bank::Primary), frame.as_slice());
    assert_eq!(
        engine.link().store().calls(),
        &[Call::Reset, Call::Pulse, Call::Refresh]
    );
    assert_eq!(engine.active_session(), None);
}

#[test]
fn test_teardown_after_timeout_restores_frame() {
    let frame = create_pattern_frame();
    let mut engine = engine_showing(&frame);
    let handle = engine
        .begin_session(Region::new(10, 10, 50, 40), GlobalZoomLevel::ZERO)
        .unwrap();
    engine.apply(handle, Direction::In).unwrap();
    engine
        .link_mut()
        .store_mut()
        .inner_mut()
        .set_fault(Some(Fault::NeverDone));

    let err = engine.apply(handle, Direction::In).unwrap_err();
    assert!(classify::session_needs_teardown(&err));
    assert_eq!(engine.session_status(handle).unwrap().level, 1);

    engine.link_mut().store_mut().inner_mut().set_fault(None);
    engine.end_session(handle).unwrap();
    assert_eq!(bank(&engine, Bank::Primary), frame.as_slice());
}

#[test]
fn test_guard_tears_down_on_early_return() {
    fn zoom_until_failure(engine: &mut ZoomCacheEngine<impl regional_zoom::FrameStore>) -> ZoomResult<()> {
        let mut guard = engine.guard(Region::new(60, 60, 32, 32), GlobalZoomLevel::ZERO)?;
        guard.apply(Direction::In)?;
        guard.apply(Direction::In)?;
        guard.finish()
    }

    let frame = create_pattern_frame();
    let mut engine = engine_showing(&frame);
    engine
        .link_mut()
        .store_mut()
        .inner_mut()
        .set_fault(Some(Fault::DoneAfter(60)));

    let err = zoom_until_failure(&mut engine).unwrap_err();
    assert_eq!(err.category(), "hardware_timeout");
    assert_eq!(err.context().operation.as_deref(), Some("regional zoom in"));
    assert_eq!(engine.active_session(), None);
    assert_eq!(bank(&engine, Bank::Primary), frame.as_slice());
}

#[test]
fn test_guard_finish_reports_teardown_result() {
    let frame = create_pattern_frame();
    let mut engine = engine_showing(&frame);
    let mut guard = engine
        .guard(Region::new(5, 5, 20, 20), GlobalZoomLevel::ZERO)
        .unwrap();
    guard.apply(Direction::In).unwrap();
    assert_eq!(guard.status().unwrap().cache_map(), "[0 *1* _]");
    guard.finish().unwrap();

    assert_eq!(engine.active_session(), None);
    assert_eq!(bank(&engine, Bank::Primary), frame.as_slice());
}

#[test]
fn test_transfer_failure_is_reported_and_session_survives() {
    let frame = create_pattern_frame();
    let mut engine = engine_showing(&frame);
    let handle = engine
        .begin_session(Region::new(0, 0, 16, 16), GlobalZoomLevel::ZERO)
        .unwrap();

    engine
        .link_mut()
        .store_mut()
        .inner_mut()
        .set_fault(Some(Fault::TransferFails(HwError::Device(-3))));
    let err = engine.apply(handle, Direction::In).unwrap_err();
    assert!(matches!(
        err,
        ZoomError::Hardware { source: HwError::Device(-3), .. }
    ));
    assert_eq!(engine.session_status(handle).unwrap().level, 0);

    engine.link_mut().store_mut().inner_mut().set_fault(None);
    engine.apply(handle, Direction::In).unwrap();
    engine.end_session(handle).unwrap();
    assert_eq!(bank(&engine, Bank::Primary), frame.as_slice());
}

#[test]
fn test_teardown_restores_both_banks_when_background_came_from_secondary() {
    let frame = create_pattern_frame();
    let (mut tracker, mut link) = presented(&frame);
    tracker.zoom_in(&mut link, Algorithm::PixelReplication).unwrap();
    let primary_before = link.store().inner().bank(Bank::Primary).to_vec();
    let secondary_before = link.store().inner().bank(Bank::Secondary).to_vec();

    let mut engine = ZoomCacheEngine::new(link);
    let handle = engine
        .begin_session(Region::new(100, 100, 40, 30), tracker.level())
        .unwrap();
    assert_eq!(engine.session_status(handle).unwrap().source_bank, Bank::Secondary);
    engine.apply(handle, Direction::In).unwrap();
    engine.apply(handle, Direction::In).unwrap();
    engine.end_session(handle).unwrap();
    tracker.acknowledge_device_reset();

    assert_eq!(bank(&engine, Bank::Primary), primary_before.as_slice());
    assert_eq!(bank(&engine, Bank::Secondary), secondary_before.as_slice());
}

#[test]
fn test_sessions_share_file_backed_banks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("banks.raw");
    let frame = create_solid_frame(90);

    {
        let store = SimulatedStore::with_banks(SharedBanks::open(&path).unwrap()).unwrap();
        let mut link = RemoteLink::new(store, ZoomConfig::immediate()).unwrap();
        link.write_frame(&frame, Bank::Primary).unwrap();

        let mut engine = ZoomCacheEngine::new(link);
        let mut guard = engine
            .guard(Region::new(0, 0, 10, 10), GlobalZoomLevel::ZERO)
            .unwrap();
        guard.apply(Direction::In).unwrap();

        // A second mapping of the same file sees the composite.
        let viewer = SharedBanks::open(&path).unwrap();
        assert_eq!(viewer.bank(Bank::Primary), guard.link().store().bank(Bank::Primary));
        guard.finish().unwrap();
        engine.link().store().flush().unwrap();
    }

    let reopened = SharedBanks::open(&path).unwrap();
    assert_eq!(reopened.bank(Bank::Primary), frame.as_slice());
}

#[test]
fn test_unused_link_has_no_session() {
    let engine = ZoomCacheEngine::new(test_link());
    assert_eq!(engine.active_session(), None);
    assert!(engine.link().store().calls().is_empty());
}
