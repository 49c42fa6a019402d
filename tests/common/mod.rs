//! Common test utilities and helpers for the regional zoom tests
//!
//! A recording wrapper around the simulated store, frame fixtures and
//! assertions shared by the integration tests.

#![allow(dead_code)]

/// Frame store wrapper that records every protocol call
pub mod recording_store {
    use regional_zoom::{Algorithm, Bank, FrameStore, HwError, SimulatedStore};

    /// One protocol call seen by the store. Pixel transfers are only counted.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Call {
        Reset,
        Pulse,
        Refresh,
        Trigger(Algorithm),
        PollDone(bool),
        PollError(bool),
        PollMaxZoom,
        PollMinZoom,
    }

    /// Records calls, then forwards them to the wrapped store
    pub struct RecordingStore<S = SimulatedStore> {
        inner: S,
        calls: Vec<Call>,
        stores: usize,
        loads: usize,
    }

    impl<S: FrameStore> RecordingStore<S> {
        pub fn new(inner: S) -> Self {
            Self {
                inner,
                calls: Vec::new(),
                stores: 0,
                loads: 0,
            }
        }

        pub fn inner(&self) -> &S {
            &self.inner
        }

        pub fn inner_mut(&mut self) -> &mut S {
            &mut self.inner
        }

        pub fn calls(&self) -> &[Call] {
            &self.calls
        }

        /// Forget everything recorded so far
        pub fn clear(&mut self) {
            self.calls.clear();
            self.stores = 0;
            self.loads = 0;
        }

        /// Number of `trigger_algorithm` calls
        pub fn triggers(&self) -> usize {
            self.calls
                .iter()
                .filter(|c| matches!(c, Call::Trigger(_)))
                .count()
        }

        /// Number of `get_flag_done` calls
        pub fn done_polls(&self) -> usize {
            self.calls
                .iter()
                .filter(|c| matches!(c, Call::PollDone(_)))
                .count()
        }

        pub fn stores(&self) -> usize {
            self.stores
        }

        pub fn loads(&self) -> usize {
            self.loads
        }

        /// Calls with consecutive done polls folded into one entry
        pub fn condensed(&self) -> Vec<Call> {
            let mut out: Vec<Call> = Vec::new();
            for &call in &self.calls {
                match (out.last(), call) {
                    (Some(Call::PollDone(false)), Call::PollDone(_)) => {
                        out.pop();
                        out.push(call);
                    }
                    _ => out.push(call),
                }
            }
            out
        }
    }

    impl<S: FrameStore> FrameStore for RecordingStore<S> {
        fn store(&mut self, address: u32, value: u8, bank: Bank) -> Result<(), HwError> {
            self.stores += 1;
            self.inner.store(address, value, bank)
        }

        fn load(&mut self, address: u32, bank: Bank) -> Result<u8, HwError> {
            self.loads += 1;
            self.inner.load(address, bank)
        }

        fn refresh(&mut self) {
            self.calls.push(Call::Refresh);
            self.inner.refresh()
        }

        fn reset(&mut self) {
            self.calls.push(Call::Reset);
            self.inner.reset()
        }

        fn pulse_enable(&mut self) {
            self.calls.push(Call::Pulse);
            self.inner.pulse_enable()
        }

        fn trigger_algorithm(&mut self, algorithm: Algorithm) {
            self.calls.push(Call::Trigger(algorithm));
            self.inner.trigger_algorithm(algorithm)
        }

        fn get_flag_done(&mut self) -> bool {
            let done = self.inner.get_flag_done();
            self.calls.push(Call::PollDone(done));
            done
        }

        fn get_flag_error(&mut self) -> bool {
            let error = self.inner.get_flag_error();
            self.calls.push(Call::PollError(error));
            error
        }

        fn get_flag_max_zoom(&mut self) -> bool {
            self.calls.push(Call::PollMaxZoom);
            self.inner.get_flag_max_zoom()
        }

        fn get_flag_min_zoom(&mut self) -> bool {
            self.calls.push(Call::PollMinZoom);
            self.inner.get_flag_min_zoom()
        }
    }
}

/// Test frame fixtures
pub mod test_frames {
    use regional_zoom::core::{FRAME_HEIGHT, FRAME_WIDTH};
    use regional_zoom::Frame;

    /// Build a frame from a per-pixel function
    pub fn frame_from(f: impl Fn(u32, u32) -> u8) -> Frame {
        let mut frame = Frame::new("test frame").expect("frame allocation");
        for y in 0..FRAME_HEIGHT {
            for x in 0..FRAME_WIDTH {
                frame.set_pixel(x, y, f(x, y));
            }
        }
        frame
    }

    /// Every pixel distinct enough that a misplaced copy shows up
    pub fn create_pattern_frame() -> Frame {
        frame_from(|x, y| ((x * 7 + y * 13) % 251) as u8)
    }

    /// 16-pixel checkerboard of 40 and 220
    pub fn create_checkerboard_frame() -> Frame {
        frame_from(|x, y| if (x / 16 + y / 16) % 2 == 0 { 40 } else { 220 })
    }

    pub fn create_solid_frame(value: u8) -> Frame {
        frame_from(|_, _| value)
    }
}

/// Engine and link builders
pub mod fixtures {
    use super::recording_store::RecordingStore;
    use regional_zoom::{
        Bank, Frame, GlobalZoomTracker, RemoteLink, SimulatedStore, ZoomCacheEngine, ZoomConfig,
    };

    pub type TestLink = RemoteLink<RecordingStore>;
    pub type TestEngine = ZoomCacheEngine<RecordingStore>;

    /// A link to a fresh simulated store, no protocol delays
    pub fn test_link() -> TestLink {
        let store = SimulatedStore::new().expect("simulated store");
        RemoteLink::new(RecordingStore::new(store), ZoomConfig::immediate()).expect("link")
    }

    /// A link with `frame` presented and the recording cleared
    pub fn presented(frame: &Frame) -> (GlobalZoomTracker, TestLink) {
        let mut link = test_link();
        let mut tracker = GlobalZoomTracker::new();
        tracker.present(&mut link, frame).expect("present frame");
        link.store_mut().clear();
        (tracker, link)
    }

    /// An engine whose store shows `frame` in bank 0
    pub fn engine_showing(frame: &Frame) -> TestEngine {
        let (_, link) = presented(frame);
        ZoomCacheEngine::new(link)
    }

    pub fn bank(engine: &TestEngine, bank: Bank) -> &[u8] {
        engine.link().store().inner().bank(bank)
    }
}

/// Custom assertions for testing
pub mod assertions {
    use regional_zoom::{Frame, Region};

    /// Assert that `pixels` holds exactly the region of `frame`
    pub fn assert_region_matches(pixels: &[u8], frame: &[u8], region: &Region) {
        assert_eq!(
            pixels.len(),
            region.pixel_count(),
            "Region buffer has {} bytes, expected {}",
            pixels.len(),
            region.pixel_count()
        );
        for (i, addr) in region.addresses().enumerate() {
            assert_eq!(
                pixels[i], frame[addr as usize],
                "Region pixel {} (address {}) differs",
                i, addr
            );
        }
    }

    /// Assert that a bank shows `background` everywhere outside `region`
    pub fn assert_background_outside(bank: &[u8], background: &Frame, region: &Region) {
        let width = regional_zoom::core::FRAME_WIDTH;
        for (addr, (&shown, &expected)) in bank.iter().zip(background.as_slice()).enumerate() {
            let (x, y) = (addr as u32 % width, addr as u32 / width);
            if !region.contains(x, y) {
                assert_eq!(shown, expected, "Background pixel ({}, {}) changed", x, y);
            }
        }
    }
}
