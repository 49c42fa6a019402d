//! # Simulated Frame Store
//!
//! An in-process [`FrameStore`] over [`SharedBanks`]. It behaves like the
//! hardware as far as the zoom engine can observe:
//!
//! - a pass reads bank 0, or bank 1 when it follows another pass without a
//!   reset in between (whole-frame zooms chain), and always writes bank 1
//! - every zoom-in pass moves a step counter up, every zoom-out pass down; the
//!   max/min flags rise at ±3 and a pass beyond them finishes with the error flag
//! - a reset clears the flags, the step counter and the chaining state, but not
//!   pixel memory
//!
//! Faults can be injected to exercise the timeout and error paths, and every
//! protocol call is counted.

use std::fmt;

use tracing::warn;
use zoom_kernels::{build_plan, KernelRunner, FRAME};

use crate::core::frame::{alloc_pixels, Bank, FRAME_PIXELS};
use crate::core::shared_banks::SharedBanks;
use crate::device::{Algorithm, FrameStore};
use crate::error::{HwError, ZoomResult};

/// Whole-frame steps the store allows in either direction.
pub const MAX_STEPS: i32 = 3;

/// Misbehaviour injected into the simulated store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The done flag never rises.
    NeverDone,
    /// Passes complete with the error flag raised.
    ErrorFlag,
    /// The done flag rises on the n-th poll after a trigger.
    DoneAfter(u32),
    /// Every pixel transfer fails.
    TransferFails(HwError),
}

/// Calls observed by the store.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StoreCounters {
    pub triggers: u64,
    pub done_polls: u64,
    pub acknowledgements: u64,
    pub resets: u64,
    pub refreshes: u64,
    pub stores: u64,
    pub loads: u64,
}

struct Pass {
    /// Polls until done; `None` never completes.
    polls_left: Option<u32>,
}

pub struct SimulatedStore {
    banks: SharedBanks,
    kernels: KernelRunner,
    scratch: Vec<u8>,
    fault: Option<Fault>,
    pass: Option<Pass>,
    done: bool,
    error: bool,
    chained: bool,
    step: i32,
    last_algorithm: Option<Algorithm>,
    counters: StoreCounters,
}

impl fmt::Debug for SimulatedStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedStore")
            .field("fault", &self.fault)
            .field("step", &self.step)
            .field("done", &self.done)
            .field("error", &self.error)
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}

impl SimulatedStore {
    /// A store over anonymous banks, both black.
    pub fn new() -> ZoomResult<Self> {
        Self::with_banks(SharedBanks::anonymous()?)
    }

    pub fn with_banks(banks: SharedBanks) -> ZoomResult<Self> {
        Ok(Self {
            banks,
            kernels: KernelRunner::new(),
            scratch: alloc_pixels(FRAME_PIXELS, "pass scratch")?,
            fault: None,
            pass: None,
            done: false,
            error: false,
            chained: false,
            step: 0,
            last_algorithm: None,
            counters: StoreCounters::default(),
        })
    }

    pub fn set_fault(&mut self, fault: Option<Fault>) {
        self.fault = fault;
    }

    pub fn bank(&self, bank: Bank) -> &[u8] {
        self.banks.bank(bank)
    }

    pub fn banks(&self) -> &SharedBanks {
        &self.banks
    }

    pub fn step(&self) -> i32 {
        self.step
    }

    pub fn last_algorithm(&self) -> Option<Algorithm> {
        self.last_algorithm
    }

    pub fn counters(&self) -> &StoreCounters {
        &self.counters
    }

    pub fn reset_counters(&mut self) {
        self.counters = StoreCounters::default();
    }

    pub fn triggers(&self) -> u64 {
        self.counters.triggers
    }

    pub fn done_polls(&self) -> u64 {
        self.counters.done_polls
    }

    pub fn acknowledgements(&self) -> u64 {
        self.counters.acknowledgements
    }

    /// Push both banks to their backing file.
    pub fn flush(&self) -> ZoomResult<()> {
        self.banks.flush()
    }

    fn check_transfer(&self, address: u32) -> Result<(), HwError> {
        if let Some(Fault::TransferFails(e)) = self.fault {
            return Err(e);
        }
        if address as usize >= FRAME_PIXELS {
            return Err(HwError::InvalidAddress(address));
        }
        Ok(())
    }

    fn execute(&mut self, algorithm: Algorithm) -> Result<(), zoom_kernels::KernelError> {
        let plan = build_plan(algorithm, FRAME);
        if self.chained {
            self.scratch.copy_from_slice(self.banks.bank(Bank::Secondary));
            self.kernels
                .run(&plan, &self.scratch, self.banks.bank_mut(Bank::Secondary))
        } else {
            let (src, dst) = self.banks.split(Bank::Primary);
            self.kernels.run(&plan, src, dst)
        }
    }
}

impl FrameStore for SimulatedStore {
    fn store(&mut self, address: u32, value: u8, bank: Bank) -> Result<(), HwError> {
        self.counters.stores += 1;
        self.check_transfer(address)?;
        self.banks.bank_mut(bank)[address as usize] = value;
        Ok(())
    }

    fn load(&mut self, address: u32, bank: Bank) -> Result<u8, HwError> {
        self.counters.loads += 1;
        self.check_transfer(address)?;
        Ok(self.banks.bank(bank)[address as usize])
    }

    fn refresh(&mut self) {
        self.counters.refreshes += 1;
    }

    fn reset(&mut self) {
        self.counters.resets += 1;
        self.pass = None;
        self.done = false;
        self.error = false;
        self.chained = false;
        self.step = 0;
    }

    fn pulse_enable(&mut self) {
        if self.done {
            self.counters.acknowledgements += 1;
            self.done = false;
        }
    }

    fn trigger_algorithm(&mut self, algorithm: Algorithm) {
        self.counters.triggers += 1;
        self.last_algorithm = Some(algorithm);
        self.done = false;
        self.error = false;

        let delta = if algorithm.is_zoom_in() { 1 } else { -1 };
        let at_limit = (self.step + delta).abs() > MAX_STEPS;
        if at_limit || self.fault == Some(Fault::ErrorFlag) {
            self.error = true;
        } else if let Err(e) = self.execute(algorithm) {
            warn!(%algorithm, error = %e, "simulated pass failed");
            self.error = true;
        } else {
            self.step += delta;
            self.chained = true;
        }

        let polls_left = match self.fault {
            Some(Fault::NeverDone) => None,
            Some(Fault::DoneAfter(n)) => Some(n.max(1)),
            _ => Some(1),
        };
        self.pass = Some(Pass { polls_left });
    }

    fn get_flag_done(&mut self) -> bool {
        self.counters.done_polls += 1;
        if let Some(pass) = self.pass.as_mut() {
            if let Some(left) = pass.polls_left.as_mut() {
                *left -= 1;
                if *left == 0 {
                    self.done = true;
                    self.pass = None;
                }
            }
        }
        self.done
    }

    fn get_flag_error(&mut self) -> bool {
        self.error
    }

    fn get_flag_max_zoom(&mut self) -> bool {
        self.step >= MAX_STEPS
    }

    fn get_flag_min_zoom(&mut self) -> bool {
        self.step <= -MAX_STEPS
    }
}
