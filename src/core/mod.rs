//! # Core Frame Infrastructure
//!
//! Frame geometry, fallible buffer allocation and the memory-mapped bank
//! storage shared by the simulated frame store.

pub mod frame;
pub mod shared_banks;

pub use frame::{
    alloc_pixels, Bank, Frame, Region, FRAME_HEIGHT, FRAME_PIXELS, FRAME_WIDTH, REGION_LEVELS,
};
pub use shared_banks::SharedBanks;
