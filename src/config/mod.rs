//! # Configuration Module
//!
//! Protocol timing shared by the library and the `rzoom` binary.

pub mod config;

pub use config::ZoomConfig;
