//! Core types, configuration, and time source for the EdgeHub trust layer.
//!
//! This crate holds everything the cryptographic components need from the
//! surrounding process: the [`Secret`] wrapper for key material loaded once at
//! startup, env-driven [`TrustConfig`], storage provider settings, and the
//! injectable [`Clock`] that every signing and verification call reads exactly
//! once.

mod clock;
mod config;
mod error;
mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{StorageConfig, TrustConfig};
pub use error::{ConfigError, ConfigResult};
pub use types::{AddressingStyle, Secret, StorageProvider};
