//! Pantabox Bridge library
//! Locates a Pantabox EV charger over Bluetooth Low Energy, decodes its
//! fixed-layout characteristics and merges partial settings updates into
//! complete settings writes.

// Module declarations
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod state;
pub mod utils;

pub use error::{BridgeError, Result};
