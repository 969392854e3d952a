//! Core functionality for the Pantabox bridge
//! This module contains the BLE acquisition layer and the charger domain.

pub mod bluetooth;
pub mod charger;

// Re-export commonly used types
pub use bluetooth::{BluestTransport, DeviceDirectory};
pub use charger::ChargerService;
