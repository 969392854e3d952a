//! Bluetooth functionality for the Pantabox bridge
//! This module handles locating the charger, maintaining the link to it,
//! and reading/writing its characteristics.

mod bluest_transport;
mod connection;
mod constants;
mod directory;
mod scanner;
mod transport;
mod types;

// Re-export types that should be publicly accessible
pub use bluest_transport::{BluestPeripheral, BluestTransport};
pub use connection::ConnectionManager;
pub use constants::*; // Re-export all constants
pub use directory::DeviceDirectory;
pub use scanner::BluetoothScanner;
pub use transport::{GattPeripheral, GattTransport};
pub use types::{AcquireState, ConnectionHandle};
