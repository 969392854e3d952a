//! The seam between the acquisition logic and a concrete BLE stack.
//! The bridge only ever talks to the radio through these two traits, so the
//! scanner, connection manager and directory can run against any stack.

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::Result;

/// Radio-level operations: discovery scans.
#[async_trait::async_trait]
pub trait GattTransport: Send + Sync + 'static {
    /// A peripheral reported by a scan
    type Peripheral: GattPeripheral;

    /// Begin a discovery scan. Candidates arrive on the returned channel
    /// until [`GattTransport::stop_scan`] is called.
    async fn start_scan(&self) -> Result<mpsc::Receiver<Self::Peripheral>>;

    /// Stop the scan started by [`GattTransport::start_scan`]
    async fn stop_scan(&self) -> Result<()>;
}

/// Link-level operations on one peripheral.
#[async_trait::async_trait]
pub trait GattPeripheral: Clone + Send + Sync + 'static {
    /// The peripheral's address (upper-case MAC)
    fn address(&self) -> String;

    async fn is_connected(&self) -> bool;

    /// Establish the link-layer connection
    async fn connect(&self) -> Result<()>;

    /// Discover services and characteristics on a connected peripheral
    async fn discover_attributes(&self) -> Result<()>;

    async fn read_characteristic(&self, uuid: Uuid) -> Result<Vec<u8>>;

    async fn write_characteristic(&self, uuid: Uuid, data: &[u8]) -> Result<()>;
}
