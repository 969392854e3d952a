//! Defines shared data structures for the Bluetooth module.

use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::core::bluetooth::transport::GattPeripheral;
use crate::error::Result;

/// Stages of one acquisition run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireState {
    Idle,
    Scanning,
    Found,
    Connecting,
    Discovering,
    Ready,
    Failed,
}

impl fmt::Display for AcquireState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Scanning => "scanning",
            Self::Found => "found",
            Self::Connecting => "connecting",
            Self::Discovering => "discovering",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

struct Link<P> {
    address: String,
    peripheral: P,
    /// One GATT operation in flight per link
    gatt_lock: Mutex<()>,
}

/// An established, attribute-discovered link to one charger.
///
/// Handles are only ever built by the connection manager once discovery
/// has succeeded. Clones share the same link and the same GATT lock, so
/// reads and writes through any clone are serialized.
pub struct ConnectionHandle<P> {
    link: Arc<Link<P>>,
}

impl<P> Clone for ConnectionHandle<P> {
    fn clone(&self) -> Self {
        Self {
            link: self.link.clone(),
        }
    }
}

impl<P: GattPeripheral> ConnectionHandle<P> {
    pub(crate) fn new(address: String, peripheral: P) -> Self {
        Self {
            link: Arc::new(Link {
                address,
                peripheral,
                gatt_lock: Mutex::new(()),
            }),
        }
    }

    pub fn address(&self) -> &str {
        &self.link.address
    }

    /// Whether the underlying link is still up
    pub async fn is_alive(&self) -> bool {
        self.link.peripheral.is_connected().await
    }

    /// Returns true if both handles refer to the same acquired link
    pub fn same_link(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.link, &other.link)
    }

    pub async fn read(&self, uuid: Uuid) -> Result<Vec<u8>> {
        let _gatt = self.link.gatt_lock.lock().await;
        self.link.peripheral.read_characteristic(uuid).await
    }

    pub async fn write(&self, uuid: Uuid, data: &[u8]) -> Result<()> {
        let _gatt = self.link.gatt_lock.lock().await;
        self.link.peripheral.write_characteristic(uuid, data).await
    }
}

impl<P> fmt::Debug for ConnectionHandle<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("address", &self.link.address)
            .finish()
    }
}
