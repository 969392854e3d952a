//! Device directory: maps a charger address to a live connection handle.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::BridgeConfig;
use crate::core::bluetooth::connection::ConnectionManager;
use crate::core::bluetooth::transport::GattTransport;
use crate::core::bluetooth::types::ConnectionHandle;
use crate::error::Result;

/// Caches acquired links per address.
///
/// Entries are replaced on each successful acquisition and removed only
/// when a cached link is found to have dropped.
pub struct DeviceDirectory<T: GattTransport> {
    connection_manager: ConnectionManager<T>,
    handles: Mutex<HashMap<String, ConnectionHandle<T::Peripheral>>>,
}

impl<T: GattTransport> DeviceDirectory<T> {
    pub fn new(transport: Arc<T>, config: &BridgeConfig) -> Self {
        Self {
            connection_manager: ConnectionManager::new(transport, config),
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Returns a live handle for `address`, acquiring one if needed.
    ///
    /// A failed acquisition leaves the cache as it was.
    pub async fn resolve(
        &self,
        address: &str,
        cancel_token: &CancellationToken,
    ) -> Result<ConnectionHandle<T::Peripheral>> {
        let cached = self.handles.lock().await.get(address).cloned();
        if let Some(handle) = cached {
            if handle.is_alive().await {
                debug!("Reusing cached link to {}", address);
                return Ok(handle);
            }
            warn!("Cached link to {} has dropped, reacquiring", address);
            let mut handles = self.handles.lock().await;
            if handles.get(address).is_some_and(|h| h.same_link(&handle)) {
                handles.remove(address);
            }
        }

        let handle = self.connection_manager.acquire(address, cancel_token).await?;
        self.handles
            .lock()
            .await
            .insert(address.to_string(), handle.clone());
        info!("Link to {} stored in the directory.", address);
        Ok(handle)
    }

    /// Number of cached links
    pub async fn len(&self) -> usize {
        self.handles.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.handles.lock().await.is_empty()
    }
}
