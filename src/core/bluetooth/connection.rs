//! Bluetooth connection handling for the charger
//! This module drives one acquisition: scan, connect, discover attributes.

use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::BridgeConfig;
use crate::core::bluetooth::scanner::BluetoothScanner;
use crate::core::bluetooth::transport::{GattPeripheral, GattTransport};
use crate::core::bluetooth::types::{AcquireState, ConnectionHandle};
use crate::error::{BridgeError, Result};

/// Connection manager for the charger
pub struct ConnectionManager<T: GattTransport> {
    scanner: BluetoothScanner<T>,
    /// The radio is exclusive: one acquisition at a time, process-wide
    radio: Mutex<()>,
    discovery_attempts: u32,
    discovery_backoff: Duration,
}

impl<T: GattTransport> ConnectionManager<T> {
    pub fn new(transport: Arc<T>, config: &BridgeConfig) -> Self {
        Self {
            scanner: BluetoothScanner::new(transport, config.scan_window()),
            radio: Mutex::new(()),
            discovery_attempts: config.discovery_attempts.max(1),
            discovery_backoff: config.discovery_backoff(),
        }
    }

    /// Runs the acquisition state machine for `address`.
    ///
    /// Scan and connect are attempted once; discovery is retried with a
    /// fixed backoff. A handle is only returned from the ready state.
    pub async fn acquire(
        &self,
        address: &str,
        cancel_token: &CancellationToken,
    ) -> Result<ConnectionHandle<T::Peripheral>> {
        let _radio = tokio::select! {
            guard = self.radio.lock() => guard,
            _ = cancel_token.cancelled() => return Err(BridgeError::Cancelled),
        };

        let mut state = AcquireState::Idle;
        let result = self.run(address, cancel_token, &mut state).await;
        if let Err(e) = &result {
            error!("Acquisition of {} failed while {}: {}", address, state, e);
            state = AcquireState::Failed;
            info!("{}: {}", address, state);
        }
        result
    }

    async fn run(
        &self,
        address: &str,
        cancel_token: &CancellationToken,
        state: &mut AcquireState,
    ) -> Result<ConnectionHandle<T::Peripheral>> {
        Self::advance(address, state, AcquireState::Scanning);
        let peripheral = self.scanner.find(address, cancel_token).await?;
        Self::advance(address, state, AcquireState::Found);

        if peripheral.is_connected().await {
            info!("Device {} already connected.", address);
        } else {
            Self::advance(address, state, AcquireState::Connecting);
            peripheral.connect().await.map_err(|e| BridgeError::ConnectFailed {
                address: address.to_string(),
                reason: e.to_string(),
            })?;
        }

        Self::advance(address, state, AcquireState::Discovering);
        self.discover_with_retry(&peripheral, address, cancel_token).await?;

        Self::advance(address, state, AcquireState::Ready);
        Ok(ConnectionHandle::new(address.to_string(), peripheral))
    }

    async fn discover_with_retry(
        &self,
        peripheral: &T::Peripheral,
        address: &str,
        cancel_token: &CancellationToken,
    ) -> Result<()> {
        let mut attempt = 0;
        while attempt < self.discovery_attempts {
            match peripheral.discover_attributes().await {
                Ok(()) => {
                    info!("Attributes discovered on {} (attempt {})", address, attempt + 1);
                    return Ok(());
                }
                Err(e) => {
                    warn!("Discovery attempt {} on {} failed: {}", attempt + 1, address, e);
                    if attempt + 1 < self.discovery_attempts {
                        info!("Retrying discovery in {} ms...", self.discovery_backoff.as_millis());
                        tokio::select! {
                            _ = tokio::time::sleep(self.discovery_backoff) => {}
                            _ = cancel_token.cancelled() => return Err(BridgeError::Cancelled),
                        }
                    }
                }
            }
            attempt += 1;
        }

        Err(BridgeError::DiscoveryFailed {
            address: address.to_string(),
            attempts: self.discovery_attempts,
        })
    }

    fn advance(address: &str, state: &mut AcquireState, next: AcquireState) {
        info!("{}: {} -> {}", address, state, next);
        *state = next;
    }
}
