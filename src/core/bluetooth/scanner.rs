use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use crate::core::bluetooth::transport::{GattPeripheral, GattTransport};
use crate::error::{BridgeError, Result};

/// Looks for one specific peripheral within a bounded scan window
pub struct BluetoothScanner<T: GattTransport> {
    transport: Arc<T>,
    window: Duration,
}

impl<T: GattTransport> BluetoothScanner<T> {
    pub fn new(transport: Arc<T>, window: Duration) -> Self {
        Self { transport, window }
    }

    /// Scans until a peripheral whose address equals `address` is seen,
    /// the window elapses, or `cancel_token` fires. The scan is always
    /// stopped before returning.
    pub async fn find(
        &self,
        address: &str,
        cancel_token: &CancellationToken,
    ) -> Result<T::Peripheral> {
        info!("Scanning for {} ({} ms window)", address, self.window.as_millis());
        let mut candidates = self.transport.start_scan().await?;
        let deadline = Instant::now() + self.window;
        let mut stream_open = true;

        let outcome = loop {
            tokio::select! {
                candidate = candidates.recv(), if stream_open => {
                    match candidate {
                        Some(peripheral) => {
                            let candidate_address = peripheral.address();
                            debug!("Found device - Address: {}", candidate_address);
                            if candidate_address == address {
                                info!("Found target device {}", address);
                                break Ok(peripheral);
                            }
                        }
                        None => {
                            // Nothing more will arrive, but the window still bounds the call.
                            info!("Bluetooth scan stream has ended.");
                            stream_open = false;
                        }
                    }
                }
                _ = sleep_until(deadline) => {
                    info!("Scan window elapsed without seeing {}", address);
                    break Err(BridgeError::NotFound(address.to_string()));
                }
                _ = cancel_token.cancelled() => {
                    info!("Scan for {} cancelled", address);
                    break Err(BridgeError::Cancelled);
                }
            }
        };

        // Close the channel first so a scan task blocked on a full buffer can exit.
        drop(candidates);
        if let Err(e) = self.transport.stop_scan().await {
            warn!("Failed to stop scan: {}", e);
        }
        outcome
    }
}
