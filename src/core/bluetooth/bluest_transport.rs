//! bluest-backed implementation of the transport traits
//! Scans run in a background task that forwards candidates over a channel,
//! mirroring how the radio hands out advertisements.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

use bluest::{Adapter, Characteristic, Device};
use futures_util::StreamExt;
use log::{debug, error, info};
use regex::Regex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::core::bluetooth::transport::{GattPeripheral, GattTransport};
use crate::error::{BridgeError, Result};

const SCAN_CHANNEL_CAPACITY: usize = 32;

static MAC_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9A-Fa-f]{2}[:-]){5}([0-9A-Fa-f]{2})").expect("MAC address pattern is valid")
});

struct ScanTask {
    cancel_token: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct BluestTransport {
    adapter: Adapter,
    scan_task: Mutex<Option<ScanTask>>,
}

impl BluestTransport {
    /// Opens the default adapter and waits for it to become available
    pub async fn new() -> Result<Self> {
        let adapter = Adapter::default()
            .await
            .ok_or_else(|| BridgeError::Adapter("No Bluetooth adapter found".to_string()))?;
        adapter
            .wait_available()
            .await
            .map_err(|e| BridgeError::Adapter(e.to_string()))?;
        info!("Bluetooth adapter is available.");
        Ok(Self {
            adapter,
            scan_task: Mutex::new(None),
        })
    }

    async fn internal_scan_task(
        adapter: Adapter,
        tx: mpsc::Sender<BluestPeripheral>,
        cancel_token: CancellationToken,
    ) -> Result<()> {
        // A connected charger no longer advertises, so report those first.
        info!("Checking for connected devices");
        for device in adapter.connected_devices().await? {
            let peripheral = BluestPeripheral::new(adapter.clone(), device);
            if !forward(&tx, peripheral, &cancel_token).await {
                return Ok(());
            }
        }

        info!("Starting bluetooth scan");
        let mut scan_stream = adapter.scan(&[]).await?;
        loop {
            tokio::select! {
                result = scan_stream.next() => {
                    match result {
                        Some(discovered_device) => {
                            debug!(
                                "Found device - Device: {:?}, RSSI: {:?}",
                                discovered_device.device, discovered_device.rssi
                            );
                            let peripheral = BluestPeripheral::new(adapter.clone(), discovered_device.device);
                            if !forward(&tx, peripheral, &cancel_token).await {
                                break;
                            }
                        }
                        None => {
                            info!("Bluetooth scan stream has ended.");
                            break;
                        }
                    }
                }
                _ = cancel_token.cancelled() => {
                    break;
                }
            }
        }
        Ok(())
    }

    fn take_scan_task(&self) -> Option<ScanTask> {
        lock(&self.scan_task).take()
    }
}

#[async_trait::async_trait]
impl GattTransport for BluestTransport {
    type Peripheral = BluestPeripheral;

    async fn start_scan(&self) -> Result<mpsc::Receiver<BluestPeripheral>> {
        if let Some(stale) = self.take_scan_task() {
            info!("Cancelling previous scan task before starting a new one.");
            stale.cancel_token.cancel();
        }

        let (tx, rx) = mpsc::channel(SCAN_CHANNEL_CAPACITY);
        let cancel_token = CancellationToken::new();
        let cancel_token_for_task = cancel_token.clone();
        let adapter_for_task = self.adapter.clone();

        let handle = tokio::spawn(async move {
            if let Err(e) = Self::internal_scan_task(adapter_for_task, tx, cancel_token_for_task).await {
                error!("Scan task finished with an error: {}", e);
            }
        });

        *lock(&self.scan_task) = Some(ScanTask { cancel_token, handle });
        info!("Device scan task started.");
        Ok(rx)
    }

    async fn stop_scan(&self) -> Result<()> {
        info!("Stopping Bluetooth scan.");
        let Some(task) = self.take_scan_task() else {
            info!("No active scan task handle found to wait for.");
            return Ok(());
        };
        task.cancel_token.cancel();
        match task.handle.await {
            Ok(()) => info!("Scan task finished after cancellation."),
            Err(e) if e.is_cancelled() => info!("Scan task was cancelled successfully."),
            Err(e) => error!("Scan task finished with an unexpected join error: {:?}", e),
        }
        Ok(())
    }
}

/// A peripheral seen by a bluest scan, with its discovered characteristics
#[derive(Clone)]
pub struct BluestPeripheral {
    adapter: Adapter,
    device: Device,
    address: String,
    characteristics: Arc<Mutex<HashMap<Uuid, Characteristic>>>,
}

impl BluestPeripheral {
    fn new(adapter: Adapter, device: Device) -> Self {
        let id = device.id().to_string();
        let address = extract_mac_address(&id).unwrap_or(id);
        Self {
            adapter,
            device,
            address,
            characteristics: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn characteristic(&self, uuid: Uuid) -> Result<Characteristic> {
        lock(&self.characteristics)
            .get(&uuid)
            .cloned()
            .ok_or_else(|| BridgeError::CharacteristicUnavailable {
                uuid,
                reason: "not found".to_string(),
            })
    }
}

#[async_trait::async_trait]
impl GattPeripheral for BluestPeripheral {
    fn address(&self) -> String {
        self.address.clone()
    }

    async fn is_connected(&self) -> bool {
        self.device.is_connected().await
    }

    async fn connect(&self) -> Result<()> {
        info!("Initiating connection to {}...", self.address);
        self.adapter.connect_device(&self.device).await?;
        Ok(())
    }

    async fn discover_attributes(&self) -> Result<()> {
        let mut found = HashMap::new();
        for service in self.device.discover_services().await? {
            debug!("Available service: {}", service.uuid());
            for characteristic in service.discover_characteristics().await? {
                found.insert(characteristic.uuid(), characteristic);
            }
        }
        if found.is_empty() {
            return Err(BridgeError::Transport("no characteristics discovered".to_string()));
        }
        info!("Discovered {} characteristics on {}", found.len(), self.address);

        *lock(&self.characteristics) = found;
        Ok(())
    }

    async fn read_characteristic(&self, uuid: Uuid) -> Result<Vec<u8>> {
        let characteristic = self.characteristic(uuid)?;
        let unavailable = |reason: String| BridgeError::CharacteristicUnavailable { uuid, reason };

        let properties = characteristic
            .properties()
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        if !properties.read {
            return Err(unavailable("not readable".to_string()));
        }
        characteristic.read().await.map_err(|e| unavailable(e.to_string()))
    }

    async fn write_characteristic(&self, uuid: Uuid, data: &[u8]) -> Result<()> {
        let characteristic = self.characteristic(uuid)?;
        let properties = characteristic
            .properties()
            .await
            .map_err(|e| BridgeError::WriteRejected(e.to_string()))?;
        let written = match write_kind(properties.write, properties.write_without_response) {
            Some(WriteKind::WithResponse) => characteristic.write(data).await,
            Some(WriteKind::WithoutResponse) => characteristic.write_without_response(data).await,
            None => {
                return Err(BridgeError::CharacteristicUnavailable {
                    uuid,
                    reason: "not writable".to_string(),
                });
            }
        };
        written.map_err(|e| BridgeError::WriteRejected(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteKind {
    WithResponse,
    WithoutResponse,
}

/// Acknowledged writes are preferred when the characteristic offers both
fn write_kind(write: bool, write_without_response: bool) -> Option<WriteKind> {
    match (write, write_without_response) {
        (true, _) => Some(WriteKind::WithResponse),
        (false, true) => Some(WriteKind::WithoutResponse),
        (false, false) => None,
    }
}

/// Hands a candidate to the scanner. Returns false once the scan is over,
/// either because the receiver is gone or the scan was cancelled while the
/// channel was full.
async fn forward<T>(tx: &mpsc::Sender<T>, item: T, cancel_token: &CancellationToken) -> bool {
    tokio::select! {
        sent = tx.send(item) => sent.is_ok(),
        _ = cancel_token.cancelled() => false,
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Platform ids embed the MAC address in a longer string on some stacks
fn extract_mac_address(device_id_str: &str) -> Option<String> {
    MAC_ADDRESS
        .find_iter(device_id_str)
        .last()
        .map(|m| m.as_str().to_uppercase())
}
