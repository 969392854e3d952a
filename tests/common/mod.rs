//! In-memory GATT transport for integration tests.
//!
//! Records scans, connects, discovery attempts and characteristic writes so
//! tests can assert on exactly what reached the radio.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use pantabox_bridge_lib::BridgeError;
use pantabox_bridge_lib::config::BridgeConfig;
use pantabox_bridge_lib::core::bluetooth::{GattPeripheral, GattTransport};
use pantabox_bridge_lib::core::charger::{
    EnergyRecord, InfoRecord, PowerRecord, VoltageCurrentRecord, WireRecord,
};
use tokio::sync::mpsc;
use uuid::Uuid;

pub const CHARGER: &str = "C8:3A:35:AA:01:02";
pub const NEIGHBOUR: &str = "11:22:33:44:55:66";

// ── MockPeripheral ────────────────────────────────────────────

#[derive(Default)]
pub struct PeripheralState {
    pub connected: AtomicBool,
    pub refuse_connect: AtomicBool,
    pub connect_calls: AtomicUsize,
    /// Discovery attempts that fail before one succeeds
    pub discovery_failures: AtomicU32,
    pub discover_calls: AtomicUsize,
    pub read_only: AtomicBool,
    pub characteristics: Mutex<HashMap<Uuid, Vec<u8>>>,
    pub writes: Mutex<Vec<(Uuid, Vec<u8>)>>,
}

#[derive(Clone)]
pub struct MockPeripheral {
    pub address: String,
    pub state: Arc<PeripheralState>,
}

impl MockPeripheral {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            state: Arc::new(PeripheralState::default()),
        }
    }

    /// A charger serving the fixture records
    pub fn charger(address: &str) -> Self {
        let peripheral = Self::new(address);
        peripheral.set_record(&fixture_info());
        peripheral.set_record(&fixture_energy());
        peripheral.set_record(&fixture_power());
        peripheral.set_record(&fixture_voltage_current());
        peripheral
    }

    pub fn set_record<R: WireRecord>(&self, record: &R) {
        self.set_raw(R::CHARACTERISTIC, record.encode());
    }

    pub fn set_raw(&self, uuid: Uuid, bytes: Vec<u8>) {
        self.state.characteristics.lock().unwrap().insert(uuid, bytes);
    }

    pub fn drop_link(&self) {
        self.state.connected.store(false, Ordering::SeqCst);
    }

    pub fn writes(&self) -> Vec<(Uuid, Vec<u8>)> {
        self.state.writes.lock().unwrap().clone()
    }

    pub fn connect_calls(&self) -> usize {
        self.state.connect_calls.load(Ordering::SeqCst)
    }

    pub fn discover_calls(&self) -> usize {
        self.state.discover_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl GattPeripheral for MockPeripheral {
    fn address(&self) -> String {
        self.address.clone()
    }

    async fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> Result<(), BridgeError> {
        self.state.connect_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.refuse_connect.load(Ordering::SeqCst) {
            return Err(BridgeError::Transport("connection refused".to_string()));
        }
        self.state.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn discover_attributes(&self) -> Result<(), BridgeError> {
        self.state.discover_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.state.discovery_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.state.discovery_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(BridgeError::Transport("discovery timed out".to_string()));
        }
        Ok(())
    }

    async fn read_characteristic(&self, uuid: Uuid) -> Result<Vec<u8>, BridgeError> {
        self.state
            .characteristics
            .lock()
            .unwrap()
            .get(&uuid)
            .cloned()
            .ok_or_else(|| BridgeError::CharacteristicUnavailable {
                uuid,
                reason: "not found".to_string(),
            })
    }

    async fn write_characteristic(&self, uuid: Uuid, data: &[u8]) -> Result<(), BridgeError> {
        if self.state.read_only.load(Ordering::SeqCst) {
            return Err(BridgeError::CharacteristicUnavailable {
                uuid,
                reason: "not writable".to_string(),
            });
        }
        self.state.writes.lock().unwrap().push((uuid, data.to_vec()));
        Ok(())
    }
}

// ── MockTransport ─────────────────────────────────────────────

#[derive(Default)]
pub struct MockTransport {
    pub advertised: Vec<MockPeripheral>,
    pub scan_calls: AtomicUsize,
    pub stop_calls: AtomicUsize,
    active_scans: AtomicUsize,
    pub max_concurrent_scans: AtomicUsize,
    /// Stops issued while the scanner still held the candidate receiver
    pub stops_with_open_receiver: AtomicUsize,
    scan_tx: Mutex<Option<mpsc::Sender<MockPeripheral>>>,
}

impl MockTransport {
    pub fn advertising(advertised: Vec<MockPeripheral>) -> Arc<Self> {
        Arc::new(Self {
            advertised,
            ..Default::default()
        })
    }

    pub fn scan_calls(&self) -> usize {
        self.scan_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl GattTransport for MockTransport {
    type Peripheral = MockPeripheral;

    async fn start_scan(&self) -> Result<mpsc::Receiver<MockPeripheral>, BridgeError> {
        self.scan_calls.fetch_add(1, Ordering::SeqCst);
        let active = self.active_scans.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent_scans.fetch_max(active, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel(16);
        for peripheral in &self.advertised {
            let _ = tx.try_send(peripheral.clone());
        }
        // Keep the sender so the scan stays open until stopped.
        *self.scan_tx.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    async fn stop_scan(&self) -> Result<(), BridgeError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.active_scans.fetch_sub(1, Ordering::SeqCst);
        if let Some(tx) = self.scan_tx.lock().unwrap().take() {
            if !tx.is_closed() {
                self.stops_with_open_receiver.fetch_add(1, Ordering::SeqCst);
            }
        }
        Ok(())
    }
}

// ── Fixtures ──────────────────────────────────────────────────

pub fn config(scan_window_ms: u64) -> BridgeConfig {
    BridgeConfig {
        scan_window_ms,
        ..Default::default()
    }
}

pub fn fixture_info() -> InfoRecord {
    InfoRecord {
        current: 16,
        kwh_per_100: 180,
        amount_per_kwh: 30,
        fi_enabled: 1,
        error_code: 0,
        efficiency: 90,
        charging_active: 1,
        pause_charging: 0,
        charging_current_max: 32,
        ble_transmit_power: 4,
    }
}

pub fn fixture_energy() -> EnergyRecord {
    EnergyRecord {
        total_energy: 1_234_500,
        energy_last_charge: 8_250,
        energy_2nd_last_charge: 7_000,
        energy_3rd_last_charge: 6_000,
        charging_energy_limit: 2_500,
    }
}

pub fn fixture_power() -> PowerRecord {
    PowerRecord {
        total_power: 1_104,
        l1: 368,
        l2: 368,
        l3: 368,
        peak_power: 1_150,
        frequency: 5_000,
        temperature: -4,
        remaining_distance: 55,
        costs: 120,
        cp_signal: 2,
    }
}

pub fn fixture_voltage_current() -> VoltageCurrentRecord {
    VoltageCurrentRecord {
        voltage: [2_300, 2_310, 2_290],
        current: [1_600, 1_600, 1_600],
    }
}
