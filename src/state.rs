//! Application state management
//! This module wires the one charger service the process owns.

use std::sync::Arc;

use log::info;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::core::{BluestTransport, ChargerService};
use crate::error::Result;

/// Global application state
pub struct AppState {
    /// The charger service backed by the system Bluetooth adapter
    pub charger: Arc<ChargerService<BluestTransport>>,
    /// Cancelled on shutdown; in-flight scans and backoffs stop early
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Creates a new AppState instance
    pub async fn new(config: &AppConfig) -> Result<Self> {
        info!("Initializing Bluetooth transport...");
        let transport = Arc::new(BluestTransport::new().await?);
        Ok(Self {
            charger: Arc::new(ChargerService::new(transport, &config.bridge)),
            shutdown: CancellationToken::new(),
        })
    }

    /// Gets a reference to the charger service
    pub fn get_charger_arc(&self) -> Arc<ChargerService<BluestTransport>> {
        self.charger.clone()
    }
}
