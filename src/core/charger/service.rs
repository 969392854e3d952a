//! Charger operations consumed by the request layer

use std::sync::Arc;

use log::{debug, error, info};
use tokio_util::sync::CancellationToken;

use crate::config::BridgeConfig;
use crate::core::bluetooth::{ConnectionHandle, DeviceDirectory, GattTransport};
use crate::core::charger::merge::{BaselinePolicy, PartialSettings, build_baseline};
use crate::core::charger::records::{
    CpState, EnergyRecord, InfoRecord, PowerRecord, SettingsRecord, VoltageCurrentRecord,
    WireRecord,
};
use crate::core::charger::views::{MeasurementsView, SettingsView};
use crate::error::{BridgeError, Result};

/// Acknowledgement of a settings write, carrying the block that was sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    pub settings: SettingsRecord,
}

/// Reads and updates a charger through the device directory
pub struct ChargerService<T: GattTransport> {
    directory: DeviceDirectory<T>,
    min_current: u8,
    max_current: u8,
}

impl<T: GattTransport> ChargerService<T> {
    pub fn new(transport: Arc<T>, config: &BridgeConfig) -> Self {
        Self {
            directory: DeviceDirectory::new(transport, config),
            min_current: config.min_current_amps,
            max_current: config.max_current_amps,
        }
    }

    pub fn directory(&self) -> &DeviceDirectory<T> {
        &self.directory
    }

    /// Energy, power and per-phase voltage/current in physical units
    pub async fn get_measurements(
        &self,
        address: &str,
        cancel_token: &CancellationToken,
    ) -> Result<MeasurementsView> {
        let handle = self.directory.resolve(address, cancel_token).await?;
        let energy: EnergyRecord = Self::read_record(&handle).await?;
        let power: PowerRecord = Self::read_record(&handle).await?;
        let vc: VoltageCurrentRecord = Self::read_record(&handle).await?;
        Ok(MeasurementsView::new(&energy, &power, &vc))
    }

    /// Info fields plus the energy limit
    pub async fn get_settings_snapshot(
        &self,
        address: &str,
        cancel_token: &CancellationToken,
    ) -> Result<SettingsView> {
        let handle = self.directory.resolve(address, cancel_token).await?;
        let info: InfoRecord = Self::read_record(&handle).await?;
        let energy: EnergyRecord = Self::read_record(&handle).await?;
        Ok(SettingsView::new(&info, &energy))
    }

    /// Control pilot state
    pub async fn charger_state(
        &self,
        address: &str,
        cancel_token: &CancellationToken,
    ) -> Result<CpState> {
        let handle = self.directory.resolve(address, cancel_token).await?;
        let power: PowerRecord = Self::read_record(&handle).await?;
        Ok(power.cp_state())
    }

    pub async fn charging_enabled(
        &self,
        address: &str,
        cancel_token: &CancellationToken,
    ) -> Result<bool> {
        let handle = self.directory.resolve(address, cancel_token).await?;
        let info: InfoRecord = Self::read_record(&handle).await?;
        Ok(info.charging_enabled())
    }

    /// Total power in kW
    pub async fn meter_power(&self, address: &str, cancel_token: &CancellationToken) -> Result<f64> {
        let handle = self.directory.resolve(address, cancel_token).await?;
        let power: PowerRecord = Self::read_record(&handle).await?;
        Ok(power.total_power_kw())
    }

    /// Configured current limit in amps
    pub async fn max_current(&self, address: &str, cancel_token: &CancellationToken) -> Result<u8> {
        let handle = self.directory.resolve(address, cancel_token).await?;
        let info: InfoRecord = Self::read_record(&handle).await?;
        Ok(info.current)
    }

    /// Applies a partial update on top of the device's current settings,
    /// keeping its configured energy limit.
    pub async fn apply_partial_settings(
        &self,
        address: &str,
        patch: &PartialSettings,
        cancel_token: &CancellationToken,
    ) -> Result<Ack> {
        self.apply_update(address, patch, BaselinePolicy::PreserveEnergyLimit, cancel_token)
            .await
    }

    /// Switches charging on or off
    pub async fn set_charging_enabled(
        &self,
        address: &str,
        pin: u16,
        enabled: bool,
        cancel_token: &CancellationToken,
    ) -> Result<Ack> {
        let patch = PartialSettings {
            charging_enabled: Some(enabled),
            pin: Some(pin),
            ..Default::default()
        };
        self.apply_update(address, &patch, BaselinePolicy::InfoOnly, cancel_token)
            .await
    }

    /// Sets the charging current limit in amps
    pub async fn set_current_limit(
        &self,
        address: &str,
        pin: u16,
        amps: i64,
        cancel_token: &CancellationToken,
    ) -> Result<Ack> {
        let patch = PartialSettings {
            current: Some(amps),
            pin: Some(pin),
            ..Default::default()
        };
        self.apply_update(address, &patch, BaselinePolicy::InfoOnly, cancel_token)
            .await
    }

    async fn apply_update(
        &self,
        address: &str,
        patch: &PartialSettings,
        policy: BaselinePolicy,
        cancel_token: &CancellationToken,
    ) -> Result<Ack> {
        patch.validate(self.min_current, self.max_current)?;

        let handle = self.directory.resolve(address, cancel_token).await?;
        let info: InfoRecord = Self::read_record(&handle).await?;
        let energy_limit = match policy {
            BaselinePolicy::PreserveEnergyLimit => {
                let energy: EnergyRecord = Self::read_record(&handle).await?;
                Some(energy.charging_energy_limit)
            }
            BaselinePolicy::InfoOnly => None,
        };

        let baseline = build_baseline(&info, energy_limit, policy);
        let settings = patch.apply_to(baseline, self.min_current, self.max_current)?;
        debug!("Settings for {}: {:?}", address, settings);

        handle
            .write(SettingsRecord::CHARACTERISTIC, &settings.encode())
            .await
            .map_err(|e| {
                error!("Failed to write settings to {}: {}", address, e);
                match e {
                    BridgeError::WriteRejected(_) => e,
                    other => BridgeError::WriteRejected(other.to_string()),
                }
            })?;
        info!("Settings written to {}", address);
        Ok(Ack { settings })
    }

    async fn read_record<R: WireRecord>(handle: &ConnectionHandle<T::Peripheral>) -> Result<R> {
        let bytes = handle.read(R::CHARACTERISTIC).await?;
        debug!("{} record from {}: {:02x?}", R::NAME, handle.address(), bytes);
        R::decode(&bytes)
    }
}
