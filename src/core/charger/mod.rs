//! Pantabox charger domain: record codec, views and the settings merge.

pub mod merge;
pub mod records;
mod service;
pub mod views;

pub use merge::{BaselinePolicy, EnergyLimit, PartialSettings};
pub use records::{
    CpState, EnergyRecord, InfoRecord, PowerRecord, SettingsRecord, VoltageCurrentRecord,
    WireRecord,
};
pub use service::{Ack, ChargerService};
pub use views::{MeasurementsView, SettingsView};
