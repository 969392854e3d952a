use std::sync::OnceLock;

use chrono::Local;
use log::{LevelFilter, Metadata, Record, SetLoggerError};

static LOGGER: OnceLock<BridgeLogger> = OnceLock::new();

/// Writes timestamped records to stderr
pub struct BridgeLogger {
    level: LevelFilter,
}

impl BridgeLogger {
    pub fn new(level: LevelFilter) -> Self {
        Self { level }
    }

    pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = LOGGER.get_or_init(|| BridgeLogger::new(level));
        log::set_logger(logger).map(|()| log::set_max_level(level))
    }

    fn format(record: &Record) -> String {
        format!(
            "{} [{}] {}",
            Local::now().to_rfc3339(),
            record.level(),
            record.args()
        )
    }
}

impl log::Log for BridgeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{}", Self::format(record));
        }
    }

    fn flush(&self) {}
}

/// Installs [`BridgeLogger`], falling back to `env_logger`
pub fn init(level: LevelFilter) {
    if BridgeLogger::init(level).is_err() {
        let _ = env_logger::builder().filter_level(level).try_init();
    }
    log::info!("Logging initialized");
}
