use std::path::PathBuf;

use log::{error, info};
use pantabox_bridge_lib::commands::{self, Command};
use pantabox_bridge_lib::config::{AppConfig, DEFAULT_CONFIG_FILE};
use pantabox_bridge_lib::{logging, state::AppState};

const USAGE: &str = "usage: pantabox-bridge [--config <file>] <command> <mac> [args...]
       pantabox-bridge [--config <file>] init-config
commands: measurements | settings | state | enabled | power | max-current
          enable <pin> <true|false> | current <pin> <amps> | update <json-patch>
<mac> is matched case-insensitively, e.g. c8:3a:35:aa:01:02";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let mut config_path = PathBuf::from(DEFAULT_CONFIG_FILE);
    if args.first().is_some_and(|a| a == "--config") {
        if args.len() < 2 {
            anyhow::bail!("--config needs a file\n{USAGE}");
        }
        config_path = PathBuf::from(args.remove(1));
        args.remove(0);
    }

    if args.first().is_some_and(|a| a == "init-config") {
        logging::init(log::LevelFilter::Info);
        if AppConfig::init_config(&config_path).await? {
            println!("Default config written to {}", config_path.display());
        } else {
            println!("Config already exists at {}", config_path.display());
        }
        return Ok(());
    }

    let config = AppConfig::load_config(&config_path).await?;
    logging::init(config.log_level());

    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => anyhow::bail!("{e}\n{USAGE}"),
    };

    let app_state = AppState::new(&config).await?;
    let shutdown = app_state.shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling in-flight request.");
            shutdown.cancel();
        }
    });

    let charger = app_state.get_charger_arc();
    match commands::execute(charger.as_ref(), command, &app_state.shutdown).await {
        Ok(body) => {
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(())
        }
        Err(e) => {
            error!("> Error: {}", e);
            println!("{}", serde_json::to_string_pretty(&commands::error_body(&e))?);
            std::process::exit(1);
        }
    }
}
