pub mod config;
pub mod mqtt;
pub mod relay;

use crate::config::{LogLevel, RelayConfig};
use crate::mqtt::MqttHandle;
use crate::relay::RelayState;
use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config_path = RelayConfig::default_path()?;
    let config = RelayConfig::load_or_create(&config_path).await?;
    setup_logging_env(config.logging.level);

    info!("Using config {}", config_path.display());
    info!("MQTT topic: {}", config.mqtt.topic);

    let mqtt = Arc::new(
        MqttHandle::connect(&config.mqtt)
            .map_err(|e| eyre!("Failed to set up MQTT connection: {}", e))?,
    );

    let state = RelayState::new(
        mqtt.clone(),
        config.mqtt.topic.as_str(),
        config.relay.payload_format,
    );

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_ctrl_c(shutdown.clone()));

    let served = relay::server::serve(&config.server, relay::router(state), shutdown).await;

    mqtt.shutdown().await;
    info!("Relay stopped");
    served
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    Ok(())
}

fn setup_logging_env(level: LogLevel) {
    FmtSubscriber::builder()
        .with_max_level(tracing::Level::from(level))
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}

async fn wait_for_ctrl_c(shutdown: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("Ctrl-C received, shutting down");
            shutdown.cancel();
        }
        // Keep serving; the process can still be killed
        Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
    }
}
