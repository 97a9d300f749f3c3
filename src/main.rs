// src/main.rs - motor-host entry point
use clap::Parser;

use eslm_rs::config::Config;
use eslm_rs::{Controller, VERSION};

#[derive(Parser, Debug)]
#[command(name = "motor-host", about = "Dual-axis linear-motor controller")]
struct Args {
    /// Path to the controller configuration file
    #[arg(default_value = "motor.toml")]
    config: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    tracing::info!("Starting motor-host {}", VERSION);
    tracing::info!("Loading configuration from: {}", args.config);

    let config = Config::load(&args.config).map_err(|e| {
        tracing::error!("Failed to load config from '{}': {}", args.config, e);
        Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>
    })?;

    tracing::info!(
        "Host: {} @ {} baud, X drive: {}, Y drive: {}",
        config.host.port,
        config.host.baud,
        config.axis.x.port,
        config.axis.y.port
    );

    let mut controller = match Controller::connect(&config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to initialize controller: {}", e);
            return Err(Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>);
        }
    };

    controller.run().await;
    Ok(())
}
