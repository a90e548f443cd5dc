use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use application::HomieDevice;
use infrastructure::config::AgentConfig;
use infrastructure::{LoadAverage, RumqttTransport, ThermalZoneTemperature};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to config directory
    #[arg(long)]
    config_dir: Option<String>,

    /// Override device ID
    #[arg(long)]
    device_id: Option<String>,

    /// Override broker URL (tcp://host:port)
    #[arg(long)]
    broker_url: Option<String>,
}

async fn run() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| {
                "info,homie_agent=debug,application=debug,infrastructure=debug".into()
            }),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Homie agent starting...");
    info!("Process ID: {}", std::process::id());

    let args = Args::parse();

    // Running from the workspace root picks up the crate's sample config
    let config_dir = args.config_dir.unwrap_or_else(|| {
        let dev_dir = "crates/agent/config";
        if std::path::Path::new(dev_dir).exists() {
            dev_dir.to_string()
        } else {
            "config".to_string()
        }
    });
    info!("Config directory: {}", config_dir);

    let mut config = AgentConfig::load(&config_dir)
        .with_context(|| format!("Failed to load configuration from {config_dir}"))?;

    if let Some(id) = args.device_id {
        config.device_id = id;
    }
    if let Some(url) = args.broker_url {
        config.mqtt.broker_url = url;
    }

    let configuration = config
        .to_configuration()
        .context("Invalid device configuration")?;
    info!(device_id = %configuration.device_id(), "Loaded configuration");

    let transport = RumqttTransport::new().with_last_will(config.state_topic(), "lost");

    let mut device = HomieDevice::new(configuration, config.firmware(), transport);
    if config.metrics.cpu_temperature {
        device = device.with_cpu_temperature(ThermalZoneTemperature::new());
    }
    if config.metrics.cpu_load {
        device = device.with_cpu_load(LoadAverage::new());
    }
    for node in &config.nodes {
        device
            .create_node(&node.name, &node.node_type)
            .with_context(|| format!("Invalid node {}", node.name))?;
    }
    info!(nodes = ?device.node_names(), "Nodes registered");

    let handle = device.start();

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down..."),
        Err(err) => warn!(error = %err, "Unable to listen for shutdown signal"),
    }

    handle.shutdown().await?;

    info!("Good bye!");
    Ok(())
}

fn main() {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("CRITICAL ERROR: failed to start runtime: {:?}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = rt.block_on(run()) {
        eprintln!("\nCRITICAL ERROR: {:?}", e);
        std::process::exit(1);
    }
}
