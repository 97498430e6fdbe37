// src/main.rs - Simulator process bootstrap
use clap::Parser;
use printer_sim::{config, spawn_printer, web};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "printer-sim", version, about = "Real-time 3D printer simulator")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(default_value = "printer.toml")]
    config: String,

    /// Port to listen on (overrides the config file and $PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    tracing::info!("Starting printer simulator v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Loading configuration from: {}", args.config);

    let mut config = config::load_config_or_default(&args.config).map_err(|e| {
        tracing::error!("Failed to load config from '{}': {}", args.config, e);
        Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>
    })?;
    config.apply_env_overrides();
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate()?;

    let sim = &config.simulation;
    tracing::info!(
        "Printer: {}",
        sim.printer_name.as_deref().unwrap_or("Simulated printer")
    );
    tracing::info!("Targets: hotend {}°C, bed {}°C", sim.hotend_target, sim.bed_target);
    tracing::info!("Tick interval: {} ms, homing delay: {} ms", sim.tick_interval_ms, sim.homing_delay_ms);

    let (hub, _printer_task) = spawn_printer(config.simulation.clone());

    let app = match &config.server.static_dir {
        Some(dir) => {
            tracing::info!("Serving static assets from {}", dir.display());
            web::api::create_router_with_assets(hub, dir)
        }
        None => web::api::create_router(hub),
    };

    let listener = tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    tracing::info!("Printer simulator listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
