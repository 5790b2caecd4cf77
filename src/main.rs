use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use dspace::{
    Config, DestinationRotator, DiscordBackend, DriveService, JsonTreeStore, TransferEngine,
    WebServer,
};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    // Load configuration
    let config = match Config::load_with_env(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {config_path}: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = dspace::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        dspace::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = run(config).await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> dspace::Result<()> {
    config.validate()?;

    info!("dspace - chunked blob storage");
    info!(
        channels = config.discord.channels.len(),
        "Server configured on {}:{}", config.server.host, config.server.port
    );

    let backend = DiscordBackend::new(&config.discord)?;
    backend
        .login(
            Duration::from_millis(config.discord.backoff_ms),
            config.discord.exponential_backoff_coefficient,
        )
        .await;

    let store = JsonTreeStore::new(&config.storage.virtual_directory_path);
    store.initialize().await?;

    let rotator = DestinationRotator::new(config.discord.channels.clone())?;
    let engine = TransferEngine::new(
        Arc::new(backend),
        Arc::new(rotator),
        config.transfer_settings(),
    );

    let mut service = DriveService::new(engine, Arc::new(store));
    if config.storage.save_downloads {
        service = service.with_downloads_dir(&config.storage.downloads_dir);
    }

    WebServer::new(&config.server, service)?.run().await?;
    Ok(())
}
