//! Media Tools Server
//!
//! HTTP service converting audio between unsigned 8-bit PCM and DFPWM, and
//! streaming video platform downloads (optionally transcoded to DFPWM)
//! straight to the client.

mod codec;
mod config;
mod config_file;
mod download;
mod error;
mod fetch;
mod ffmpeg;
mod http;
mod process;
mod state;
mod transcode;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ServerConfig;
use crate::config_file::ConfigFile;
use crate::error::{Result, ToolsError};
use crate::http::create_router;
use crate::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "media-tools-server";

/// Default configuration file, read when no path is given
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let config_path = match args.next() {
        Some(flag) if flag == "--write-config" => {
            let path = args.next().unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
            config_file::generate_default_config(&path)
                .map_err(|e| ToolsError::Config(format!("{}: {}", path, e)))?;
            println!("Wrote default configuration to {}", path);
            return Ok(());
        }
        Some(path) => path,
        None => DEFAULT_CONFIG_PATH.to_string(),
    };

    // Logging depends on the config, so load failures are reported afterwards
    let (mut config, load_error) = load_config(&config_path);
    let rejected_env = config.apply_env();
    init_logging(&config);

    tracing::info!("{} v{} starting", APP_NAME, VERSION);
    if let Some(e) = load_error {
        tracing::warn!(
            "Failed to load config file {}: {}. Using defaults.",
            config_path,
            e
        );
    }
    for value in rejected_env {
        tracing::warn!("Ignoring invalid environment override {}", value);
    }

    ffmpeg::init()?;
    tracing::info!("FFmpeg version: {}", ffmpeg::version_info());
    if !ffmpeg::is_dfpwm_available() {
        tracing::warn!("libavcodec has no DFPWM support; codec endpoints will fail");
    }

    tracing::info!("Configuration loaded: {:?}", config);

    let addr: SocketAddr = config
        .socket_addr()
        .parse()
        .map_err(|e| ToolsError::Config(format!("invalid listen address: {}", e)))?;

    let state = Arc::new(AppState::new(config));
    let app = create_router(state);

    tracing::info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Read the TOML config at `path`, falling back to defaults
fn load_config(path: &str) -> (ServerConfig, Option<String>) {
    if !std::path::Path::new(path).exists() {
        return (ServerConfig::default(), None);
    }
    match ConfigFile::from_file(path) {
        Ok(cf) => (cf.into_server_config(), None),
        Err(e) => (ServerConfig::default(), Some(e.to_string())),
    }
}

/// Initialize logging with tracing
fn init_logging(config: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "media_tools_server={},tower_http={}",
            config.log_level, config.log_level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
