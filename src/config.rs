//! Server configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Request limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum size of a raw audio request body in megabytes
    pub max_body_mb: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self { max_body_mb: 50 }
    }
}

impl LimitsConfig {
    /// Get maximum body size in bytes
    pub fn max_body_bytes(&self) -> usize {
        self.max_body_mb * 1024 * 1024
    }
}

/// DFPWM codec configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Sample rate reported to the codec
    pub sample_rate: u32,

    /// Samples per frame handed to the codec; must be a multiple of 8
    pub frame_samples: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            frame_samples: 4096,
        }
    }
}

/// Media downloader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Path to the yt-dlp executable
    pub ytdlp_path: PathBuf,

    /// Prefix the media id is appended to
    pub base_url: String,

    /// Read size for the downloader's output pipe
    pub chunk_size: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: PathBuf::from("yt-dlp"),
            base_url: "https://www.youtube.com/watch?v=".to_string(),
            chunk_size: 64 * 1024,
        }
    }
}

/// External transcoder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscoderConfig {
    /// Path to the ffmpeg executable
    pub ffmpeg_path: PathBuf,

    /// Read size for the transcoder's output pipe
    pub chunk_size: usize,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            chunk_size: 64 * 1024,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Enable CORS
    pub cors_enabled: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log output format (pretty, json)
    pub log_format: String,

    pub limits: LimitsConfig,

    pub codec: CodecConfig,

    pub fetcher: FetcherConfig,

    pub transcoder: TranscoderConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_enabled: true,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            limits: LimitsConfig::default(),
            codec: CodecConfig::default(),
            fetcher: FetcherConfig::default(),
            transcoder: TranscoderConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Apply overrides from the process environment.
    ///
    /// Called once at startup, before logging is set up; request handling
    /// never consults the environment. Returns the rejected values.
    pub fn apply_env(&mut self) -> Vec<String> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut rejected = Vec::new();
        if let Some(path) = lookup("FFMPEG_PATH").filter(|p| !p.is_empty()) {
            self.transcoder.ffmpeg_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("YTDLP_PATH").filter(|p| !p.is_empty()) {
            self.fetcher.ytdlp_path = PathBuf::from(path);
        }
        if let Some(port) = lookup("PORT") {
            match port.parse() {
                Ok(port) => self.port = port,
                Err(_) => rejected.push(format!("PORT={}", port)),
            }
        }
        rejected
    }
}
