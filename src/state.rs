//! Application state management
//!
//! This module defines the AppState structure that holds:
//! - Server configuration
//! - The DFPWM codec adapter
//! - The download pipeline (fetcher + transcoder)
//!
//! Nothing in here changes after startup.

use std::sync::Arc;

use crate::codec::{AudioCodec, DfpwmCodec};
use crate::config::ServerConfig;
use crate::download::Downloader;
use crate::fetch::{MediaFetcher, YtDlpFetcher};
use crate::transcode::{FfmpegTranscoder, Transcoder};

/// Application state shared across all handlers
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,

    /// Buffer codec for the encode/decode endpoints
    pub codec: Arc<dyn AudioCodec>,

    /// Fetch → transcode pipeline for the download endpoints
    pub downloader: Downloader,
}

impl AppState {
    /// Create a new AppState with adapters built from the configuration
    pub fn new(config: ServerConfig) -> Self {
        let codec = Arc::new(DfpwmCodec::new(&config.codec));
        let fetcher = Arc::new(YtDlpFetcher::new(&config.fetcher));
        let transcoder = Arc::new(FfmpegTranscoder::new(&config.transcoder));

        tracing::info!(
            ytdlp = %config.fetcher.ytdlp_path.display(),
            ffmpeg = %config.transcoder.ffmpeg_path.display(),
            "External tools configured"
        );

        Self::with_adapters(config, codec, fetcher, transcoder)
    }

    /// Create AppState around explicit adapters
    pub fn with_adapters(
        config: ServerConfig,
        codec: Arc<dyn AudioCodec>,
        fetcher: Arc<dyn MediaFetcher>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        Self {
            config,
            codec,
            downloader: Downloader::new(fetcher, transcoder),
        }
    }

    /// Create AppState with default configuration
    pub fn with_defaults() -> Self {
        Self::new(ServerConfig::default())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_defaults()
    }
}
