//! Configuration file support
//!
//! Loads server configuration from TOML files. Every section except
//! `[server]` may be omitted.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{CodecConfig, FetcherConfig, LimitsConfig, ServerConfig, TranscoderConfig};

/// Configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Server settings
    pub server: ServerSettings,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
    /// Limits settings
    pub limits: Option<LimitsSettings>,
    /// DFPWM codec settings
    pub codec: Option<CodecSettings>,
    /// Downloader settings
    pub fetcher: Option<FetcherSettings>,
    /// Transcoder settings
    pub transcoder: Option<TranscoderSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Enable CORS
    pub cors_enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsSettings {
    /// Maximum raw audio request body size in MB
    pub max_body_mb: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodecSettings {
    pub sample_rate: Option<u32>,
    pub frame_samples: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherSettings {
    /// Path to the yt-dlp executable
    pub ytdlp_path: Option<PathBuf>,
    pub base_url: Option<String>,
    pub chunk_size: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscoderSettings {
    /// Path to the ffmpeg executable
    pub ffmpeg_path: Option<PathBuf>,
    pub chunk_size: Option<usize>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ConfigFile = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Generate default configuration file
    pub fn default_config() -> Self {
        let defaults = ServerConfig::default();
        Self {
            server: ServerSettings {
                host: defaults.host,
                port: defaults.port,
                cors_enabled: Some(defaults.cors_enabled),
            },
            logging: Some(LoggingSettings {
                level: defaults.log_level,
                format: Some(defaults.log_format),
            }),
            limits: Some(LimitsSettings {
                max_body_mb: Some(defaults.limits.max_body_mb),
            }),
            codec: Some(CodecSettings {
                sample_rate: Some(defaults.codec.sample_rate),
                frame_samples: Some(defaults.codec.frame_samples),
            }),
            fetcher: Some(FetcherSettings {
                ytdlp_path: Some(defaults.fetcher.ytdlp_path),
                base_url: Some(defaults.fetcher.base_url),
                chunk_size: Some(defaults.fetcher.chunk_size),
            }),
            transcoder: Some(TranscoderSettings {
                ffmpeg_path: Some(defaults.transcoder.ffmpeg_path),
                chunk_size: Some(defaults.transcoder.chunk_size),
            }),
        }
    }

    /// Convert to ServerConfig, filling gaps with defaults
    pub fn into_server_config(self) -> ServerConfig {
        let limits = LimitsConfig::default();
        let codec = CodecConfig::default();
        let fetcher = FetcherConfig::default();
        let transcoder = TranscoderConfig::default();

        let (log_level, log_format) = match self.logging {
            Some(l) => (l.level, l.format.unwrap_or_else(|| "pretty".to_string())),
            None => ("info".to_string(), "pretty".to_string()),
        };

        ServerConfig {
            host: self.server.host,
            port: self.server.port,
            cors_enabled: self.server.cors_enabled.unwrap_or(true),
            log_level,
            log_format,
            limits: LimitsConfig {
                max_body_mb: self
                    .limits
                    .and_then(|l| l.max_body_mb)
                    .unwrap_or(limits.max_body_mb),
            },
            codec: match self.codec {
                Some(c) => CodecConfig {
                    sample_rate: c.sample_rate.unwrap_or(codec.sample_rate),
                    frame_samples: c.frame_samples.unwrap_or(codec.frame_samples),
                },
                None => codec,
            },
            fetcher: match self.fetcher {
                Some(f) => FetcherConfig {
                    ytdlp_path: f.ytdlp_path.unwrap_or(fetcher.ytdlp_path),
                    base_url: f.base_url.unwrap_or(fetcher.base_url),
                    chunk_size: nonzero(f.chunk_size).unwrap_or(fetcher.chunk_size),
                },
                None => fetcher,
            },
            transcoder: match self.transcoder {
                Some(t) => TranscoderConfig {
                    ffmpeg_path: t.ffmpeg_path.unwrap_or(transcoder.ffmpeg_path),
                    chunk_size: nonzero(t.chunk_size).unwrap_or(transcoder.chunk_size),
                },
                None => transcoder,
            },
        }
    }
}

/// A zero read size would end every stream at once; treat it as unset.
fn nonzero(chunk_size: Option<usize>) -> Option<usize> {
    chunk_size.filter(|&n| n > 0)
}

/// Generate default configuration file at the specified path
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigFile::default_config();
    config.to_file(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_written_defaults_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tools.toml");

        generate_default_config(&path).unwrap();

        let loaded = ConfigFile::from_file(&path).unwrap();
        assert_eq!(loaded.server.port, 3000);
        assert_eq!(loaded.limits.as_ref().unwrap().max_body_mb, Some(50));
        assert_eq!(
            loaded.transcoder.as_ref().unwrap().ffmpeg_path,
            Some(PathBuf::from("ffmpeg"))
        );

        let config = loaded.into_server_config();
        assert_eq!(config.codec.sample_rate, 48000);
        assert_eq!(config.log_format, "pretty");
    }

    #[test]
    fn test_minimal_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tools.toml");
        std::fs::write(
            &path,
            "[server]\nhost = \"127.0.0.1\"\nport = 8081\n\n[transcoder]\nffmpeg_path = \"/usr/bin/ffmpeg\"\n",
        )
        .unwrap();

        let config = ConfigFile::from_file(&path).unwrap().into_server_config();
        assert_eq!(config.socket_addr(), "127.0.0.1:8081");
        assert_eq!(config.transcoder.ffmpeg_path, PathBuf::from("/usr/bin/ffmpeg"));
        assert_eq!(config.transcoder.chunk_size, 64 * 1024);
        assert_eq!(config.fetcher.ytdlp_path, PathBuf::from("yt-dlp"));
        assert_eq!(config.limits.max_body_mb, 50);
        assert_eq!(config.log_level, "info");
        assert!(config.cors_enabled);
    }

    #[test]
    fn test_zero_chunk_size_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tools.toml");
        std::fs::write(
            &path,
            "[server]\nhost = \"0.0.0.0\"\nport = 3000\n\n[fetcher]\nchunk_size = 0\n\n[transcoder]\nchunk_size = 0\n",
        )
        .unwrap();

        let config = ConfigFile::from_file(&path).unwrap().into_server_config();
        assert_eq!(config.fetcher.chunk_size, 64 * 1024);
        assert_eq!(config.transcoder.chunk_size, 64 * 1024);
    }

    #[test]
    fn test_missing_server_section_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tools.toml");
        std::fs::write(&path, "[fetcher]\nytdlp_path = \"/opt/yt-dlp\"\n").unwrap();

        assert!(ConfigFile::from_file(&path).is_err());
    }
}
