//! Stream transcoding module
//!
//! Converts a media byte stream to another container/codec by piping it
//! through the ffmpeg executable:
//! - `TranscodeSpec` describes the output of one endpoint
//! - `Transcoder` is the seam the download pipeline talks to
//! - `FfmpegTranscoder` runs the configured ffmpeg binary

pub mod ffmpeg_cli;

use crate::error::Result;
use crate::fetch::MediaStream;

pub use ffmpeg_cli::FfmpegTranscoder;

/// Output configuration for one transcoding run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeSpec {
    /// Output container / muxer name
    pub container: &'static str,
    /// Sample format handed to the encoder
    pub sample_format: &'static str,
    /// Output audio codec
    pub codec: &'static str,
    /// Output bitrate in bits per second
    pub bitrate: u32,
    /// Output sample rate
    pub sample_rate: u32,
    /// Output channel count
    pub channels: u16,
    /// Drop any video tracks
    pub strip_video: bool,
}

impl TranscodeSpec {
    /// Mono DFPWM at 48 kHz (one bit per sample, so 48 kbit/s)
    pub fn dfpwm() -> Self {
        Self {
            container: "dfpwm",
            sample_format: "u8",
            codec: "dfpwm",
            bitrate: 48_000,
            sample_rate: 48_000,
            channels: 1,
            strip_video: true,
        }
    }

    /// ffmpeg output options, reading from stdin and writing to stdout
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-i".to_string(),
            "pipe:0".to_string(),
        ];
        if self.strip_video {
            args.push("-vn".to_string());
        }
        args.extend([
            "-ac".to_string(),
            self.channels.to_string(),
            "-ar".to_string(),
            self.sample_rate.to_string(),
            "-sample_fmt".to_string(),
            self.sample_format.to_string(),
            "-c:a".to_string(),
            self.codec.to_string(),
            "-b:a".to_string(),
            self.bitrate.to_string(),
            "-f".to_string(),
            self.container.to_string(),
            "pipe:1".to_string(),
        ]);
        args
    }
}

/// Converts one media stream into another
pub trait Transcoder: Send + Sync {
    /// Start converting `input`. The output stream ends with the input's
    /// error if the input fails.
    fn transcode(&self, input: MediaStream, spec: &TranscodeSpec) -> Result<MediaStream>;
}
