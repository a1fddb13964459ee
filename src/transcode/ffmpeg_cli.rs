//! ffmpeg executable transcoder

use std::path::PathBuf;
use tokio::process::Command;

use super::{TranscodeSpec, Transcoder};
use crate::config::TranscoderConfig;
use crate::error::{MediaError, Result};
use crate::fetch::MediaStream;
use crate::process::{spawn_stream, ProcessOptions};

/// Runs the ffmpeg binary chosen at startup
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: PathBuf,
    chunk_size: usize,
}

impl FfmpegTranscoder {
    pub fn new(config: &TranscoderConfig) -> Self {
        Self {
            program: config.ffmpeg_path.clone(),
            chunk_size: config.chunk_size,
        }
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }
}

fn classify_failure(stderr: &str) -> MediaError {
    MediaError::Upstream(format!("ffmpeg: {}", stderr.trim()))
}

impl Transcoder for FfmpegTranscoder {
    fn transcode(&self, input: MediaStream, spec: &TranscodeSpec) -> Result<MediaStream> {
        tracing::debug!(
            program = %self.program.display(),
            codec = spec.codec,
            bitrate = spec.bitrate,
            "Starting transcoder"
        );

        let mut command = Command::new(&self.program);
        command.args(spec.to_args());

        let stream = spawn_stream(
            command,
            ProcessOptions {
                label: "ffmpeg",
                chunk_size: self.chunk_size,
                classify: classify_failure,
                input: Some(input),
            },
        )?;
        Ok(stream)
    }
}
