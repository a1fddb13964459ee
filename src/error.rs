use thiserror::Error;

/// Main error type for the tools server
#[derive(Error, Debug)]
pub enum ToolsError {
    #[error("FFmpeg error: {0}")]
    Ffmpeg(#[from] FfmpegError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Media id extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// FFmpeg-specific errors
#[derive(Error, Debug)]
pub enum FfmpegError {
    #[error("FFmpeg initialization failed: {0}")]
    InitFailed(String),

    #[error("Codec not found: {0}")]
    CodecNotFound(String),

    #[error("Failed to open encoder: {0}")]
    EncoderOpen(String),

    #[error("Failed to open decoder: {0}")]
    DecoderOpen(String),

    #[error("Failed to encode frame: {0}")]
    EncodeFrame(String),

    #[error("Failed to decode packet: {0}")]
    DecodePacket(String),
}

/// Errors carried by media byte streams (fetcher and transcoder output).
///
/// The kind decides the HTTP outcome, never the message text.
#[derive(Error, Debug)]
pub enum MediaError {
    /// The platform reports the media as unavailable.
    #[error("Media not found: {0}")]
    NotFound(String),

    /// Any other failure reported by the downloader or transcoder.
    #[error("Upstream failure: {0}")]
    Upstream(String),

    /// The external executable could not be started.
    #[error("Failed to start {0}")]
    Spawn(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasons a platform URL could not be turned into a media id
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Not a valid URL: {0}")]
    InvalidUrl(String),

    #[error("Not a supported host: {0}")]
    UnsupportedHost(String),

    #[error("No id found in URL: {0}")]
    MissingId(String),

    #[error("Id does not match the expected format: {0}")]
    InvalidId(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ToolsError>;
