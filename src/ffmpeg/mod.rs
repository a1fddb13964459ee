//! FFmpeg module - libav initialisation and codec probes
//!
//! Only the in-process DFPWM codec goes through libav. Container transcoding
//! runs the ffmpeg executable instead (see `transcode`).

pub use ffmpeg_next as ffmpeg;

/// Name libavcodec registers the DFPWM encoder and decoder under
pub const DFPWM_CODEC_NAME: &str = "dfpwm";

/// Initialize FFmpeg library
///
/// This should be called once at application startup.
/// Returns an error if FFmpeg fails to initialize.
pub fn init() -> Result<(), crate::error::FfmpegError> {
    ffmpeg::init().map_err(|e| {
        crate::error::FfmpegError::InitFailed(format!("ffmpeg::init() failed: {}", e))
    })?;

    // Codec contexts are opened per request; keep libav quiet about each one.
    ffmpeg::util::log::set_level(ffmpeg::util::log::Level::Warning);

    tracing::info!("FFmpeg initialized");

    Ok(())
}

/// Whether this libav build ships both halves of the DFPWM codec
pub fn is_dfpwm_available() -> bool {
    ffmpeg::encoder::find_by_name(DFPWM_CODEC_NAME).is_some()
        && ffmpeg::decoder::find_by_name(DFPWM_CODEC_NAME).is_some()
}

/// Get FFmpeg version information
pub fn version_info() -> String {
    let version = unsafe { ffmpeg::ffi::avcodec_version() };
    format!(
        "libavcodec {}.{}.{}",
        version >> 16,
        (version >> 8) & 0xff,
        version & 0xff
    )
}
