//! 1-bit audio codec adapter
//!
//! Converts whole in-memory buffers between unsigned 8-bit mono PCM and
//! DFPWM. The bit-stream algorithm itself lives in libavcodec.

pub mod dfpwm;

use bytes::Bytes;

use crate::error::Result;

pub use dfpwm::DfpwmCodec;

/// A buffer-to-buffer audio codec
pub trait AudioCodec: Send + Sync {
    /// Encode unsigned 8-bit PCM samples
    fn encode(&self, pcm: &[u8]) -> Result<Bytes>;

    /// Decode codec bytes back to unsigned 8-bit PCM samples
    fn decode(&self, encoded: &[u8]) -> Result<Bytes>;
}
