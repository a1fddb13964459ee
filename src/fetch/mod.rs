//! Media fetcher
//!
//! Downloads media from the video platform as a byte stream:
//! - Stream filter / quality resolution into a stream rank
//! - The `MediaFetcher` seam and its yt-dlp implementation
//! - Media id extraction from platform URLs

pub mod media_id;
pub mod quality;
pub mod ytdlp;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::error::MediaError;

pub use media_id::{extract_media_id, MediaIdentity};
pub use quality::{resolve_quality_token, Quality, QualityToken, StreamFilter};
pub use ytdlp::YtDlpFetcher;

/// Single-consumer byte stream of downloaded (or transcoded) media.
///
/// Errors are terminal: no item follows an `Err`.
pub type MediaStream = BoxStream<'static, Result<Bytes, MediaError>>;

/// What to download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub media_id: String,
    pub filter: StreamFilter,
    pub token: QualityToken,
}

/// Produces media streams for platform ids
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Start downloading. Failures the downloader only reports once it is
    /// running arrive as the stream's final item.
    async fn fetch(&self, request: &FetchRequest) -> Result<MediaStream, MediaError>;
}
