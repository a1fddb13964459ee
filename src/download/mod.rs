//! Download pipeline
//!
//! Validates download parameters, resolves the stream rank, starts the
//! fetcher and optionally the transcoder, and holds the response back until
//! the first chunk arrives so early failures still map to a status code.

use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::error::{MediaError, Result, ToolsError};
use crate::fetch::{
    resolve_quality_token, FetchRequest, MediaFetcher, MediaStream, Quality, StreamFilter,
};
use crate::transcode::{TranscodeSpec, Transcoder};

/// A validated download request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub media_id: String,
    pub filter: StreamFilter,
    pub quality: Quality,
}

impl DownloadRequest {
    /// Validate raw query values.
    ///
    /// A missing or empty `quality` means `highest`.
    pub fn from_query(
        filter: StreamFilter,
        media_id: Option<String>,
        quality: Option<String>,
    ) -> Result<Self> {
        let media_id = media_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ToolsError::InvalidRequest("missing media id".to_string()))?;

        let quality = match quality.as_deref() {
            None | Some("") => Quality::default(),
            Some(raw) => raw
                .parse()
                .map_err(|e: crate::fetch::quality::InvalidQuality| {
                    ToolsError::InvalidRequest(e.to_string())
                })?,
        };

        Ok(Self {
            media_id,
            filter,
            quality,
        })
    }

    pub fn fetch_request(&self) -> FetchRequest {
        FetchRequest {
            media_id: self.media_id.clone(),
            filter: self.filter,
            token: resolve_quality_token(self.filter, self.quality),
        }
    }
}

/// Runs fetch → (transcode) pipelines
#[derive(Clone)]
pub struct Downloader {
    fetcher: Arc<dyn MediaFetcher>,
    transcoder: Arc<dyn Transcoder>,
}

impl Downloader {
    pub fn new(fetcher: Arc<dyn MediaFetcher>, transcoder: Arc<dyn Transcoder>) -> Self {
        Self {
            fetcher,
            transcoder,
        }
    }

    /// Fetch media as-is.
    pub async fn download(&self, request: &DownloadRequest) -> Result<MediaStream> {
        let fetched = self.fetcher.fetch(&request.fetch_request()).await?;
        Ok(prime(fetched).await?)
    }

    /// Fetch media and pass it through the transcoder.
    ///
    /// The fetch stream is primed first, so an unavailable media id fails
    /// before the transcoder is ever started.
    pub async fn download_transcoded(
        &self,
        request: &DownloadRequest,
        spec: &TranscodeSpec,
    ) -> Result<MediaStream> {
        let fetched = self.fetcher.fetch(&request.fetch_request()).await?;
        let fetched = prime(fetched).await?;
        let transcoded = self.transcoder.transcode(fetched, spec)?;
        Ok(prime(transcoded).await?)
    }
}

/// Wait for the first item of `stream`.
///
/// An error before any data is returned as-is; otherwise the first chunk is
/// put back in front of the remaining stream. An empty stream stays empty.
pub async fn prime(mut stream: MediaStream) -> std::result::Result<MediaStream, MediaError> {
    match stream.next().await {
        None => Ok(stream::empty().boxed()),
        Some(Err(err)) => Err(err),
        Some(Ok(first)) => Ok(stream::once(async move { Ok(first) })
            .chain(stream)
            .boxed()),
    }
}
