//! yt-dlp backed fetcher
//!
//! Runs `yt-dlp -o -` and streams the selected format from its stdout.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;

use super::{FetchRequest, MediaFetcher, MediaStream, QualityToken};
use crate::config::FetcherConfig;
use crate::error::MediaError;
use crate::process::{spawn_stream, ProcessOptions};

/// stderr fragments meaning the media does not exist or cannot be served
const NOT_FOUND_MARKERS: &[&str] = &[
    "Video unavailable",
    "This video is unavailable",
    "Private video",
    "Incomplete YouTube ID",
    "is not a valid URL",
];

/// Fetcher that shells out to yt-dlp
#[derive(Debug, Clone)]
pub struct YtDlpFetcher {
    program: PathBuf,
    base_url: String,
    chunk_size: usize,
}

impl YtDlpFetcher {
    pub fn new(config: &FetcherConfig) -> Self {
        Self {
            program: config.ytdlp_path.clone(),
            base_url: config.base_url.clone(),
            chunk_size: config.chunk_size,
        }
    }

    /// Watch URL for a media id
    pub fn media_url(&self, media_id: &str) -> String {
        format!("{}{}", self.base_url, media_id)
    }

    /// Command line arguments for one download
    pub fn args(&self, request: &FetchRequest) -> Vec<String> {
        vec![
            "--quiet".to_string(),
            "--no-warnings".to_string(),
            "--no-playlist".to_string(),
            "--no-part".to_string(),
            "-f".to_string(),
            format_selector(request.token).to_string(),
            "-o".to_string(),
            "-".to_string(),
            "--".to_string(),
            self.media_url(&request.media_id),
        ]
    }
}

/// yt-dlp format selector for a stream rank
pub fn format_selector(token: QualityToken) -> &'static str {
    match token {
        QualityToken::Highest => "best",
        QualityToken::Lowest => "worst",
        QualityToken::HighestVideo => "bestvideo",
        QualityToken::LowestVideo => "worstvideo",
        QualityToken::HighestAudio => "bestaudio",
        QualityToken::LowestAudio => "worstaudio",
    }
}

/// Turn yt-dlp's stderr into an error kind
pub fn classify_failure(stderr: &str) -> MediaError {
    let message = stderr.trim().to_string();
    if NOT_FOUND_MARKERS.iter().any(|marker| stderr.contains(marker)) {
        MediaError::NotFound(message)
    } else {
        MediaError::Upstream(message)
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<MediaStream, MediaError> {
        tracing::info!(
            media_id = %request.media_id,
            filter = %request.filter,
            quality = %request.token,
            "Starting download"
        );

        let mut command = Command::new(&self.program);
        command.args(self.args(request));

        spawn_stream(
            command,
            ProcessOptions {
                label: "yt-dlp",
                chunk_size: self.chunk_size,
                classify: classify_failure,
                input: None,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::StreamFilter;

    fn request(token: QualityToken) -> FetchRequest {
        FetchRequest {
            media_id: "ptdgQMSZKVg".to_string(),
            filter: StreamFilter::AudioOnly,
            token,
        }
    }

    #[test]
    fn test_args() {
        let fetcher = YtDlpFetcher::new(&FetcherConfig::default());
        let args = fetcher.args(&request(QualityToken::HighestAudio));
        assert_eq!(
            args.last().map(String::as_str),
            Some("https://www.youtube.com/watch?v=ptdgQMSZKVg")
        );
        let f = args.iter().position(|a| a == "-f").unwrap();
        assert_eq!(args[f + 1], "bestaudio");
        let o = args.iter().position(|a| a == "-o").unwrap();
        assert_eq!(args[o + 1], "-");
    }

    #[test]
    fn test_format_selectors() {
        assert_eq!(format_selector(QualityToken::Highest), "best");
        assert_eq!(format_selector(QualityToken::Lowest), "worst");
        assert_eq!(format_selector(QualityToken::HighestVideo), "bestvideo");
        assert_eq!(format_selector(QualityToken::LowestVideo), "worstvideo");
        assert_eq!(format_selector(QualityToken::HighestAudio), "bestaudio");
        assert_eq!(format_selector(QualityToken::LowestAudio), "worstaudio");
    }

    #[test]
    fn test_classify_failure() {
        assert!(matches!(
            classify_failure("ERROR: [youtube] aaaaaaaaaaa: Video unavailable\n"),
            MediaError::NotFound(_)
        ));
        assert!(matches!(
            classify_failure("ERROR: [youtube] aaaaaaaaaaa: Private video. Sign in"),
            MediaError::NotFound(_)
        ));
        assert!(matches!(
            classify_failure("ERROR: unable to download video data: HTTP Error 403"),
            MediaError::Upstream(_)
        ));
    }

    #[cfg(unix)]
    mod spawned {
        use super::*;
        use crate::process::tests::script;
        use futures::StreamExt;

        fn fetcher(program: PathBuf) -> YtDlpFetcher {
            YtDlpFetcher::new(&FetcherConfig {
                ytdlp_path: program,
                ..Default::default()
            })
        }

        #[tokio::test]
        async fn test_fetch_streams_stdout() {
            let dir = tempfile::tempdir().unwrap();
            let program = script(&dir, "yt-dlp", "printf 'media-bytes'\n");

            let mut stream = fetcher(program)
                .fetch(&request(QualityToken::HighestAudio))
                .await
                .unwrap();
            let mut out = Vec::new();
            while let Some(chunk) = stream.next().await {
                out.extend_from_slice(&chunk.unwrap());
            }
            assert_eq!(out, b"media-bytes");
        }

        #[tokio::test]
        async fn test_fetch_unavailable() {
            let dir = tempfile::tempdir().unwrap();
            let program = script(
                &dir,
                "yt-dlp",
                "echo 'ERROR: [youtube] ptdgQMSZKVg: Video unavailable' >&2\nexit 1\n",
            );

            let mut stream = fetcher(program)
                .fetch(&request(QualityToken::HighestAudio))
                .await
                .unwrap();
            assert!(matches!(
                stream.next().await,
                Some(Err(MediaError::NotFound(_)))
            ));
            assert!(stream.next().await.is_none());
        }
    }
}
