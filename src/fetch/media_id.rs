//! Media id extraction from platform URLs

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use url::Url;

use crate::error::ExtractError;

/// Platform ids are always this long
pub const MEDIA_ID_LEN: usize = 11;

/// Hosts that carry the id in the `v` query parameter
const QUERY_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "gaming.youtube.com",
];

/// Hosts that may carry the id as a path segment
const PATH_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "youtube-nocookie.com",
    "www.youtube-nocookie.com",
];

/// Path prefixes followed directly by an id
const ID_PATHS: &[&str] = &["embed", "v", "shorts", "live", "e"];

const SHORT_HOST: &str = "youtu.be";

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("valid id regex"))
}

/// A URL together with the media id found in it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct MediaIdentity {
    /// The URL as given
    #[schema(example = "https://www.youtube.com/watch?v=ptdgQMSZKVg")]
    pub url: String,
    /// The extracted media id
    #[schema(example = "ptdgQMSZKVg")]
    pub id: String,
}

/// Whether `id` looks like a platform media id
pub fn is_valid_media_id(id: &str) -> bool {
    id_pattern().is_match(id)
}

/// Extract the media id from a watch, short, embed or shorts URL.
pub fn extract_media_id(link: &str) -> Result<MediaIdentity, ExtractError> {
    let parsed =
        Url::parse(link.trim()).map_err(|_| ExtractError::InvalidUrl(link.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ExtractError::InvalidUrl(link.to_string()));
    }
    let host = parsed
        .host_str()
        .ok_or_else(|| ExtractError::InvalidUrl(link.to_string()))?
        .to_ascii_lowercase();

    let query_id = parsed
        .query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty());

    let segments = parsed
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect::<Vec<_>>())
        .unwrap_or_default();

    let candidate = if host == SHORT_HOST {
        query_id.or_else(|| segments.first().map(|s| s.to_string()))
    } else if let Some(id) = query_id.filter(|_| QUERY_HOSTS.contains(&host.as_str())) {
        Some(id)
    } else if PATH_HOSTS.contains(&host.as_str()) {
        match segments.as_slice() {
            [prefix, id, ..] if ID_PATHS.contains(prefix) => Some(id.to_string()),
            _ => None,
        }
    } else {
        return Err(ExtractError::UnsupportedHost(host));
    };

    let candidate = candidate.ok_or_else(|| ExtractError::MissingId(link.to_string()))?;
    let id: String = candidate.chars().take(MEDIA_ID_LEN).collect();
    if !is_valid_media_id(&id) {
        return Err(ExtractError::InvalidId(id));
    }

    Ok(MediaIdentity {
        url: link.to_string(),
        id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id_of(link: &str) -> String {
        extract_media_id(link).unwrap().id
    }

    #[test]
    fn test_watch_url() {
        let result = extract_media_id("https://www.youtube.com/watch?v=ptdgQMSZKVg").unwrap();
        assert_eq!(
            result,
            MediaIdentity {
                url: "https://www.youtube.com/watch?v=ptdgQMSZKVg".to_string(),
                id: "ptdgQMSZKVg".to_string(),
            }
        );
    }

    #[test]
    fn test_url_variants() {
        assert_eq!(id_of("https://youtu.be/uWN-SLVR69Q"), "uWN-SLVR69Q");
        assert_eq!(id_of("https://youtu.be/uWN-SLVR69Q?t=30"), "uWN-SLVR69Q");
        assert_eq!(id_of("https://m.youtube.com/watch?v=uWN-SLVR69Q"), "uWN-SLVR69Q");
        assert_eq!(
            id_of("https://music.youtube.com/watch?v=uWN-SLVR69Q&list=RD"),
            "uWN-SLVR69Q"
        );
        assert_eq!(id_of("https://www.youtube.com/embed/uWN-SLVR69Q"), "uWN-SLVR69Q");
        assert_eq!(id_of("https://www.youtube.com/shorts/uWN-SLVR69Q"), "uWN-SLVR69Q");
        assert_eq!(id_of("http://youtube.com/v/uWN-SLVR69Q"), "uWN-SLVR69Q");
        assert_eq!(
            id_of("https://www.youtube-nocookie.com/embed/uWN-SLVR69Q"),
            "uWN-SLVR69Q"
        );
    }

    #[test]
    fn test_long_id_is_truncated() {
        assert_eq!(
            id_of("https://www.youtube.com/watch?v=ptdgQMSZKVgEXTRA"),
            "ptdgQMSZKVg"
        );
    }

    #[test]
    fn test_not_a_url() {
        assert_eq!(
            extract_media_id("not a url"),
            Err(ExtractError::InvalidUrl("not a url".to_string()))
        );
        assert!(matches!(
            extract_media_id("ftp://www.youtube.com/watch?v=ptdgQMSZKVg"),
            Err(ExtractError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_unsupported_host() {
        assert_eq!(
            extract_media_id("https://example.com/watch?v=ptdgQMSZKVg"),
            Err(ExtractError::UnsupportedHost("example.com".to_string()))
        );
    }

    #[test]
    fn test_missing_and_invalid_ids() {
        assert!(matches!(
            extract_media_id("https://www.youtube.com/feed/trending"),
            Err(ExtractError::MissingId(_))
        ));
        assert!(matches!(
            extract_media_id("https://www.youtube.com/watch?v=short"),
            Err(ExtractError::InvalidId(_))
        ));
        assert!(matches!(
            extract_media_id("https://youtu.be/"),
            Err(ExtractError::MissingId(_))
        ));
    }
}
