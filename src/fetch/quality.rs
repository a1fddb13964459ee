//! Stream filter and quality selection

use std::fmt;
use std::str::FromStr;

/// Which tracks of a media item to download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamFilter {
    AudioAndVideo,
    VideoOnly,
    AudioOnly,
}

impl StreamFilter {
    pub const ALL: [StreamFilter; 3] = [
        StreamFilter::AudioAndVideo,
        StreamFilter::VideoOnly,
        StreamFilter::AudioOnly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StreamFilter::AudioAndVideo => "videoandaudio",
            StreamFilter::VideoOnly => "videoonly",
            StreamFilter::AudioOnly => "audioonly",
        }
    }
}

impl fmt::Display for StreamFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested relative quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Quality {
    #[default]
    Highest,
    Lowest,
}

impl Quality {
    pub const ALL: [Quality; 2] = [Quality::Highest, Quality::Lowest];

    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Highest => "highest",
            Quality::Lowest => "lowest",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The quality string was neither `highest` nor `lowest`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidQuality(pub String);

impl fmt::Display for InvalidQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown quality {:?}, expected highest or lowest", self.0)
    }
}

impl std::error::Error for InvalidQuality {}

impl FromStr for Quality {
    type Err = InvalidQuality;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "highest" => Ok(Quality::Highest),
            "lowest" => Ok(Quality::Lowest),
            other => Err(InvalidQuality(other.to_string())),
        }
    }
}

/// Concrete stream rank handed to the downloader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualityToken {
    Highest,
    Lowest,
    HighestVideo,
    LowestVideo,
    HighestAudio,
    LowestAudio,
}

impl QualityToken {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityToken::Highest => "highest",
            QualityToken::Lowest => "lowest",
            QualityToken::HighestVideo => "highestvideo",
            QualityToken::LowestVideo => "lowestvideo",
            QualityToken::HighestAudio => "highestaudio",
            QualityToken::LowestAudio => "lowestaudio",
        }
    }
}

impl fmt::Display for QualityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve a filter and quality into the downloader's stream rank.
///
/// Both inputs are closed enums, so every combination has a token.
pub fn resolve_quality_token(filter: StreamFilter, quality: Quality) -> QualityToken {
    match (filter, quality) {
        (StreamFilter::AudioAndVideo, Quality::Highest) => QualityToken::Highest,
        (StreamFilter::AudioAndVideo, Quality::Lowest) => QualityToken::Lowest,
        (StreamFilter::VideoOnly, Quality::Highest) => QualityToken::HighestVideo,
        (StreamFilter::VideoOnly, Quality::Lowest) => QualityToken::LowestVideo,
        (StreamFilter::AudioOnly, Quality::Highest) => QualityToken::HighestAudio,
        (StreamFilter::AudioOnly, Quality::Lowest) => QualityToken::LowestAudio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_table() {
        let expected = [
            (StreamFilter::AudioAndVideo, Quality::Highest, "highest"),
            (StreamFilter::AudioAndVideo, Quality::Lowest, "lowest"),
            (StreamFilter::VideoOnly, Quality::Highest, "highestvideo"),
            (StreamFilter::VideoOnly, Quality::Lowest, "lowestvideo"),
            (StreamFilter::AudioOnly, Quality::Highest, "highestaudio"),
            (StreamFilter::AudioOnly, Quality::Lowest, "lowestaudio"),
        ];
        for (filter, quality, token) in expected {
            assert_eq!(
                resolve_quality_token(filter, quality).as_str(),
                token,
                "{} / {}",
                filter,
                quality
            );
        }
    }

    #[test]
    fn test_every_combination_is_distinct() {
        let mut seen = std::collections::HashSet::new();
        for filter in StreamFilter::ALL {
            for quality in Quality::ALL {
                assert!(seen.insert(resolve_quality_token(filter, quality)));
            }
        }
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn test_parse_quality() {
        assert_eq!("highest".parse::<Quality>(), Ok(Quality::Highest));
        assert_eq!("lowest".parse::<Quality>(), Ok(Quality::Lowest));
        assert_eq!(
            "medium".parse::<Quality>(),
            Err(InvalidQuality("medium".to_string()))
        );
        assert!("Highest".parse::<Quality>().is_err());
        assert!("".parse::<Quality>().is_err());
    }

    #[test]
    fn test_default_quality() {
        assert_eq!(Quality::default(), Quality::Highest);
    }
}
