// FormatSelector - maps the client's format choice onto yt-dlp instructions
//
// Three behaviours:
// - mp3: best audio, transcoded to 192 kbps MP3
// - low: worst stream in an MP4 container
// - anything else: best stream in an MP4 container, extension kept literally

use super::errors::GatewayError;

/// Longest literal selector accepted as a file extension
const MAX_EXTENSION_LEN: usize = 16;

/// Format choice sent by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatSelector {
    /// Best video in an MP4 container; carries the extension to use
    DefaultVideo(String),
    /// Worst video in an MP4 container
    LowQualityVideo,
    /// Best audio, transcoded to MP3
    AudioOnly,
}

/// Engine instructions derived from a selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    /// Value for yt-dlp `-f`
    pub format: String,
    /// Audio codec to extract to, if the download is transcoded
    pub extract_audio: Option<AudioTranscode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTranscode {
    pub codec: &'static str,
    pub quality_kbps: u32,
}

impl FormatSelector {
    /// Parse the client value; a missing value means `mp4`.
    pub fn parse(value: Option<&str>) -> Result<Self, GatewayError> {
        match value.unwrap_or("mp4") {
            "mp3" => Ok(Self::AudioOnly),
            "low" => Ok(Self::LowQualityVideo),
            other => {
                // The literal ends up in a filename
                let valid = !other.is_empty()
                    && other.len() <= MAX_EXTENSION_LEN
                    && other.chars().all(|c| c.is_ascii_alphanumeric());
                if valid {
                    Ok(Self::DefaultVideo(other.to_string()))
                } else {
                    Err(GatewayError::invalid("Invalid format"))
                }
            }
        }
    }

    /// Extension of the stored artifact
    pub fn extension(&self) -> &str {
        match self {
            Self::AudioOnly => "mp3",
            Self::LowQualityVideo => "low",
            Self::DefaultVideo(ext) => ext,
        }
    }

    /// Get format spec for yt-dlp
    pub fn format_spec(&self) -> FormatSpec {
        match self {
            Self::AudioOnly => FormatSpec {
                format: "bestaudio/best".to_string(),
                extract_audio: Some(AudioTranscode {
                    codec: "mp3",
                    quality_kbps: 192,
                }),
            },
            Self::LowQualityVideo => FormatSpec {
                format: "worst[ext=mp4]".to_string(),
                extract_audio: None,
            },
            Self::DefaultVideo(_) => FormatSpec {
                format: "best[ext=mp4]".to_string(),
                extract_audio: None,
            },
        }
    }
}
