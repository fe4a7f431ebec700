// Request validation: URL presence and coarse per-platform shape checks

use regex::Regex;

use super::errors::GatewayError;
use super::models::Platform;

lazy_static::lazy_static! {
    static ref YOUTUBE_RE: Regex =
        Regex::new(r"^.*(youtube\.com/watch\?v=|youtu\.be/).*").unwrap();
    static ref TIKTOK_RE: Regex =
        Regex::new(r"^.*(tiktok\.com/@.+/video/|vm\.tiktok\.com/).*").unwrap();
}

/// Check a candidate URL against the platform hint.
///
/// Unrecognised platforms are accepted without any pattern check.
pub fn validate_url<'a>(
    url: Option<&'a str>,
    platform: &Platform,
) -> Result<&'a str, GatewayError> {
    let url = match url {
        Some(url) if !url.is_empty() => url,
        _ => return Err(GatewayError::invalid("URL is required")),
    };

    match platform {
        Platform::YouTube if !YOUTUBE_RE.is_match(url) => {
            tracing::debug!(url, "rejected YouTube URL");
            Err(GatewayError::invalid("Invalid YouTube URL"))
        }
        Platform::TikTok if !TIKTOK_RE.is_match(url) => {
            tracing::debug!(url, "rejected TikTok URL");
            Err(GatewayError::invalid("Invalid TikTok URL"))
        }
        Platform::Other(name) => {
            tracing::debug!(url, platform = %name, "unrecognised platform, skipping URL check");
            Ok(url)
        }
        _ => Ok(url),
    }
}
