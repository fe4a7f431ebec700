// Failure diagnostics - classifies engine error output for logging
//
// The client always receives the engine's own message; the class only
// ends up in log fields so operators can group failures.

use std::fmt;

/// Coarse reason an engine run failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// URL not handled by any extractor
    UnsupportedUrl,
    /// Video deleted, removed or otherwise gone
    Unavailable,
    /// Private video requiring authorization
    Private,
    /// Geographic restriction
    GeoBlocked,
    /// Age-restricted content requiring login
    AgeRestricted,
    /// Rate limiting or bot detection
    RateLimited,
    /// Network timeout or connection failure
    Network,
    /// Engine binary or module missing
    ToolMissing,
    /// Requested format not offered by the source
    FormatUnavailable,
    /// Anything else
    Unknown,
}

impl FailureClass {
    /// Whether a later attempt could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Network)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnsupportedUrl => "unsupported_url",
            Self::Unavailable => "unavailable",
            Self::Private => "private",
            Self::GeoBlocked => "geo_blocked",
            Self::AgeRestricted => "age_restricted",
            Self::RateLimited => "rate_limited",
            Self::Network => "network",
            Self::ToolMissing => "tool_missing",
            Self::FormatUnavailable => "format_unavailable",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Analyze an error message and return its failure class
pub fn diagnose_error(error: &str) -> FailureClass {
    let lower = error.to_lowercase();

    if lower.contains("failed to start") || lower.contains("no module named") {
        return FailureClass::ToolMissing;
    }

    if lower.contains("unsupported url") || lower.contains("is not a valid url") {
        return FailureClass::UnsupportedUrl;
    }

    if lower.contains("requested format is not available") {
        return FailureClass::FormatUnavailable;
    }

    if lower.contains("private video")
        || lower.contains("video is private")
        || lower.contains("sign in if you've been granted access")
    {
        return FailureClass::Private;
    }

    if lower.contains("age-restricted")
        || lower.contains("sign in to confirm your age")
        || lower.contains("age_verification")
    {
        return FailureClass::AgeRestricted;
    }

    if lower.contains("available in your country")
        || lower.contains("geo restriction")
        || lower.contains("geo-restricted")
        || lower.contains("blocked it in your country")
    {
        return FailureClass::GeoBlocked;
    }

    if lower.contains("video unavailable")
        || lower.contains("video has been removed")
        || lower.contains("no longer available")
        || lower.contains("http error 404")
    {
        return FailureClass::Unavailable;
    }

    if lower.contains("http error 429")
        || lower.contains("too many requests")
        || lower.contains("confirm you're not a bot")
    {
        return FailureClass::RateLimited;
    }

    if lower.contains("timed out")
        || lower.contains("timeout")
        || lower.contains("connection reset")
        || lower.contains("name or service not known")
        || lower.contains("network is unreachable")
    {
        return FailureClass::Network;
    }

    FailureClass::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_url_detection() {
        let error = "ERROR: Unsupported URL: https://example.com/";
        assert_eq!(diagnose_error(error), FailureClass::UnsupportedUrl);
    }

    #[test]
    fn test_unavailable_detection() {
        let error = "ERROR: [youtube] abc: Video unavailable";
        assert_eq!(diagnose_error(error), FailureClass::Unavailable);
    }

    #[test]
    fn test_private_detection() {
        let error = "ERROR: [youtube] abc: Private video. Sign in if you've been granted access";
        assert_eq!(diagnose_error(error), FailureClass::Private);
    }

    #[test]
    fn test_geo_detection() {
        let error = "The uploader has not made this video available in your country";
        assert_eq!(diagnose_error(error), FailureClass::GeoBlocked);
    }

    #[test]
    fn test_age_restricted_detection() {
        let error = "Sign in to confirm your age";
        assert_eq!(diagnose_error(error), FailureClass::AgeRestricted);
    }

    #[test]
    fn test_rate_limit_detection() {
        let error = "ERROR: HTTP Error 429: Too Many Requests";
        assert_eq!(diagnose_error(error), FailureClass::RateLimited);
        assert!(FailureClass::RateLimited.is_transient());
    }

    #[test]
    fn test_timeout_detection() {
        let error = "Timed out after 30s";
        assert_eq!(diagnose_error(error), FailureClass::Network);
    }

    #[test]
    fn test_missing_tool_detection() {
        let error = "Failed to start yt-dlp: No such file or directory (os error 2)";
        assert_eq!(diagnose_error(error), FailureClass::ToolMissing);
        assert!(!FailureClass::ToolMissing.is_transient());
    }

    #[test]
    fn test_format_detection() {
        let error = "ERROR: [youtube] abc: Requested format is not available";
        assert_eq!(diagnose_error(error), FailureClass::FormatUnavailable);
    }

    #[test]
    fn test_unknown() {
        assert_eq!(diagnose_error("something odd"), FailureClass::Unknown);
    }
}
