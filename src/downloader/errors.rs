// Error kinds surfaced by the gateway

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Missing or malformed request field
    InvalidInput(String),

    /// Metadata lookup failed inside the extraction engine
    Extraction(String),

    /// Media transfer or transcode failed
    Download(String),

    /// Requested artifact is not in storage
    NotFound,
}

impl GatewayError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Short machine-readable label, used as a log field
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Extraction(_) => "extraction",
            Self::Download(_) => "download",
            Self::NotFound => "not_found",
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(msg) => write!(f, "{}", msg),
            Self::Extraction(msg) => write!(f, "{}", msg),
            Self::Download(msg) => write!(f, "{}", msg),
            Self::NotFound => write!(f, "File not found"),
        }
    }
}

impl std::error::Error for GatewayError {}

/// Failure reported by the engine process itself.
///
/// Carries the message the client will see; the gateway decides whether it
/// becomes an extraction or a download error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    pub message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Pick the most useful line out of engine stderr.
    ///
    /// yt-dlp prefixes fatal problems with `ERROR:`; the last such line is the
    /// one that aborted the run. Without one the whole (trimmed) output is kept.
    pub fn from_stderr(stderr: &str) -> Self {
        let last_error = stderr
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| line.starts_with("ERROR:"));

        match last_error {
            Some(line) => Self::new(line),
            None if stderr.trim().is_empty() => {
                Self::new("Extraction engine failed without output")
            }
            None => Self::new(stderr.trim()),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for EngineError {}
