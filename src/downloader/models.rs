// Common data models for the gateway

use serde::{Deserialize, Serialize};
use std::fmt;

use super::format_selector::FormatSelector;

/// Platform hint sent by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    YouTube,
    TikTok,
    /// Anything else, kept verbatim for logging
    Other(String),
}

impl Platform {
    /// Parse the client value; a missing hint means YouTube.
    pub fn from_hint(hint: Option<&str>) -> Self {
        match hint {
            None | Some("youtube") => Self::YouTube,
            Some("tiktok") => Self::TikTok,
            Some(other) => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::YouTube => write!(f, "youtube"),
            Self::TikTok => write!(f, "tiktok"),
            Self::Other(name) => write!(f, "{}", name),
        }
    }
}

/// A validated download request, alive for one HTTP call
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub format: FormatSelector,
    pub platform: Platform,
}

/// Metadata as reported by the extraction engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataResult {
    pub title: String,
    /// Seconds, as the engine reported them (integer or fractional)
    pub duration: serde_json::Number,
    pub thumbnail: String,
    /// Engine format descriptors, forwarded untouched
    pub formats: Vec<serde_json::Value>,
}

impl MetadataResult {
    /// Build from the engine's JSON dump, applying the documented fallbacks.
    pub fn from_engine_json(json: &serde_json::Value) -> Self {
        Self {
            title: json["title"].as_str().unwrap_or("Unknown").to_string(),
            duration: match &json["duration"] {
                serde_json::Value::Number(n) => n.clone(),
                _ => serde_json::Number::from(0),
            },
            thumbnail: json["thumbnail"].as_str().unwrap_or("").to_string(),
            formats: json["formats"].as_array().cloned().unwrap_or_default(),
        }
    }
}

/// A file produced by a successful download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub filename: String,
}

impl StoredArtifact {
    /// Path under which the artifact can be fetched back
    pub fn download_url(&self) -> String {
        format!("/download-file/{}", self.filename)
    }
}
