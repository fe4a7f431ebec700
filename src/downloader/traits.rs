// Extraction engine trait definition

use async_trait::async_trait;
use std::path::Path;

use super::errors::EngineError;
use super::format_selector::FormatSpec;
use super::models::MetadataResult;

/// External component that resolves video URLs and performs transfers.
#[async_trait]
pub trait ExtractionEngine: Send + Sync {
    /// Name of the engine (for logging)
    fn name(&self) -> &'static str;

    /// Query metadata only, no media is transferred
    async fn fetch_metadata(&self, url: &str) -> Result<MetadataResult, EngineError>;

    /// Download `url` to `destination`, applying `spec`.
    ///
    /// `destination` is the final artifact path, extension included.
    async fn download_media(
        &self,
        url: &str,
        spec: &FormatSpec,
        destination: &Path,
    ) -> Result<(), EngineError>;
}
