// Gateway between HTTP handlers, the extraction engine and storage

use std::sync::Arc;
use std::time::SystemTime;

use uuid::Uuid;

use super::errors::GatewayError;
use super::models::{DownloadRequest, MetadataResult, StoredArtifact};
use super::traits::ExtractionEngine;
use crate::retention::{RetentionSweeper, SweepPolicy};
use crate::storage::ArtifactStore;

#[derive(Clone)]
pub struct Gateway {
    engine: Arc<dyn ExtractionEngine>,
    store: Arc<dyn ArtifactStore>,
    sweeper: RetentionSweeper,
    policy: SweepPolicy,
}

impl Gateway {
    pub fn new(
        engine: Arc<dyn ExtractionEngine>,
        store: Arc<dyn ArtifactStore>,
        policy: SweepPolicy,
    ) -> Self {
        let sweeper = RetentionSweeper::new(store.clone());
        Self {
            engine,
            store,
            sweeper,
            policy,
        }
    }

    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }

    pub fn sweeper(&self) -> &RetentionSweeper {
        &self.sweeper
    }

    /// Query title, duration, thumbnail and formats without downloading.
    pub async fn fetch_metadata(&self, url: &str) -> Result<MetadataResult, GatewayError> {
        tracing::debug!(engine = self.engine.name(), url, "fetching metadata");
        self.engine
            .fetch_metadata(url)
            .await
            .map_err(|e| GatewayError::Extraction(e.message))
    }

    /// Download into a freshly named artifact, then sweep if the policy says so.
    ///
    /// A failed download may leave a partial file behind; it is left for the
    /// sweeper.
    pub async fn download_media(
        &self,
        request: &DownloadRequest,
    ) -> Result<StoredArtifact, GatewayError> {
        let filename = format!("{}.{}", Uuid::new_v4(), request.format.extension());
        let destination = self
            .store
            .resolve(&filename)
            .ok_or_else(|| GatewayError::Download(format!("Cannot store {}", filename)))?;

        tracing::info!(
            engine = self.engine.name(),
            url = %request.url,
            platform = %request.platform,
            format = request.format.extension(),
            %filename,
            "starting download"
        );

        self.engine
            .download_media(&request.url, &request.format.format_spec(), &destination)
            .await
            .map_err(|e| GatewayError::Download(e.message))?;

        if self.policy.sweeps_after_download() {
            // A transfer longer than the window would otherwise sweep itself
            let report = self
                .sweeper
                .sweep_sparing(SystemTime::now(), Some(filename.as_str()))
                .await;
            tracing::debug!(?report, "post-download sweep finished");
        }

        Ok(StoredArtifact { filename })
    }
}
