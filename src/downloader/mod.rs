// Downloader module - validation, engine abstraction and the gateway on top

pub mod backends;
pub mod diagnostics;
pub mod errors;
pub mod format_selector;
pub mod gateway;
pub mod models;
pub mod traits;
pub mod utils;
pub mod validator;

pub use errors::{EngineError, GatewayError};
pub use format_selector::{FormatSelector, FormatSpec};
pub use gateway::Gateway;
pub use models::{DownloadRequest, MetadataResult, Platform, StoredArtifact};
pub use traits::ExtractionEngine;
