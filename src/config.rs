use anyhow::Result;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::downloader::backends::Launcher;
use crate::downloader::utils::limit_from_secs;
use crate::retention::SweepPolicy;

pub static CONFIG_FILE: &str = "video-gateway.toml";
pub static CONFIG_FILE_ENV: &str = "VIDEO_GATEWAY_CONFIG";
pub static ENV_PREFIX: &str = "VIDEO_GATEWAY_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub bind_addr: String,
    pub storage_dir: PathBuf,
    /// yt-dlp executable; detected when unset
    pub ytdlp_path: Option<String>,
    /// Run `<python> -m yt_dlp` instead of the executable
    pub python: Option<String>,
    pub metadata_timeout_secs: u64,
    pub download_timeout_secs: u64,
    /// Sweep on a timer instead of after each download
    pub sweep_interval_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            storage_dir: PathBuf::from("downloads"),
            ytdlp_path: None,
            python: None,
            metadata_timeout_secs: 60,
            download_timeout_secs: 0,
            sweep_interval_secs: None,
        }
    }
}

impl Config {
    /// Defaults, then the TOML file, then `VIDEO_GATEWAY_*` variables.
    pub fn get_config() -> Result<Self> {
        let file = std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| CONFIG_FILE.to_string());
        Ok(Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]))
            .extract()?)
    }

    pub fn launcher(&self) -> Launcher {
        match (&self.python, &self.ytdlp_path) {
            (Some(python), _) => Launcher::PythonModule(python.clone()),
            (None, Some(path)) => Launcher::Binary(path.clone()),
            (None, None) => Launcher::detect_binary(),
        }
    }

    pub fn sweep_policy(&self) -> SweepPolicy {
        match self.sweep_interval_secs {
            Some(secs) if secs > 0 => SweepPolicy::Interval(Duration::from_secs(secs)),
            _ => SweepPolicy::AfterDownload,
        }
    }

    pub fn metadata_timeout(&self) -> Option<Duration> {
        limit_from_secs(self.metadata_timeout_secs)
    }

    pub fn download_timeout(&self) -> Option<Duration> {
        limit_from_secs(self.download_timeout_secs)
    }
}
