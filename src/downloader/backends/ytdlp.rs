// yt-dlp engine - drives the yt-dlp CLI (or its Python module) as a child process

use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use std::process::Command as StdCommand;
use std::time::Duration;

use crate::downloader::diagnostics::diagnose_error;
use crate::downloader::errors::EngineError;
use crate::downloader::format_selector::FormatSpec;
use crate::downloader::models::MetadataResult;
use crate::downloader::traits::ExtractionEngine;
use crate::downloader::utils::run_output_with_timeout;

/// How the engine process is started
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Launcher {
    /// Native `yt-dlp` executable
    Binary(String),
    /// `<interpreter> -m yt_dlp`
    PythonModule(String),
}

impl Launcher {
    /// Find yt-dlp binary in common install locations, then PATH.
    pub fn detect_binary() -> Self {
        let common_paths = [
            "/opt/homebrew/bin/yt-dlp", // Homebrew on Apple Silicon
            "/usr/local/bin/yt-dlp",    // Homebrew on Intel Mac, pip --user installs
            "/usr/bin/yt-dlp",          // System installation
        ];

        for path in common_paths {
            if Path::new(path).exists() {
                return Self::Binary(path.to_string());
            }
        }

        if let Ok(output) = StdCommand::new("which").arg("yt-dlp").output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return Self::Binary(path);
                }
            }
        }

        Self::Binary("yt-dlp".to_string())
    }

    fn program(&self) -> &str {
        match self {
            Self::Binary(path) => path,
            Self::PythonModule(interpreter) => interpreter,
        }
    }

    fn base_args(&self) -> Vec<String> {
        match self {
            Self::Binary(_) => Vec::new(),
            Self::PythonModule(_) => vec!["-m".to_string(), "yt_dlp".to_string()],
        }
    }
}

impl fmt::Display for Launcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary(path) => write!(f, "{}", path),
            Self::PythonModule(interpreter) => write!(f, "{} -m yt_dlp", interpreter),
        }
    }
}

/// Engine backed by yt-dlp
pub struct YtDlpEngine {
    launcher: Launcher,
    metadata_timeout: Option<Duration>,
    download_timeout: Option<Duration>,
}

impl YtDlpEngine {
    pub fn new(
        launcher: Launcher,
        metadata_timeout: Option<Duration>,
        download_timeout: Option<Duration>,
    ) -> Self {
        Self {
            launcher,
            metadata_timeout,
            download_timeout,
        }
    }

    pub fn launcher(&self) -> &Launcher {
        &self.launcher
    }

    fn metadata_args(&self, url: &str) -> Vec<String> {
        let mut args = self.launcher.base_args();
        args.extend(
            [
                "--dump-single-json",
                "--no-playlist",
                "--no-warnings",
                "--quiet",
                "--",
            ]
            .map(String::from),
        );
        args.push(url.to_string());
        args
    }

    fn download_args(&self, url: &str, spec: &FormatSpec, destination: &Path) -> Vec<String> {
        let mut args = self.launcher.base_args();
        args.extend(
            ["--no-playlist", "--no-warnings", "--quiet", "--no-progress"].map(String::from),
        );
        args.push("-f".to_string());
        args.push(spec.format.clone());

        args.push("-o".to_string());
        args.push(output_template(destination, spec.extract_audio.is_some()));

        if let Some(audio) = &spec.extract_audio {
            args.push("-x".to_string());
            args.push("--audio-format".to_string());
            args.push(audio.codec.to_string());
            args.push("--audio-quality".to_string());
            args.push(format!("{}K", audio.quality_kbps));
        }

        args.push("--".to_string());
        args.push(url.to_string());
        args
    }

    async fn run(
        &self,
        args: Vec<String>,
        limit: Option<Duration>,
    ) -> Result<Vec<u8>, EngineError> {
        let program = self.launcher.program();
        tracing::debug!(engine = self.name(), "{} {}", program, args.join(" "));

        let output = run_output_with_timeout(program, args, limit)
            .await
            .map_err(EngineError::new)?;

        if output.status.success() {
            Ok(output.stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(EngineError::from_stderr(&stderr))
        }
    }
}

/// Build the yt-dlp `-o` template for a destination path.
///
/// When audio is extracted the post-processor swaps the extension, so the
/// template leaves it to yt-dlp and the result lands on the destination.
fn output_template(destination: &Path, extension_from_engine: bool) -> String {
    let target = if extension_from_engine {
        destination.with_extension("")
    } else {
        destination.to_path_buf()
    };
    // Literal `%` would be read as a template field
    let escaped = target.to_string_lossy().replace('%', "%%");

    if extension_from_engine {
        format!("{}.%(ext)s", escaped)
    } else {
        escaped
    }
}

#[async_trait]
impl ExtractionEngine for YtDlpEngine {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn fetch_metadata(&self, url: &str) -> Result<MetadataResult, EngineError> {
        let stdout = self
            .run(self.metadata_args(url), self.metadata_timeout)
            .await
            .map_err(|e| log_failure("metadata", url, e))?;

        let json: serde_json::Value = serde_json::from_slice(&stdout)
            .map_err(|e| EngineError::new(format!("Invalid JSON from yt-dlp: {}", e)))?;

        tracing::info!(url, "metadata fetched");
        Ok(MetadataResult::from_engine_json(&json))
    }

    async fn download_media(
        &self,
        url: &str,
        spec: &FormatSpec,
        destination: &Path,
    ) -> Result<(), EngineError> {
        self.run(self.download_args(url, spec, destination), self.download_timeout)
            .await
            .map_err(|e| log_failure("download", url, e))?;

        if tokio::fs::metadata(destination).await.is_err() {
            return Err(log_failure(
                "download",
                url,
                EngineError::new("yt-dlp finished without producing the requested file"),
            ));
        }

        tracing::info!(url, destination = %destination.display(), "download finished");
        Ok(())
    }
}

fn log_failure(operation: &str, url: &str, err: EngineError) -> EngineError {
    let class = diagnose_error(&err.message);
    tracing::warn!(
        operation,
        url,
        class = %class,
        transient = class.is_transient(),
        "yt-dlp failed: {}",
        err.message
    );
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::format_selector::FormatSelector;
    use std::path::PathBuf;

    fn engine(launcher: Launcher) -> YtDlpEngine {
        YtDlpEngine::new(launcher, None, None)
    }

    #[test]
    fn test_metadata_args() {
        let args = engine(Launcher::Binary("yt-dlp".into())).metadata_args("https://youtu.be/x");
        assert_eq!(args[0], "--dump-single-json");
        assert!(args.contains(&"--no-playlist".to_string()));
        assert_eq!(args.last().unwrap(), "https://youtu.be/x");
    }

    #[test]
    fn test_python_launcher_prefixes_module() {
        let launcher = Launcher::PythonModule("python3".into());
        assert_eq!(launcher.program(), "python3");
        assert_eq!(launcher.to_string(), "python3 -m yt_dlp");

        let args = engine(launcher).metadata_args("u");
        assert_eq!(&args[..3], &["-m", "yt_dlp", "--dump-single-json"]);
    }

    #[test]
    fn test_video_download_uses_exact_path() {
        let spec = FormatSelector::LowQualityVideo.format_spec();
        let dest = PathBuf::from("/data/abc.low");
        let args = engine(Launcher::Binary("yt-dlp".into())).download_args("u", &spec, &dest);

        let f = args.iter().position(|a| a == "-f").unwrap();
        assert_eq!(args[f + 1], "worst[ext=mp4]");
        let o = args.iter().position(|a| a == "-o").unwrap();
        assert_eq!(args[o + 1], "/data/abc.low");
        assert!(!args.contains(&"-x".to_string()));
    }

    #[test]
    fn test_audio_download_transcodes() {
        let spec = FormatSelector::AudioOnly.format_spec();
        let dest = PathBuf::from("/data/abc.mp3");
        let args = engine(Launcher::Binary("yt-dlp".into())).download_args("u", &spec, &dest);

        let o = args.iter().position(|a| a == "-o").unwrap();
        assert_eq!(args[o + 1], "/data/abc.%(ext)s");
        assert!(args.contains(&"-x".to_string()));
        let q = args.iter().position(|a| a == "--audio-quality").unwrap();
        assert_eq!(args[q + 1], "192K");
        let c = args.iter().position(|a| a == "--audio-format").unwrap();
        assert_eq!(args[c + 1], "mp3");
    }

    #[test]
    fn test_template_escapes_percent() {
        let dest = PathBuf::from("/data/100%/abc.mp4");
        assert_eq!(output_template(&dest, false), "/data/100%%/abc.mp4");
    }

    #[tokio::test]
    async fn test_missing_binary_is_engine_error() {
        let engine = engine(Launcher::Binary("definitely-not-yt-dlp-xyz".into()));
        let err = engine.fetch_metadata("https://youtu.be/x").await.unwrap_err();
        assert!(err.message.contains("Failed to start"));
    }

    /// Install `body` as an executable `yt-dlp` stand-in under `dir`.
    #[cfg(unix)]
    fn script(dir: &Path, body: &str) -> Launcher {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("yt-dlp");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        Launcher::Binary(path.to_string_lossy().into_owned())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_metadata_parsed_from_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = script(
            dir.path(),
            r#"cat <<'JSON'
{"title": "Clip", "duration": 212, "thumbnail": "https://i.ytimg.com/vi/x/hq.jpg",
 "formats": [{"format_id": "18", "ext": "mp4"}]}
JSON"#,
        );

        let info = engine(launcher).fetch_metadata("https://youtu.be/x").await.unwrap();

        assert_eq!(info.title, "Clip");
        assert_eq!(info.duration, serde_json::Number::from(212));
        assert_eq!(info.thumbnail, "https://i.ytimg.com/vi/x/hq.jpg");
        assert_eq!(info.formats, vec![serde_json::json!({ "format_id": "18", "ext": "mp4" })]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_multi_entry_url_yields_one_document() {
        // Line-per-entry output for --dump-json, one document for --dump-single-json
        let dir = tempfile::tempdir().unwrap();
        let launcher = script(
            dir.path(),
            r#"if [ "$1" = "--dump-json" ]; then
  echo '{"title": "first"}'
  echo '{"title": "second"}'
else
  echo '{"_type": "playlist", "title": "uploads", "entries": [{"title": "first"}]}'
fi"#,
        );

        let info = engine(launcher)
            .fetch_metadata("https://www.tiktok.com/@someone")
            .await
            .unwrap();

        assert_eq!(info.title, "uploads");
        assert_eq!(info.duration, serde_json::Number::from(0));
        assert!(info.formats.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_download_writes_destination() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = script(
            dir.path(),
            r#"while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; fi
  shift
done
printf 'media' > "$out""#,
        );
        let dest = dir.path().join("abc.mp4");
        let spec = FormatSelector::DefaultVideo("mp4".into()).format_spec();

        engine(launcher)
            .download_media("https://youtu.be/x", &spec, &dest)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"media");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_success_without_output_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = script(dir.path(), "exit 0");
        let dest = dir.path().join("abc.mp4");
        let spec = FormatSelector::DefaultVideo("mp4".into()).format_spec();

        let err = engine(launcher)
            .download_media("https://youtu.be/x", &spec, &dest)
            .await
            .unwrap_err();

        assert_eq!(
            err.message,
            "yt-dlp finished without producing the requested file"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failure_reports_last_error_line() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = script(
            dir.path(),
            r#"echo 'WARNING: falling back' >&2
echo 'ERROR: [youtube] x: Video unavailable' >&2
exit 1"#,
        );

        let err = engine(launcher).fetch_metadata("https://youtu.be/x").await.unwrap_err();
        assert_eq!(err.message, "ERROR: [youtube] x: Video unavailable");
    }
}
