// Extraction engine backends

mod ytdlp;

pub use ytdlp::{Launcher, YtDlpEngine};
