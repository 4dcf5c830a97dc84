use std::env;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the yt-dlp executable
pub const TOOL_ENV: &str = "YT_DLP_GUI_TOOL";

/// Executable looked up on PATH when no override is set
pub const DEFAULT_TOOL: &str = "yt-dlp";

/// Process-wide settings, resolved once at startup
#[derive(Clone, Debug)]
pub struct Settings {
    /// Program handed to the process spawner
    pub tool: PathBuf,
    /// Folder pre-filled in the form
    pub default_folder: PathBuf,
}

impl Settings {
    pub fn from_env() -> Self {
        let tool = env::var_os(TOOL_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TOOL));
        let default_folder = default_download_folder(dirs::home_dir().as_deref());
        Self { tool, default_folder }
    }
}

/// `<home>/Downloads` when it exists, else `<home>`, else the working directory.
pub fn default_download_folder(home: Option<&Path>) -> PathBuf {
    match home {
        Some(home) => {
            let downloads = home.join("Downloads");
            if downloads.is_dir() {
                downloads
            } else {
                home.to_path_buf()
            }
        }
        None => PathBuf::from("."),
    }
}
