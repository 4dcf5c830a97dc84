use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Form problems caught before any process is spawned
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Please enter a URL.")]
    EmptyUrl,

    #[error("Please choose a download folder.")]
    NoFolder,

    #[error("Selected download folder does not exist.")]
    FolderMissing(PathBuf),
}

/// Faults inside the download worker
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("{0} is not installed or not in PATH")]
    ToolMissing(String),

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to terminate the download: {0}")]
    Terminate(io::Error),

    #[error("{0} was terminated by a signal")]
    Signalled(String),
}

pub type DownloadResult<T> = Result<T, DownloadError>;
