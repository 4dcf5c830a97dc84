//! Application state owned by the display thread.
//!
//! The form fields, the log and the progress bar all live here. A download's
//! worker only ever talks to this struct through its [`DownloadHandle`] event
//! channel, drained once per frame by [`AppState::poll`].

use std::path::PathBuf;
use tokio::runtime::Handle;
use tracing::{info, warn};
use crate::command::{build_args, display_command};
use crate::config::Settings;
use crate::downloader::{self, DownloadHandle};
use crate::error::InputError;
use crate::model::{DownloadEvent, DownloadRequest, Format, Outcome, Resolution};

pub struct AppState {
    /// Input field for the video URL
    pub url: String,
    /// Destination folder, as typed or picked
    pub output_folder: String,
    pub format: Format,
    pub resolution: Resolution,
    pub use_aria2: bool,
    pub download_thumbnail: bool,
    pub download_subtitles: bool,
    /// Current percentage shown by the progress bar
    pub progress: u8,
    /// Lines shown in the log panel
    pub log: Vec<String>,
    /// Message for the error dialog, cleared when dismissed
    pub error: Option<String>,
    /// Executable to run
    tool: PathBuf,
    /// The single in-flight download, if any
    active: Option<DownloadHandle>,
}

impl AppState {
    pub fn new(settings: &Settings) -> Self {
        Self {
            url: String::new(),
            output_folder: settings.default_folder.display().to_string(),
            format: Format::default(),
            resolution: Resolution::default(),
            use_aria2: false,
            download_thumbnail: false,
            download_subtitles: false,
            progress: 0,
            log: Vec::new(),
            error: None,
            tool: settings.tool.clone(),
            active: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn can_start(&self) -> bool {
        self.active.is_none()
    }

    pub fn can_cancel(&self) -> bool {
        self.active.as_ref().is_some_and(|h| !h.is_cancelling())
    }

    /// Validates the form into a request. Nothing is spawned here.
    pub fn request(&self) -> Result<DownloadRequest, InputError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(InputError::EmptyUrl);
        }

        let folder = self.output_folder.trim();
        if folder.is_empty() {
            return Err(InputError::NoFolder);
        }
        let output_folder = PathBuf::from(folder);
        if !output_folder.exists() {
            return Err(InputError::FolderMissing(output_folder));
        }

        Ok(DownloadRequest {
            url: url.to_owned(),
            output_folder,
            format: self.format,
            resolution: self.resolution,
            use_aria2: self.use_aria2,
            download_thumbnail: self.download_thumbnail,
            download_subtitles: self.download_subtitles,
        })
    }

    /// Starts a download from the current form. Input errors go to the
    /// error dialog and leave the state idle.
    pub fn start(&mut self, runtime: &Handle) {
        if !self.can_start() {
            return;
        }

        let request = match self.request() {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "download not started");
                self.error = Some(e.to_string());
                return;
            }
        };

        let args = build_args(&request);
        info!(url = %request.url, folder = %request.output_folder.display(), "starting download");

        self.progress = 0;
        self.log.push("Starting download...".to_owned());
        self.log.push(format!("Command: {}", display_command(&self.tool, &args)));
        self.active = Some(downloader::start(runtime, self.tool.clone(), args));
    }

    /// Asks the tool to stop and clears the bar at once. Start stays
    /// disabled until the child has actually exited.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.active.as_mut() {
            handle.cancel();
            self.progress = 0;
        }
    }

    fn is_cancelling(&self) -> bool {
        self.active.as_ref().is_some_and(DownloadHandle::is_cancelling)
    }

    /// Applies every queued worker event. Returns true if anything changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Some(event) = self.active.as_mut().and_then(DownloadHandle::try_recv) {
            self.apply(event);
            changed = true;
        }
        changed
    }

    fn apply(&mut self, event: DownloadEvent) {
        match event {
            DownloadEvent::Log(line) => self.log.push(line),
            // samples queued before the cancel must not refill the bar
            DownloadEvent::Progress(_) if self.is_cancelling() => {}
            DownloadEvent::Progress(pct) => self.progress = pct,
            DownloadEvent::Finished(outcome) => self.finish(outcome),
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        self.active = None;
        match outcome {
            Outcome::Succeeded => {
                self.progress = 100;
                self.log.push("✓ Download completed successfully!".to_owned());
            }
            Outcome::Failed(code) => {
                self.log.push(format!("✗ Download failed with error code {code}"));
            }
            Outcome::Cancelled => {
                self.progress = 0;
                self.log.push("⚠ Download cancelled by user.".to_owned());
            }
            Outcome::ToolMissing => {
                self.log.push(format!(
                    "✗ Error: {} not found. Please install it first.",
                    self.tool.display()
                ));
                self.error = Some(format!("{} is not installed or not in PATH.", self.tool.display()));
            }
            Outcome::Error(msg) => {
                self.log.push(format!("✗ Error: {msg}"));
                self.error = Some(format!("An error occurred: {msg}"));
            }
        }
    }
}
