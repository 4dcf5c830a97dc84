use std::path::PathBuf;

/// Container/stream choice offered in the format dropdown
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    /// Video merged into mp4, optionally height-limited
    #[default]
    Video,
    /// Audio only, extracted to mp3
    Audio,
    /// Best video and audio streams, resolution ignored
    BestQuality,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Video, Format::Audio, Format::BestQuality];

    /// Label shown in the dropdown
    pub fn label(self) -> &'static str {
        match self {
            Format::Video => "MP4 (video)",
            Format::Audio => "MP3 (audio)",
            Format::BestQuality => "Best Quality",
        }
    }

    /// Whether the resolution selector applies to this format
    pub fn uses_resolution(self) -> bool {
        !matches!(self, Format::Audio)
    }
}

/// Maximum video height requested from the tool
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Resolution {
    #[default]
    Best,
    P144,
    P240,
    P360,
    P480,
    P720,
    P1080,
    P1440,
    P2160,
}

impl Resolution {
    pub const ALL: [Resolution; 9] = [
        Resolution::Best,
        Resolution::P144,
        Resolution::P240,
        Resolution::P360,
        Resolution::P480,
        Resolution::P720,
        Resolution::P1080,
        Resolution::P1440,
        Resolution::P2160,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Resolution::Best => "Best",
            Resolution::P144 => "144p",
            Resolution::P240 => "240p",
            Resolution::P360 => "360p",
            Resolution::P480 => "480p",
            Resolution::P720 => "720p",
            Resolution::P1080 => "1080p",
            Resolution::P1440 => "1440p",
            Resolution::P2160 => "2160p",
        }
    }

    /// Height encoded in the `<N>p` label, `None` for `Best`
    pub fn height(self) -> Option<u32> {
        self.label().strip_suffix('p')?.parse().ok()
    }
}

/// Everything the argument assembler needs for one run.
/// Built fresh from the form each time a download starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Page or media URL handed to the tool as-is
    pub url: String,
    /// Existing folder the file is written into
    pub output_folder: PathBuf,
    /// Selected format
    pub format: Format,
    /// Selected resolution (ignored for audio)
    pub resolution: Resolution,
    /// Delegate the transfer to aria2c
    pub use_aria2: bool,
    /// Write and embed the thumbnail
    pub download_thumbnail: bool,
    /// Write and embed English subtitles, auto-generated included
    pub download_subtitles: bool,
}

/// How a supervised run ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Tool exited with status 0
    Succeeded,
    /// Tool exited with the given nonzero status
    Failed(i32),
    /// User asked the tool to terminate
    Cancelled,
    /// Tool executable could not be started at all
    ToolMissing,
    /// Any other fault while supervising
    Error(String),
}

/// Messages sent from the download worker to the display thread
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DownloadEvent {
    /// One non-blank output line, verbatim
    Log(String),
    /// Percentage found in the latest line (0..=100)
    Progress(u8),
    /// Last event of every run
    Finished(Outcome),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_resolutions_encode_their_height() {
        for res in Resolution::ALL {
            match res {
                Resolution::Best => assert_eq!(res.height(), None),
                _ => assert_eq!(
                    res.height().map(|h| format!("{h}p")),
                    Some(res.label().to_string())
                ),
            }
        }
        assert_eq!(Resolution::P720.height(), Some(720));
    }

    #[test]
    fn only_audio_ignores_resolution() {
        assert!(Format::Video.uses_resolution());
        assert!(Format::BestQuality.uses_resolution());
        assert!(!Format::Audio.uses_resolution());
    }
}
