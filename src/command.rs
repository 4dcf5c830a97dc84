//! Translates a [`DownloadRequest`] into yt-dlp arguments.

use crate::model::{DownloadRequest, Format};
use std::path::Path;

const BEST_FORMAT: &str = "bestvideo+bestaudio/best";
const ARIA2_ARGS: &str = "-x 16 -k 1M";

/// Builds the argument vector (program name excluded) for one download.
pub fn build_args(req: &DownloadRequest) -> Vec<String> {
    let template = req.output_folder.join("%(title)s.%(ext)s");
    let mut args = vec!["-o".to_owned(), template.to_string_lossy().into_owned()];

    if req.download_thumbnail {
        args.extend(["--write-thumbnail", "--embed-thumbnail"].map(String::from));
    }

    if req.download_subtitles {
        args.extend(
            ["--write-subs", "--write-auto-subs", "--embed-subs", "--sub-lang", "en"].map(String::from),
        );
    }

    match (req.format, req.resolution.height()) {
        (Format::Audio, _) => {
            args.extend(["-x", "--audio-format", "mp3", "--audio-quality", "0"].map(String::from));
        }
        (Format::BestQuality, _) | (Format::Video, None) => push_video(&mut args, BEST_FORMAT.to_owned()),
        (Format::Video, Some(height)) => {
            push_video(&mut args, format!("bestvideo[height<={height}]+bestaudio/best"))
        }
    }

    if req.use_aria2 {
        args.extend(["--external-downloader", "aria2c", "--external-downloader-args", ARIA2_ARGS].map(String::from));
    }

    args.push("--add-metadata".to_owned());
    args.push(req.url.clone());
    args
}

fn push_video(args: &mut Vec<String>, selector: String) {
    args.push("-f".to_owned());
    args.push(selector);
    args.push("--merge-output-format".to_owned());
    args.push("mp4".to_owned());
}

/// Renders the command line for the log window, quoting arguments with spaces.
pub fn display_command(program: &Path, args: &[String]) -> String {
    let mut line = program.display().to_string();
    for arg in args {
        line.push(' ');
        if arg.is_empty() || arg.contains(char::is_whitespace) {
            line.push('"');
            line.push_str(arg);
            line.push('"');
        } else {
            line.push_str(arg);
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Resolution;
    use std::path::PathBuf;

    fn request(format: Format, resolution: Resolution) -> DownloadRequest {
        DownloadRequest {
            url: "https://www.youtube.com/watch?v=abc123".to_owned(),
            output_folder: PathBuf::from("/tmp/videos"),
            format,
            resolution,
            use_aria2: false,
            download_thumbnail: false,
            download_subtitles: false,
        }
    }

    fn has_height_constraint(args: &[String]) -> bool {
        args.iter().any(|a| a.contains("height<="))
    }

    #[test]
    fn plain_video_request() {
        let args = build_args(&request(Format::Video, Resolution::Best));
        assert_eq!(
            args,
            vec![
                "-o",
                "/tmp/videos/%(title)s.%(ext)s",
                "-f",
                "bestvideo+bestaudio/best",
                "--merge-output-format",
                "mp4",
                "--add-metadata",
                "https://www.youtube.com/watch?v=abc123",
            ]
        );
    }

    #[test]
    fn audio_never_constrains_height() {
        for res in Resolution::ALL {
            let args = build_args(&request(Format::Audio, res));
            assert!(!has_height_constraint(&args), "{res:?} leaked into {args:?}");
            assert!(!args.iter().any(|a| a == "-f"));
            assert!(args.windows(2).any(|w| w == ["--audio-format", "mp3"]));
            assert!(args.windows(2).any(|w| w == ["--audio-quality", "0"]));
        }
    }

    #[test]
    fn explicit_resolution_sets_height_limit() {
        for res in Resolution::ALL.into_iter().filter(|r| r.height().is_some()) {
            let label = res.label();
            let n = label.trim_end_matches('p');
            let args = build_args(&request(Format::Video, res));
            let expected = format!("bestvideo[height<={n}]+bestaudio/best");
            assert!(args.contains(&expected), "{label}: {args:?}");
        }
    }

    #[test]
    fn best_quality_ignores_resolution() {
        let args = build_args(&request(Format::BestQuality, Resolution::P480));
        assert!(!has_height_constraint(&args));
        assert!(args.contains(&BEST_FORMAT.to_owned()));
    }

    #[test]
    fn optional_flags_are_appended() {
        let mut req = request(Format::Video, Resolution::P1080);
        req.use_aria2 = true;
        req.download_thumbnail = true;
        req.download_subtitles = true;
        let args = build_args(&req);

        assert!(args.contains(&"--embed-thumbnail".to_owned()));
        assert!(args.windows(2).any(|w| w == ["--sub-lang", "en"]));
        assert!(args.contains(&"--write-auto-subs".to_owned()));
        assert!(args.windows(2).any(|w| w == ["--external-downloader", "aria2c"]));
        assert!(args.windows(2).any(|w| w == ["--external-downloader-args", "-x 16 -k 1M"]));
        assert_eq!(args[args.len() - 2], "--add-metadata");
        assert_eq!(args.last().map(String::as_str), Some("https://www.youtube.com/watch?v=abc123"));
    }

    #[test]
    fn assembling_is_idempotent() {
        let mut req = request(Format::Video, Resolution::P720);
        req.download_subtitles = true;
        assert_eq!(build_args(&req), build_args(&req.clone()));
    }

    #[test]
    fn display_quotes_spaced_arguments() {
        let args = vec!["--external-downloader-args".to_owned(), ARIA2_ARGS.to_owned()];
        assert_eq!(
            display_command(Path::new("yt-dlp"), &args),
            r#"yt-dlp --external-downloader-args "-x 16 -k 1M""#
        );
    }
}
