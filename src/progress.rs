use once_cell::sync::Lazy;
use regex::Regex;

// Best-effort scrape of yt-dlp's free-text output; breaks if the tool changes its wording.
static PERCENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)%").unwrap());

/// Returns the first `<number>%` on the line, truncated to a whole percent
/// and capped at 100.
pub fn parse_progress_from_line(line: &str) -> Option<u8> {
    let caps = PERCENT_RE.captures(line)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    Some(value.min(100.0).trunc() as u8)
}
