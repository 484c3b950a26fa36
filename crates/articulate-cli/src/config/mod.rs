//! Configuration loading and resolution.

use std::path::{Path, PathBuf};

use articulate::{LaunchOptions, SessionConfig};

use crate::error::{CliError, CliResult};

/// Where the dataset goes when `--out` is not given.
pub const DEFAULT_OUTPUT_PATH: &str = "src/out/articulations.csv";

/// Default scroll intensity.
pub const DEFAULT_SCROLL_PASSES: i64 = 10;

/// Everything a batch run needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub urls: Vec<String>,
    pub out: PathBuf,
    pub launch: LaunchOptions,
    pub session: SessionConfig,
}

impl RunOptions {
    pub fn new(urls: Vec<String>, out: PathBuf, launch: LaunchOptions, scroll_passes: i64) -> Self {
        Self {
            urls,
            out,
            launch,
            session: SessionConfig::for_intensity(clamp_scroll_passes(scroll_passes)),
        }
    }
}

/// Scroll intensity is floored at 1. Any integer is accepted.
pub fn clamp_scroll_passes(passes: i64) -> u32 {
    u32::try_from(passes.max(1)).unwrap_or(u32::MAX)
}

/// URLs listed one per line; blank lines and `#` comments are skipped.
pub fn parse_links(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

/// Links-file URLs first, then the explicit ones. At least one is required.
pub fn resolve_urls(links_file: Option<&Path>, explicit: &[String]) -> CliResult<Vec<String>> {
    let mut urls = match links_file {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|source| CliError::LinksFile {
                path: path.to_path_buf(),
                source,
            })?;
            parse_links(&text)
        }
        None => Vec::new(),
    };
    urls.extend(explicit.iter().cloned());
    if urls.is_empty() {
        return Err(CliError::NoUrls);
    }
    Ok(urls)
}
