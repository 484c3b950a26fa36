//! Browser control surface.
//!
//! Defines the `PageHandle` trait that abstracts over the browser engine
//! (currently Chromium via chromiumoxide) and the launch options used to
//! start it. Extraction code only ever talks to a `PageHandle`.

#[cfg(feature = "chromium")]
pub mod chromium;
pub mod fixture;

use async_trait::async_trait;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Errors reported by a page handle.
#[derive(thiserror::Error, Debug)]
pub enum PageError {
    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("timed out after {0:?} waiting for {1}")]
    Timeout(Duration, String),

    #[error("script failed: {0}")]
    Script(String),

    #[error("no element matches {0}")]
    NotFound(String),

    #[error("element lookup failed: {0}")]
    Lookup(String),

    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("page handle is closed")]
    Closed,
}

pub type PageResult<T> = Result<T, PageError>;

/// A single loaded, controllable document (one browser tab).
///
/// The handle is navigated from URL to URL and closed once at the end.
#[async_trait]
pub trait PageHandle: Send + Sync + Sized {
    /// Opaque reference to an element of the current document.
    type Element: Send + Sync;

    /// Load `url`, replacing the current document.
    async fn navigate(&mut self, url: &str) -> PageResult<()>;
    /// Wait until `selector` matches an element, or fail with `PageError::Timeout`.
    async fn wait_for_element(&self, selector: &str, timeout: Duration) -> PageResult<()>;
    /// Evaluate a script in the page and return its value.
    async fn execute_js(&self, script: &str) -> PageResult<serde_json::Value>;
    /// First element matching `selector` in the document.
    async fn find_element(&self, selector: &str) -> PageResult<Self::Element>;
    /// All elements matching `selector`, in document order.
    async fn find_elements(&self, selector: &str) -> PageResult<Vec<Self::Element>>;
    /// All elements matching `selector` inside the subtree of `scope`.
    async fn find_within(
        &self,
        scope: &Self::Element,
        selector: &str,
    ) -> PageResult<Vec<Self::Element>>;
    /// Rendered text of an element, trimmed.
    async fn text(&self, element: &Self::Element) -> PageResult<String>;
    /// Release the handle.
    async fn close(self) -> PageResult<()>;
}

/// Browser window size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSize {
    fn default() -> Self {
        Self {
            width: 1600,
            height: 2200,
        }
    }
}

impl FromStr for WindowSize {
    type Err = String;

    /// Parse `"W,H"`, e.g. `"1600,2200"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(',')
            .ok_or_else(|| format!("expected \"W,H\", got {s:?}"))?;
        let parse = |part: &str| -> Result<u32, String> {
            match part.trim().parse::<u32>() {
                Ok(0) => Err(format!("window dimension must be positive in {s:?}")),
                Ok(v) => Ok(v),
                Err(e) => Err(format!("invalid window dimension {part:?}: {e}")),
            }
        };
        Ok(Self {
            width: parse(w)?,
            height: parse(h)?,
        })
    }
}

impl std::fmt::Display for WindowSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.width, self.height)
    }
}

/// Where the Chrome/Chromium binary comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ChromeExecutable {
    /// Use exactly this binary.
    Explicit(PathBuf),
    /// Look in `ARTICULATE_CHROME_PATH`, then `PATH`, then defer to the
    /// engine's own detection.
    #[default]
    Discover,
}

/// Options for launching the browser session.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    pub executable: ChromeExecutable,
    pub window_size: WindowSize,
    pub user_agent: Option<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            executable: ChromeExecutable::Discover,
            window_size: WindowSize::default(),
            user_agent: None,
        }
    }
}

impl LaunchOptions {
    /// Extra command-line switches for the browser. Headless mode, window
    /// size, sandboxing and automation hiding are set on the engine's own
    /// builder instead.
    pub fn browser_args(&self) -> Vec<String> {
        let mut args = vec![
            "--disable-gpu".to_string(),
            "--disable-dev-shm-usage".to_string(),
        ];
        if let Some(ua) = &self.user_agent {
            args.push(format!("--user-agent={ua}"));
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_size_parse() {
        let size: WindowSize = "1600,2200".parse().unwrap();
        assert_eq!(size, WindowSize { width: 1600, height: 2200 });

        let size: WindowSize = " 800 , 600 ".parse().unwrap();
        assert_eq!(size.width, 800);
        assert_eq!(size.height, 600);
    }

    #[test]
    fn test_window_size_rejects_malformed() {
        assert!("1600x2200".parse::<WindowSize>().is_err());
        assert!("0,10".parse::<WindowSize>().is_err());
        assert!("a,b".parse::<WindowSize>().is_err());
        assert!("".parse::<WindowSize>().is_err());
    }

    #[test]
    fn test_window_size_display_roundtrip() {
        let size = WindowSize::default();
        assert_eq!(size.to_string(), "1600,2200");
    }

    #[test]
    fn test_browser_args_leave_builder_flags_alone() {
        let opts = LaunchOptions {
            user_agent: Some("Mozilla/5.0 test".to_string()),
            ..LaunchOptions::default()
        };
        let args = opts.browser_args();
        assert!(args.contains(&"--user-agent=Mozilla/5.0 test".to_string()));
        for builder_flag in ["--headless", "--no-sandbox", "--disable-blink-features", "--window-size"] {
            assert!(
                !args.iter().any(|a| a.starts_with(builder_flag)),
                "{builder_flag} in {args:?}"
            );
        }
        assert_eq!(LaunchOptions::default().browser_args().len(), 2);
    }
}
