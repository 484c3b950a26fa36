//! Chromium-backed page handle using chromiumoxide.

use super::{ChromeExecutable, LaunchOptions, PageError, PageHandle, PageResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// Environment variable naming an explicit browser binary.
pub const CHROME_PATH_ENV: &str = "ARTICULATE_CHROME_PATH";

/// How often `wait_for_element` re-queries the document.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Resolve the browser binary for `executable`.
///
/// `None` means no binary was found here and the engine's own detection
/// should be used.
pub fn find_chromium(executable: &ChromeExecutable) -> Option<PathBuf> {
    match executable {
        ChromeExecutable::Explicit(path) => Some(path.clone()),
        ChromeExecutable::Discover => {
            if let Ok(p) = std::env::var(CHROME_PATH_ENV) {
                let path = PathBuf::from(&p);
                if path.exists() {
                    return Some(path);
                }
            }
            ["google-chrome", "chromium", "chromium-browser"]
                .iter()
                .find_map(|name| which::which(name).ok())
        }
    }
}

/// One Chromium browser with a single reusable tab.
pub struct ChromiumPage {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

/// Browser configuration for `options`.
///
/// Viewport emulation is disabled so pages lay out at the real window size.
/// Headless mode, sandboxing and the automation flag are builder settings;
/// raw args must not repeat them.
pub fn browser_config(options: &LaunchOptions) -> PageResult<BrowserConfig> {
    let mut builder = BrowserConfig::builder()
        .window_size(options.window_size.width, options.window_size.height)
        .viewport(None::<Viewport>)
        .no_sandbox()
        .hide()
        .args(options.browser_args());
    builder = if options.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(path) = find_chromium(&options.executable) {
        debug!("using browser binary {}", path.display());
        builder = builder.chrome_executable(path);
    }
    builder
        .build()
        .map_err(|e| PageError::Launch(format!("invalid browser config: {e}")))
}

impl ChromiumPage {
    /// Launch a browser according to `options` and open a blank tab.
    pub async fn launch(options: &LaunchOptions) -> PageResult<Self> {
        let config = browser_config(options)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| PageError::Launch(e.to_string()))?;

        // Drive the CDP connection for as long as the browser lives.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| PageError::Launch(format!("failed to open tab: {e}")))?;

        Ok(Self {
            browser,
            page,
            handler,
        })
    }
}

#[async_trait]
impl PageHandle for ChromiumPage {
    type Element = Element;

    async fn navigate(&mut self, url: &str) -> PageResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| PageError::Navigation(format!("{url}: {e}")))?;
        Ok(())
    }

    async fn wait_for_element(&self, selector: &str, timeout: Duration) -> PageResult<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(PageError::Timeout(timeout, selector.to_string()));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn execute_js(&self, script: &str) -> PageResult<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| PageError::Script(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn find_element(&self, selector: &str) -> PageResult<Element> {
        self.page
            .find_element(selector)
            .await
            .map_err(|_| PageError::NotFound(selector.to_string()))
    }

    async fn find_elements(&self, selector: &str) -> PageResult<Vec<Element>> {
        self.page
            .find_elements(selector)
            .await
            .map_err(|e| PageError::Lookup(format!("{selector}: {e}")))
    }

    async fn find_within(&self, scope: &Element, selector: &str) -> PageResult<Vec<Element>> {
        scope
            .find_elements(selector)
            .await
            .map_err(|e| PageError::Lookup(format!("{selector}: {e}")))
    }

    async fn text(&self, element: &Element) -> PageResult<String> {
        let text = element
            .inner_text()
            .await
            .map_err(|e| PageError::Lookup(e.to_string()))?;
        Ok(text.unwrap_or_default().trim().to_string())
    }

    async fn close(self) -> PageResult<()> {
        let Self {
            mut browser,
            page,
            handler,
        } = self;
        let _ = page.close().await;
        let closed = browser
            .close()
            .await
            .map_err(|e| PageError::Launch(format!("failed to close browser: {e}")));
        let _ = browser.wait().await;
        handler.abort();
        closed.map(|_| ())
    }
}
