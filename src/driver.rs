//! Driver capability interface
//!
//! Stitching needs only a handful of operations from a browser-automation
//! driver: evaluating a script in the page, scrolling, taking a single
//! viewport screenshot, and (for the direct geckodriver path) discovering the
//! driver's own HTTP endpoint. The trait below is that minimal surface; any
//! automation client can adapt to it. The bundled [`crate::WebDriverSession`]
//! implements it over the plain W3C wire protocol.

use crate::{Error, Result};
use url::Url;

/// Browser families the stitcher distinguishes between.
///
/// Only three distinctions matter here: Firefox (geckodriver quirks and the
/// full-page RPC), browsers whose plain screenshot already covers the whole
/// page, and everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserFamily {
    Firefox,
    Chromium,
    InternetExplorer,
    Safari,
    Other,
}

impl BrowserFamily {
    /// Map a WebDriver `browserName` capability onto a family.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "firefox" => BrowserFamily::Firefox,
            "chrome" | "chromium" | "msedge" | "microsoftedge" => BrowserFamily::Chromium,
            "internet explorer" | "internetexplorer" | "ie" => BrowserFamily::InternetExplorer,
            "safari" => BrowserFamily::Safari,
            _ => BrowserFamily::Other,
        }
    }

    /// In IE and Safari a regular screenshot is a full page screenshot only.
    pub fn captures_full_page(self) -> bool {
        matches!(
            self,
            BrowserFamily::InternetExplorer | BrowserFamily::Safari
        )
    }
}

/// Location of a live driver session: the driver's server base URL plus the
/// session id, exposed explicitly rather than dug out of a client library's
/// private session state.
#[derive(Debug, Clone)]
pub struct DriverEndpoint {
    /// Base URL of the driver's HTTP server, path ending in `/`
    pub base_url: Url,
    /// WebDriver session id
    pub session_id: String,
}

impl DriverEndpoint {
    /// URL of geckodriver's full-page screenshot command for this session.
    pub fn full_screenshot_url(&self) -> Result<Url> {
        self.base_url
            .join(&format!("session/{}/moz/screenshot/full", self.session_id))
            .map_err(|e| Error::Protocol(format!("could not build screenshot URL: {}", e)))
    }
}

/// Minimal driver operations required by the stitcher
pub trait Driver {
    /// The browser family this driver is controlling
    fn family(&self) -> BrowserFamily;

    /// Run a script in the page context and return its structured result
    fn execute_script(&mut self, script: &str) -> Result<serde_json::Value>;

    /// Take a single viewport screenshot as PNG bytes
    fn capture_viewport(&mut self) -> Result<Vec<u8>>;

    /// Server base URL and session id of the underlying driver session.
    ///
    /// Required only for the direct geckodriver full-page RPC; drivers
    /// without an addressable HTTP endpoint keep the default.
    fn endpoint(&self) -> Result<DriverEndpoint> {
        Err(Error::UnsupportedCapability(
            "endpoint discovery".to_string(),
        ))
    }

    /// Driver build version (e.g. geckodriver's), when known
    fn driver_version(&self) -> Option<String> {
        None
    }

    /// Scroll the page down by `dy` logical pixels
    fn scroll_by(&mut self, dy: u32) -> Result<()> {
        self.execute_script(&format!("window.scrollBy(0,{})", dy))?;
        Ok(())
    }

    /// Scroll to the absolute top of the page
    fn scroll_to_top(&mut self) -> Result<()> {
        self.execute_script("document.body.scrollTop = document.documentElement.scrollTop = 0;")?;
        Ok(())
    }
}
