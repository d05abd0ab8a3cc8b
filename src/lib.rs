//! Stitchshot
//!
//! Full-page screenshots for WebDriver-driven browsers, built by scrolling a
//! page one viewport at a time and compositing the captures into a single
//! seamless PNG.
//!
//! # Features
//!
//! - **Stitching pipeline**: measure, scroll, capture, composite, with
//!   device-scale (retina) aware geometry and height limiting
//! - **Shortcut detection**: pages that fit one viewport, browsers whose
//!   plain screenshot is already full page, and drivers that return
//!   full-page output for a viewport capture are all written through as-is
//! - **Direct geckodriver RPC**: one-request full-page capture on Firefox
//!   with geckodriver 0.24.0 or newer
//! - **Injected-script capture**: in-page html2canvas render with a bounded
//!   wait, for drivers without a native full-page path
//!
//! # Example
//!
//! ```no_run
//! use stitchshot::{StitchConfig, Stitcher, WebDriverSession};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = WebDriverSession::connect("http://localhost:4444", "firefox")?;
//! session.goto("https://example.com")?;
//!
//! let config = StitchConfig {
//!     page_height_limit: Some(5000),
//!     ..Default::default()
//! };
//! Stitcher::new(&mut session, config).save_stitch("example.png")?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

pub mod error;
pub use error::{Error, Result};

pub mod driver;
pub use driver::{BrowserFamily, Driver, DriverEndpoint};

pub mod canvas_capture;
pub mod compose;
pub mod gecko;
pub mod geometry;
pub mod stitch;
pub mod webdriver;

pub use geometry::PageMetrics;
pub use stitch::Stitcher;
pub use webdriver::WebDriverSession;

/// How a full-page base64 capture should be produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// geckodriver's own full-page screenshot RPC (Firefox, >= 0.24.0)
    Geckodriver,
    /// In-page html2canvas render driven by injected script
    Canvas,
}

/// Tunables for one stitch operation
///
/// The defaults mirror the behavior the pipeline was built around; every
/// knob that used to be a buried constant lives here instead.
#[derive(Debug, Clone)]
pub struct StitchConfig {
    /// Cap on the stitched page height in CSS pixels. `None` and
    /// `Some(0)` both mean unlimited; non-positive limits are ignored
    /// rather than rejected.
    pub page_height_limit: Option<u32>,
    /// Hard per-axis pixel ceiling of the PNG pipeline. Heights that would
    /// exceed this after device scaling are clamped.
    pub max_pixel_dimension: u32,
    /// Ceiling on the in-page render wait for the injected-script capture
    pub render_wait: Duration,
    /// Delay between polls of the in-page render signal
    pub poll_interval: Duration,
    /// Relative band around the natural page height within which a viewport
    /// capture is judged to already be a full-page image. A heuristic for a
    /// driver quirk, not an exact contract.
    pub full_page_tolerance: f64,
    /// Timeout for direct driver HTTP requests
    pub http_timeout: Duration,
    /// Where the injected `<script>` tag loads html2canvas from when no
    /// inline source is supplied
    pub html2canvas_url: String,
    /// Inline html2canvas source, executed directly in the page. Takes
    /// precedence over `html2canvas_url`; supply this for offline use.
    pub html2canvas_source: Option<String>,
}

impl Default for StitchConfig {
    fn default() -> Self {
        StitchConfig {
            page_height_limit: None,
            max_pixel_dimension: 65500,
            render_wait: Duration::from_secs(120),
            poll_interval: Duration::from_millis(500),
            full_page_tolerance: 0.02,
            http_timeout: Duration::from_secs(60),
            html2canvas_url:
                "https://cdn.jsdelivr.net/npm/html2canvas@1.4.1/dist/html2canvas.min.js"
                    .to_string(),
            html2canvas_source: None,
        }
    }
}
