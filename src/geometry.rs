//! Page geometry: viewport and page measurement, device scale detection,
//! height limiting, and the slice/remainder math the compositor runs on.
//!
//! Everything here is recomputed on every stitch operation. Page content is
//! dynamic and the rendering context can move between displays, so neither
//! the measured dimensions nor the scale factor may be reused from an
//! earlier call.

use crate::driver::Driver;
use crate::{Error, Result, StitchConfig};
use log::debug;

const VIEWPORT_HEIGHT_JS: &str = "return window.innerHeight;";

// Both metrics are queried because either one can undercount on its own.
const PAGE_HEIGHT_JS: &str = "return Math.max( document.documentElement.scrollHeight, document.documentElement.getBoundingClientRect().height );";

const HIGH_DENSITY_JS: &str = r#"var mq = window.matchMedia("only screen and (min--moz-device-pixel-ratio: 1.3), only screen and (-o-min-device-pixel-ratio: 2.6/2), only screen and (-webkit-min-device-pixel-ratio: 1.3), only screen and (min-device-pixel-ratio: 1.3), only screen and (min-resolution: 1.3dppx)"); return (mq && mq.matches || (window.devicePixelRatio > 1));"#;

/// Measured and derived geometry for one stitch operation.
///
/// All pixel quantities are CSS (logical) pixels unless multiplied by
/// `scale`; the canvas and every placement offset are device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMetrics {
    /// Visible rendering area height at measurement time
    pub viewport_height: u32,
    /// Full scrollable content height before any limiting
    pub natural_height: u32,
    /// Target height after the caller limit and codec ceiling
    pub height: u32,
    /// Device scale factor: 2 on high-density displays, 1 otherwise
    pub scale: u32,
    /// Number of scroll steps; total captures taken is `slices + 1`
    pub slices: u32,
    /// `height mod viewport_height`
    pub remainder: u32,
    /// Whether limiting reduced the natural height
    pub clamped: bool,
}

impl PageMetrics {
    /// Derive metrics from raw measurements.
    ///
    /// `limit` is an optional cap on the page height in logical pixels; zero
    /// is treated as absent. `max_dimension` is the codec's hard per-axis
    /// pixel ceiling and applies to the scaled height regardless of the
    /// caller limit.
    pub fn from_raw(
        viewport_height: u32,
        natural_height: u32,
        scale: u32,
        limit: Option<u32>,
        max_dimension: u32,
    ) -> Self {
        let mut height = natural_height;

        if let Some(limit) = limit.filter(|l| *l > 0) {
            height = height.min(limit);
        }

        if u64::from(height) * u64::from(scale) > u64::from(max_dimension) {
            height = max_dimension / scale;
        }

        let clamped = height != natural_height;

        let (slices, remainder) = if viewport_height == 0 {
            (0, 0)
        } else {
            (height / viewport_height, height % viewport_height)
        };

        PageMetrics {
            viewport_height,
            natural_height,
            height,
            scale,
            slices,
            remainder,
            clamped,
        }
    }

    /// Total viewport captures the orchestrator will take
    pub fn captures(&self) -> u32 {
        self.slices + 1
    }

    /// Destination canvas height in device pixels
    pub fn canvas_height(&self) -> u32 {
        self.height * self.scale
    }

    /// Vertical placement offset for slice `index`, in device pixels
    pub fn offset_for(&self, index: u32) -> u32 {
        self.viewport_height * index * self.scale
    }

    /// Height of the final-slice crop, in device pixels
    pub fn crop_height(&self) -> u32 {
        self.remainder * self.scale
    }

    /// Whether a single capture already covers the whole target.
    ///
    /// True for pages that are an exact single viewport. Degenerate
    /// geometry (a zero-height viewport, or a page shorter than the
    /// viewport) is folded in here as well: one capture is the only
    /// sensible output for either.
    pub fn one_shot(&self) -> bool {
        self.slices == 0 || (self.slices == 1 && self.remainder == 0)
    }
}

/// Ask the page whether it is rendering on a high-density display.
///
/// Returns 2 when the media query (or `devicePixelRatio > 1`) matches, 1
/// otherwise. Queried per call; the answer can change between invocations.
pub fn detect_scale<D: Driver + ?Sized>(driver: &mut D) -> Result<u32> {
    let value = driver.execute_script(HIGH_DENSITY_JS)?;
    Ok(if value.as_bool().unwrap_or(false) { 2 } else { 1 })
}

/// Measure the page and derive the full metrics for one operation.
pub fn measure<D: Driver + ?Sized>(driver: &mut D, config: &StitchConfig) -> Result<PageMetrics> {
    let viewport_height = script_px(driver, VIEWPORT_HEIGHT_JS)?;
    let natural_height = script_px(driver, PAGE_HEIGHT_JS)?;
    let scale = detect_scale(driver)?;

    let metrics = PageMetrics::from_raw(
        viewport_height,
        natural_height,
        scale,
        config.page_height_limit,
        config.max_pixel_dimension,
    );

    debug!(
        "measured page: viewport={}px natural={}px target={}px scale={}x slices={} remainder={}px clamped={}",
        metrics.viewport_height,
        metrics.natural_height,
        metrics.height,
        metrics.scale,
        metrics.slices,
        metrics.remainder,
        metrics.clamped
    );

    Ok(metrics)
}

fn script_px<D: Driver + ?Sized>(driver: &mut D, script: &str) -> Result<u32> {
    let value = driver.execute_script(script)?;
    let px = value
        .as_f64()
        .ok_or_else(|| Error::Script(format!("expected a number from '{}', got {}", script, value)))?;
    Ok(px.max(0.0) as u32)
}
