//! The stitch pipeline
//!
//! [`Stitcher`] drives one full-page capture: measure the page, bail out
//! through one of the shortcuts when stitching is unnecessary, otherwise
//! scroll-and-capture sequentially and composite the slices. Every call
//! measures the page afresh; nothing is cached between operations, and a
//! failure anywhere aborts the whole operation with no partial output.

use crate::driver::{BrowserFamily, Driver};
use crate::geometry::{self, PageMetrics};
use crate::{canvas_capture, compose, gecko, CaptureMode, Result, StitchConfig};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::RgbaImage;
use log::{debug, warn};
use std::path::Path;

/// Full-page screenshot service over a [`Driver`].
///
/// A standalone type holding the driver by reference; construct one per
/// operation or keep it around, either way each call re-measures the page.
pub struct Stitcher<'d, D: Driver> {
    driver: &'d mut D,
    config: StitchConfig,
}

impl<'d, D: Driver> Stitcher<'d, D> {
    pub fn new(driver: &'d mut D, config: StitchConfig) -> Self {
        Stitcher { driver, config }
    }

    /// Capture the whole page and write it to `path` as a PNG.
    ///
    /// Shortcuts, in order: browsers whose plain screenshot is already a
    /// full-page image; pages that fit one viewport exactly (or degenerate
    /// geometry); Firefox captures that already cover the page height
    /// (geckodriver has been observed returning full-page output for a
    /// viewport screenshot — re-stitching that would double the content).
    pub fn save_stitch<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        if self.driver.family().captures_full_page() {
            debug!("driver screenshots are full page; writing single capture");
            let png = self.driver.capture_viewport()?;
            return write_raw(path, &png);
        }

        let metrics = geometry::measure(self.driver, &self.config)?;

        if metrics.one_shot() {
            debug!("page fits a single viewport capture");
            let png = self.driver.capture_viewport()?;
            return write_raw(path, &png);
        }

        if let Some(png) = self.already_complete_capture(&metrics)? {
            warn!("viewport capture already spans the page height; writing it unstitched");
            return write_raw(path, &png);
        }

        let slices = self.gather_slices(&metrics)?;
        let canvas = compose::stitch(&slices, &metrics)?;
        compose::write_png(&canvas, path)
    }

    /// Produce a base64 PNG of the whole page without touching disk.
    ///
    /// `CaptureMode::Geckodriver` calls the driver's own full-page RPC;
    /// `CaptureMode::Canvas` renders in-page via an injected script. The
    /// canvas mode applies the same shortcuts as [`Stitcher::save_stitch`].
    pub fn full_page_base64(&mut self, mode: CaptureMode) -> Result<String> {
        match mode {
            CaptureMode::Geckodriver => gecko::full_page_base64(self.driver, &self.config),
            CaptureMode::Canvas => {
                if self.driver.family().captures_full_page() {
                    return self.single_capture_base64();
                }

                let metrics = geometry::measure(self.driver, &self.config)?;

                if metrics.one_shot() {
                    return self.single_capture_base64();
                }
                if let Some(png) = self.already_complete_capture(&metrics)? {
                    return Ok(BASE64.encode(png));
                }

                canvas_capture::full_page_base64(self.driver, &self.config)
            }
        }
    }

    fn single_capture_base64(&mut self) -> Result<String> {
        Ok(BASE64.encode(self.driver.capture_viewport()?))
    }

    /// Scroll-then-capture loop. Strictly sequential: each capture is only
    /// valid after its scroll has taken effect.
    fn gather_slices(&mut self, metrics: &PageMetrics) -> Result<Vec<RgbaImage>> {
        self.driver.scroll_to_top()?;

        let mut slices = Vec::with_capacity(metrics.captures() as usize);
        slices.push(compose::decode_capture(&self.driver.capture_viewport()?)?);

        for _ in 0..metrics.slices {
            self.driver.scroll_by(metrics.viewport_height)?;
            slices.push(compose::decode_capture(&self.driver.capture_viewport()?)?);
        }

        Ok(slices)
    }

    /// Guard against drivers that already return full-page output for a
    /// plain viewport screenshot (seen on Firefox). The tolerance band is a
    /// pragmatic heuristic, configurable as `full_page_tolerance`.
    fn already_complete_capture(&mut self, metrics: &PageMetrics) -> Result<Option<Vec<u8>>> {
        if self.driver.family() != BrowserFamily::Firefox {
            return Ok(None);
        }

        let png = self.driver.capture_viewport()?;
        let capture = compose::decode_capture(&png)?;

        let natural = f64::from(metrics.natural_height);
        let band = natural * self.config.full_page_tolerance;
        let height = f64::from(capture.height());

        if height >= natural - band && height <= natural + band {
            Ok(Some(png))
        } else {
            Ok(None)
        }
    }
}

fn write_raw<P: AsRef<Path>>(path: P, png: &[u8]) -> Result<()> {
    std::fs::write(path, png)?;
    Ok(())
}
