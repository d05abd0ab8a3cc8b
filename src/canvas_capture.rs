//! Injected-script full-page capture
//!
//! Renders the page into an in-page canvas with html2canvas and reads the
//! result back as a base64 PNG. The library source can be supplied inline
//! through [`StitchConfig::html2canvas_source`]; otherwise a `<script src>`
//! tag pointing at [`StitchConfig::html2canvas_url`] is injected and the
//! library polled for until it appears. The render itself completes
//! asynchronously in the page, so the decoded data URL is polled for with a
//! hard ceiling of [`StitchConfig::render_wait`].
//!
//! Known limitation inherited from html2canvas: cross-origin content and
//! SVG are not rendered faithfully.

use crate::driver::{BrowserFamily, Driver};
use crate::{Error, Result, StitchConfig};
use std::time::Instant;

// Firefox needs the legacy onrendered callback; everywhere else the
// promise-based API is the one that exists.
const FIREFOX_ACTIVATOR_JS: &str = r#"function genScreenshot () { var canvasImgContentDecoded; html2canvas(document.body, { onrendered: function (canvas) { window.canvasImgContentDecoded = canvas.toDataURL("image/png"); }}); }; genScreenshot();"#;

const PROMISE_ACTIVATOR_JS: &str = r#"function genScreenshot () { var canvasImgContentDecoded; html2canvas(document.body).then(function (canvas) { window.canvasImgContentDecoded = canvas.toDataURL("image/png"); }); }; genScreenshot();"#;

const LIBRARY_LOADER_TEMPLATE: &str = r#"var s = document.createElement('script'); s.src = "{{H2C_URL}}"; document.head.appendChild(s); return true;"#;

const LIBRARY_PROBE_JS: &str = "return (typeof window.html2canvas === 'function');";

const DECODED_PROBE_JS: &str = "return window.canvasImgContentDecoded;";

const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Render the page in-page and return the base64 PNG payload.
pub fn full_page_base64<D: Driver + ?Sized>(
    driver: &mut D,
    config: &StitchConfig,
) -> Result<String> {
    let deadline = Instant::now() + config.render_wait;

    match &config.html2canvas_source {
        Some(source) => {
            driver.execute_script(source)?;
        }
        None => {
            let loader = LIBRARY_LOADER_TEMPLATE.replace("{{H2C_URL}}", &config.html2canvas_url);
            driver.execute_script(&loader)?;
            poll(driver, config, deadline, LIBRARY_PROBE_JS, |value| {
                if value.as_bool() == Some(true) {
                    Some(())
                } else {
                    None
                }
            })?;
        }
    }

    let activator = if driver.family() == BrowserFamily::Firefox {
        FIREFOX_ACTIVATOR_JS
    } else {
        PROMISE_ACTIVATOR_JS
    };
    driver.execute_script(activator)?;

    let data_url = poll(driver, config, deadline, DECODED_PROBE_JS, |value| {
        value.as_str().map(str::to_string)
    })?;

    Ok(data_url
        .strip_prefix(DATA_URL_PREFIX)
        .unwrap_or(&data_url)
        .to_string())
}

/// Re-run `script` until `accept` produces a value or `deadline` passes.
fn poll<D, T, F>(
    driver: &mut D,
    config: &StitchConfig,
    deadline: Instant,
    script: &str,
    mut accept: F,
) -> Result<T>
where
    D: Driver + ?Sized,
    F: FnMut(&serde_json::Value) -> Option<T>,
{
    loop {
        let value = driver.execute_script(script)?;
        if let Some(out) = accept(&value) {
            return Ok(out);
        }
        if Instant::now() >= deadline {
            return Err(Error::Timeout(config.render_wait.as_secs()));
        }
        std::thread::sleep(config.poll_interval);
    }
}
