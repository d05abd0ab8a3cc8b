//! Direct geckodriver full-page screenshot RPC
//!
//! geckodriver 0.24.0 grew a non-standard command that returns a base64
//! full-page PNG in one request: `GET session/{id}/moz/screenshot/full`.
//! It is only defined for Firefox, and only on new-enough drivers, so both
//! are checked before the request goes out. The response body is
//! `{"value": "<base64>"}`.

use crate::driver::{BrowserFamily, Driver};
use crate::{Error, Result, StitchConfig};

const MIN_GECKODRIVER: (u64, u64, u64) = (0, 24, 0);

/// Fetch a base64 full-page PNG straight from geckodriver.
pub fn full_page_base64<D: Driver + ?Sized>(
    driver: &mut D,
    config: &StitchConfig,
) -> Result<String> {
    ensure_geckodriver(driver)?;

    let endpoint = driver.endpoint()?;
    let url = endpoint.full_screenshot_url()?;
    let raw = request_payload(url.as_str(), config)?;

    parse_payload(&raw)
}

fn ensure_geckodriver<D: Driver + ?Sized>(driver: &D) -> Result<()> {
    if driver.family() != BrowserFamily::Firefox {
        return Err(Error::UnsupportedCapability(
            "the full-page screenshot RPC; it only exists on Firefox".to_string(),
        ));
    }

    let version = driver.driver_version().ok_or_else(|| {
        Error::UnsupportedCapability(
            "the full-page screenshot RPC; geckodriver version is unknown".to_string(),
        )
    })?;

    let parsed = parse_version(&version)
        .ok_or_else(|| Error::Protocol(format!("unparsable geckodriver version '{}'", version)))?;

    if parsed < MIN_GECKODRIVER {
        return Err(Error::UnsupportedCapability(format!(
            "the full-page screenshot RPC; it requires geckodriver {}.{}.{} or newer, found {}",
            MIN_GECKODRIVER.0, MIN_GECKODRIVER.1, MIN_GECKODRIVER.2, version
        )));
    }

    Ok(())
}

fn request_payload(url: &str, config: &StitchConfig) -> Result<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .map_err(|e| Error::Connectivity(format!("could not build HTTP client: {}", e)))?;

    let response = client
        .get(url)
        .send()
        .map_err(|e| Error::Connectivity(format!("geckodriver could not be accessed at '{}': {}", url, e)))?;

    response
        .text()
        .map_err(|e| Error::Protocol(format!("geckodriver response could not be read: {}", e)))
}

fn parse_payload(raw: &str) -> Result<String> {
    let parsed: serde_json::Value = serde_json::from_str(raw)
        .map_err(|_| Error::Protocol(format!("geckodriver response '{}' was malformed", raw)))?;

    parsed
        .get("value")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| Error::Protocol(format!("geckodriver response '{}' was malformed", raw)))
}

fn parse_version(raw: &str) -> Option<(u64, u64, u64)> {
    let mut parts = raw.trim().split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    let patch = parts
        .next()
        .and_then(|p| p.parse().ok())
        .unwrap_or(0);
    Some((major, minor, patch))
}
