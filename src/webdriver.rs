//! Minimal blocking W3C WebDriver client
//!
//! A deliberately small wire-protocol client: create or attach to a session,
//! navigate, run synchronous scripts, take viewport screenshots, and end the
//! session. It exists so the stitcher has a working [`Driver`] out of the
//! box; any richer automation client can be adapted to the trait instead.

use crate::driver::{BrowserFamily, Driver, DriverEndpoint};
use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::debug;
use reqwest::blocking::Client;
use serde::Serialize;
use std::time::Duration;
use url::Url;

const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct NewSessionRequest<'a> {
    capabilities: Capabilities<'a>,
}

#[derive(Serialize)]
struct Capabilities<'a> {
    #[serde(rename = "alwaysMatch")]
    always_match: AlwaysMatch<'a>,
}

#[derive(Serialize)]
struct AlwaysMatch<'a> {
    #[serde(rename = "browserName")]
    browser_name: &'a str,
}

/// A live session on a WebDriver-speaking server (geckodriver, chromedriver,
/// a Selenium grid node).
pub struct WebDriverSession {
    client: Client,
    base_url: Url,
    session_id: String,
    family: BrowserFamily,
    driver_version: Option<String>,
    owns_session: bool,
}

impl WebDriverSession {
    /// Create a new session on `server_url` for the named browser.
    pub fn connect(server_url: &str, browser: &str) -> Result<Self> {
        let base_url = normalize_base(server_url)?;
        let client = build_client()?;

        let request = NewSessionRequest {
            capabilities: Capabilities {
                always_match: AlwaysMatch {
                    browser_name: browser,
                },
            },
        };

        let url = join(&base_url, "session")?;
        let response = client
            .post(url)
            .json(&request)
            .send()
            .map_err(into_connectivity)?;
        let value = wire_value(response)?;

        let session_id = value
            .get("sessionId")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::Protocol("new-session response carried no session id".to_string()))?
            .to_string();

        let caps = value.get("capabilities").cloned().unwrap_or_default();
        let family = caps
            .get("browserName")
            .and_then(|v| v.as_str())
            .map(BrowserFamily::from_name)
            .unwrap_or(BrowserFamily::Other);
        let driver_version = caps
            .get("moz:geckodriverVersion")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        debug!("created session {} ({:?})", session_id, family);

        Ok(WebDriverSession {
            client,
            base_url,
            session_id,
            family,
            driver_version,
            owns_session: true,
        })
    }

    /// Attach to an already-running session.
    ///
    /// The wire protocol has no way to ask an existing session which browser
    /// it drives, so the family is supplied by the caller. The session is
    /// left open on [`WebDriverSession::close`].
    pub fn attach(server_url: &str, session_id: &str, family: BrowserFamily) -> Result<Self> {
        Ok(WebDriverSession {
            client: build_client()?,
            base_url: normalize_base(server_url)?,
            session_id: session_id.to_string(),
            family,
            driver_version: None,
            owns_session: false,
        })
    }

    /// Record the driver's build version (used by the full-page RPC gate)
    /// when it is known out of band, e.g. for attached sessions.
    pub fn with_driver_version(mut self, version: &str) -> Self {
        self.driver_version = Some(version.to_string());
        self
    }

    /// Navigate the session to `url` and block until the driver returns.
    pub fn goto(&mut self, url: &str) -> Result<()> {
        let command = self.command_url("url")?;
        let body = serde_json::json!({ "url": url });
        let response = self
            .client
            .post(command)
            .json(&body)
            .send()
            .map_err(into_connectivity)?;
        wire_value(response)?;
        Ok(())
    }

    /// End the session if this client created it.
    pub fn close(self) -> Result<()> {
        if !self.owns_session {
            return Ok(());
        }
        let command = join(&self.base_url, &format!("session/{}", self.session_id))?;
        let response = self
            .client
            .delete(command)
            .send()
            .map_err(into_connectivity)?;
        wire_value(response)?;
        Ok(())
    }

    fn command_url(&self, tail: &str) -> Result<Url> {
        join(
            &self.base_url,
            &format!("session/{}/{}", self.session_id, tail),
        )
    }
}

impl Driver for WebDriverSession {
    fn family(&self) -> BrowserFamily {
        self.family
    }

    fn execute_script(&mut self, script: &str) -> Result<serde_json::Value> {
        let command = self.command_url("execute/sync")?;
        let body = serde_json::json!({ "script": script, "args": [] });

        let response = self
            .client
            .post(command)
            .json(&body)
            .send()
            .map_err(into_connectivity)?;

        let status = response.status();
        let envelope: serde_json::Value = response
            .json()
            .map_err(|e| Error::Protocol(format!("driver response was malformed: {}", e)))?;
        let value = envelope
            .get("value")
            .cloned()
            .ok_or_else(|| Error::Protocol("driver response carried no value".to_string()))?;

        if !status.is_success() {
            let message = value
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown driver error");
            return Err(Error::Script(message.to_string()));
        }

        Ok(value)
    }

    fn capture_viewport(&mut self) -> Result<Vec<u8>> {
        let command = self.command_url("screenshot")?;
        let response = self.client.get(command).send().map_err(into_connectivity)?;
        let value = wire_value(response)?;

        let payload = value
            .as_str()
            .ok_or_else(|| Error::Protocol("screenshot response was not a string".to_string()))?;

        BASE64
            .decode(payload)
            .map_err(|e| Error::Protocol(format!("screenshot payload was not base64: {}", e)))
    }

    fn endpoint(&self) -> Result<DriverEndpoint> {
        Ok(DriverEndpoint {
            base_url: self.base_url.clone(),
            session_id: self.session_id.clone(),
        })
    }

    fn driver_version(&self) -> Option<String> {
        self.driver_version.clone()
    }
}

fn build_client() -> Result<Client> {
    Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| Error::Connectivity(format!("could not build HTTP client: {}", e)))
}

// The W3C endpoints are all relative to the server root, so the base path
// must end in '/' for Url::join to append rather than replace.
fn normalize_base(server_url: &str) -> Result<Url> {
    let mut url = Url::parse(server_url)
        .map_err(|e| Error::Protocol(format!("invalid driver server URL '{}': {}", server_url, e)))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn join(base: &Url, tail: &str) -> Result<Url> {
    base.join(tail)
        .map_err(|e| Error::Protocol(format!("could not build command URL '{}': {}", tail, e)))
}

fn into_connectivity(err: reqwest::Error) -> Error {
    Error::Connectivity(err.to_string())
}

/// Unwrap the `{"value": ...}` envelope, surfacing driver-reported errors.
fn wire_value(response: reqwest::blocking::Response) -> Result<serde_json::Value> {
    let status = response.status();
    let envelope: serde_json::Value = response
        .json()
        .map_err(|e| Error::Protocol(format!("driver response was malformed: {}", e)))?;

    let value = envelope
        .get("value")
        .cloned()
        .ok_or_else(|| Error::Protocol("driver response carried no value".to_string()))?;

    if !status.is_success() {
        let message = value
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown driver error");
        return Err(Error::Protocol(format!("driver command failed: {}", message)));
    }

    Ok(value)
}
