use std::fmt;
use url::Url;
use crate::protocol::DEFAULT_RTMP_PORT;
use crate::{Error, Result};

/// Server address plus the application and stream to play
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayTarget {
    pub host: String,
    pub port: u16,
    pub app: String,
    pub stream: String,
    tc_url: String,
}

impl PlayTarget {
    pub fn new(host: &str, port: u16, app: &str, stream: &str) -> Result<Self> {
        if host.is_empty() {
            return Err(Error::config("Missing host"));
        }
        if app.is_empty() || stream.is_empty() {
            return Err(Error::config(format!(
                "Both app and stream are required, got \"{}/{}\"",
                app, stream
            )));
        }

        let tc_url = Url::parse(&format!("rtmp://{}:{}/{}", host, port, app))
            .map_err(|e| Error::config(format!("Invalid tcUrl: {}", e)))?;

        Ok(PlayTarget {
            host: host.to_string(),
            port,
            app: app.to_string(),
            stream: stream.to_string(),
            tc_url: tc_url.to_string(),
        })
    }

    /// From separate host, port and `app/stream` path
    pub fn from_parts(host: &str, port: u16, path: &str) -> Result<Self> {
        let (app, stream) = path
            .trim_start_matches('/')
            .split_once('/')
            .ok_or_else(|| Error::config(format!("Expected app/stream, got \"{}\"", path)))?;
        Self::new(host, port, app, stream)
    }

    /// From `rtmp://host[:port]/app/stream`
    pub fn parse(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).map_err(|e| Error::config(format!("Invalid URL: {}", e)))?;

        if parsed.scheme() != "rtmp" {
            return Err(Error::config(format!("Unsupported scheme: {}", parsed.scheme())));
        }

        let host = parsed.host_str().ok_or_else(|| Error::config("Missing host in URL"))?;
        let port = parsed.port().unwrap_or(DEFAULT_RTMP_PORT);
        Self::from_parts(host, port, parsed.path())
    }

    /// `rtmp://host:port/app`, as sent in `connect`
    pub fn tc_url(&self) -> &str {
        &self.tc_url
    }

    /// `host:port` for the TCP connect
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for PlayTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tc_url, self.stream)
    }
}
