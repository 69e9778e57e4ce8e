//! Endpoint resolution for user supplied RPC addresses

use reqwest::Url;
use std::fmt;
use thiserror::Error;

/// Default CometBFT RPC port used when a plain-text address carries none
pub const DEFAULT_RPC_PORT: &str = "26657";
const DEFAULT_TLS_PORT: &str = "443";

#[derive(Debug, Error)]
pub enum AddressError {
    #[error("invalid RPC address {addr:?}: {reason}")]
    Invalid { addr: String, reason: String },
}

/// A resolved RPC endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: String,
    pub tls: bool,
}

impl Endpoint {
    /// Resolve `tcp://host:26657`, `https://host`, `host:port` or a bare host.
    ///
    /// `tls` and `https` schemes turn TLS on and default the port to 443;
    /// anything else is plain text on the chain's RPC port.
    pub fn resolve(addr: &str) -> Result<Self, AddressError> {
        let invalid = |reason: &str| AddressError::Invalid {
            addr: addr.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = addr.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty address"));
        }

        let (scheme, rest) = match trimmed.split_once("://") {
            Some((scheme, rest)) => (scheme.to_ascii_lowercase(), rest),
            None => ("tcp".to_string(), trimmed),
        };

        // Parsed under a non-special scheme so the url crate keeps explicit
        // default ports (e.g. `http://host:80`) instead of eliding them.
        let url = Url::parse(&format!("tcp://{}", rest)).map_err(|e| invalid(&e.to_string()))?;
        let host = match url.host_str() {
            Some(h) if !h.is_empty() => h.to_string(),
            _ => return Err(invalid("missing host")),
        };

        let tls = matches!(scheme.as_str(), "tls" | "https");
        let port = match url.port() {
            Some(p) => p.to_string(),
            None if tls => DEFAULT_TLS_PORT.to_string(),
            None => DEFAULT_RPC_PORT.to_string(),
        };

        Ok(Self { host, port, tls })
    }

    pub fn http_scheme(&self) -> &'static str {
        if self.tls {
            "https"
        } else {
            "http"
        }
    }

    /// `scheme://host:port`
    pub fn http_base(&self) -> String {
        format!("{}://{}:{}", self.http_scheme(), self.host, self.port)
    }

    pub fn http_route(&self, path: &str) -> String {
        format!("{}/{}", self.http_base(), path.trim_start_matches('/'))
    }

    /// Websocket RPC address for subscribers speaking the `/websocket` dialect
    pub fn websocket_url(&self) -> String {
        let scheme = if self.tls { "wss" } else { "ws" };
        format!("{}://{}:{}/websocket", scheme, self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.http_base())
    }
}
