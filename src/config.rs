//! Client configuration and the transfer-mode resolver.
//!
//! [`ClientConfig`] holds everything needed to reach a unoserver instance;
//! it is built via [`ClientConfigBuilder`] so validation happens once, before
//! any request is sent.
//!
//! [`Location`] decides whether documents travel as filesystem paths (the
//! server reads and writes them itself) or as inline bytes.

use crate::error::UnoError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default unoserver host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default unoserver XML-RPC port.
pub const DEFAULT_PORT: u16 = 2003;

/// Configuration for a [`crate::UnoClient`].
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use unoclient::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .endpoint("http://localhost:2003")
///     .timeout(Duration::from_secs(120))
///     .build()
///     .unwrap();
/// assert_eq!(config.endpoint, "http://localhost:2003");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// XML-RPC endpoint, `scheme://host:port`. Scheme is `http` or `https`.
    pub endpoint: String,

    /// Deadline for a single remote call. Default: none (wait indefinitely).
    ///
    /// Conversions of large documents can take minutes on a busy server, so
    /// no deadline is imposed unless the caller asks for one.
    pub timeout: Option<Duration>,

    /// `User-Agent` header sent with each request.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default().to_string(),
            timeout: None,
            user_agent: concat!("unoclient/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    pub fn timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.config.timeout = secs.map(Duration::from_secs);
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    /// Build the configuration, validating the endpoint.
    pub fn build(self) -> Result<ClientConfig, UnoError> {
        validate_endpoint(&self.config.endpoint)?;
        if self.config.timeout == Some(Duration::ZERO) {
            return Err(UnoError::InvalidConfig(
                "Timeout must be greater than zero".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Reject endpoints that would produce a malformed call.
pub(crate) fn validate_endpoint(endpoint: &str) -> Result<(), UnoError> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(UnoError::InvalidConfig("Endpoint must not be empty".into()));
    }
    let Some((scheme, rest)) = endpoint.split_once("://") else {
        return Err(UnoError::InvalidConfig(format!(
            "Endpoint '{endpoint}' must be of the form scheme://host:port"
        )));
    };
    if Protocol::from_str(scheme).is_err() {
        return Err(UnoError::InvalidConfig(format!(
            "Unsupported scheme '{scheme}' in endpoint '{endpoint}' (expected http or https)"
        )));
    }
    let authority = rest.split('/').next().unwrap_or_default();
    let host = match authority.strip_prefix('[') {
        // IPv6 literal: `[addr]` optionally followed by `:port`.
        Some(bracketed) => match bracketed.split_once(']') {
            Some((addr, tail)) if tail.is_empty() || tail.starts_with(':') => addr,
            _ => {
                return Err(UnoError::InvalidConfig(format!(
                    "Endpoint '{endpoint}' has a malformed IPv6 host"
                )))
            }
        },
        None if authority.matches(':').count() > 1 => {
            return Err(UnoError::InvalidConfig(format!(
                "Endpoint '{endpoint}' has an IPv6 host that is not enclosed in brackets"
            )))
        }
        None => authority.split(':').next().unwrap_or_default(),
    };
    if host.is_empty() {
        return Err(UnoError::InvalidConfig(format!(
            "Endpoint '{endpoint}' has no host"
        )));
    }
    Ok(())
}

// ── Endpoint ─────────────────────────────────────────────────────────────

/// Transport scheme of the unoserver endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Http,
    Https,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Http => write!(f, "http"),
            Protocol::Https => write!(f, "https"),
        }
    }
}

impl FromStr for Protocol {
    type Err = UnoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            other => Err(UnoError::InvalidConfig(format!(
                "Unknown protocol '{other}' (expected http or https)"
            ))),
        }
    }
}

/// The three pieces a host layer typically collects separately.
///
/// `Display` renders the `scheme://host:port` form expected by
/// [`ClientConfig::endpoint`], bracketing IPv6 literals (`[::1]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub protocol: Protocol,
    pub host: String,
    pub port: u16,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            protocol: Protocol::Http,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') && !self.host.starts_with('[') {
            write!(f, "{}://[{}]:{}", self.protocol, self.host, self.port)
        } else {
            write!(f, "{}://{}:{}", self.protocol, self.host, self.port)
        }
    }
}

// ── Location ─────────────────────────────────────────────────────────────

/// Where unoserver runs relative to this process.
///
/// | Location | Documents sent as |
/// |----------|-------------------|
/// | `Local`  | filesystem paths; the server reads and writes them itself |
/// | `Remote` | inline bytes; this process does all file I/O |
/// | `Auto`   | paths if the host is literally `127.0.0.1` or `localhost` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    #[default]
    Auto,
    Local,
    Remote,
}

/// Host strings that `Location::Auto` treats as "same machine".
const LOCAL_HOSTS: [&str; 2] = ["127.0.0.1", "localhost"];

impl Location {
    /// Decide whether documents are exchanged by path (`true`) or by content.
    ///
    /// `Auto` matches the two literal host strings only. It does not resolve
    /// names and does not recognise other loopback forms such as `::1`,
    /// `LOCALHOST` or `0.0.0.0`.
    pub fn resolve(&self, host: &str) -> bool {
        match self {
            Location::Local => true,
            Location::Remote => false,
            Location::Auto => LOCAL_HOSTS.contains(&host),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Auto => write!(f, "auto"),
            Location::Local => write!(f, "local"),
            Location::Remote => write!(f, "remote"),
        }
    }
}

impl FromStr for Location {
    type Err = UnoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Location::Auto),
            "local" => Ok(Location::Local),
            "remote" => Ok(Location::Remote),
            other => Err(UnoError::InvalidConfig(format!(
                "Unknown location '{other}' (expected auto, local or remote)"
            ))),
        }
    }
}
