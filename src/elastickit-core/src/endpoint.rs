use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use url::{Host, Url};

/// Transport scheme of a cluster node
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported scheme: {0}")]
pub struct UnsupportedScheme(pub String);

impl FromStr for Scheme {
    type Err = UnsupportedScheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            _ => Err(UnsupportedScheme(s.to_string())),
        }
    }
}

/// A reachable cluster node reduced to scheme, credentials, host and port.
///
/// Renders as `scheme://[user[:password]@]host[:port]`, never with a path,
/// query, fragment or trailing slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    scheme: Scheme,
    // userinfo is kept percent-encoded, as it appears in the URL
    username: String,
    password: Option<String>,
    host: Host<String>,
    port: Option<u16>,
}

impl Endpoint {
    pub fn new(scheme: Scheme, host: Host<String>, port: Option<u16>) -> Self {
        Self {
            scheme,
            username: String::new(),
            password: None,
            host,
            port,
        }
    }

    /// Endpoint for an already resolved socket address
    pub fn from_socket_addr(scheme: Scheme, addr: SocketAddr) -> Self {
        let host = match addr.ip() {
            IpAddr::V4(ip) => Host::Ipv4(ip),
            IpAddr::V6(ip) => Host::Ipv6(ip),
        };
        Self::new(scheme, host, Some(addr.port()))
    }

    /// Reduce a parsed URL to its endpoint part.
    ///
    /// Returns `None` when the scheme is not http/https or the URL has no host.
    pub fn from_url(url: &Url) -> Option<Self> {
        let scheme = url.scheme().parse().ok()?;
        let host = url.host()?.to_owned();

        Some(Self {
            scheme,
            username: url.username().to_string(),
            password: url.password().map(str::to_string),
            host,
            port: url.port(),
        })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &Host<String> {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Decoded user name, e.g. for basic auth
    pub fn username(&self) -> Option<Cow<'_, str>> {
        (!self.username.is_empty()).then(|| percent_decode_str(&self.username).decode_utf8_lossy())
    }

    /// Decoded password
    pub fn password(&self) -> Option<Cow<'_, str>> {
        self.password
            .as_deref()
            .map(|password| percent_decode_str(password).decode_utf8_lossy())
    }

    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() || self.password.is_some()
    }

    /// Same endpoint with any userinfo stripped, for logs and reports
    pub fn redacted(&self) -> Self {
        Self::new(self.scheme, self.host.clone(), self.port)
    }

    /// Base URL for requests against this node
    pub fn to_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.to_string())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", self.scheme)?;
        if self.has_credentials() {
            f.write_str(&self.username)?;
            if let Some(password) = &self.password {
                write!(f, ":{}", password)?;
            }
            f.write_str("@")?;
        }
        // Host's Display brackets IPv6 literals
        write!(f, "{}", self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        Ok(())
    }
}

impl Serialize for Endpoint {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
