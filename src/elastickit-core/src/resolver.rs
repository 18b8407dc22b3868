//! Forward DNS lookup used by the schemeless `host:port` fallback.

use std::net::{IpAddr, ToSocketAddrs};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use crate::canonicalize::DropReason;

/// Trait for resolving a host name to addresses
pub trait Resolver: Send + Sync {
    /// Addresses for `host`, in the order the resolver returned them.
    /// An empty answer is reported as [`DropReason::NoAddresses`].
    fn lookup_host(&self, host: &str) -> Result<Vec<IpAddr>, DropReason>;

    /// Same as [`Resolver::lookup_host`] for callers that bound the lookup
    /// themselves, such as a tokio timeout around a blocking task. Resolvers
    /// with their own timeout should skip it here.
    fn lookup_host_unbounded(&self, host: &str) -> Result<Vec<IpAddr>, DropReason> {
        self.lookup_host(host)
    }
}

/// Resolver backed by the operating system (getaddrinfo)
#[derive(Debug, Clone, Default)]
pub struct SystemResolver {
    timeout: Option<Duration>,
}

impl SystemResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give up on a lookup after `timeout`
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl Resolver for SystemResolver {
    fn lookup_host(&self, host: &str) -> Result<Vec<IpAddr>, DropReason> {
        let Some(timeout) = self.timeout else {
            return lookup_blocking(host);
        };

        // getaddrinfo cannot be interrupted, so the lookup runs on its own
        // thread and is abandoned if it outlives the timeout.
        let (tx, rx) = mpsc::channel();
        let owned = host.to_string();
        std::thread::Builder::new()
            .name("dns-lookup".to_string())
            .spawn(move || {
                let _ = tx.send(lookup_blocking(&owned));
            })
            .map_err(|e| DropReason::Resolution(format!("failed to spawn lookup thread: {}", e)))?;

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                tracing::debug!(host = %host, ?timeout, "DNS lookup timed out");
                Err(DropReason::Timeout(timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(DropReason::Resolution(
                "lookup thread exited without an answer".to_string(),
            )),
        }
    }

    fn lookup_host_unbounded(&self, host: &str) -> Result<Vec<IpAddr>, DropReason> {
        lookup_blocking(host)
    }
}

/// Resolve `host` on the calling thread
pub fn lookup_blocking(host: &str) -> Result<Vec<IpAddr>, DropReason> {
    // Fast path for IP literals
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(vec![ip]);
    }

    let addrs = (host, 0)
        .to_socket_addrs()
        .map_err(|e| DropReason::Resolution(e.to_string()))?;

    let ips: Vec<IpAddr> = addrs.map(|addr| addr.ip()).collect();
    if ips.is_empty() {
        return Err(DropReason::NoAddresses);
    }
    Ok(ips)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ip_literal_fast_path() {
        let ips = lookup_blocking("10.0.0.7").unwrap();
        assert_eq!(ips, vec!["10.0.0.7".parse::<IpAddr>().unwrap()]);
    }

    #[test]
    fn test_localhost_resolves_to_loopback() {
        let ips = SystemResolver::new().lookup_host("localhost").unwrap();
        assert!(!ips.is_empty());
        assert!(ips.iter().all(|ip| ip.is_loopback()));
    }

    #[test]
    fn test_localhost_with_timeout() {
        let resolver = SystemResolver::with_timeout(Some(Duration::from_secs(5)));
        assert!(resolver.lookup_host("localhost").is_ok());
    }

    #[test]
    fn test_unbounded_lookup_ignores_timeout() {
        let resolver = SystemResolver::with_timeout(Some(Duration::from_secs(5)));
        let ips = resolver.lookup_host_unbounded("localhost").unwrap();
        assert!(ips.iter().all(|ip| ip.is_loopback()));
        assert_eq!(
            resolver.lookup_host_unbounded("10.0.0.7").unwrap(),
            vec!["10.0.0.7".parse::<IpAddr>().unwrap()]
        );
    }

    #[test]
    fn test_invalid_tld_fails() {
        let result = SystemResolver::new().lookup_host("doesnotexist.invalid");
        assert!(result.is_err());
    }
}
