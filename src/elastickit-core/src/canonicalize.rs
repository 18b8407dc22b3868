//! Endpoint canonicalization
//!
//! Reduces raw endpoint strings from configuration to the canonical
//! `scheme://host[:port]` form used to seed the client's node list:
//! - `http`/`https` URLs lose their path, query and fragment
//! - schemeless `host:port` inputs are resolved through DNS and become
//!   `http://<first address>:<port>`
//! - anything else is dropped
//!
//! Example: `http://127.0.0.1:9200/path?query=1` -> `http://127.0.0.1:9200`

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::endpoint::{Endpoint, Scheme};
use crate::resolver::{Resolver, SystemResolver};

/// Why an input did not make it into the canonical set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DropReason {
    #[error("not a valid URL: {0}")]
    Unparsable(#[from] url::ParseError),

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("expected host:port")]
    MalformedHostPort,

    #[error("DNS lookup failed: {0}")]
    Resolution(String),

    #[error("DNS lookup returned no addresses")]
    NoAddresses,

    #[error("DNS lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("cancelled")]
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct CanonicalizeOptions {
    /// Scheme given to endpoints produced by the DNS fallback
    pub fallback_scheme: Scheme,
    /// Upper bound for a single fallback lookup
    pub dns_timeout: Option<Duration>,
}

impl Default for CanonicalizeOptions {
    fn default() -> Self {
        Self {
            fallback_scheme: Scheme::Http,
            dns_timeout: None,
        }
    }
}

impl CanonicalizeOptions {
    pub fn with_fallback_scheme(mut self, scheme: Scheme) -> Self {
        self.fallback_scheme = scheme;
        self
    }

    pub fn with_dns_timeout(mut self, timeout: Duration) -> Self {
        self.dns_timeout = Some(timeout);
        self
    }
}

/// What happened to one raw input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub input: String,
    pub result: Result<Endpoint, DropReason>,
}

/// Per-input results of a canonicalization run, in input order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalizeReport {
    outcomes: Vec<Outcome>,
}

impl CanonicalizeReport {
    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    /// Surviving endpoints, in input order
    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().cloned())
            .collect()
    }

    /// Surviving endpoints rendered in canonical form
    pub fn canonical(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(Endpoint::to_string))
            .collect()
    }

    /// Dropped inputs with the reason each was dropped
    pub fn dropped(&self) -> Vec<(&str, &DropReason)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.input.as_str(), e)))
            .collect()
    }

    /// True when no input survived
    pub fn is_empty(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_err())
    }
}

/// First stage of canonicalization: either a finished endpoint, or a
/// `host:port` pair that still needs a DNS lookup.
#[derive(Debug, PartialEq, Eq)]
enum Parsed<'a> {
    Ready(Endpoint),
    Lookup { host: &'a str, port: u16 },
}

fn parse(raw: &str) -> Result<Parsed<'_>, DropReason> {
    let url = Url::parse(raw)?;

    if let Some(endpoint) = Endpoint::from_url(&url) {
        return Ok(Parsed::Ready(endpoint));
    }

    // A URL with an authority but the wrong scheme (ftp://host) is dropped.
    // Only the authority-less shape, which is how `host:port` parses, falls
    // back to DNS.
    if url.has_host() || url.scheme() == "http" || url.scheme() == "https" {
        return Err(DropReason::UnsupportedScheme(url.scheme().to_string()));
    }

    let (host, port) = raw.split_once(':').ok_or(DropReason::MalformedHostPort)?;
    if host.is_empty() {
        return Err(DropReason::MalformedHostPort);
    }
    let port = port
        .parse::<u16>()
        .map_err(|_| DropReason::MalformedHostPort)?;

    Ok(Parsed::Lookup { host, port })
}

/// Input as it may appear in logs
fn loggable(raw: &str) -> &str {
    if raw.contains('@') {
        "<redacted>"
    } else {
        raw
    }
}

fn log_outcome(index: usize, outcome: &Outcome) {
    match &outcome.result {
        Ok(endpoint) => tracing::debug!(
            index,
            input = %loggable(&outcome.input),
            endpoint = %endpoint.redacted(),
            "Accepted endpoint"
        ),
        Err(reason) => tracing::debug!(
            index,
            input = %loggable(&outcome.input),
            %reason,
            "Dropped endpoint"
        ),
    }
}

/// Canonicalizes endpoint lists with a configurable resolver
pub struct Canonicalizer<R = SystemResolver> {
    options: CanonicalizeOptions,
    resolver: Arc<R>,
}

impl Canonicalizer<SystemResolver> {
    pub fn new(options: CanonicalizeOptions) -> Self {
        let resolver = SystemResolver::with_timeout(options.dns_timeout);
        Self::with_resolver(options, resolver)
    }
}

impl Default for Canonicalizer<SystemResolver> {
    fn default() -> Self {
        Self::new(CanonicalizeOptions::default())
    }
}

impl<R: Resolver + 'static> Canonicalizer<R> {
    pub fn with_resolver(options: CanonicalizeOptions, resolver: R) -> Self {
        Self {
            options,
            resolver: Arc::new(resolver),
        }
    }

    pub fn options(&self) -> &CanonicalizeOptions {
        &self.options
    }

    /// Canonical endpoints for `raw`, invalid entries silently dropped
    pub fn canonicalize<I, S>(&self, raw: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.report(raw).canonical()
    }

    /// Canonicalize `raw` and keep the reason for every dropped entry
    pub fn report<I, S>(&self, raw: I) -> CanonicalizeReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let outcomes = raw
            .into_iter()
            .enumerate()
            .map(|(index, input)| {
                let input = input.as_ref().trim();
                let outcome = Outcome {
                    input: input.to_string(),
                    result: self.resolve_one(input),
                };
                log_outcome(index, &outcome);
                outcome
            })
            .collect();

        CanonicalizeReport { outcomes }
    }

    /// Like [`Canonicalizer::report`], but runs lookups on the blocking pool
    /// and stops when `cancel` fires. Inputs not yet processed at that point
    /// are reported as [`DropReason::Cancelled`].
    pub async fn report_async<I, S>(&self, raw: I, cancel: &CancellationToken) -> CanonicalizeReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let inputs: Vec<String> = raw
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .collect();

        let mut outcomes = Vec::with_capacity(inputs.len());
        for (index, input) in inputs.into_iter().enumerate() {
            let result = if cancel.is_cancelled() {
                Err(DropReason::Cancelled)
            } else {
                tokio::select! {
                    _ = cancel.cancelled() => Err(DropReason::Cancelled),
                    result = self.resolve_one_async(&input) => result,
                }
            };

            let outcome = Outcome { input, result };
            log_outcome(index, &outcome);
            outcomes.push(outcome);
        }

        CanonicalizeReport { outcomes }
    }

    fn resolve_one(&self, raw: &str) -> Result<Endpoint, DropReason> {
        match parse(raw)? {
            Parsed::Ready(endpoint) => Ok(endpoint),
            Parsed::Lookup { host, port } => {
                let ips = self.resolver.lookup_host(host)?;
                self.fallback_endpoint(&ips, port)
            }
        }
    }

    async fn resolve_one_async(&self, raw: &str) -> Result<Endpoint, DropReason> {
        let (host, port) = match parse(raw)? {
            Parsed::Ready(endpoint) => return Ok(endpoint),
            Parsed::Lookup { host, port } => (host.to_string(), port),
        };

        // The tokio timeout below is the only bound on this path
        let resolver = self.resolver.clone();
        let lookup = tokio::task::spawn_blocking(move || resolver.lookup_host_unbounded(&host));

        let joined = match self.options.dns_timeout {
            Some(timeout) => tokio::time::timeout(timeout, lookup)
                .await
                .map_err(|_| DropReason::Timeout(timeout))?,
            None => lookup.await,
        };
        let ips = joined.map_err(|e| DropReason::Resolution(format!("lookup task failed: {}", e)))??;

        self.fallback_endpoint(&ips, port)
    }

    fn fallback_endpoint(&self, ips: &[std::net::IpAddr], port: u16) -> Result<Endpoint, DropReason> {
        let ip = ips.first().copied().ok_or(DropReason::NoAddresses)?;
        Ok(Endpoint::from_socket_addr(
            self.options.fallback_scheme,
            SocketAddr::new(ip, port),
        ))
    }
}

/// Canonicalize `raw` with default options and the system resolver.
///
/// Never fails: an empty result means no usable endpoint was configured.
pub fn canonicalize<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Canonicalizer::new(CanonicalizeOptions::default()).canonicalize(raw)
}
