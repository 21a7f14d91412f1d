//! Hostname resolution.
//!
//! The gate never talks to DNS directly; it goes through a [`Resolver`] so
//! that lookups can be swapped for a static table, a cache or a mock.

use std::collections::{BTreeSet, HashMap};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use hickory_resolver::config::{LookupIpStrategy, NameServerConfigGroup, ResolverConfig};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;

use crate::host_spec::{normalize_host, parse_ip_literal};
use crate::Error;

/// Maps a hostname to the set of addresses it currently resolves to.
///
/// Implementations must return `Ok` with an empty set when the host does not
/// exist, and reserve `Err` for other failures (timeouts, broken resolver
/// configuration). IP literals resolve to themselves.
#[async_trait::async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, host: &str) -> Result<BTreeSet<IpAddr>, Error>;
}

#[async_trait::async_trait]
impl<R: Resolver + ?Sized> Resolver for Arc<R> {
    async fn resolve(&self, host: &str) -> Result<BTreeSet<IpAddr>, Error> {
        (**self).resolve(host).await
    }
}

/// Resolver backed by real DNS.
///
/// Always queries both A and AAAA records. A host is only as safe as every
/// address a client might connect to, so an IPv4 answer never hides the
/// IPv6 ones.
pub struct SystemResolver {
    inner: TokioResolver,
}

impl SystemResolver {
    /// Build a resolver from `/etc/resolv.conf` (or the platform equivalent).
    ///
    /// # Errors
    ///
    /// Returns [`Error::DnsError`] if the system configuration can't be read.
    pub fn from_system_conf() -> Result<Self, Error> {
        let mut builder = TokioResolver::builder_tokio()
            .map_err(|e| Error::dns_error("system", e.to_string()))?;
        builder.options_mut().ip_strategy = LookupIpStrategy::Ipv4AndIpv6;
        Ok(Self {
            inner: builder.build(),
        })
    }

    /// Build a resolver that queries `nameservers` over plain UDP/TCP,
    /// trying each lookup once with the given timeout.
    pub fn with_nameservers(nameservers: &[IpAddr], port: u16, timeout: Duration) -> Self {
        let config = ResolverConfig::from_parts(
            None,
            vec![],
            NameServerConfigGroup::from_ips_clear(nameservers, port, true),
        );
        let mut builder =
            TokioResolver::builder_with_config(config, TokioConnectionProvider::default());
        let opts = builder.options_mut();
        opts.ip_strategy = LookupIpStrategy::Ipv4AndIpv6;
        opts.timeout = timeout;
        opts.attempts = 1;
        Self {
            inner: builder.build(),
        }
    }
}

impl std::fmt::Debug for SystemResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemResolver").finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl Resolver for SystemResolver {
    async fn resolve(&self, host: &str) -> Result<BTreeSet<IpAddr>, Error> {
        if let Some(ip) = parse_ip_literal(host) {
            return Ok(BTreeSet::from([ip]));
        }

        match self.inner.lookup_ip(host).await {
            Ok(lookup) => {
                let addrs: BTreeSet<IpAddr> = lookup.iter().collect();
                tracing::debug!(host = %host, count = addrs.len(), "resolved host");
                Ok(addrs)
            }
            Err(e) if e.is_no_records_found() => {
                tracing::debug!(host = %host, "no records found: {}", e);
                Ok(BTreeSet::new())
            }
            Err(e) => Err(Error::dns_error(host, e.to_string())),
        }
    }
}

/// Fixed host table.
///
/// Lookups are case-insensitive and ignore a trailing dot. Hosts that are not
/// in the table resolve to nothing.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    records: HashMap<String, BTreeSet<IpAddr>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add addresses for `host`, merging with any already present.
    pub fn with_host<I>(mut self, host: &str, addrs: I) -> Self
    where
        I: IntoIterator<Item = IpAddr>,
    {
        self.insert(host, addrs);
        self
    }

    pub fn insert<I>(&mut self, host: &str, addrs: I)
    where
        I: IntoIterator<Item = IpAddr>,
    {
        self.records
            .entry(normalize_host(host))
            .or_default()
            .extend(addrs);
    }
}

#[async_trait::async_trait]
impl Resolver for StaticResolver {
    async fn resolve(&self, host: &str) -> Result<BTreeSet<IpAddr>, Error> {
        if let Some(ip) = parse_ip_literal(host) {
            return Ok(BTreeSet::from([ip]));
        }
        Ok(self
            .records
            .get(&normalize_host(host))
            .cloned()
            .unwrap_or_default())
    }
}
