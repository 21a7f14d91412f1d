//! Deny list matching.
//!
//! A [`DenyList`] is built once per configuration generation and never
//! mutated. Matching is existential: a host is denied if its name equals any
//! hostname entry or any of its resolved addresses falls inside any network
//! entry. Entry order only affects which entry gets reported.

use std::collections::BTreeSet;
use std::net::IpAddr;

use crate::host_spec::{normalize_host, HostSpec};
use crate::Error;

/// Immutable set of denied hosts and networks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DenyList {
    entries: Vec<HostSpec>,
    dual_stack: bool,
}

impl DenyList {
    /// Create a deny list from already parsed entries.
    pub fn new(entries: Vec<HostSpec>) -> Self {
        Self {
            entries,
            dual_stack: false,
        }
    }

    /// Parse configuration strings into a deny list.
    ///
    /// # Errors
    ///
    /// Returns the first [`Error::InvalidSpec`] encountered. A single bad
    /// entry fails the whole load.
    ///
    /// # Example
    ///
    /// ```rust
    /// use egress_gate::DenyList;
    ///
    /// let list = DenyList::parse(["169.254.169.254", "10.0.0.0/8", "internal.corp"]).unwrap();
    /// assert_eq!(list.len(), 3);
    /// ```
    pub fn parse<I, S>(entries: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .map(|entry| HostSpec::parse(entry.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(entries))
    }

    /// Also match IPv4-mapped IPv6 addresses against IPv4 networks (and
    /// IPv4 addresses against mapped IPv6 networks). Off by default.
    pub fn with_dual_stack(mut self, dual_stack: bool) -> Self {
        self.dual_stack = dual_stack;
        self
    }

    pub fn is_dual_stack(&self) -> bool {
        self.dual_stack
    }

    pub fn entries(&self) -> &[HostSpec] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `host` or any of `resolved` is denied.
    ///
    /// An empty `resolved` set is not a failure here; only hostname entries
    /// can match then. Logs the host and the matching entry at error level.
    pub fn is_denied(&self, host: &str, resolved: &BTreeSet<IpAddr>) -> bool {
        self.find_match(host, resolved).is_some()
    }

    /// Return the entry that denies `host`, if any.
    ///
    /// Hostname entries are checked before network entries.
    pub fn find_match(&self, host: &str, resolved: &BTreeSet<IpAddr>) -> Option<&HostSpec> {
        let entry = self.match_host(host).or_else(|| self.match_addrs(resolved))?;
        tracing::error!(host = %host, entry = %entry, "{} is denied", host);
        Some(entry)
    }

    fn match_host(&self, host: &str) -> Option<&HostSpec> {
        let normalized = normalize_host(host);
        self.entries.iter().find(|e| e.matches_host(&normalized))
    }

    fn match_addrs(&self, resolved: &BTreeSet<IpAddr>) -> Option<&HostSpec> {
        self.entries
            .iter()
            .filter(|e| e.is_network())
            .find(|e| resolved.iter().any(|ip| e.contains_addr(ip, self.dual_stack)))
    }
}

impl FromIterator<HostSpec> for DenyList {
    fn from_iter<T: IntoIterator<Item = HostSpec>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
