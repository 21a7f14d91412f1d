//! Destination gating: parse, resolve, match.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::runtime::RuntimeFlavor;

use crate::deny_list::DenyList;
use crate::host_spec::HostSpec;
use crate::resolver::Resolver;
use crate::target_url::TargetUrl;
use crate::Error;

/// Outcome of gating a destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchDecision {
    /// The host resolved and nothing in the deny list matched.
    Allowed,

    /// The host name or one of its addresses matched `entry`.
    Denied { entry: HostSpec },

    /// The host resolved to nothing, or resolution failed. The destination
    /// can't be proven safe and must be rejected.
    Unresolvable,
}

impl MatchDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

impl fmt::Display for MatchDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allowed => f.write_str("allowed"),
            Self::Denied { entry } => write!(f, "denied by {}", entry),
            Self::Unresolvable => f.write_str("unresolvable"),
        }
    }
}

/// Gate a URL against a deny list.
///
/// 1. Parses the URL (http/https only)
/// 2. Resolves the host exactly once
/// 3. Returns [`MatchDecision::Unresolvable`] if nothing resolved or the
///    resolver failed
/// 4. Otherwise checks the host and every address against the deny list
///
/// # Errors
///
/// Only URL problems are errors ([`Error::MalformedUrl`],
/// [`Error::UnsupportedScheme`]); everything else is a decision.
pub async fn evaluate<R>(url: &str, deny_list: &DenyList, resolver: &R) -> Result<MatchDecision, Error>
where
    R: Resolver + ?Sized,
{
    let target = TargetUrl::parse(url)?;
    Ok(decide(&target, deny_list, resolver).await)
}

/// Like [`evaluate`], but turns every non-allowed decision into an error.
///
/// # Errors
///
/// [`Error::HostDenied`] on a deny list match and [`Error::UnresolvableHost`]
/// when the host can't be resolved, in addition to URL errors.
pub async fn validate_url_host<R>(url: &str, deny_list: &DenyList, resolver: &R) -> Result<(), Error>
where
    R: Resolver + ?Sized,
{
    let target = TargetUrl::parse(url)?;
    let decision = decide(&target, deny_list, resolver).await;
    into_result(url, &target, decision)
}

async fn decide<R>(target: &TargetUrl, deny_list: &DenyList, resolver: &R) -> MatchDecision
where
    R: Resolver + ?Sized,
{
    let host = target.host();

    let resolved = match resolver.resolve(host).await {
        Ok(addrs) => addrs,
        Err(e) => {
            tracing::warn!(host = %host, error = %e, "host resolution failed");
            return MatchDecision::Unresolvable;
        }
    };

    if resolved.is_empty() {
        tracing::warn!(host = %host, "host could not be resolved to a valid IP address");
        return MatchDecision::Unresolvable;
    }

    match deny_list.find_match(host, &resolved) {
        Some(entry) => MatchDecision::Denied {
            entry: entry.clone(),
        },
        None => MatchDecision::Allowed,
    }
}

fn into_result(url: &str, target: &TargetUrl, decision: MatchDecision) -> Result<(), Error> {
    match decision {
        MatchDecision::Allowed => Ok(()),
        MatchDecision::Denied { entry } => {
            Err(Error::host_denied(url, target.host(), entry.to_string()))
        }
        MatchDecision::Unresolvable => Err(Error::unresolvable_host(url, target.host())),
    }
}

/// Shared destination gate for a delivery subsystem.
///
/// Holds the current deny list generation and a resolver. Reloading swaps
/// the whole list; evaluations in flight keep the generation they started
/// with.
pub struct UrlGate<R> {
    deny_list: ArcSwap<DenyList>,
    resolver: R,
}

impl<R: Resolver> UrlGate<R> {
    pub fn new(deny_list: DenyList, resolver: R) -> Self {
        Self {
            deny_list: ArcSwap::from_pointee(deny_list),
            resolver,
        }
    }

    /// Snapshot of the current deny list.
    pub fn deny_list(&self) -> Arc<DenyList> {
        self.deny_list.load_full()
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Replace the deny list with a new generation.
    pub fn reload(&self, deny_list: DenyList) {
        tracing::info!(entries = deny_list.len(), "deny list reloaded");
        self.deny_list.store(Arc::new(deny_list));
    }

    /// Parse `entries` and replace the deny list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSpec`] and keeps the current list if any
    /// entry is invalid.
    pub fn reload_entries<I, S>(&self, entries: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let dual_stack = self.deny_list.load().is_dual_stack();
        let deny_list = DenyList::parse(entries)?.with_dual_stack(dual_stack);
        self.reload(deny_list);
        Ok(())
    }

    /// See [`evaluate`].
    pub async fn evaluate(&self, url: &str) -> Result<MatchDecision, Error> {
        let deny_list = self.deny_list.load_full();
        evaluate(url, &deny_list, &self.resolver).await
    }

    /// See [`validate_url_host`].
    pub async fn ensure_allowed(&self, url: &str) -> Result<(), Error> {
        let deny_list = self.deny_list.load_full();
        validate_url_host(url, &deny_list, &self.resolver).await
    }

    /// Synchronous version of [`UrlGate::evaluate`].
    ///
    /// This blocks the current thread while resolving. Outside of a Tokio
    /// runtime it creates a temporary one. Inside a multi-threaded runtime
    /// it blocks in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Runtime`] when called from a current-thread runtime,
    /// which cannot be blocked without stalling the lookup it waits on.
    pub fn evaluate_sync(&self, url: &str) -> Result<MatchDecision, Error> {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                if handle.runtime_flavor() == RuntimeFlavor::CurrentThread {
                    return Err(Error::runtime(
                        "evaluate_sync called from a current-thread runtime, use evaluate().await",
                    ));
                }
                tokio::task::block_in_place(|| handle.block_on(self.evaluate(url)))
            }
            Err(_) => {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(|e| Error::runtime(e.to_string()))?;
                rt.block_on(self.evaluate(url))
            }
        }
    }
}

impl<R> fmt::Debug for UrlGate<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlGate")
            .field("deny_list", &self.deny_list.load_full())
            .finish_non_exhaustive()
    }
}
