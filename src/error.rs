//! Error types for egress_gate.

use thiserror::Error;

/// Errors that can occur while loading a deny list or gating a destination.
#[derive(Debug, Error)]
pub enum Error {
    /// A deny list entry is neither an address, a CIDR network nor a hostname.
    #[error("Invalid deny list entry {entry:?}: {reason}")]
    InvalidSpec { entry: String, reason: String },

    /// The URL could not be parsed as an absolute URL with a host.
    #[error("Invalid URL: {reason}")]
    MalformedUrl { url: String, reason: String },

    /// The URL scheme is not http or https.
    #[error("Invalid URL or unsupported: scheme '{scheme}' not allowed, only http/https")]
    UnsupportedScheme { url: String, scheme: String },

    /// The host or one of its addresses matched the deny list.
    #[error("Host of url is denied: {host} matched deny list entry {entry}")]
    HostDenied {
        url: String,
        host: String,
        entry: String,
    },

    /// The host resolved to no addresses.
    #[error("Host {host} could not be resolved to a valid IP address")]
    UnresolvableHost { url: String, host: String },

    /// DNS resolution failed for a reason other than an unknown host.
    #[error("DNS error for {host}: {message}")]
    DnsError { host: String, message: String },

    /// Email address failed format validation.
    #[error("Invalid email address: {reason}")]
    InvalidEmail { email: String, reason: String },

    /// HTTP method is not one of the accepted delivery methods.
    #[error("Invalid method supplied {method:?}. Only POST, PUT and PATCH are allowed")]
    InvalidMethod { method: String },

    /// Configuration could not be read or parsed.
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// A blocking call could not be driven on the current runtime.
    #[error("Runtime error: {reason}")]
    Runtime { reason: String },
}

impl Error {
    pub(crate) fn invalid_spec(entry: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSpec {
            entry: entry.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported_scheme(url: impl Into<String>, scheme: impl Into<String>) -> Self {
        Self::UnsupportedScheme {
            url: url.into(),
            scheme: scheme.into(),
        }
    }

    pub(crate) fn host_denied(
        url: impl Into<String>,
        host: impl Into<String>,
        entry: impl Into<String>,
    ) -> Self {
        Self::HostDenied {
            url: url.into(),
            host: host.into(),
            entry: entry.into(),
        }
    }

    pub(crate) fn unresolvable_host(url: impl Into<String>, host: impl Into<String>) -> Self {
        Self::UnresolvableHost {
            url: url.into(),
            host: host.into(),
        }
    }

    pub(crate) fn dns_error(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DnsError {
            host: host.into(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid_email(email: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEmail {
            email: email.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    pub(crate) fn runtime(reason: impl Into<String>) -> Self {
        Self::Runtime {
            reason: reason.into(),
        }
    }

    /// Whether this error means the destination must not be contacted
    /// because of the deny list or an unresolvable host.
    pub fn is_rejected_destination(&self) -> bool {
        matches!(self, Self::HostDenied { .. } | Self::UnresolvableHost { .. })
    }
}
