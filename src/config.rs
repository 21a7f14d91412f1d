//! Gate configuration.
//!
//! Loaded from TOML. Every field has a default so an empty file yields a
//! gate with an empty deny list and a cached system resolver.
//!
//! ```toml
//! host_deny_list = ["169.254.169.254", "10.0.0.0/8", "internal.corp"]
//! dual_stack = false
//!
//! [resolver]
//! cache_enabled = true
//! cache_capacity = 10000
//! cache_ttl_secs = 60
//!
//! [logging]
//! level = "info"
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::cache::CachedResolver;
use crate::deny_list::DenyList;
use crate::gate::UrlGate;
use crate::resolver::Resolver;
use crate::Error;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct GateConfig {
    /// Hosts, addresses and CIDR networks that must never be contacted.
    #[serde(default)]
    pub host_deny_list: Vec<String>,

    /// Match IPv4-mapped IPv6 addresses against IPv4 entries.
    #[serde(default)]
    pub dual_stack: bool,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResolverConfig {
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_capacity() -> u64 {
    10_000
}

fn default_cache_ttl_secs() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_enabled: default_cache_enabled(),
            cache_capacity: default_cache_capacity(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl GateConfig {
    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] on malformed TOML, [`Error::InvalidSpec`] if a deny
    /// list entry is invalid. Entries are checked here so a bad list fails
    /// the load instead of the first delivery.
    pub fn from_toml_str(contents: &str) -> Result<Self, Error> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| Error::config(format!("failed to parse config TOML: {}", e)))?;
        config.deny_list()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Build the deny list for this configuration generation.
    pub fn deny_list(&self) -> Result<DenyList, Error> {
        Ok(DenyList::parse(&self.host_deny_list)?.with_dual_stack(self.dual_stack))
    }

    /// Build a gate around `resolver`, wrapped in a cache when enabled.
    pub fn build_gate<R>(&self, resolver: R) -> Result<UrlGate<Arc<dyn Resolver>>, Error>
    where
        R: Resolver + 'static,
    {
        let resolver: Arc<dyn Resolver> = if self.resolver.cache_enabled {
            Arc::new(CachedResolver::new(
                resolver,
                self.resolver.cache_capacity,
                Duration::from_secs(self.resolver.cache_ttl_secs),
            ))
        } else {
            Arc::new(resolver)
        };
        Ok(UrlGate::new(self.deny_list()?, resolver))
    }
}

/// Install a `tracing` subscriber for binaries embedding the gate.
///
/// `RUST_LOG` takes precedence over the configured level. Hickory's own
/// logs are silenced unless the filter names them.
pub fn init_tracing(config: &LoggingConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut filter = config.level.clone();
        if !filter.contains("hickory_proto") {
            filter.push_str(",hickory_proto=off");
        }
        if !filter.contains("hickory_resolver") {
            filter.push_str(",hickory_resolver=off");
        }
        tracing_subscriber::EnvFilter::new(filter)
    });

    // Another subscriber may already be installed by the host application.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init();
}
