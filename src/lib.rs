//! # egress_gate
//!
//! Deny list enforcement for outbound notification destinations.
//!
//! Before a webhook or other HTTP destination is contacted, `egress_gate`
//! resolves its host and checks both the hostname and every resolved
//! address against an administrator-configured deny list of hostnames,
//! addresses and CIDR networks. It does not make HTTP requests itself.
//!
//! Resolution failures fail closed: a host that resolves to nothing is
//! [`MatchDecision::Unresolvable`], never allowed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use egress_gate::{DenyList, MatchDecision, SystemResolver, UrlGate};
//!
//! # async fn example() -> Result<(), egress_gate::Error> {
//! let deny_list = DenyList::parse(["169.254.169.254", "10.0.0.0/8", "internal.corp"])?;
//! let gate = UrlGate::new(deny_list, SystemResolver::from_system_conf()?);
//!
//! match gate.evaluate("https://hooks.example.com/notify").await? {
//!     MatchDecision::Allowed => println!("safe to deliver"),
//!     decision => println!("rejected: {}", decision),
//! }
//! # Ok(())
//! # }
//! ```

mod cache;
mod deny_list;
mod error;
mod gate;
mod host_spec;
mod resolver;
mod target_url;
mod validate;

pub mod config;

pub use cache::CachedResolver;
pub use deny_list::DenyList;
pub use error::Error;
pub use gate::{evaluate, validate_url_host, MatchDecision, UrlGate};
pub use host_spec::HostSpec;
pub use resolver::{Resolver, StaticResolver, SystemResolver};
pub use target_url::TargetUrl;
pub use validate::{validate_email, validate_method, validate_url, ALLOWED_METHODS};
