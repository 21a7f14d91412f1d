//! Deny list entry parsing.
//!
//! Every entry of the configured deny list is classified once, at load time,
//! into either an exact hostname or an IP network. Bare addresses become
//! single-address networks (`/32` or `/128`).

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use ipnet::IpNet;
use url::Host;

use crate::Error;

const MAX_HOSTNAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// A single deny list entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostSpec {
    /// Hostname compared case-insensitively, ignoring one trailing dot.
    /// Stored lowercase without the trailing dot.
    ExactHost(String),

    /// Address range; a bare address is stored with a full-length prefix.
    Network(IpNet),
}

impl HostSpec {
    /// Parse a deny list entry.
    ///
    /// Accepts an IPv4/IPv6 literal (IPv6 optionally bracketed), a CIDR
    /// network (`address/prefix`) or a hostname.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSpec`] if the entry is empty, is a malformed
    /// CIDR, uses a non-canonical numeric address form (`127.1`,
    /// `0177.0.0.1`, `0x7f000001`), or is not a plausible hostname.
    pub fn parse(spec: &str) -> Result<Self, Error> {
        let trimmed = spec.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_spec(spec, "empty entry"));
        }

        if trimmed.contains('/') {
            let net: IpNet = trimmed
                .parse()
                .map_err(|e| Error::invalid_spec(spec, format!("invalid CIDR network: {}", e)))?;
            return Ok(Self::Network(net.trunc()));
        }

        if let Some(ip) = parse_ip_literal(trimmed) {
            return Ok(Self::Network(IpNet::from(ip)));
        }

        parse_hostname(trimmed)
            .map(Self::ExactHost)
            .map_err(|reason| Error::invalid_spec(spec, reason))
    }

    /// Whether this entry is an exact hostname.
    pub fn is_host(&self) -> bool {
        matches!(self, Self::ExactHost(_))
    }

    /// Whether this entry is an address or network.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Compare against a host already passed through [`normalize_host`].
    pub(crate) fn matches_host(&self, normalized: &str) -> bool {
        match self {
            Self::ExactHost(name) => name == normalized,
            Self::Network(_) => false,
        }
    }

    /// Family-aware containment test.
    ///
    /// With `dual_stack` set, IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`)
    /// are also tested against IPv4 networks and IPv4 addresses against
    /// IPv6 networks in their mapped form. Without it families never cross.
    pub(crate) fn contains_addr(&self, ip: &IpAddr, dual_stack: bool) -> bool {
        let Self::Network(net) = self else {
            return false;
        };

        if net.contains(ip) {
            return true;
        }

        if !dual_stack {
            return false;
        }

        match (net, ip) {
            (IpNet::V4(_), IpAddr::V6(v6)) => v6
                .to_ipv4_mapped()
                .is_some_and(|v4| net.contains(&IpAddr::V4(v4))),
            (IpNet::V6(_), IpAddr::V4(v4)) => net.contains(&IpAddr::V6(v4.to_ipv6_mapped())),
            _ => false,
        }
    }
}

impl FromStr for HostSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for HostSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExactHost(name) => f.write_str(name),
            Self::Network(net) if net.prefix_len() == net.max_prefix_len() => {
                write!(f, "{}", net.addr())
            }
            Self::Network(net) => write!(f, "{}", net),
        }
    }
}

/// Normalize a host for comparison: strip IPv6 brackets and one trailing
/// dot, lowercase, and convert internationalized names to their ASCII
/// (punycode) form so they compare equal to parsed entries.
pub(crate) fn normalize_host(host: &str) -> String {
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    let host = host.strip_suffix('.').unwrap_or(host).to_lowercase();
    match Host::parse(&host) {
        Ok(Host::Domain(ascii)) => ascii,
        _ => host,
    }
}

/// Parse an IP literal, accepting brackets around IPv6.
pub(crate) fn parse_ip_literal(s: &str) -> Option<IpAddr> {
    if let Some(inner) = s.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        return inner.parse::<std::net::Ipv6Addr>().ok().map(IpAddr::V6);
    }
    s.parse().ok()
}

/// Validate and normalize a hostname entry.
fn parse_hostname(raw: &str) -> Result<String, String> {
    let name = raw.strip_suffix('.').unwrap_or(raw);

    if name.is_empty() {
        return Err("empty hostname".to_string());
    }

    if let Some(c) = name.chars().find(|c| c.is_whitespace() || c.is_control()) {
        return Err(format!("hostname contains forbidden character {:?}", c));
    }

    if let Some(c) = name
        .chars()
        .find(|c| matches!(c, ':' | '/' | '?' | '#' | '@' | '[' | ']' | '\\'))
    {
        return Err(format!("hostname contains URL delimiter {:?}", c));
    }

    if ends_in_number(name) {
        return Err("non-standard IP address form not allowed, use dotted-quad or CIDR".to_string());
    }

    let ascii = match Host::parse(name) {
        Ok(Host::Domain(domain)) => domain,
        Ok(other) => {
            return Err(format!("resolves to IP address {}, use the literal form", other));
        }
        Err(e) => return Err(format!("invalid hostname: {}", e)),
    };

    if ascii.len() > MAX_HOSTNAME_LEN {
        return Err(format!("hostname longer than {} bytes", MAX_HOSTNAME_LEN));
    }

    for label in ascii.split('.') {
        if label.is_empty() {
            return Err("hostname has an empty label".to_string());
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(format!("hostname label longer than {} bytes", MAX_LABEL_LEN));
        }
    }

    Ok(ascii.to_lowercase())
}

/// URL parsers treat a host whose last label is numeric (decimal or `0x`
/// hex) as an IPv4 address, so such a name can never appear as a domain.
fn ends_in_number(name: &str) -> bool {
    let last = name.rsplit('.').next().unwrap_or(name);
    if last.is_empty() {
        return false;
    }
    if last.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    last.strip_prefix("0x")
        .or_else(|| last.strip_prefix("0X"))
        .is_some_and(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(s: &str) -> HostSpec {
        HostSpec::Network(s.parse().unwrap())
    }

    // ==================== Address literal tests ====================

    #[test]
    fn test_parse_ipv4_literal() {
        assert_eq!(HostSpec::parse("169.254.169.254").unwrap(), net("169.254.169.254/32"));
    }

    #[test]
    fn test_parse_ipv6_literal() {
        assert_eq!(HostSpec::parse("::1").unwrap(), net("::1/128"));
        assert_eq!(HostSpec::parse("[fd00:ec2::254]").unwrap(), net("fd00:ec2::254/128"));
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(HostSpec::parse("  10.0.0.1 ").unwrap(), net("10.0.0.1/32"));
    }

    // ==================== CIDR tests ====================

    #[test]
    fn test_parse_cidr() {
        assert_eq!(HostSpec::parse("10.0.0.0/8").unwrap(), net("10.0.0.0/8"));
        assert_eq!(HostSpec::parse("fc00::/7").unwrap(), net("fc00::/7"));
    }

    #[test]
    fn test_parse_cidr_truncates_host_bits() {
        assert_eq!(HostSpec::parse("10.1.2.3/8").unwrap(), net("10.0.0.0/8"));
    }

    #[test]
    fn test_reject_invalid_cidr() {
        assert!(HostSpec::parse("10.0.0.0/33").is_err());
        assert!(HostSpec::parse("::/129").is_err());
        assert!(HostSpec::parse("example.com/24").is_err());
        assert!(HostSpec::parse("10.0.0.0/").is_err());
    }

    // ==================== Hostname tests ====================

    #[test]
    fn test_parse_hostname_normalized() {
        assert_eq!(
            HostSpec::parse("Internal.CORP.").unwrap(),
            HostSpec::ExactHost("internal.corp".to_string())
        );
    }

    #[test]
    fn test_parse_single_label_hostname() {
        assert!(HostSpec::parse("localhost").unwrap().is_host());
        assert!(HostSpec::parse("instance-data").unwrap().is_host());
    }

    #[test]
    fn test_parse_idn_hostname_to_punycode() {
        assert_eq!(
            HostSpec::parse("bücher.example").unwrap(),
            HostSpec::ExactHost("xn--bcher-kva.example".to_string())
        );
    }

    #[test]
    fn test_hostname_with_digits_is_host() {
        // Numeric labels are fine as long as the last one is not.
        assert!(HostSpec::parse("10.internal.corp").unwrap().is_host());
        assert!(HostSpec::parse("123host.example.com").unwrap().is_host());
    }

    #[test]
    fn test_reject_empty() {
        assert!(HostSpec::parse("").is_err());
        assert!(HostSpec::parse("   ").is_err());
        assert!(HostSpec::parse(".").is_err());
    }

    #[test]
    fn test_reject_whitespace_and_control() {
        assert!(HostSpec::parse("bad host.com").is_err());
        assert!(HostSpec::parse("bad\thost.com").is_err());
        assert!(HostSpec::parse("bad\u{0}host.com").is_err());
    }

    #[test]
    fn test_reject_url_delimiters() {
        assert!(HostSpec::parse("user@host.com").is_err());
        assert!(HostSpec::parse("host.com:8080").is_err());
        assert!(HostSpec::parse("[example.com]").is_err());
    }

    #[test]
    fn test_reject_empty_label() {
        assert!(HostSpec::parse("a..b").is_err());
        assert!(HostSpec::parse(".example.com").is_err());
    }

    #[test]
    fn test_reject_long_label() {
        let label = "a".repeat(64);
        assert!(HostSpec::parse(&format!("{}.com", label)).is_err());
        let label = "a".repeat(63);
        assert!(HostSpec::parse(&format!("{}.com", label)).is_ok());
    }

    // ==================== Non-standard IP forms ====================

    #[test]
    fn test_reject_short_form_ip() {
        assert!(HostSpec::parse("127.1").is_err());
        assert!(HostSpec::parse("10.0.1").is_err());
    }

    #[test]
    fn test_reject_octal_ip() {
        assert!(HostSpec::parse("0177.0.0.1").is_err());
    }

    #[test]
    fn test_reject_decimal_and_hex_ip() {
        assert!(HostSpec::parse("2130706433").is_err());
        assert!(HostSpec::parse("0x7f000001").is_err());
        assert!(HostSpec::parse("0x7f.0.0.0x1").is_err());
    }

    // ==================== Matching primitives ====================

    #[test]
    fn test_families_never_cross() {
        let v4 = net("10.0.0.0/8");
        let mapped: IpAddr = "::ffff:10.0.0.1".parse().unwrap();
        assert!(!v4.contains_addr(&mapped, false));

        let v6 = net("::ffff:0:0/96");
        let plain: IpAddr = "10.0.0.1".parse().unwrap();
        assert!(!v6.contains_addr(&plain, false));
    }

    #[test]
    fn test_dual_stack_mapped_addresses() {
        let v4 = net("10.0.0.0/8");
        let mapped: IpAddr = "::ffff:10.0.0.1".parse().unwrap();
        assert!(v4.contains_addr(&mapped, true));

        let v6 = net("::ffff:10.0.0.0/104");
        let plain: IpAddr = "10.0.0.1".parse().unwrap();
        assert!(v6.contains_addr(&plain, true));

        // Not mapped, so no coercion even in dual-stack mode.
        let compat: IpAddr = "::10.0.0.1".parse().unwrap();
        assert!(!v4.contains_addr(&compat, true));
    }

    #[test]
    fn test_host_entry_contains_no_addresses() {
        let host = HostSpec::parse("internal.corp").unwrap();
        assert!(!host.contains_addr(&"10.0.0.1".parse().unwrap(), true));
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("EXAMPLE.com."), "example.com");
        assert_eq!(normalize_host("[::1]"), "::1");
        assert_eq!(normalize_host("example.com"), "example.com");
        assert_eq!(normalize_host("BÜCHER.example."), "xn--bcher-kva.example");
        assert_eq!(normalize_host("xn--bcher-kva.example"), "xn--bcher-kva.example");
        assert_eq!(normalize_host("10.0.0.1"), "10.0.0.1");
    }

    #[test]
    fn test_display() {
        assert_eq!(HostSpec::parse("10.0.0.1").unwrap().to_string(), "10.0.0.1");
        assert_eq!(HostSpec::parse("10.0.0.0/8").unwrap().to_string(), "10.0.0.0/8");
        assert_eq!(HostSpec::parse("Example.COM").unwrap().to_string(), "example.com");
    }
}
