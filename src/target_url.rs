//! Destination URL parsing.

use url::{Host, Url};

use crate::Error;

/// An absolute http/https URL with its host extracted for resolution.
///
/// Host forms follow the URL standard: domains are lowercased and
/// punycoded, numeric hosts like `0177.0.0.1` or `2130706433` are rewritten
/// to canonical IPv4, and IPv6 literals lose their brackets.
#[derive(Debug, Clone)]
pub struct TargetUrl {
    host: String,
}

impl TargetUrl {
    /// Parse a destination URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedUrl`] if the input is not an absolute URL
    /// with a host, and [`Error::UnsupportedScheme`] if the scheme is not
    /// http or https.
    pub fn parse(input: &str) -> Result<Self, Error> {
        if input.trim().is_empty() {
            return Err(Error::malformed_url(input, "url is null or empty"));
        }

        let url = Url::parse(input).map_err(|e| Error::malformed_url(input, e.to_string()))?;

        match url.scheme() {
            "http" | "https" => {}
            scheme => return Err(Error::unsupported_scheme(input, scheme)),
        }

        // Special schemes never parse with an empty host.
        let host = match url.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(v4)) => v4.to_string(),
            Some(Host::Ipv6(v6)) => v6.to_string(),
            None => return Err(Error::malformed_url(input, "URL must have a host")),
        };

        Ok(Self { host })
    }

    /// Host as passed to the resolver and the deny list.
    pub fn host(&self) -> &str {
        &self.host
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_https() {
        let url = TargetUrl::parse("https://example.com/path").unwrap();
        assert_eq!(url.host(), "example.com");
    }

    #[test]
    fn test_port_and_userinfo_not_part_of_host() {
        let url = TargetUrl::parse("http://user:pw@example.com:8080/hook").unwrap();
        assert_eq!(url.host(), "example.com");
    }

    #[test]
    fn test_idn_host_punycoded() {
        let url = TargetUrl::parse("https://BÜCHER.example/").unwrap();
        assert_eq!(url.host(), "xn--bcher-kva.example");
    }

    #[test]
    fn test_host_lowercased_trailing_dot_kept() {
        // Trailing dot is left for the matcher to normalize.
        let url = TargetUrl::parse("http://INTERNAL.CORP./").unwrap();
        assert_eq!(url.host(), "internal.corp.");
    }

    #[test]
    fn test_ipv4_literal() {
        let url = TargetUrl::parse("http://169.254.169.254/latest/meta-data").unwrap();
        assert_eq!(url.host(), "169.254.169.254");
    }

    #[test]
    fn test_ipv6_literal_unbracketed() {
        let url = TargetUrl::parse("http://[::1]:8080/").unwrap();
        assert_eq!(url.host(), "::1");
    }

    #[test]
    fn test_non_standard_ipv4_canonicalized() {
        assert_eq!(TargetUrl::parse("http://0177.0.0.1/").unwrap().host(), "127.0.0.1");
        assert_eq!(TargetUrl::parse("http://2130706433/").unwrap().host(), "127.0.0.1");
        assert_eq!(TargetUrl::parse("http://0x7f.0.0.1/").unwrap().host(), "127.0.0.1");
        assert_eq!(TargetUrl::parse("http://127.1/").unwrap().host(), "127.0.0.1");
    }

    #[test]
    fn test_mixed_case_scheme() {
        assert!(TargetUrl::parse("HTTPS://example.com/").is_ok());
    }

    #[test]
    fn test_reject_empty() {
        assert!(matches!(TargetUrl::parse(""), Err(Error::MalformedUrl { .. })));
        assert!(matches!(TargetUrl::parse("  "), Err(Error::MalformedUrl { .. })));
    }

    #[test]
    fn test_reject_relative() {
        assert!(matches!(
            TargetUrl::parse("/just/a/path"),
            Err(Error::MalformedUrl { .. })
        ));
        assert!(matches!(
            TargetUrl::parse("example.com"),
            Err(Error::MalformedUrl { .. })
        ));
    }

    #[test]
    fn test_reject_missing_host() {
        assert!(matches!(TargetUrl::parse("http://"), Err(Error::MalformedUrl { .. })));
    }

    #[test]
    fn test_reject_other_schemes() {
        for url in [
            "ftp://example.com",
            "file:///etc/passwd",
            "gopher://example.com",
            "mailto:ops@example.com",
        ] {
            assert!(
                matches!(TargetUrl::parse(url), Err(Error::UnsupportedScheme { .. })),
                "{} should be rejected",
                url
            );
        }
    }
}
