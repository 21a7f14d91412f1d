//! Format checks for notification destinations.
//!
//! These are syntactic only. Run [`validate_url`] before handing a URL to
//! the gate so callers get a format error rather than a deny decision.

use std::sync::LazyLock;

use regex::Regex;

use crate::target_url::TargetUrl;
use crate::Error;

/// Methods a webhook destination may be called with.
pub const ALLOWED_METHODS: &[&str] = &["POST", "PUT", "PATCH"];

// RFC 5322 addr-spec, adapted from https://stackoverflow.com/a/201378
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?i)^(?:[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*"#,
        r#"|"(?:[\x01-\x08\x0b\x0c\x0e-\x1f\x21\x23-\x5b\x5d-\x7f]|\\[\x01-\x09\x0b\x0c\x0e-\x7f])*")"#,
        r#"@(?:(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])?"#,
        r#"|\[(?:(?:(?:2(?:5[0-5]|[0-4][0-9])|1[0-9][0-9]|[1-9]?[0-9]))\.){3}"#,
        r#"(?:(?:2(?:5[0-5]|[0-4][0-9])|1[0-9][0-9]|[1-9]?[0-9])|[a-z0-9-]*[a-z0-9]:"#,
        r#"(?:[\x01-\x08\x0b\x0c\x0e-\x1f\x21-\x5a\x53-\x7f]|\\[\x01-\x09\x0b\x0c\x0e-\x7f])+)\])$"#,
    ))
    .expect("email pattern is valid")
});

/// Check that `url` is a non-empty absolute http/https URL.
///
/// # Errors
///
/// [`Error::MalformedUrl`] or [`Error::UnsupportedScheme`].
pub fn validate_url(url: &str) -> Result<(), Error> {
    TargetUrl::parse(url).map(|_| ())
}

/// Check an email address against the RFC 5322 addr-spec grammar.
///
/// # Errors
///
/// [`Error::InvalidEmail`] if the address is empty or does not match.
pub fn validate_email(email: &str) -> Result<(), Error> {
    if email.is_empty() {
        return Err(Error::invalid_email(
            email,
            "from address and recipient should be provided",
        ));
    }
    if !EMAIL_PATTERN.is_match(email) {
        return Err(Error::invalid_email(email, "not an RFC 5322 address"));
    }
    Ok(())
}

/// Check that `method` is one of [`ALLOWED_METHODS`].
///
/// # Errors
///
/// [`Error::InvalidMethod`] for anything else, including lowercase names.
pub fn validate_method(method: &str) -> Result<(), Error> {
    if ALLOWED_METHODS.contains(&method) {
        Ok(())
    } else {
        Err(Error::InvalidMethod {
            method: method.to_string(),
        })
    }
}
