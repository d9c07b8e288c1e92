//! Client-side screening of repository URLs.
//!
//! [`validate`] is pure and performs no network or filesystem access. Checks
//! run in a fixed order and the first failing one decides the error, so a
//! URL that is both too long and contains `..` reports `PathTraversal`.

use std::sync::OnceLock;

use regex::Regex;
use reqwest::Url;

use crate::error::ValidationError;

pub const MAX_URL_LENGTH: usize = 2048;

const DANGEROUS_SCHEMES: [&str; 4] = ["javascript:", "data:", "vbscript:", "file:"];

const PLACEHOLDER_URLS: [&str; 2] = [
    "https://github.com/username/repository",
    "https://github.com/username/repository.git",
];

const ALLOWED_SCHEMES: [&str; 3] = ["http", "https", "ssh"];

fn scheme_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").expect("static regex"))
}

fn scp_like() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^git@[A-Za-z0-9.\-]+:[^\s:]+$").expect("static regex"))
}

/// Validate a user-supplied repository URL.
///
/// Accepts `http(s)://` and `ssh://` URLs with a host, and SCP-style
/// `git@host:owner/repo.git` remotes.
pub fn validate(input: &str) -> Result<(), ValidationError> {
    let url = input.trim();
    if url.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }

    let lower = url.to_ascii_lowercase();
    if DANGEROUS_SCHEMES.iter().any(|s| lower.starts_with(s)) {
        return Err(ValidationError::DangerousProtocol);
    }

    if url.contains("..") {
        return Err(ValidationError::PathTraversal);
    }

    if url.contains('@') && !(url.starts_with("git@") || lower.starts_with("ssh://")) {
        return Err(ValidationError::EmbeddedCredentials);
    }

    let remainder = scheme_prefix().replace(url, "");
    if remainder.contains("//") {
        return Err(ValidationError::DoubleSlash);
    }

    if url.chars().count() > MAX_URL_LENGTH {
        return Err(ValidationError::TooLong {
            max: MAX_URL_LENGTH,
        });
    }

    if PLACEHOLDER_URLS.iter().any(|p| p.eq_ignore_ascii_case(url)) {
        return Err(ValidationError::PlaceholderUrl);
    }

    if url.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidUrl);
    }

    if url.starts_with("git@") {
        return if scp_like().is_match(url) {
            Ok(())
        } else {
            Err(ValidationError::InvalidUrl)
        };
    }

    let parsed = Url::parse(url).map_err(|_| ValidationError::InvalidUrl)?;
    if !ALLOWED_SCHEMES.contains(&parsed.scheme()) {
        return Err(ValidationError::UnsupportedProtocol(parsed.scheme().to_string()));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(ValidationError::InvalidUrl);
    }

    tracing::debug!(url = %url, "Repository URL passed validation");
    Ok(())
}
