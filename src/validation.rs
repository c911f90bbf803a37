//! Centralized validation functions for linkshield.
//!
//! This module provides unified validation for:
//! - Domain names (tracked domains, backup domains, command arguments)
//! - Time intervals (check and heartbeat intervals)

use anyhow::{bail, Result};
use std::time::Duration;

use crate::error::LinkShieldError;

/// Maximum length of a DNS name
const MAX_DOMAIN_LEN: usize = 253;

/// Check whether a string only uses the domain alphabet (letters, digits, `.`, `-`).
///
/// # Examples
/// ```
/// use linkshield::validation::is_valid_domain;
/// assert!(is_valid_domain("a-backup.test"));
/// assert!(!is_valid_domain("bad domain"));
/// assert!(!is_valid_domain(""));
/// ```
pub fn is_valid_domain(domain: &str) -> bool {
    !domain.is_empty()
        && domain.len() <= MAX_DOMAIN_LEN
        && domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

/// Validate a domain and return it trimmed.
pub fn validate_domain(domain: &str) -> Result<String, LinkShieldError> {
    let trimmed = domain.trim();
    if is_valid_domain(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(LinkShieldError::InvalidDomain(domain.to_string()))
    }
}

/// Parse an interval string into a [`Duration`].
///
/// Accepts formats like: 30s, 2m, 1h, 1d. Zero-length intervals are rejected.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use linkshield::validation::parse_interval;
/// assert_eq!(parse_interval("2m").unwrap(), Duration::from_secs(120));
/// assert!(parse_interval("0s").is_err());
/// ```
pub fn parse_interval(interval: &str) -> Result<Duration> {
    if interval.is_empty() {
        bail!("Interval cannot be empty");
    }

    // Reject non-ASCII to prevent Unicode edge cases with byte slicing
    if !interval.is_ascii() {
        bail!(
            "Invalid interval '{}'. Only ASCII characters allowed",
            interval
        );
    }

    if interval.len() < 2 {
        bail!(
            "Invalid interval '{}'. Use format like '30s', '2m', '1h', '1d'",
            interval
        );
    }

    let (num_part, suffix) = interval.split_at(interval.len() - 1);
    let value: u64 = num_part.parse().map_err(|_| {
        anyhow::anyhow!(
            "Invalid interval '{}'. '{}' is not a number",
            interval,
            num_part
        )
    })?;

    let multiplier = match suffix {
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 86_400,
        _ => bail!(
            "Invalid interval suffix '{}'. Valid suffixes: s, m, h, d",
            suffix
        ),
    };

    if value == 0 {
        bail!("Interval '{}' must be greater than zero", interval);
    }

    let secs = value
        .checked_mul(multiplier)
        .ok_or_else(|| anyhow::anyhow!("Interval '{}' is too large", interval))?;

    Ok(Duration::from_secs(secs))
}
