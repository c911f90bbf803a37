//! Common utility functions used across modules.
//!
//! - [`truncate_utf16`] - Truncate strings to a UTF-16 length with ellipsis
//! - [`format_duration`] - Compact human-readable durations (2m, 1h30m)

use std::time::Duration;

/// Truncate a string to at most `max_units` UTF-16 code units, adding "..."
/// if truncated. Never splits a character.
///
/// # Examples
/// ```
/// use linkshield::utils::truncate_utf16;
/// assert_eq!(truncate_utf16("short", 10), "short");
/// assert_eq!(truncate_utf16("this is long", 10), "this is...");
/// ```
pub fn truncate_utf16(s: &str, max_units: usize) -> String {
    if s.encode_utf16().count() <= max_units {
        return s.to_string();
    }
    if max_units <= 3 {
        return "...".to_string();
    }

    let budget = max_units - 3;
    let mut used = 0;
    let mut end = 0;
    for (i, c) in s.char_indices() {
        used += c.len_utf16();
        if used > budget {
            break;
        }
        end = i + c.len_utf8();
    }
    format!("{}...", &s[..end])
}

/// Format a duration compactly, largest unit first.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use linkshield::utils::format_duration;
/// assert_eq!(format_duration(Duration::from_secs(120)), "2m");
/// assert_eq!(format_duration(Duration::from_secs(5400)), "1h30m");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    if total == 0 {
        return "0s".to_string();
    }

    let days = total / 86_400;
    let hours = (total % 86_400) / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    let mut out = String::new();
    for (value, unit) in [(days, "d"), (hours, "h"), (minutes, "m"), (seconds, "s")] {
        if value > 0 {
            out.push_str(&format!("{}{}", value, unit));
        }
    }
    out
}
