//! Display helpers for manifest data.
//!
//! Descriptor sizes use binary units and may be unknown; creation times are
//! shown in full with a relative age next to them.

use chrono::{DateTime, SecondsFormat, Utc};
use chrono_humanize::Humanize;
use humansize::{BINARY, format_size};


/// Formats a descriptor size, where a negative value means the size is unknown.
///
/// # Examples
///
/// ```
/// use libremold::format::format_blob_size;
///
/// assert_eq!(format_blob_size(2048), "2 KiB");
/// assert_eq!(format_blob_size(-1), "unknown");
/// ```
pub fn format_blob_size(size: i64) -> String {
    u64::try_from(size)
        .map(|bytes| format_size(bytes, BINARY))
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Formats an image creation time as RFC 3339 followed by its age, or `N/A`.
///
/// ```
/// use chrono::{Duration, Utc};
/// use libremold::format::format_created;
///
/// let yesterday = Utc::now() - Duration::days(1);
/// assert!(format_created(Some(&yesterday)).ends_with("(a day ago)"));
/// assert_eq!(format_created(None), "N/A");
/// ```
pub fn format_created(created: Option<&DateTime<Utc>>) -> String {
    match created {
        Some(created) => format!(
            "{} ({})",
            created.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            created.humanize()
        ),
        None => "N/A".to_string(),
    }
}
