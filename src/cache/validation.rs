//! Cache entry validation.
//!
//! Classifies stored values as fresh or as one of the reasons they must be
//! treated as absent.

use chrono::Duration;

use super::entry::CacheEntry;

/// Result of validating a stored cache value.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    /// Entry is current and inside the expiration window.
    Fresh(CacheEntry),
    /// Entry is older than the expiration window.
    Expired,
    /// Entry was written under a different schema version.
    VersionMismatch,
    /// Stored value does not deserialize.
    Corrupt,
}

impl ValidationResult {
    /// Whether the value should be evicted.
    pub fn is_stale(&self) -> bool {
        !matches!(self, ValidationResult::Fresh(_))
    }

    /// Short label for listings.
    pub fn label(&self) -> &'static str {
        match self {
            ValidationResult::Fresh(_) => "fresh",
            ValidationResult::Expired => "expired",
            ValidationResult::VersionMismatch => "old-version",
            ValidationResult::Corrupt => "corrupt",
        }
    }
}

/// Validate a raw stored value at `now_ms`.
pub fn validate(raw: &str, now_ms: i64) -> ValidationResult {
    let entry = match CacheEntry::from_json(raw) {
        Ok(e) => e,
        Err(_) => return ValidationResult::Corrupt,
    };

    if !entry.is_current_version() {
        ValidationResult::VersionMismatch
    } else if entry.is_expired_at(now_ms) {
        ValidationResult::Expired
    } else {
        ValidationResult::Fresh(entry)
    }
}

/// Format a duration for display.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.num_seconds();

    if secs >= 86400 {
        let days = secs / 86400;
        format!("{}d", days)
    } else if secs >= 3600 {
        let hours = secs / 3600;
        format!("{}h", hours)
    } else if secs >= 60 {
        let mins = secs / 60;
        format!("{}m", mins)
    } else {
        format!("{}s", secs.max(0))
    }
}
