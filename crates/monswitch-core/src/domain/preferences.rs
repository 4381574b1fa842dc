//! User preferences overlaid on the hardware state.
//!
//! - An **alias** replaces an input's default name for one monitor, e.g.
//!   `("ACME123", USB-C 1) → "Laptop"`.
//! - A **favourite** flags a `(monitor, input)` pair for the cross-monitor
//!   quick-switch list.  Favourites are kept even while the monitor they
//!   reference is disconnected.

use serde::{Deserialize, Serialize};

use super::input_source::InputSource;

/// A user-flagged `(monitor, input)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Favorite {
    pub monitor_id: String,
    pub input: InputSource,
}

impl Favorite {
    pub fn new(monitor_id: impl Into<String>, input: InputSource) -> Self {
        Self {
            monitor_id: monitor_id.into(),
            input,
        }
    }

    /// Returns `true` if this favourite refers to `monitor_id` / `input`.
    pub fn matches(&self, monitor_id: &str, input: InputSource) -> bool {
        self.monitor_id == monitor_id && self.input == input
    }
}

/// Normalises a user-entered alias.
///
/// Returns `None` when the alias is empty or whitespace-only, meaning "remove
/// the alias and use the default name".  Otherwise returns the trimmed text.
pub fn normalize_alias(alias: &str) -> Option<&str> {
    let trimmed = alias.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_alias_treats_empty_as_absent() {
        assert_eq!(normalize_alias(""), None);
        assert_eq!(normalize_alias("   \t"), None);
    }

    #[test]
    fn test_normalize_alias_trims_surrounding_whitespace() {
        assert_eq!(normalize_alias("  Laptop "), Some("Laptop"));
        assert_eq!(normalize_alias("Work PC"), Some("Work PC"));
    }

    #[test]
    fn test_favorite_matches_on_both_fields() {
        let fav = Favorite::new("ACME123", InputSource::USB_C1);
        assert!(fav.matches("ACME123", InputSource::USB_C1));
        assert!(!fav.matches("ACME123", InputSource::HDMI1));
        assert!(!fav.matches("OTHER", InputSource::USB_C1));
    }
}
