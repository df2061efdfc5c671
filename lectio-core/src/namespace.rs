//! Mapping between module ids and the calendar's event ids.
//!
//! Every event this tool manages has an id made of a fixed tag followed by the
//! module id (`"lec" + "5512"`). Events without the tag belong to the user and
//! are never read, written or deleted.

use std::fmt;

/// Tag used when none is configured. Changing it orphans every stored event.
pub const DEFAULT_TAG: &str = "lec";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    tag: String,
}

impl Default for Namespace {
    fn default() -> Self {
        Namespace::new(DEFAULT_TAG)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag)
    }
}

impl Namespace {
    pub fn new(tag: &str) -> Self {
        Namespace {
            tag: tag.to_string(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn to_external_id(&self, module_id: &str) -> String {
        format!("{}{}", self.tag, module_id)
    }

    /// Strips the tag. Returns the input unchanged when the tag is absent, so
    /// callers must check [`Namespace::owns`] first.
    pub fn to_module_id<'a>(&self, external_id: &'a str) -> &'a str {
        external_id.strip_prefix(&self.tag).unwrap_or(external_id)
    }

    pub fn owns(&self, external_id: &str) -> bool {
        external_id.starts_with(&self.tag)
    }
}

/// Google event ids are restricted to base32hex characters (`a-v`, `0-9`).
pub fn is_valid_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='v').contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_id_roundtrip() {
        let ns = Namespace::default();
        let external = ns.to_external_id("5512");
        assert_eq!(external, "lec5512");
        assert!(ns.owns(&external));
        assert_eq!(ns.to_module_id(&external), "5512");
    }

    #[test]
    fn test_untagged_id_is_not_owned_and_left_unchanged() {
        let ns = Namespace::default();
        assert!(!ns.owns("personal123"));
        assert_eq!(ns.to_module_id("personal123"), "personal123");
    }

    #[test]
    fn test_only_prefix_is_stripped() {
        let ns = Namespace::default();
        assert_eq!(ns.to_module_id("leclec1"), "lec1");
        assert!(!ns.owns("xlec1"));
    }

    #[test]
    fn test_is_valid_tag() {
        assert!(is_valid_tag("lec"));
        assert!(is_valid_tag("lec2"));
        assert!(!is_valid_tag(""));
        assert!(!is_valid_tag("Lec"));
        assert!(!is_valid_tag("lex"));
        assert!(!is_valid_tag("lec-"));
    }
}
