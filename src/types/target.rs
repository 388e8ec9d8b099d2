//! Lookup targets
//!
//! A target pairs one user-supplied identifier with one regional branch
//! code. The batch for a run is the cross product of identifiers and
//! branches.

use std::fmt;

use serde::Serialize;

/// One identifier checked against one regional branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    /// Phone, email, agreement number or address as the user typed it
    pub value: String,

    /// Regional branch code, e.g. "spb"
    pub domain: String,
}

impl Target {
    pub fn new(value: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            domain: domain.into(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.value, self.domain)
    }
}

/// Whether a contact value looks like a Russian mobile number.
///
/// The mobile agreement endpoint only answers for these, so anything
/// else skips the follow-up request.
pub fn is_phone(value: &str) -> bool {
    value.len() == 11
        && value.chars().all(|c| c.is_ascii_digit())
        && (value.starts_with("79") || value.starts_with("89"))
}
