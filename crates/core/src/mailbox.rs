use std::fmt;

use serde::{Deserialize, Serialize};

/// An email address with an optional display name.
///
/// # Examples
///
/// ```
/// use mailbridge_core::Mailbox;
///
/// let plain: Mailbox = "ops@example.com".into();
/// assert_eq!(plain.to_string(), "ops@example.com");
///
/// let named: Mailbox = ("ops@example.com", "Ops Team").into();
/// assert_eq!(named.to_string(), "Ops Team <ops@example.com>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mailbox {
    /// The bare email address.
    pub email: String,

    /// Optional human-readable display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Mailbox {
    /// Create a mailbox without a display name.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    /// Create a mailbox with a display name.
    pub fn named(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: Some(name.into()),
        }
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => write!(f, "{name} <{}>", self.email),
            _ => f.write_str(&self.email),
        }
    }
}

impl From<&str> for Mailbox {
    fn from(email: &str) -> Self {
        Self::new(email)
    }
}

impl From<String> for Mailbox {
    fn from(email: String) -> Self {
        Self::new(email)
    }
}

impl From<(&str, &str)> for Mailbox {
    fn from((email, name): (&str, &str)) -> Self {
        Self::named(email, name)
    }
}

impl From<(String, String)> for Mailbox {
    fn from((email, name): (String, String)) -> Self {
        Self::named(email, name)
    }
}

/// Insert `mailbox` into an address list keyed by email.
///
/// An address that is already present keeps its position and takes the new
/// display name.
pub(crate) fn insert_unique(list: &mut Vec<Mailbox>, mailbox: Mailbox) {
    match list.iter_mut().find(|m| m.email == mailbox.email) {
        Some(existing) => existing.name = mailbox.name,
        None => list.push(mailbox),
    }
}
