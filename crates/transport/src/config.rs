use std::collections::HashMap;

/// A source of named configuration values, looked up at send time.
///
/// Empty values are reported as unset.
pub trait ConfigSource: Send + Sync + std::fmt::Debug {
    fn get(&self, name: &str) -> Option<String>;
}

/// Reads values from the process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|value| !value.is_empty())
    }
}

/// An in-memory set of values.
///
/// # Examples
///
/// ```
/// use mailbridge_transport::{ConfigSource, MapSource};
///
/// let source = MapSource::new().with("SENDGRID_TEST_EMAIL", "qa@example.com");
/// assert_eq!(source.get("SENDGRID_TEST_EMAIL").as_deref(), Some("qa@example.com"));
/// assert!(source.get("SENDGRID_DEFAULT_FROM_EMAIL").is_none());
/// ```
#[derive(Debug, Default, Clone)]
pub struct MapSource {
    values: HashMap<String, String>,
}

impl MapSource {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) {
        self.values.remove(name);
    }
}

impl ConfigSource for MapSource {
    fn get(&self, name: &str) -> Option<String> {
        self.values
            .get(name)
            .filter(|value| !value.is_empty())
            .cloned()
    }
}
