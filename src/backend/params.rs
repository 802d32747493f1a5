//! Free-form backend parameters.

use crate::error::{ConfigError, ConfigResult};
use std::collections::BTreeMap;
use std::str::FromStr;

/// String parameters handed to a backend constructor.
///
/// Each backend decides which names it understands; unknown names are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    values: BTreeMap<String, String>,
}

impl Params {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Adds or replaces a parameter.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Returns the raw value of a parameter.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Parses a parameter, returning `Ok(None)` when it is absent.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidParam`] if the value does not parse as `T`.
    pub fn parse<T: FromStr>(&self, name: &str) -> ConfigResult<Option<T>> {
        self.get(name)
            .map(|raw| {
                raw.trim().parse().map_err(|_| ConfigError::InvalidParam {
                    name: name.to_string(),
                    value: raw.to_string(),
                })
            })
            .transpose()
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_parse() {
        let params = Params::new().with("shard_count", " 16 ").with("mode", "fast");

        assert_eq!(params.get("mode"), Some("fast"));
        assert_eq!(params.get("missing"), None);
        assert_eq!(params.parse::<usize>("shard_count").unwrap(), Some(16));
        assert_eq!(params.parse::<usize>("missing").unwrap(), None);
    }

    #[test]
    fn test_parse_error_names_parameter() {
        let params = Params::new().with("shard_count", "sixteen");
        match params.parse::<usize>("shard_count") {
            Err(ConfigError::InvalidParam { name, value }) => {
                assert_eq!(name, "shard_count");
                assert_eq!(value, "sixteen");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_from_iterator() {
        let params: Params = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(params.get("a"), Some("1"));
        assert_eq!(params.get("b"), Some("2"));
    }
}
