//! Configuration management utilities

use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while reading settings from the environment
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    /// A required variable is missing or blank
    #[error("{0} not set")]
    Missing(String),

    /// A variable is present but cannot be parsed
    #[error("Invalid value for {key}: {detail}")]
    Invalid { key: String, detail: String },
}

type ProcessLookup = fn(&str) -> Option<String>;

/// Typed reader over a key/value lookup
///
/// Production code reads the process environment through [`EnvReader::process`];
/// tests inject a closure so they never mutate global state.
///
/// ```
/// use nexus_utils::EnvReader;
///
/// let env = EnvReader::new(|key| (key == "APP_PORT").then(|| "9000".to_string()));
/// assert_eq!(env.parse::<u16>("APP_PORT").unwrap(), Some(9000));
/// assert_eq!(env.get_or("APP_HOST", "0.0.0.0"), "0.0.0.0");
/// ```
pub struct EnvReader<F = ProcessLookup> {
    lookup: F,
}

impl EnvReader {
    /// Reader backed by `std::env::var`
    pub fn process() -> Self {
        Self {
            lookup: |key| std::env::var(key).ok(),
        }
    }
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Reader backed by a custom lookup
    pub fn new(lookup: F) -> Self {
        Self { lookup }
    }

    /// Trimmed value, `None` when unset or blank
    pub fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Value or the given default
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Value that must be present
    pub fn require(&self, key: &str) -> Result<String, EnvError> {
        self.get(key).ok_or_else(|| EnvError::Missing(key.to_string()))
    }

    /// Parse a value with [`FromStr`]
    pub fn parse<T>(&self, key: &str) -> Result<Option<T>, EnvError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.get(key)
            .map(|raw| {
                raw.parse::<T>().map_err(|e| EnvError::Invalid {
                    key: key.to_string(),
                    detail: e.to_string(),
                })
            })
            .transpose()
    }

    /// Boolean flag; `1`, `true`, `yes` and `on` are truthy
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| {
            matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn reader(pairs: &[(&str, &str)]) -> EnvReader<impl Fn(&str) -> Option<String>> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        EnvReader::new(move |key| map.get(key).cloned())
    }

    #[test]
    fn test_get_trims_and_skips_blank() {
        let env = reader(&[("A", "  value "), ("B", "   ")]);
        assert_eq!(env.get("A").as_deref(), Some("value"));
        assert_eq!(env.get("B"), None);
        assert_eq!(env.get("C"), None);
    }

    #[test]
    fn test_require() {
        let env = reader(&[("TOKEN", "abc")]);
        assert_eq!(env.require("TOKEN").unwrap(), "abc");
        assert_eq!(
            env.require("SECRET"),
            Err(EnvError::Missing("SECRET".to_string()))
        );
    }

    #[test]
    fn test_parse() {
        let env = reader(&[("PORT", "8080"), ("BAD", "eighty")]);
        assert_eq!(env.parse::<u16>("PORT").unwrap(), Some(8080));
        assert_eq!(env.parse::<u16>("MISSING").unwrap(), None);

        let err = env.parse::<u16>("BAD").unwrap_err();
        assert!(err.to_string().starts_with("Invalid value for BAD"));
    }

    #[test]
    fn test_flag() {
        let env = reader(&[("ON", "TRUE"), ("ONE", "1"), ("OFF", "false")]);
        assert!(env.flag("ON"));
        assert!(env.flag("ONE"));
        assert!(!env.flag("OFF"));
        assert!(!env.flag("UNSET"));
    }
}
