//! Language tags and language-scoped strings and identifiers.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A language tag such as `en`, `de`, or `simple`.
///
/// Stored lowercase; comparison is by code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Language(String);

impl Language {
    /// Parses and validates a language code.
    pub fn new(code: &str) -> Result<Self, ConfigError> {
        let code = code.trim().to_ascii_lowercase();
        let valid = !code.is_empty()
            && code.len() <= 12
            && code
                .chars()
                .all(|c| c.is_ascii_lowercase() || c == '-' || c == '_');
        if !valid {
            return Err(ConfigError::InvalidLanguage(code));
        }
        Ok(Self(code))
    }

    pub fn code(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Language {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::new(s)
    }
}

impl TryFrom<String> for Language {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Language::new(&value)
    }
}

impl From<Language> for String {
    fn from(lang: Language) -> String {
        lang.0
    }
}

/// A phrase tagged with the language it is written in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalString {
    pub language: Language,
    pub text: String,
}

impl LocalString {
    pub fn new(language: Language, text: impl Into<String>) -> Self {
        Self {
            language,
            text: text.into(),
        }
    }
}

/// A concept identifier within one language's concept space.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalId {
    pub language: Language,
    pub id: i64,
}

impl LocalId {
    pub fn new(language: Language, id: i64) -> Self {
        Self { language, id }
    }
}
