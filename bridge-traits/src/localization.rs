//! Translation lookup and app language query.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{BridgeError, Result};

/// ISO 639-1 language code with an optional region subtag (`de`, `en-US`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode {
    language: String,
    region: Option<String>,
}

impl LanguageCode {
    /// Parses `de`, `en-US`, `en_US` or POSIX locales such as `de_DE.UTF-8`.
    pub fn parse(input: &str) -> Result<Self> {
        let base = input
            .split(['.', '@'])
            .next()
            .unwrap_or_default()
            .trim();

        let mut parts = base.split(['-', '_']);
        let language = parts.next().unwrap_or_default().to_ascii_lowercase();

        if language.len() != 2 || !language.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(BridgeError::invalid_input(format!(
                "'{}' is not an ISO 639-1 language code",
                input
            )));
        }

        let region = match parts.next() {
            Some(region)
                if region.len() == 2 && region.chars().all(|c| c.is_ascii_alphabetic()) =>
            {
                Some(region.to_ascii_uppercase())
            }
            Some(other) => {
                return Err(BridgeError::invalid_input(format!(
                    "'{}' is not a valid region subtag",
                    other
                )))
            }
            None => None,
        };

        Ok(Self { language, region })
    }

    /// The two-letter language part (`de` for `de-AT`).
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.region {
            Some(region) => write!(f, "{}-{}", self.language, region),
            None => f.write_str(&self.language),
        }
    }
}

impl FromStr for LanguageCode {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = BridgeError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<LanguageCode> for String {
    fn from(code: LanguageCode) -> Self {
        code.to_string()
    }
}

/// Resolves localization keys through the host's string tables.
///
/// `values` fill positional placeholders in the translated template. A
/// failure means the key is missing or localization is unavailable; callers
/// always keep a fallback string, see [`Translator::translate_or`].
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, key: &str, values: &[String]) -> Result<String>;

    /// Translates `key`, returning `fallback` when the host cannot.
    async fn translate_or(&self, key: &str, values: &[String], fallback: &str) -> String {
        match self.translate(key, values).await {
            Ok(text) => text,
            Err(_) => fallback.to_string(),
        }
    }
}

/// Reports the language the app UI is currently displayed in.
#[async_trait]
pub trait LanguageProvider: Send + Sync {
    async fn app_language(&self) -> Result<LanguageCode>;
}
