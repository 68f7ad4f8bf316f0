//! Translation catalogue and locale lookup for desktop hosts.

use async_trait::async_trait;
use bridge_traits::{BridgeError, LanguageCode, LanguageProvider, Result, Translator};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Translator backed by a flat JSON object of `key -> template`.
///
/// Templates use positional placeholders: `"Hello {0}, you have {1} new messages"`.
/// `{{` and `}}` produce literal braces.
#[derive(Debug, Clone, Default)]
pub struct CatalogTranslator {
    templates: HashMap<String, String>,
}

impl CatalogTranslator {
    pub fn new(templates: HashMap<String, String>) -> Self {
        Self { templates }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let templates: HashMap<String, String> = serde_json::from_str(json).map_err(|e| {
            BridgeError::invalid_input(format!("Invalid translation catalogue: {}", e))
        })?;
        Ok(Self::new(templates))
    }

    /// Loads a catalogue file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await?;
        let translator = Self::from_json(&json)?;
        debug!(entries = translator.len(), "Loaded translation catalogue");
        Ok(translator)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[async_trait]
impl Translator for CatalogTranslator {
    async fn translate(&self, key: &str, values: &[String]) -> Result<String> {
        let template = self
            .templates
            .get(key)
            .ok_or_else(|| BridgeError::not_found(format!("No translation for '{}'", key)))?;

        fill_placeholders(template, values)
            .map_err(|e| BridgeError::invalid_input(format!("Translation '{}': {}", key, e)))
    }
}

fn fill_placeholders(template: &str, values: &[String]) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut digits = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(d) if d.is_ascii_digit() => digits.push(d),
                        _ => return Err("malformed placeholder".to_string()),
                    }
                }
                let index: usize = digits
                    .parse()
                    .map_err(|_| "empty placeholder".to_string())?;
                let value = values
                    .get(index)
                    .ok_or_else(|| format!("no value for placeholder {{{}}}", index))?;
                out.push_str(value);
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Locale variables consulted in order; the first usable one wins.
const LOCALE_VARS: [&str; 3] = ["LC_ALL", "LC_MESSAGES", "LANG"];

/// App language from the POSIX locale environment.
#[derive(Clone)]
pub struct EnvLanguageProvider {
    lookup: EnvLookup,
    override_code: Option<LanguageCode>,
    fallback: Option<LanguageCode>,
}

impl EnvLanguageProvider {
    pub fn new() -> Self {
        Self::with_lookup(|name: &str| std::env::var(name).ok())
    }

    /// Reads locale variables through `lookup` instead of the process
    /// environment.
    pub fn with_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            lookup: Arc::new(lookup),
            override_code: None,
            fallback: None,
        }
    }

    /// Always report `code`, e.g. from an in-app language setting.
    pub fn with_override(mut self, code: LanguageCode) -> Self {
        self.override_code = Some(code);
        self
    }

    /// Reported when the environment names no usable locale.
    pub fn with_fallback(mut self, code: LanguageCode) -> Self {
        self.fallback = Some(code);
        self
    }
}

impl Default for EnvLanguageProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EnvLanguageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvLanguageProvider")
            .field("override_code", &self.override_code)
            .field("fallback", &self.fallback)
            .finish()
    }
}

#[async_trait]
impl LanguageProvider for EnvLanguageProvider {
    async fn app_language(&self) -> Result<LanguageCode> {
        if let Some(code) = &self.override_code {
            return Ok(code.clone());
        }

        for var in LOCALE_VARS {
            let Some(value) = (self.lookup)(var) else {
                continue;
            };
            // "C" and "POSIX" carry no language.
            if value.is_empty() || value == "C" || value == "POSIX" || value.starts_with("C.") {
                continue;
            }
            match LanguageCode::parse(&value) {
                Ok(code) => return Ok(code),
                Err(err) => warn!(var, error = %err, "Ignoring unparsable locale"),
            }
        }

        self.fallback
            .clone()
            .ok_or_else(|| BridgeError::not_available("No locale configured in the environment"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::ErrorCode;

    fn env(pairs: &'static [(&'static str, &'static str)]) -> EnvLanguageProvider {
        EnvLanguageProvider::with_lookup(move |name: &str| {
            pairs
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        })
    }

    #[tokio::test]
    async fn test_translate_fills_placeholders() {
        let translator = CatalogTranslator::from_json(
            r#"{ "inbox.summary": "Hello {0}, you have {1} new messages {{beta}}" }"#,
        )
        .unwrap();

        let text = translator
            .translate("inbox.summary", &["Ada".to_string(), "3".to_string()])
            .await
            .unwrap();
        assert_eq!(text, "Hello Ada, you have 3 new messages {beta}");
    }

    #[tokio::test]
    async fn test_missing_key_is_not_found() {
        let translator = CatalogTranslator::default();
        let err = translator.translate("nope", &[]).await.unwrap_err();
        assert!(err.is(&ErrorCode::NOT_FOUND));

        let text = translator.translate_or("nope", &[], "Fallback").await;
        assert_eq!(text, "Fallback");
    }

    #[tokio::test]
    async fn test_missing_value_is_invalid_input() {
        let translator = CatalogTranslator::from_json(r#"{ "greet": "Hi {0} and {1}" }"#).unwrap();
        let err = translator
            .translate("greet", &["Ada".to_string()])
            .await
            .unwrap_err();
        assert!(err.is(&ErrorCode::INVALID_INPUT));
        assert!(err.message.contains("{1}"));
    }

    #[test]
    fn test_invalid_catalogue_json() {
        let err = CatalogTranslator::from_json("[1, 2]").unwrap_err();
        assert!(err.is(&ErrorCode::INVALID_INPUT));
    }

    #[tokio::test]
    async fn test_load_catalogue_from_file() {
        let path = std::env::temp_dir().join(format!("catalogue-{}.json", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, r#"{ "a": "A", "b": "B" }"#)
            .await
            .unwrap();

        let translator = CatalogTranslator::load(&path).await.unwrap();
        assert_eq!(translator.len(), 2);

        tokio::fs::remove_file(&path).await.unwrap();
        let err = CatalogTranslator::load(&path).await.unwrap_err();
        assert!(err.is(&ErrorCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn test_language_precedence() {
        let provider = env(&[("LANG", "en_US.UTF-8"), ("LC_ALL", "de_DE.UTF-8")]);
        assert_eq!(provider.app_language().await.unwrap().to_string(), "de-DE");

        let provider = env(&[("LANG", "fr_CA.UTF-8"), ("LC_ALL", "C")]);
        assert_eq!(provider.app_language().await.unwrap().to_string(), "fr-CA");
    }

    #[tokio::test]
    async fn test_override_wins() {
        let provider = env(&[("LANG", "en_US.UTF-8")])
            .with_override(LanguageCode::parse("it").unwrap());
        assert_eq!(provider.app_language().await.unwrap().language(), "it");
    }

    #[tokio::test]
    async fn test_fallback_and_unavailable() {
        let err = env(&[]).app_language().await.unwrap_err();
        assert!(err.is(&ErrorCode::NOT_AVAILABLE));

        let provider = env(&[("LANG", "POSIX")]).with_fallback(LanguageCode::parse("en").unwrap());
        assert_eq!(provider.app_language().await.unwrap().language(), "en");
    }
}
