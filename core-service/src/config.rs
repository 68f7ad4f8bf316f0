//! # Service Configuration
//!
//! Collects the bridge ports a host injects and the settings for the event
//! bus and logging.
//!
//! ## Required ports
//!
//! - `Translator` - Localized strings for every user-facing message
//! - `LanguageProvider` - Current app language
//!
//! ## Optional ports
//!
//! - `Authenticator` - Biometric / passcode prompt
//! - `PushRegistrar` - Remote notification registration
//! - `Scanner` - QR / document code scanning
//!
//! A missing optional port is not a configuration error: calls through the
//! service report `bridge.notAvailable` instead.
//!
//! When the `desktop-shims` feature is enabled, `bridge-desktop` supplies
//! defaults for the translator, the language provider, the scanner and the
//! push registrar.
//!
//! ## Usage
//!
//! ```ignore
//! use core_service::CoreConfig;
//! use core_runtime::config::EventBusConfig;
//!
//! # fn main() -> core_service::Result<()> {
//! let config = CoreConfig::builder()
//!     .bus_config(EventBusConfig::builder().pending_warning_threshold(64).build()?)
//!     .build()?;
//! # let _ = config;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use bridge_traits::{Authenticator, LanguageProvider, PushRegistrar, Scanner, Translator};
use core_runtime::config::EventBusConfig;
use core_runtime::logging::LoggingConfig;

use crate::error::{CoreError, Result};

/// Validated service configuration.
#[derive(Clone)]
pub struct CoreConfig {
    pub authenticator: Option<Arc<dyn Authenticator>>,
    pub push_registrar: Option<Arc<dyn PushRegistrar>>,
    pub scanner: Option<Arc<dyn Scanner>>,
    pub translator: Arc<dyn Translator>,
    pub language_provider: Arc<dyn LanguageProvider>,
    pub bus: EventBusConfig,
    /// Installed as the global subscriber when the service starts.
    pub logging: Option<LoggingConfig>,
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }
}

impl fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreConfig")
            .field("authenticator", &self.authenticator.is_some())
            .field("push_registrar", &self.push_registrar.is_some())
            .field("scanner", &self.scanner.is_some())
            .field("bus", &self.bus)
            .field("logging", &self.logging)
            .finish_non_exhaustive()
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn translator_missing_error() -> CoreError {
    CoreError::capability_missing(
        "Translator",
        "Translator implementation is required for user-facing messages. \
         Desktop: enable the 'desktop-shims' feature to use the default CatalogTranslator. \
         Mobile: inject the platform string catalogue.",
    )
}

#[cfg(not(feature = "desktop-shims"))]
fn language_provider_missing_error() -> CoreError {
    CoreError::capability_missing(
        "LanguageProvider",
        "LanguageProvider implementation is required to pick the UI language. \
         Desktop: enable the 'desktop-shims' feature to use the default EnvLanguageProvider. \
         Mobile: inject the platform locale lookup.",
    )
}

#[cfg(feature = "desktop-shims")]
fn provide_default_translator() -> Result<Arc<dyn Translator>> {
    use bridge_desktop::CatalogTranslator;

    // Empty catalogue: every lookup falls back to the caller's text.
    let translator: Arc<dyn Translator> = Arc::new(CatalogTranslator::default());
    Ok(translator)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_translator() -> Result<Arc<dyn Translator>> {
    Err(translator_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_language_provider() -> Result<Arc<dyn LanguageProvider>> {
    use bridge_desktop::EnvLanguageProvider;
    use bridge_traits::LanguageCode;

    let fallback = LanguageCode::parse(DEFAULT_LANGUAGE)
        .map_err(|e| CoreError::InitializationFailed(e.to_string()))?;
    let provider: Arc<dyn LanguageProvider> =
        Arc::new(EnvLanguageProvider::new().with_fallback(fallback));
    Ok(provider)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_language_provider() -> Result<Arc<dyn LanguageProvider>> {
    Err(language_provider_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_scanner() -> Option<Arc<dyn Scanner>> {
    use bridge_desktop::InboxScanner;

    let scanner: Arc<dyn Scanner> = Arc::new(InboxScanner::new());
    Some(scanner)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_scanner() -> Option<Arc<dyn Scanner>> {
    None
}

/// Language reported by the desktop default when the environment has none.
#[cfg(feature = "desktop-shims")]
const DEFAULT_LANGUAGE: &str = "en";

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    authenticator: Option<Arc<dyn Authenticator>>,
    push_registrar: Option<Arc<dyn PushRegistrar>>,
    scanner: Option<Arc<dyn Scanner>>,
    translator: Option<Arc<dyn Translator>>,
    language_provider: Option<Arc<dyn LanguageProvider>>,
    bus: Option<EventBusConfig>,
    logging: Option<LoggingConfig>,
}

impl CoreConfigBuilder {
    pub fn authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    /// Without one, the desktop build announces a locally minted token on
    /// the service's bus.
    pub fn push_registrar(mut self, registrar: Arc<dyn PushRegistrar>) -> Self {
        self.push_registrar = Some(registrar);
        self
    }

    pub fn scanner(mut self, scanner: Arc<dyn Scanner>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    pub fn translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn language_provider(mut self, provider: Arc<dyn LanguageProvider>) -> Self {
        self.language_provider = Some(provider);
        self
    }

    /// Settings for the service's event bus.
    ///
    /// Default: [`EventBusConfig::default()`]
    pub fn bus_config(mut self, config: EventBusConfig) -> Self {
        self.bus = Some(config);
        self
    }

    /// Installs logging when the service starts. Leave unset when the host
    /// already configured a `tracing` subscriber.
    pub fn logging(mut self, config: LoggingConfig) -> Self {
        self.logging = Some(config);
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// - `CoreError::CapabilityMissing` when a required port is missing and
    ///   no default is available
    /// - `CoreError::Runtime` when the bus configuration is invalid
    pub fn build(self) -> Result<CoreConfig> {
        let translator = match self.translator {
            Some(translator) => translator,
            None => provide_default_translator()?,
        };

        let language_provider = match self.language_provider {
            Some(provider) => provider,
            None => provide_default_language_provider()?,
        };

        let bus = self.bus.unwrap_or_default();
        bus.validate()?;

        Ok(CoreConfig {
            authenticator: self.authenticator,
            push_registrar: self.push_registrar,
            scanner: self.scanner.or_else(provide_default_scanner),
            translator,
            language_provider,
            bus,
            logging: self.logging,
        })
    }
}
