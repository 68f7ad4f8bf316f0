//! Core service façade.
//!
//! Owns the event bus and the host's bridge ports and drives account
//! lifecycle: registering, selecting and removing the accounts a host
//! process manages. Desktop apps typically enable the `desktop-shims` feature
//! (which depends on `bridge-desktop`) to get working defaults for every
//! port.
//!
//! ```ignore
//! use core_service::{CoreConfig, CoreService};
//! use core_runtime::AccountAddress;
//!
//! # async fn example() -> core_service::Result<()> {
//! let core = CoreService::new(CoreConfig::builder().build()?)?;
//! let address = AccountAddress::parse("did:e:localhost:dids:0f3a")?;
//!
//! core.register_account(address.clone());
//! core.select_account(&address, Some("Work".to_string()))?;
//! let text = core.translate_or("welcome", &[], "Welcome").await;
//! core.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;

pub use config::{CoreConfig, CoreConfigBuilder};
pub use error::{CoreError, Result};

use std::fmt;
use std::sync::Arc;

use bridge_traits::{
    AuthenticationOptions, Authenticator, BridgeError, LanguageCode, LanguageProvider,
    PushRegistrar, Scanner, Translator,
};
use core_runtime::accounts::AccountAddress;
use core_runtime::bus::EventBus;
use core_runtime::events::catalog::{
    AccountRemoved, AccountRemovedEvent, AccountSelected, AccountSelectedEvent,
};
use core_runtime::events::Event;
use core_runtime::logging::{init_logging, redact_address};
use tracing::{debug, info};

/// Ports the service calls on behalf of application logic.
struct Ports {
    authenticator: Option<Arc<dyn Authenticator>>,
    push_registrar: Option<Arc<dyn PushRegistrar>>,
    scanner: Option<Arc<dyn Scanner>>,
    translator: Arc<dyn Translator>,
    language_provider: Arc<dyn LanguageProvider>,
}

/// Primary façade exposed to host applications.
///
/// Cloning is cheap; clones share the bus and the ports.
#[derive(Clone)]
pub struct CoreService {
    bus: EventBus,
    ports: Arc<Ports>,
}

impl CoreService {
    /// Creates the bus and wires the ports.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Runtime` if logging was requested and a global
    /// subscriber is already installed.
    pub fn new(config: CoreConfig) -> Result<Self> {
        if let Some(logging) = config.logging {
            init_logging(logging)?;
        }

        let bus = EventBus::with_config(config.bus);
        let push_registrar = config
            .push_registrar
            .or_else(|| default_push_registrar(&bus));

        info!(
            authenticator = config.authenticator.is_some(),
            push = push_registrar.is_some(),
            scanner = config.scanner.is_some(),
            "Core service started"
        );

        Ok(Self {
            bus,
            ports: Arc::new(Ports {
                authenticator: config.authenticator,
                push_registrar,
                scanner: config.scanner,
                translator: config.translator,
                language_provider: config.language_provider,
            }),
        })
    }

    /// The bus every collaborator publishes into and subscribes on.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub async fn authenticate(
        &self,
        options: &AuthenticationOptions,
    ) -> bridge_traits::Result<bool> {
        let authenticator = self
            .ports
            .authenticator
            .as_ref()
            .ok_or_else(|| port_missing("Authenticator"))?;
        authenticator.authenticate(options).await
    }

    /// Asks the host for a push token. The token itself arrives later as an
    /// `app.remoteNotificationRegistered` event.
    pub async fn init_push_registration(&self) -> bridge_traits::Result<()> {
        let registrar = self
            .ports
            .push_registrar
            .as_ref()
            .ok_or_else(|| port_missing("PushRegistrar"))?;
        registrar.init_push_registration().await
    }

    pub async fn scan(&self) -> bridge_traits::Result<String> {
        let scanner = self
            .ports
            .scanner
            .as_ref()
            .ok_or_else(|| port_missing("Scanner"))?;
        scanner.scan().await
    }

    pub async fn translate(&self, key: &str, values: &[String]) -> bridge_traits::Result<String> {
        self.ports.translator.translate(key, values).await
    }

    /// Translated text, or `fallback` when the lookup fails.
    pub async fn translate_or(&self, key: &str, values: &[String], fallback: &str) -> String {
        self.ports
            .translator
            .translate_or(key, values, fallback)
            .await
    }

    pub async fn app_language(&self) -> bridge_traits::Result<LanguageCode> {
        self.ports.language_provider.app_language().await
    }

    /// Makes `address` a valid routing target. Returns `false` if it was
    /// already registered.
    pub fn register_account(&self, address: AccountAddress) -> bool {
        self.bus.accounts().register(address)
    }

    /// Registered accounts in registration order.
    pub fn accounts(&self) -> Vec<AccountAddress> {
        self.bus.accounts().addresses()
    }

    pub fn active_account(&self) -> Option<AccountAddress> {
        self.bus.accounts().active()
    }

    /// Marks `address` as the active account and publishes
    /// `app.accountSelected` to its subscribers.
    ///
    /// # Errors
    ///
    /// `core_runtime::Error::UnknownAccount` if the address is not registered.
    pub fn select_account(&self, address: &AccountAddress, name: Option<String>) -> Result<()> {
        self.bus.accounts().select(address)?;
        debug!(address = %redact_address(address.as_str()), "Account selected");

        let event = Event::data::<AccountSelectedEvent>(
            address.clone(),
            AccountSelected {
                address: address.clone(),
                name,
            },
        )
        .with_published_at(self.bus.clock().now());
        self.bus.publish(event);
        Ok(())
    }

    /// Tears down everything scoped to `address` and announces the removal
    /// with a native `app.accountRemoved` event once the account's own
    /// subscribers are gone.
    ///
    /// Returns the number of subscriptions that were removed.
    ///
    /// # Errors
    ///
    /// `core_runtime::Error::UnknownAccount` if the address is not registered.
    pub async fn remove_account(&self, address: &AccountAddress) -> Result<usize> {
        if !self.bus.accounts().contains(address) {
            return Err(core_runtime::Error::UnknownAccount(address.to_string()).into());
        }

        let removed = self.bus.remove_account(address).await;
        info!(
            address = %redact_address(address.as_str()),
            subscriptions = removed,
            "Account removed"
        );

        let event = Event::native::<AccountRemovedEvent>(AccountRemoved {
            address: address.clone(),
        })
        .with_published_at(self.bus.clock().now());
        self.bus.publish_and_flush(event).await;
        Ok(removed)
    }

    /// Closes the bus after in-flight deliveries finish.
    pub async fn shutdown(&self) {
        self.bus.shutdown().await;
        info!("Core service shut down");
    }
}

impl fmt::Debug for CoreService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreService")
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

fn port_missing(port: &str) -> BridgeError {
    BridgeError::not_available(format!("No {} configured for this host", port))
}

#[cfg(feature = "desktop-shims")]
fn default_push_registrar(bus: &EventBus) -> Option<Arc<dyn PushRegistrar>> {
    use bridge_desktop::DesktopPushRegistrar;

    let registrar: Arc<dyn PushRegistrar> = Arc::new(DesktopPushRegistrar::new(bus.clone()));
    Some(registrar)
}

#[cfg(not(feature = "desktop-shims"))]
fn default_push_registrar(_bus: &EventBus) -> Option<Arc<dyn PushRegistrar>> {
    None
}
