//! # Desktop Bridge Implementations
//!
//! Default implementations of the native bridge ports for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! Desktop machines lack most of the capabilities a phone offers, so each
//! port is backed by the closest desktop equivalent:
//! - `Authenticator` answers from a configured policy
//! - `PushRegistrar` mints a local token and announces it on the event bus
//! - `Scanner` consumes a decoded payload from an inbox file
//! - `Translator` reads a JSON string catalogue
//! - `LanguageProvider` reads the POSIX locale environment
//!
//! [`DesktopHost`] turns shell callbacks into native events.
//!
//! ## Usage
//!
//! ```no_run
//! use bridge_desktop::{DesktopHost, DesktopPushRegistrar, EnvLanguageProvider};
//! use bridge_traits::{LanguageProvider, PushRegistrar};
//! use core_runtime::bus::EventBus;
//!
//! #[tokio::main]
//! async fn main() {
//!     let bus = EventBus::new();
//!     let host = DesktopHost::new(bus.clone());
//!     let push = DesktopPushRegistrar::new(bus.clone());
//!
//!     host.app_ready();
//!     push.init_push_registration().await.unwrap();
//!     let language = EnvLanguageProvider::new().app_language().await;
//!     println!("UI language: {:?}", language);
//! }
//! ```

mod authentication;
mod host;
mod localization;
mod push;
mod scanner;

pub use authentication::{AuthenticationPolicy, PolicyAuthenticator};
pub use host::DesktopHost;
pub use localization::{CatalogTranslator, EnvLanguageProvider};
pub use push::DesktopPushRegistrar;
pub use scanner::InboxScanner;

/// Directory name used under the platform data directory.
pub(crate) const APP_DIR_NAME: &str = "event-core";
