//! # Native Bridge Ports
//!
//! Capability traits that each host environment must implement for the core.
//!
//! ## Overview
//!
//! The core never talks to a platform API directly. Application logic and the
//! host's event-producing adapter depend on the narrow ports defined here, and
//! every host (desktop, iOS, Android) ships its own implementation.
//!
//! ## Ports
//!
//! - [`Authenticator`](authentication::Authenticator) - Biometric / passcode prompt
//! - [`PushRegistrar`](push::PushRegistrar) - Remote notification registration
//! - [`Scanner`](scanner::Scanner) - QR / document code scanning
//! - [`Translator`](localization::Translator) - Localized string lookup
//! - [`LanguageProvider`](localization::LanguageProvider) - Current app language
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](log::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! Ports never panic and never raise host-specific errors. Every operation
//! returns [`Result<T>`](error::Result) whose failure half is a
//! [`BridgeError`](error::BridgeError): a stable code plus a human message.
//! Exactly one of `Ok` / `Err` is returned per call, so upstream code can
//! treat every host identically:
//!
//! ```ignore
//! use bridge_traits::{AuthenticationOptions, Authenticator, ErrorCode};
//!
//! async fn unlock(auth: &dyn Authenticator) -> bool {
//!     match auth.authenticate(&AuthenticationOptions::new("Unlock")).await {
//!         Ok(confirmed) => confirmed,
//!         Err(err) if err.is(&ErrorCode::NOT_AVAILABLE) => true,
//!         Err(err) => {
//!             tracing::warn!(code = %err.code, "authentication failed");
//!             false
//!         }
//!     }
//! }
//! ```
//!
//! Timeouts are the adapter's business; the core never imposes one on a
//! bridge call and never retries one.
//!
//! ## Thread Safety
//!
//! All ports require `Send + Sync` so they can be shared behind `Arc` across
//! async tasks.

pub mod authentication;
pub mod error;
pub mod localization;
pub mod log;
pub mod push;
pub mod scanner;
pub mod time;

pub use error::{BridgeError, ErrorCode, Result};

pub use authentication::{AuthenticationOptions, Authenticator};
pub use localization::{LanguageCode, LanguageProvider, Translator};
pub use log::{LogEntry, LogLevel, LoggerSink};
pub use push::{PushPlatform, PushRegistrar, PushToken};
pub use scanner::Scanner;
pub use time::{Clock, ManualClock, SystemClock};
