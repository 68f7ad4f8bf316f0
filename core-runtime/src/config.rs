//! # Event Bus Configuration
//!
//! Builder for the settings an [`EventBus`](crate::bus::EventBus) is created
//! with.
//!
//! ## Usage
//!
//! ```
//! use core_runtime::bus::{CollectingDiagnostics, EventBus};
//! use core_runtime::config::EventBusConfig;
//! use std::sync::Arc;
//!
//! let diagnostics = Arc::new(CollectingDiagnostics::new());
//! let config = EventBusConfig::builder()
//!     .diagnostics(diagnostics.clone())
//!     .pending_warning_threshold(64)
//!     .build()
//!     .expect("valid bus config");
//!
//! let bus = EventBus::with_config(config);
//! assert_eq!(bus.subscription_count(), 0);
//! ```
//!
//! ## Error Handling
//!
//! `build()` rejects settings the bus cannot run with:
//!
//! ```should_panic
//! use core_runtime::config::EventBusConfig;
//!
//! let config = EventBusConfig::builder()
//!     .pending_warning_threshold(0)
//!     .build()
//!     .expect("Should fail - threshold must be positive");
//! ```

use bridge_traits::{Clock, SystemClock};
use std::fmt;
use std::sync::Arc;

use crate::accounts::AccountRegistry;
use crate::bus::{DiagnosticSink, TracingDiagnostics};
use crate::error::{Error, Result};

/// In-flight delivery passes above which the bus starts warning.
pub const DEFAULT_PENDING_WARNING_THRESHOLD: usize = 1024;

/// Settings for one event bus.
///
/// Use [`EventBusConfig::builder`] to construct instances; the `Default` value
/// is what an unconfigured builder produces.
#[derive(Clone)]
pub struct EventBusConfig {
    /// Receives handler failures. Defaults to [`TracingDiagnostics`].
    pub diagnostics: Arc<dyn DiagnosticSink>,

    /// Time source used to stamp events created by the core itself.
    pub clock: Arc<dyn Clock>,

    /// Accounts the bus routes data events to. A fresh registry is created
    /// when none is supplied.
    pub accounts: Arc<AccountRegistry>,

    /// Number of concurrently pending delivery passes that triggers a warning.
    /// Fan-out itself stays unbounded.
    pub pending_warning_threshold: usize,
}

impl EventBusConfig {
    pub fn builder() -> EventBusConfigBuilder {
        EventBusConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.pending_warning_threshold == 0 {
            return Err(Error::Config(
                "Pending warning threshold must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            diagnostics: Arc::new(TracingDiagnostics),
            clock: Arc::new(SystemClock),
            accounts: Arc::new(AccountRegistry::new()),
            pending_warning_threshold: DEFAULT_PENDING_WARNING_THRESHOLD,
        }
    }
}

impl fmt::Debug for EventBusConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBusConfig")
            .field("diagnostics", &"DiagnosticSink { ... }")
            .field("clock", &"Clock { ... }")
            .field("accounts", &self.accounts.len())
            .field("pending_warning_threshold", &self.pending_warning_threshold)
            .finish()
    }
}

/// Builder for [`EventBusConfig`].
#[derive(Default)]
pub struct EventBusConfigBuilder {
    diagnostics: Option<Arc<dyn DiagnosticSink>>,
    clock: Option<Arc<dyn Clock>>,
    accounts: Option<Arc<AccountRegistry>>,
    pending_warning_threshold: Option<usize>,
}

impl EventBusConfigBuilder {
    /// Sets the sink that receives handler errors and panics.
    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    /// Sets the time source. Hosts inject a
    /// [`ManualClock`](bridge_traits::ManualClock) in tests.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Shares an existing account registry with the bus.
    pub fn accounts(mut self, accounts: Arc<AccountRegistry>) -> Self {
        self.accounts = Some(accounts);
        self
    }

    /// Sets the in-flight pass count that triggers a backpressure warning.
    ///
    /// Default: 1024
    pub fn pending_warning_threshold(mut self, threshold: usize) -> Self {
        self.pending_warning_threshold = Some(threshold);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the warning threshold is zero.
    pub fn build(self) -> Result<EventBusConfig> {
        let defaults = EventBusConfig::default();
        let config = EventBusConfig {
            diagnostics: self.diagnostics.unwrap_or(defaults.diagnostics),
            clock: self.clock.unwrap_or(defaults.clock),
            accounts: self.accounts.unwrap_or(defaults.accounts),
            pending_warning_threshold: self
                .pending_warning_threshold
                .unwrap_or(defaults.pending_warning_threshold),
        };

        config.validate()?;
        Ok(config)
    }
}
