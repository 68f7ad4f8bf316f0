//! Where handler failures go.
//!
//! A failing subscriber never affects the publisher or the other subscribers
//! of the same event. The bus hands each failure to a [`DiagnosticSink`]
//! instead.

use std::any::Any;
use std::sync::{Mutex, PoisonError};
use tracing::warn;

use super::subscription::SubscriptionId;
use crate::accounts::AccountAddress;
use crate::events::Namespace;
use crate::logging::redact_address;

/// One handler invocation that returned an error or panicked.
#[derive(Debug)]
pub struct HandlerFailure {
    pub subscription: SubscriptionId,
    pub namespace: Namespace,
    pub target: Option<AccountAddress>,
    pub error: anyhow::Error,
    pub panicked: bool,
}

/// Receives handler failures reported by the event bus.
///
/// Called on the delivering task; implementations should return quickly.
pub trait DiagnosticSink: Send + Sync {
    fn handler_failed(&self, failure: HandlerFailure);
}

/// Default sink: logs every failure at `warn` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn handler_failed(&self, failure: HandlerFailure) {
        let target = failure
            .target
            .as_ref()
            .map(|address| redact_address(address.as_str()));

        warn!(
            subscription = %failure.subscription,
            namespace = %failure.namespace,
            target = ?target,
            panicked = failure.panicked,
            error = %format!("{:#}", failure.error),
            "Event handler failed"
        );
    }
}

/// Sink that keeps failures in memory so hosts and tests can inspect them.
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    failures: Mutex<Vec<HandlerFailure>>,
}

impl CollectingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes and returns everything collected so far.
    pub fn take(&self) -> Vec<HandlerFailure> {
        std::mem::take(&mut *self.failures.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl DiagnosticSink for CollectingDiagnostics {
    fn handler_failed(&self, failure: HandlerFailure) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(failure);
    }
}

/// Turns a caught panic payload into an error.
pub(crate) fn panic_error(payload: Box<dyn Any + Send>) -> anyhow::Error {
    let message = if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    };
    anyhow::anyhow!("handler panicked: {}", message)
}
