//! # Events
//!
//! Immutable notification values routed by the [`EventBus`](crate::bus::EventBus).
//!
//! ## Overview
//!
//! Every event is one flat value: a [`Namespace`] naming its kind, the moment
//! it was created, a scope and an opaque payload.
//!
//! - **Data events** concern exactly one locally managed account and carry its
//!   [`AccountAddress`] as routing target. Only subscribers filtering on that
//!   address (or on any address) see them.
//! - **Native events** are process-wide host signals (app ready, URL opened,
//!   push payload before account resolution) with no target.
//!
//! Payloads are owned by the collaborator that publishes them. The core keeps
//! them behind an `Arc<dyn Any>` and hands them back typed on request.
//!
//! ## Typed event kinds
//!
//! Catalogued kinds implement [`EventType`], which binds a namespace to a
//! payload type at definition time:
//!
//! ```rust
//! use core_runtime::accounts::AccountAddress;
//! use core_runtime::events::catalog::{MessageReceived, MessageReceivedEvent};
//! use core_runtime::events::Event;
//!
//! let event = Event::data::<MessageReceivedEvent>(
//!     AccountAddress::new("acct-1"),
//!     MessageReceived {
//!         message_id: "MSG-1".to_string(),
//!         sender: "peer-9".to_string(),
//!     },
//! );
//!
//! assert_eq!(event.namespace().as_str(), "transport.messageReceived");
//! assert_eq!(event.payload::<MessageReceived>().unwrap().message_id, "MSG-1");
//! ```
//!
//! Collaborators with their own namespaces can build events with
//! [`Event::data_with`] / [`Event::native_with`] instead.

pub mod catalog;
mod namespace;
pub mod registry;

pub use namespace::{Domain, Namespace};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use crate::accounts::AccountAddress;

/// Shared, type-erased event payload.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Whether an event kind is account scoped or process wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    Data,
    Native,
}

/// Routing scope of a concrete event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventScope {
    /// Process-wide host signal.
    Native,
    /// Concerns the account at `target`.
    Data { target: AccountAddress },
}

impl EventScope {
    pub fn kind(&self) -> ScopeKind {
        match self {
            EventScope::Native => ScopeKind::Native,
            EventScope::Data { .. } => ScopeKind::Data,
        }
    }
}

/// Compile-time binding of a namespace to its scope and payload type.
pub trait EventType: 'static {
    const NAMESPACE: Namespace;
    const SCOPE: ScopeKind;
    type Payload: Any + Send + Sync + fmt::Debug;
}

/// Event kinds published with an account target.
pub trait DataEventType: EventType {}

/// Event kinds published without an account target.
pub trait NativeEventType: EventType {}

/// A published notification.
///
/// Cloning is cheap: the payload is shared, never copied.
#[derive(Clone)]
pub struct Event {
    namespace: Namespace,
    published_at: DateTime<Utc>,
    scope: EventScope,
    payload: Payload,
    payload_type: &'static str,
}

impl Event {
    /// Builds a data event of a catalogued kind.
    pub fn data<E: DataEventType>(target: AccountAddress, payload: E::Payload) -> Self {
        Self::data_with(E::NAMESPACE, target, payload)
    }

    /// Builds a native event of a catalogued kind.
    pub fn native<E: NativeEventType>(payload: E::Payload) -> Self {
        Self::native_with(E::NAMESPACE, payload)
    }

    /// Builds a data event for an arbitrary namespace.
    pub fn data_with<T>(namespace: Namespace, target: AccountAddress, payload: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self::build(namespace, EventScope::Data { target }, payload)
    }

    /// Builds a native event for an arbitrary namespace.
    pub fn native_with<T>(namespace: Namespace, payload: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self::build(namespace, EventScope::Native, payload)
    }

    fn build<T>(namespace: Namespace, scope: EventScope, payload: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            namespace,
            published_at: Utc::now(),
            scope,
            payload: Arc::new(payload),
            payload_type: type_name::<T>(),
        }
    }

    /// Overrides the creation timestamp, e.g. with a host [`Clock`](bridge_traits::Clock).
    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = published_at;
        self
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn published_at(&self) -> DateTime<Utc> {
        self.published_at
    }

    pub fn scope(&self) -> &EventScope {
        &self.scope
    }

    pub fn kind(&self) -> ScopeKind {
        self.scope.kind()
    }

    /// The account a data event concerns; `None` for native events.
    pub fn target(&self) -> Option<&AccountAddress> {
        match &self.scope {
            EventScope::Data { target } => Some(target),
            EventScope::Native => None,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self.scope, EventScope::Native)
    }

    pub fn is(&self, namespace: &Namespace) -> bool {
        &self.namespace == namespace
    }

    /// Borrows the payload as `T`, if that is its type.
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    /// Shares the payload as `T`, if that is its type.
    pub fn payload_arc<T>(&self) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        Arc::clone(&self.payload).downcast::<T>().ok()
    }

    /// Returns the payload of a catalogued kind when this event is of that kind.
    pub fn payload_of<E: EventType>(&self) -> Option<&E::Payload> {
        if self.namespace == E::NAMESPACE {
            self.payload::<E::Payload>()
        } else {
            None
        }
    }

    /// Type name of the payload, for diagnostics.
    pub fn payload_type(&self) -> &'static str {
        self.payload_type
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("namespace", &self.namespace.as_str())
            .field("published_at", &self.published_at)
            .field("scope", &self.scope)
            .field("payload_type", &self.payload_type)
            .finish()
    }
}
