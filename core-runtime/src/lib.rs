//! # Core Runtime Module
//!
//! Address-scoped event routing for a host process that manages several
//! accounts at once:
//! - Account addresses and the registry of locally managed accounts
//! - Namespaced, typed events and the catalogue of known kinds
//! - The event bus that routes them to subscribers
//! - Bus configuration, logging and the runtime error type
//!
//! ## Overview
//!
//! Collaborators publish data events (about one account) and native events
//! (host signals) into one shared [`EventBus`](bus::EventBus). Subscribers
//! pick a namespace and an address filter and are invoked asynchronously,
//! one invocation at a time per subscription.

pub mod accounts;
pub mod bus;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use accounts::{AccountAddress, AccountRegistry};
pub use bus::{AddressFilter, BusStats, EventBus, EventStream, SubscriptionId};
pub use config::EventBusConfig;
pub use error::{Error, Result};
pub use events::{Event, EventScope, EventType, Namespace};
