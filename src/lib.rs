//! Address-scoped event notification core.
//!
//! This crate re-exports the workspace crates behind one dependency. Host
//! applications depend on `event-core` and pick features here instead of
//! wiring each crate individually:
//!
//! - `desktop-shims` (default) - desktop implementations of every bridge port
//!
//! ```ignore
//! use event_core::{CoreConfig, CoreService};
//!
//! # async fn example() -> event_core::Result<()> {
//! let core = CoreService::new(CoreConfig::builder().build()?)?;
//! core.bus().drain().await;
//! # Ok(())
//! # }
//! ```

pub use bridge_traits as bridge;
pub use core_runtime as runtime;
pub use core_service::{CoreConfig, CoreConfigBuilder, CoreError, CoreService, Result};

pub use core_runtime::{AccountAddress, AddressFilter, Event, EventBus, EventType, Namespace};
