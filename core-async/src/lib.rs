//! Runtime abstraction layer for the event core.
//!
//! Every other crate in the workspace spawns tasks, sleeps and locks through
//! this crate instead of naming the executor directly. The native build is
//! backed by Tokio.
//!
//! # Modules
//!
//! - `task`: Task spawning, including the "spawn if a runtime is around,
//!   otherwise run inline" dispatch used by the event bus
//! - `time`: Sleep, timeouts, `Duration` and `Instant`
//! - `sync`: Async-aware locks, channels and notification primitives
//! - `runtime`: Runtime handles and `block_on`
//!
//! # Examples
//!
//! ```rust
//! use core_async::task;
//! use core_async::time::{sleep, Duration};
//!
//! async fn example() {
//!     let handle = task::spawn(async {
//!         sleep(Duration::from_millis(5)).await;
//!         42
//!     });
//!     assert_eq!(handle.await.unwrap(), 42);
//! }
//! ```

pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn;
pub use time::{sleep, Duration, Instant};
