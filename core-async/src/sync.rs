//! Synchronization primitives.
//!
//! Async-aware locks and channels re-exported from `tokio::sync`. All of them
//! are `Send + Sync` and never block the executor thread.
//!
//! ```rust
//! use core_async::sync::Mutex;
//!
//! async fn example() {
//!     let counter = Mutex::new(0);
//!     *counter.lock().await += 1;
//! }
//! ```

pub use tokio::sync::{
    broadcast, mpsc, oneshot, watch, Mutex, MutexGuard, Notify, RwLock, RwLockReadGuard,
    RwLockWriteGuard, Semaphore,
};
