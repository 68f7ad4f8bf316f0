//! Task spawning and execution abstractions.
//!
//! # Examples
//!
//! ```rust
//! use core_async::task;
//!
//! async fn example() {
//!     let handle = task::spawn(async { 42 });
//!     assert_eq!(handle.await.unwrap(), 42);
//! }
//! ```

use std::future::Future;

use crate::runtime;

pub use tokio::task::{spawn_blocking, yield_now, JoinError, JoinHandle, LocalKey};

/// Declares a value scoped to one future via [`LocalKey::scope`].
pub use tokio::task_local;

/// Spawns a new asynchronous task on the ambient Tokio runtime.
///
/// # Panics
///
/// Panics when called outside of a runtime. Use [`dispatch`] when the caller
/// cannot guarantee one.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::task::spawn(future)
}

/// Outcome of [`dispatch`].
#[derive(Debug)]
pub enum Dispatched<T> {
    /// The future was handed to the ambient runtime and is still running.
    Spawned(JoinHandle<T>),
    /// No runtime was available; the future ran to completion inline.
    Completed(T),
}

impl<T> Dispatched<T> {
    /// Returns `true` when the work already finished on the calling thread.
    pub fn is_completed(&self) -> bool {
        matches!(self, Dispatched::Completed(_))
    }
}

/// Spawns `future` on the runtime driving the current thread, or runs it to
/// completion inline when the caller is plain synchronous code.
///
/// This lets fire-and-forget APIs stay non-blocking inside async code while
/// still working from a synchronous host callback.
pub fn dispatch<F>(future: F) -> Dispatched<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    match runtime::current() {
        Some(handle) => Dispatched::Spawned(handle.spawn(future)),
        None => Dispatched::Completed(runtime::block_on(future)),
    }
}

/// Result type for task operations.
pub type Result<T> = std::result::Result<T, JoinError>;
