//! Runtime utilities that abstract over the underlying async executor.
//!
//! Downstream crates use these wrappers so they never depend on Tokio
//! directly.

pub use tokio::runtime::{Builder, Handle, Runtime};

/// Runs the provided future to completion on a lightweight current-thread
/// runtime.
///
/// Must not be called from inside an async context; use
/// [`task::dispatch`](crate::task::dispatch) when the caller may or may not
/// already be running on a runtime.
pub fn block_on<F>(future: F) -> F::Output
where
    F: std::future::Future,
{
    Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("core_async::runtime::block_on: failed to build Tokio runtime")
        .block_on(future)
}

/// Returns a handle to the runtime driving the current thread, if any.
pub fn current() -> Option<Handle> {
    Handle::try_current().ok()
}
