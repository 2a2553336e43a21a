//! Global Tokio runtime for the D-Bus connection
//!
//! GPUI uses its own async executor, but zbus is built on Tokio here. This
//! module provides a lazily initialized global Tokio runtime shared by the
//! window (serving the bus) and the command-line client.

use gpui::{Context, Task};
use std::future::Future;
use std::sync::OnceLock;
use tokio::runtime::Runtime;

static TOKIO_RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Initialize the global Tokio runtime. Call this during startup.
pub fn init() -> std::io::Result<()> {
    if TOKIO_RUNTIME.get().is_some() {
        return Ok(());
    }
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("tokio-dbus")
        .enable_all()
        .build()?;
    let _ = TOKIO_RUNTIME.set(runtime);
    Ok(())
}

/// Get the global Tokio runtime handle
///
/// Initializes the runtime on first use if `init` was not called.
pub fn handle() -> std::io::Result<tokio::runtime::Handle> {
    init()?;
    TOKIO_RUNTIME
        .get()
        .map(|runtime| runtime.handle().clone())
        .ok_or_else(|| std::io::Error::other("Tokio runtime unavailable"))
}

/// Run a future to completion on the Tokio runtime, blocking the caller
pub fn block_on<F: Future>(future: F) -> std::io::Result<F::Output> {
    Ok(handle()?.block_on(future))
}

/// Spawn a future on the Tokio runtime and return a GPUI Task
pub fn spawn<T, R, F>(
    cx: &mut Context<T>,
    future: F,
) -> std::io::Result<Task<Result<R, tokio::task::JoinError>>>
where
    R: Send + 'static,
    F: Future<Output = R> + Send + 'static,
{
    let join_handle = handle()?.spawn(future);
    Ok(cx.foreground_executor().spawn(join_handle))
}
