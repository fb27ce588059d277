//! Bridge from blocking call paths into the async API.

use std::future::Future;

use tokio::runtime::{Handle, RuntimeFlavor};

/// Drive `future` to completion on the current thread.
///
/// Inside a multi-threaded Tokio runtime the worker is handed off with
/// `block_in_place` first; elsewhere a local executor is used. Callers on a
/// current-thread runtime must not use this from async code: the single
/// worker would be blocked.
pub fn wait<F: Future>(future: F) -> F::Output {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| handle.block_on(future))
        }
        _ => futures::executor::block_on(future),
    }
}
