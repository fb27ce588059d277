//! Blocking execution context backed by Tokio's blocking thread pool.

use std::sync::Arc;

use async_trait::async_trait;
use identity_manager_sdk::{AuthenticationRequestContext, BlockingWork, IdentityError, ProviderResult};
use tokio::runtime::Handle;
use tokio::sync::Semaphore;

/// Runs provider and augmentor blocking work on Tokio's blocking pool.
///
/// At most `max_blocking_tasks` submissions run at once; further callers wait
/// asynchronously for a slot. When no runtime is reachable (neither captured
/// at construction nor current at call time) the work runs inline, since
/// there is no scheduler to stall.
#[derive(Debug, Clone)]
pub struct TokioBlockingContext {
    handle: Option<Handle>,
    permits: Arc<Semaphore>,
}

impl TokioBlockingContext {
    /// Capture the current runtime, if any.
    #[must_use]
    pub fn new(max_blocking_tasks: usize) -> Self {
        Self {
            handle: Handle::try_current().ok(),
            permits: Arc::new(Semaphore::new(max_blocking_tasks)),
        }
    }

    #[must_use]
    pub fn with_handle(handle: Handle, max_blocking_tasks: usize) -> Self {
        Self {
            handle: Some(handle),
            permits: Arc::new(Semaphore::new(max_blocking_tasks)),
        }
    }

    /// Number of blocking slots currently free.
    #[must_use]
    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }
}

#[async_trait]
impl AuthenticationRequestContext for TokioBlockingContext {
    async fn run_blocking(&self, work: BlockingWork) -> ProviderResult {
        let Some(handle) = self.handle.clone().or_else(|| Handle::try_current().ok()) else {
            tracing::trace!("no tokio runtime available, running blocking work inline");
            return work();
        };

        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| IdentityError::Backend(anyhow::Error::new(e)))?;

        let joined = handle
            .spawn_blocking(move || {
                let _permit = permit;
                work()
            })
            .await;

        match joined {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "blocking authentication task did not complete");
                Err(IdentityError::Backend(anyhow::anyhow!(
                    "blocking authentication task did not complete: {e}"
                )))
            }
        }
    }
}
