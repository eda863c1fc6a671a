//! Scoped tool source sessions
//!
//! A session is torn down exactly once, whichever way its scope ends: the body
//! returns, the body panics, or the enclosing future is dropped mid-flight.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::FutureExt;

use crate::logging::Logger;

use super::error::McpResult;
use super::source::ToolSource;

/// Owns an open tool source and shuts it down on close or drop
pub struct SessionGuard {
    source: Arc<dyn ToolSource>,
    closed: AtomicBool,
    logger: Arc<dyn Logger>,
}

impl SessionGuard {
    pub fn new(source: Arc<dyn ToolSource>, logger: Arc<dyn Logger>) -> Self {
        Self {
            source,
            closed: AtomicBool::new(false),
            logger,
        }
    }

    /// The guarded source
    pub fn source(&self) -> &Arc<dyn ToolSource> {
        &self.source
    }

    /// Whether teardown has already been started
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Shut the source down; later calls are no-ops
    pub async fn close(&self) -> McpResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.logger.debug(&format!("[Session] Closing '{}'", self.source.name()));
        self.source.shutdown().await
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        self.logger.debug(&format!(
            "[Session] '{}' dropped while open, shutting down",
            self.source.name()
        ));

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let source = Arc::clone(&self.source);
                let logger = Arc::clone(&self.logger);
                handle.spawn(async move {
                    if let Err(e) = source.shutdown().await {
                        logger.warn(&format!("[Session] Shutdown after drop failed: {}", e));
                    }
                });
            }
            Err(_) => {
                // No runtime left; the child process is killed when the transport drops.
                self.logger.warn("[Session] No runtime available for shutdown");
            }
        }
    }
}

/// Run `body` with an open source and tear the source down afterwards
///
/// Panics in `body` are re-raised after teardown. If the returned future is
/// dropped before completion, teardown is spawned from the guard's `Drop`.
pub async fn scoped<F, Fut, T>(source: Arc<dyn ToolSource>, logger: Arc<dyn Logger>, body: F) -> T
where
    F: FnOnce(Arc<dyn ToolSource>) -> Fut,
    Fut: Future<Output = T>,
{
    let guard = SessionGuard::new(source, Arc::clone(&logger));
    let outcome = AssertUnwindSafe(body(Arc::clone(guard.source())))
        .catch_unwind()
        .await;

    if let Err(e) = guard.close().await {
        logger.warn(&format!("[Session] Shutdown failed: {}", e));
    }

    match outcome {
        Ok(value) => value,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
