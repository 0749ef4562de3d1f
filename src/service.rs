//! The long-running sync service.
//!
//! One initial full pass, then a watcher feeding change events to the
//! replica while full passes repeat on a fixed interval. Event handling and
//! full passes run concurrently and share no lock; passes never overlap each
//! other.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::SyncError;
use crate::logging::LogSink;
use crate::sync::{ChangeSource, FsWatcher, Roots, SyncStats, Synchronizer};

/// Run one full pass on a blocking thread.
pub async fn run_pass(sync: &Synchronizer) -> Result<SyncStats> {
    let sync = sync.clone();
    let stats = tokio::task::spawn_blocking(move || sync.synchronize())
        .await
        .context("Full synchronization task failed")??;
    Ok(stats)
}

/// Feed events from `source` to the synchronizer, in arrival order, until
/// cancelled or the source ends.
///
/// A subscription failure is logged and returned; the source is stopped on
/// every exit path.
pub async fn pump_events<S: ChangeSource>(
    mut source: S,
    sync: Synchronizer,
    cancel: CancellationToken,
) -> crate::error::Result<()> {
    let outcome = loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break Ok(()),
            next = source.next_event() => next,
        };

        match next {
            Some(Ok(event)) => {
                let handler = sync.clone();
                if let Err(e) = tokio::task::spawn_blocking(move || handler.apply(&event)).await {
                    sync.sink().error(format!("Event handler failed: {e}"));
                }
            }
            Some(Err(e)) => {
                sync.sink().error(e.to_string());
                break Err(e);
            }
            None => break Ok(()),
        }
    };

    source.stop();
    outcome
}

/// A running watcher plus the task pumping its events.
struct Subscription {
    cancel: CancellationToken,
    handle: JoinHandle<crate::error::Result<()>>,
}

impl Subscription {
    fn start(sync: &Synchronizer, parent: &CancellationToken) -> Option<Self> {
        match FsWatcher::start(sync.roots().source()) {
            Ok(watcher) => {
                let cancel = parent.child_token();
                let handle = tokio::spawn(pump_events(watcher, sync.clone(), cancel.clone()));
                Some(Self { cancel, handle })
            }
            Err(e) => {
                sync.sink()
                    .error(format!("Failed to start file system watcher: {e}"));
                None
            }
        }
    }

    fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.handle.await;
    }
}

/// Run the service until `cancel` fires.
///
/// Returns an error only for startup failures: a missing source root or a
/// failed initial pass.
pub async fn run(config: &Config, sink: Arc<dyn LogSink>, cancel: CancellationToken) -> Result<()> {
    let roots = Roots::resolve(&config.source, &config.replica).context("Failed to resolve paths")?;
    if !roots.source().is_dir() {
        return Err(SyncError::SourceMissing {
            path: roots.source().to_path_buf(),
        }
        .into());
    }

    let sync = Synchronizer::new(roots, sink.clone()).with_hash(config.hash);

    sink.info("Initial full synchronization...".to_string());
    run_pass(&sync).await.context("Initial synchronization failed")?;

    let mut subscription = if config.watch() {
        sink.info("Starting file system watcher for immediate updates...".to_string());
        Subscription::start(&sync, &cancel)
    } else {
        None
    };

    sink.info(format!(
        "Entering periodic sync loop every {}s. Press Ctrl+C to exit.",
        config.interval_secs
    ));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(config.interval()) => {}
        }

        if config.watch() && subscription.as_ref().map_or(true, Subscription::is_finished) {
            if let Some(stale) = subscription.take() {
                stale.shutdown().await;
            }
            sink.info("Resubscribing file system watcher...".to_string());
            subscription = Subscription::start(&sync, &cancel);
        }

        sink.info("Periodic full synchronization...".to_string());
        tokio::select! {
            // An abandoned pass finishes on its blocking thread; the next start re-syncs.
            _ = cancel.cancelled() => break,
            result = run_pass(&sync) => {
                if let Err(e) = result {
                    sink.error(format!("Periodic sync failed: {e:#}"));
                }
            }
        }
    }

    if let Some(subscription) = subscription.take() {
        subscription.shutdown().await;
    }
    sink.info("Service stopped.".to_string());
    Ok(())
}
