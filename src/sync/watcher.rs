//! File system watcher for real-time sync.
//!
//! Provides cross-platform file watching using notify crate, translated into
//! [`ChangeEvent`]s.

use async_trait::async_trait;
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::{Result, SyncError};
use crate::fs::LocalFs;
use crate::sync::events::ChangeEvent;

/// How long a `From` half waits for its `To` before it counts as a move out
/// of the watched tree.
const RENAME_PAIR_WINDOW: Duration = Duration::from_millis(250);

/// A lazy, unbounded stream of change events.
///
/// Once `next_event` returns `None` the source is exhausted and cannot be
/// restarted; subscribe again instead.
#[async_trait]
pub trait ChangeSource: Send {
    /// Wait for the next event. `Some(Err(_))` reports a subscription failure.
    async fn next_event(&mut self) -> Option<Result<ChangeEvent>>;

    /// Stop delivery and release the subscription.
    fn stop(&mut self);
}

/// Turns raw notify events into change events.
///
/// A rename reported as separate `From`/`To` halves is paired up here; a
/// `From` with no matching `To` means the entry left the watched tree.
#[derive(Debug, Default)]
pub struct EventTranslator {
    pending_from: Option<PathBuf>,
    last_rename: Option<(PathBuf, PathBuf)>,
}

impl EventTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate one notify event into zero or more change events.
    pub fn translate(&mut self, event: Event) -> Vec<ChangeEvent> {
        let mut out = Vec::new();
        let mut paths = event.paths.into_iter();

        match event.kind {
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                self.flush_pending(&mut out);
                self.pending_from = paths.next();
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                if let Some(to) = paths.next() {
                    match self.pending_from.take() {
                        Some(from) => self.push_rename(from, to, &mut out),
                        None => out.push(ChangeEvent::Created(to)),
                    }
                }
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                if let (Some(from), Some(to)) = (paths.next(), paths.next()) {
                    if self.pending_from.as_ref() == Some(&from) {
                        self.pending_from = None;
                    }
                    self.flush_pending(&mut out);
                    self.push_rename(from, to, &mut out);
                }
            }
            EventKind::Modify(ModifyKind::Name(_)) => {
                self.flush_pending(&mut out);
                for path in paths {
                    if LocalFs::kind(&path).is_missing() {
                        out.push(ChangeEvent::Deleted(path));
                    } else {
                        out.push(ChangeEvent::Created(path));
                    }
                }
            }
            EventKind::Create(_) => {
                self.flush_pending(&mut out);
                out.extend(paths.map(ChangeEvent::Created));
            }
            EventKind::Modify(_) => {
                self.flush_pending(&mut out);
                out.extend(paths.map(ChangeEvent::Changed));
            }
            EventKind::Remove(_) => {
                self.flush_pending(&mut out);
                out.extend(paths.map(ChangeEvent::Deleted));
            }
            EventKind::Access(_) | EventKind::Any | EventKind::Other => {}
        }

        out
    }

    /// Whether a `From` half is waiting for its `To`.
    pub fn has_pending(&self) -> bool {
        self.pending_from.is_some()
    }

    /// Emit a held `From` half as a deletion.
    pub fn flush_pending(&mut self, out: &mut Vec<ChangeEvent>) {
        if let Some(from) = self.pending_from.take() {
            out.push(ChangeEvent::Deleted(from));
        }
    }

    fn push_rename(&mut self, from: PathBuf, to: PathBuf, out: &mut Vec<ChangeEvent>) {
        // inotify reports one move as both a paired To and a Both event.
        let pair = (from, to);
        if self.last_rename.as_ref() == Some(&pair) {
            self.last_rename = None;
            return;
        }
        self.last_rename = Some(pair.clone());
        out.push(ChangeEvent::Renamed {
            from: pair.0,
            to: pair.1,
        });
    }
}

/// Message forwarded from the notify callback thread.
type WatchMessage = std::result::Result<Event, notify::Error>;

/// Recursive watcher over the source tree.
pub struct FsWatcher {
    watcher: Option<RecommendedWatcher>,
    receiver: mpsc::UnboundedReceiver<WatchMessage>,
    translator: EventTranslator,
    ready: std::collections::VecDeque<ChangeEvent>,
    root: PathBuf,
}

impl FsWatcher {
    /// Subscribe to changes anywhere under `root`.
    pub fn start(root: &Path) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: WatchMessage| {
                let _ = tx.send(res);
            },
            Config::default().with_poll_interval(Duration::from_secs(1)),
        )?;

        watcher.watch(root, RecursiveMode::Recursive)?;

        Ok(Self {
            watcher: Some(watcher),
            receiver: rx,
            translator: EventTranslator::new(),
            ready: std::collections::VecDeque::new(),
            root: root.to_path_buf(),
        })
    }

    /// The watched directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_active(&self) -> bool {
        self.watcher.is_some()
    }
}

#[async_trait]
impl ChangeSource for FsWatcher {
    async fn next_event(&mut self) -> Option<Result<ChangeEvent>> {
        loop {
            if let Some(event) = self.ready.pop_front() {
                return Some(Ok(event));
            }
            if self.watcher.is_none() {
                return None;
            }

            let message = if self.translator.has_pending() {
                match tokio::time::timeout(RENAME_PAIR_WINDOW, self.receiver.recv()).await {
                    Ok(message) => message,
                    Err(_) => {
                        let mut out = Vec::new();
                        self.translator.flush_pending(&mut out);
                        self.ready.extend(out);
                        continue;
                    }
                }
            } else {
                self.receiver.recv().await
            };

            match message? {
                Ok(event) => self.ready.extend(self.translator.translate(event)),
                Err(e) => return Some(Err(SyncError::Watch(e))),
            }
        }
    }

    fn stop(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            let _ = watcher.unwatch(&self.root);
        }
        self.receiver.close();
        self.ready.clear();
    }
}

impl Drop for FsWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
