//! Debounced, non-overlapping rescans driven by filesystem events.

use crate::error::{Result, VigilError};
use ignore::overrides::{Override, OverrideBuilder};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use vigil_api::{GlobPatternSource, RescanHandler};

use crate::config::DEFAULT_DEBOUNCE;

struct FsWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
}

impl FsWatcher {
    fn new(root: &Path) -> notify::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;
        watcher.watch(root, RecursiveMode::Recursive)?;
        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    async fn next_event_async(&mut self) -> Option<notify::Result<Event>> {
        self.rx.recv().await
    }
}

/// Listener for one glob pattern, relative to the workspace root.
struct Subscription {
    pattern: String,
    matcher: Override,
}

impl Subscription {
    fn new(root: &Path, pattern: &str) -> Result<Self> {
        let invalid = |e: ignore::Error| VigilError::Internal(format!("invalid glob {pattern}: {e}"));
        let mut builder = OverrideBuilder::new(root);
        builder.add(pattern).map_err(invalid)?;
        let matcher = builder.build().map_err(invalid)?;
        Ok(Self {
            pattern: pattern.to_string(),
            matcher,
        })
    }

    fn matches(&self, path: &Path) -> bool {
        self.matcher.matched(path, false).is_whitelist()
    }
}

#[derive(Default)]
struct WatchState {
    subscriptions: Vec<Subscription>,
    cancel: Option<CancellationToken>,
}

struct Inner {
    root: PathBuf,
    patterns: Vec<String>,
    window: Mutex<Duration>,
    handler: Arc<dyn RescanHandler>,
    /// Set from the first matched event until the resulting rescan returns.
    scheduled: AtomicBool,
    watch: Mutex<WatchState>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, WatchState> {
        self.watch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn window(&self) -> Duration {
        *self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn on_file_event(self: &Arc<Self>, path: &Path) -> bool {
        let matched = self
            .state()
            .subscriptions
            .iter()
            .find(|s| s.matches(path))
            .map(|s| s.pattern.clone());

        let Some(pattern) = matched else {
            return false;
        };
        debug!("file event: {} (matched {})", path.display(), pattern);
        self.schedule();
        true
    }

    fn schedule(self: &Arc<Self>) {
        if self
            .scheduled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            // Already covered by the pending run.
            return;
        }

        let inner = Arc::clone(self);
        let window = self.window();
        tokio::spawn(async move {
            tokio::time::sleep(window).await;

            let handler = Arc::clone(&inner.handler);
            match tokio::spawn(async move { handler.rescan().await }).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => error!("rescan failed: {}", err),
                Err(err) => error!("rescan task aborted: {}", err),
            }

            // Only now may the next window be armed.
            inner.scheduled.store(false, Ordering::Release);
        });
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(cancel) = self.state().cancel.take() {
            cancel.cancel();
        }
    }
}

/// Coalesces bursts of file changes matching a set of glob patterns into
/// single calls of a [`RescanHandler`].
///
/// The first matching event arms a timer for the debounce window; events that
/// arrive while a run is pending or in flight are dropped. The flag is cleared
/// only after the handler returns, so two runs never overlap.
pub struct ScanScheduler {
    inner: Arc<Inner>,
}

impl ScanScheduler {
    pub fn new(
        root: impl Into<PathBuf>,
        patterns: Vec<String>,
        handler: Arc<dyn RescanHandler>,
    ) -> Self {
        let root = root.into();
        let root = std::fs::canonicalize(&root).unwrap_or(root);
        Self {
            inner: Arc::new(Inner {
                root,
                patterns,
                window: Mutex::new(DEFAULT_DEBOUNCE),
                handler,
                scheduled: AtomicBool::new(false),
                watch: Mutex::new(WatchState::default()),
            }),
        }
    }

    pub fn from_source(
        root: impl Into<PathBuf>,
        source: &dyn GlobPatternSource,
        handler: Arc<dyn RescanHandler>,
    ) -> Self {
        Self::new(root, source.glob_patterns(), handler)
    }

    pub fn with_window(self, window: Duration) -> Self {
        self.set_window(window);
        self
    }

    /// Replace the debounce window. Applies from the next armed run; a run
    /// already waiting keeps the window it was armed with.
    pub fn set_window(&self, window: Duration) {
        *self.inner.window.lock().unwrap_or_else(PoisonError::into_inner) = window;
    }

    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    pub fn patterns(&self) -> &[String] {
        &self.inner.patterns
    }

    pub fn window(&self) -> Duration {
        self.inner.window()
    }

    pub fn is_watching(&self) -> bool {
        !self.inner.state().subscriptions.is_empty()
    }

    pub fn is_scheduled(&self) -> bool {
        self.inner.scheduled.load(Ordering::Acquire)
    }

    /// Subscribe to create/modify/delete events for every pattern.
    /// Does nothing when already watching. Must be called within a tokio
    /// runtime.
    pub fn start(&self) -> Result<()> {
        let mut state = self.inner.state();
        if !state.subscriptions.is_empty() {
            return Ok(());
        }

        let subscriptions = self
            .inner
            .patterns
            .iter()
            .map(|pattern| {
                info!("listening for file events: {}", pattern);
                Subscription::new(&self.inner.root, pattern)
            })
            .collect::<Result<Vec<_>>>()?;
        if subscriptions.is_empty() {
            warn!("no file patterns to watch");
            return Ok(());
        }

        let mut watcher = FsWatcher::new(&self.inner.root)?;
        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();
        let inner_weak = Arc::downgrade(&self.inner);
        let root = self.inner.root.clone();

        tokio::spawn(async move {
            info!("Started watching {}", root.display());
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        break;
                    }
                    event = watcher.next_event_async() => {
                        let event = match event {
                            Some(Ok(event)) => event,
                            Some(Err(err)) => {
                                warn!("file watcher error: {}", err);
                                continue;
                            }
                            None => break,
                        };
                        if !is_content_change(&event.kind) {
                            continue;
                        }
                        let Some(inner) = inner_weak.upgrade() else {
                            break;
                        };
                        for path in &event.paths {
                            if inner.on_file_event(path) {
                                break;
                            }
                        }
                    }
                }
            }
            info!("File watcher task ended for {}", root.display());
        });

        state.subscriptions = subscriptions;
        state.cancel = Some(cancel_token);
        Ok(())
    }

    /// Drop every subscription. Safe to call when not watching.
    pub fn stop(&self) {
        let mut state = self.inner.state();
        if let Some(cancel) = state.cancel.take() {
            info!("stop listening");
            cancel.cancel();
        }
        state.subscriptions.clear();
    }

    /// Feed one changed path through the subscriptions, as the watcher does.
    /// Returns whether any pattern matched.
    pub fn handle_file_event(&self, path: &Path) -> bool {
        self.inner.on_file_event(path)
    }
}

fn is_content_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}
