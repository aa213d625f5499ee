//! Change filtering and debounced resync triggering.
//!
//! Qualifying changes restart a single timer. When a burst settles and the
//! timer runs out, one unit trigger is sent; whoever owns the receiving end
//! runs the synchronization pass (trailing edge).

use crate::vault::EntryKind;
use crate::watcher::VaultChange;
use crate::SyncConfig;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Quiet period before a burst of changes triggers a pass.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(2000);

/// Decides which changes warrant a pass and coalesces them into one trigger.
pub struct ChangeGate {
    delay: Duration,
    trigger: mpsc::Sender<()>,
    pending: Option<JoinHandle<()>>,
}

impl ChangeGate {
    /// Create a gate that sends triggers on `trigger`.
    pub fn new(delay: Duration, trigger: mpsc::Sender<()>) -> Self {
        Self {
            delay,
            trigger,
            pending: None,
        }
    }

    /// Create a gate together with the receiving end of its trigger channel.
    ///
    /// The channel holds a single trigger, so a trigger fired while one is
    /// still queued is absorbed by it.
    pub fn channel(delay: Duration) -> (Self, mpsc::Receiver<()>) {
        let (tx, rx) = mpsc::channel(1);
        (Self::new(delay, tx), rx)
    }

    /// Whether `change` should lead to a pass at all.
    pub fn accepts(change: &VaultChange, config: &SyncConfig) -> bool {
        if !config.auto_sync {
            return false;
        }

        if config.mentions_container(&change.path) {
            trace!(path = %change.path, "Ignoring change inside index container");
            return false;
        }

        if change.entry == EntryKind::File && !change.is_markdown() {
            trace!(path = %change.path, "Ignoring non-markdown change");
            return false;
        }

        true
    }

    /// Filter `change` and (re)start the timer if it qualifies.
    ///
    /// Returns whether a pass is now scheduled because of it. Must be called
    /// from within a tokio runtime.
    pub fn on_change(&mut self, change: &VaultChange, config: &SyncConfig) -> bool {
        if !Self::accepts(change, config) {
            return false;
        }

        debug!(path = %change.path, kind = ?change.kind, "Scheduling synchronization");
        self.schedule();
        true
    }

    /// Restart the timer, dropping any pending one.
    pub fn schedule(&mut self) {
        self.cancel();

        let delay = self.delay;
        let trigger = self.trigger.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Full means a trigger is already queued
            let _ = trigger.try_send(());
        }));
    }

    /// Drop the pending timer, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Whether a timer is running.
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Current quiet period.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Change the quiet period for future timers.
    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }
}

impl Drop for ChangeGate {
    fn drop(&mut self) {
        self.cancel();
    }
}
