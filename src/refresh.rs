//! Refresh gating and background refresh
//!
//! `RefreshScheduler` decides on each render request whether the refresh
//! interval has elapsed. `RefreshHandle` drives a `MetarSearch` from a tokio
//! task for the binary's watch mode and reports finished cycles over a channel.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::mpsc;

use crate::data::{ReportSource, SearchListExtension};
use crate::extension::{CycleSummary, MetarSearch};

/// Time gate between refresh cycles
#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    interval: TimeDelta,
    last_refresh: Option<DateTime<Utc>>,
}

impl RefreshScheduler {
    /// Creates a scheduler that has never refreshed
    pub fn new(interval_minutes: u64) -> Self {
        let interval = i64::try_from(interval_minutes)
            .ok()
            .and_then(TimeDelta::try_minutes)
            .unwrap_or(TimeDelta::MAX);
        Self {
            interval,
            last_refresh: None,
        }
    }

    pub fn interval(&self) -> TimeDelta {
        self.interval
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.last_refresh
    }

    /// Returns whether a refresh is due at `now`
    ///
    /// Due when `now - interval` is strictly after the last refresh. When due,
    /// the last refresh time is set to `now` before returning, so a re-entrant
    /// call during a slow cycle does not start another one.
    pub fn should_refresh(&mut self, now: DateTime<Utc>) -> bool {
        let due = match self.last_refresh {
            None => true,
            Some(last) => now
                .checked_sub_signed(self.interval)
                .is_some_and(|threshold| threshold > last),
        };
        if due {
            self.last_refresh = Some(now);
        }
        due
    }
}

/// Messages sent from the background refresh task
#[derive(Debug, Clone)]
pub enum RefreshMessage {
    /// A refresh cycle completed
    Refreshed {
        summary: CycleSummary,
        tags: SearchListExtension,
    },
}

/// Configuration for the background refresh task
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// How often the task offers a render pass to the scheduler
    pub tick: Duration,
    /// Whether the task runs at all
    pub enabled: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(60),
            enabled: true,
        }
    }
}

/// Handle for controlling the background refresh task
pub struct RefreshHandle {
    /// Channel for receiving refresh messages
    pub receiver: mpsc::Receiver<RefreshMessage>,
    /// Flag to signal shutdown
    shutdown_tx: mpsc::Sender<()>,
}

impl RefreshHandle {
    /// Spawns a task that offers `search` a render pass on every tick
    ///
    /// The first tick fires immediately, so the first cycle runs right away.
    /// Cycles the scheduler skips produce no message.
    pub fn spawn<S>(mut search: MetarSearch<S>, config: RefreshConfig) -> Self
    where
        S: ReportSource + Send + Sync + 'static,
    {
        let (msg_tx, msg_rx) = mpsc::channel(32);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        if config.enabled {
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(config.tick);

                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            if let Some(summary) = search.refresh_if_due(Utc::now()).await {
                                let message = RefreshMessage::Refreshed {
                                    summary,
                                    tags: search.tags().clone(),
                                };
                                if msg_tx.send(message).await.is_err() {
                                    break;
                                }
                            }
                        }
                        _ = shutdown_rx.recv() => {
                            break;
                        }
                    }
                }
            });
        }

        Self {
            receiver: msg_rx,
            shutdown_tx,
        }
    }

    /// Waits for the next refresh message
    pub async fn recv(&mut self) -> Option<RefreshMessage> {
        self.receiver.recv().await
    }

    /// Shuts down the background refresh task
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}
