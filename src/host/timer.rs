//! Recognizer restart timer.
//!
//! Posts `HostEvent::RestartDue` back into the session channel after a delay.
//! Holds only a weak sender, so an idle timer never keeps the channel open.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::session::HostEvent;

/// At most one pending restart at a time.
pub struct RestartTimer {
    event_tx: mpsc::WeakSender<HostEvent>, // Session channel (weak)
    pending: Option<CancellationToken>,    // Token of the armed timer
}

impl RestartTimer {
    pub fn new(event_tx: mpsc::WeakSender<HostEvent>) -> Self {
        Self { event_tx, pending: None }
    }

    /// Arm the timer, replacing any armed one.
    pub fn schedule(&mut self, delay: Duration) {
        self.cancel();

        let Some(event_tx) = self.event_tx.upgrade() else {
            debug!("Session channel closed, restart not scheduled");
            return;
        };

        let token = CancellationToken::new();
        let cancelled = token.clone();
        self.pending = Some(token);

        debug!("Restart scheduled in {}ms", delay.as_millis());
        tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => debug!("Restart timer cancelled"),
                _ = tokio::time::sleep(delay) => {
                    if event_tx.send(HostEvent::RestartDue).await.is_err() {
                        debug!("Session channel closed before restart");
                    }
                }
            }
        });
    }

    /// Disarm the timer. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut timer = RestartTimer::new(tx.downgrade());
        timer.schedule(Duration::from_millis(1000));
        drop(tx);

        assert_eq!(rx.recv().await, Some(HostEvent::RestartDue));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_restart() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut timer = RestartTimer::new(tx.downgrade());
        timer.schedule(Duration::from_millis(1000));
        timer.cancel();
        timer.cancel();
        drop(tx);

        assert_eq!(rx.recv().await, None);
    }
}
