use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::models::Quote;

use super::repository::Repository;

/// Published by the repository after a quote row is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteChange {
    pub id: i64,
}

/// Keeps the latest copy of one quote up to date while it is displayed.
///
/// The row is re-read whenever the repository reports a write to it and on
/// every `interval` tick. Reads are idempotent so overlapping refreshes are
/// harmless. Dropping the watch stops the background task.
pub struct QuoteWatch {
    rx: watch::Receiver<Option<Quote>>,
    handle: JoinHandle<()>,
}

impl QuoteWatch {
    pub fn spawn(repo: Repository, id: i64, interval: Duration) -> Self {
        let (tx, rx) = watch::channel(None);
        let changes = repo.subscribe();
        let handle = tokio::spawn(run(repo, id, interval, tx, changes));
        Self { rx, handle }
    }

    /// Most recent copy of the quote, `None` before the first read or if the
    /// row does not exist.
    pub fn latest(&self) -> Option<Quote> {
        self.rx.borrow().clone()
    }

    /// Wait until the displayed quote differs from the last one seen.
    pub async fn changed(&mut self) -> Option<Quote> {
        self.rx.changed().await.ok()?;
        self.rx.borrow_and_update().clone()
    }

    pub fn stop(self) {
        // Drop aborts the task
    }
}

impl Drop for QuoteWatch {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run(
    repo: Repository,
    id: i64,
    interval: Duration,
    tx: watch::Sender<Option<Quote>>,
    mut changes: broadcast::Receiver<QuoteChange>,
) {
    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            change = changes.recv() => match change {
                Ok(QuoteChange { id: changed }) if changed != id => continue,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }

        match repo.get_by_id(id).await {
            Ok(quote) => {
                tx.send_if_modified(|current| {
                    if *current != quote {
                        *current = quote;
                        true
                    } else {
                        false
                    }
                });
            }
            Err(e) => warn!(id, error = %e, "Couldn't refresh watched quote"),
        }

        if tx.is_closed() {
            break;
        }
    }
    debug!(id, "Quote watch stopped");
}
