//! The event loop.
//!
//! Inbound events are read one JSON object per line. Each user gets a worker
//! task fed through its own channel, so a user's events are handled in order
//! while different users proceed concurrently. Idle workers retire and are
//! pruned from the routing table.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tb_core::UserId;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;

use crate::controller::Controller;
use crate::error::BotError;
use crate::messenger::{InboundEvent, Messenger};

/// Workers idle this long retire; the next event for the user spawns a new one.
const WORKER_IDLE: Duration = Duration::from_secs(300);

struct Worker {
    tx: mpsc::UnboundedSender<InboundEvent>,
    /// Resolves once the worker task has finished, successfully or not.
    finished: oneshot::Receiver<()>,
}

impl Worker {
    fn is_finished(&mut self) -> bool {
        matches!(self.finished.try_recv(), Err(oneshot::error::TryRecvError::Closed))
    }
}

type Workers = HashMap<UserId, Worker>;

/// Returns false once the worker must stop.
async fn handle<M: Messenger>(
    controller: &Controller<M>,
    fatal: &mpsc::UnboundedSender<BotError>,
    user: UserId,
    event: InboundEvent,
) -> bool {
    let Err(err) = controller.handle(event).await else {
        return true;
    };
    if fatal.send(err).is_err() {
        tracing::debug!(%user, "runner already stopped");
    }
    false
}

fn spawn_worker<M: Messenger>(
    controller: &Arc<Controller<M>>,
    fatal: &mpsc::UnboundedSender<BotError>,
    tasks: &mut JoinSet<()>,
    user: UserId,
    previous: Option<oneshot::Receiver<()>>,
) -> Worker {
    let (tx, mut rx) = mpsc::unbounded_channel::<InboundEvent>();
    let (done, finished) = oneshot::channel::<()>();
    let controller = Arc::clone(controller);
    let fatal = fatal.clone();
    tasks.spawn(async move {
        // A retiring predecessor may still be draining this user's events.
        if let Some(previous) = previous {
            let _ = previous.await;
        }
        loop {
            match tokio::time::timeout(WORKER_IDLE, rx.recv()).await {
                Ok(Some(event)) => {
                    if !handle(&controller, &fatal, user, event).await {
                        break;
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    tracing::debug!(%user, "worker idle, retiring");
                    rx.close();
                    while let Some(event) = rx.recv().await {
                        if !handle(&controller, &fatal, user, event).await {
                            break;
                        }
                    }
                    break;
                }
            }
        }
        tracing::debug!(%user, "worker finished");
        drop(done);
    });
    Worker { tx, finished }
}

fn route<M: Messenger>(
    controller: &Arc<Controller<M>>,
    fatal: &mpsc::UnboundedSender<BotError>,
    tasks: &mut JoinSet<()>,
    workers: &mut Workers,
    event: InboundEvent,
) {
    let user = event.sender.id;
    let event = match workers.get(&user) {
        Some(worker) => match worker.tx.send(event) {
            Ok(()) => return,
            // Retired or stopped after a fatal error.
            Err(mpsc::error::SendError(event)) => event,
        },
        None => {
            workers.retain(|_, worker| !worker.is_finished());
            while let Some(joined) = tasks.try_join_next() {
                if let Err(err) = joined {
                    tracing::warn!(error = %err, "worker task failed");
                }
            }
            event
        }
    };
    let previous = workers.remove(&user).map(|worker| worker.finished);
    let worker = spawn_worker(controller, fatal, tasks, user, previous);
    if let Err(mpsc::error::SendError(event)) = worker.tx.send(event) {
        tracing::debug!(%user, ?event, "dropping event for stopped worker");
    }
    workers.insert(user, worker);
}

/// Runs until end of input, Ctrl-C, or a fatal error.
///
/// Lines that are not valid events are logged and skipped. At end of input
/// every queued event is still handled before returning.
pub async fn run<M, R>(controller: Arc<Controller<M>>, input: R) -> Result<()>
where
    M: Messenger,
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let (fatal_tx, mut fatal_rx) = mpsc::unbounded_channel::<BotError>();
    let mut workers = Workers::new();
    let mut tasks = JoinSet::new();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read input")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<InboundEvent>(&line) {
                    Ok(event) => route(&controller, &fatal_tx, &mut tasks, &mut workers, event),
                    Err(err) => tracing::warn!(error = %err, "skipping malformed event"),
                }
            }
            Some(err) = fatal_rx.recv() => {
                return Err(err).context("fatal error while handling an event");
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, shutting down");
                return Ok(());
            }
        }
    }

    tracing::debug!(workers = workers.len(), "end of input, draining workers");
    drop(workers);
    drop(fatal_tx);
    while let Some(joined) = tasks.join_next().await {
        if let Err(err) = joined {
            tracing::warn!(error = %err, "worker task failed");
        }
    }
    if let Ok(err) = fatal_rx.try_recv() {
        return Err(err).context("fatal error while handling an event");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::{TimeZone, Utc};
    use tb_core::ManualClock;
    use tb_db::Database;

    use super::*;
    use crate::console::ConsoleMessenger;
    use crate::controller::Settings;

    type TestController = Controller<ConsoleMessenger<Vec<u8>>>;

    fn controller() -> Arc<TestController> {
        let db = Database::open_in_memory().unwrap();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap());
        Arc::new(Controller::new(
            Arc::new(ConsoleMessenger::new(Vec::new())),
            Arc::new(Mutex::new(db)),
            Arc::new(clock),
            Settings::default(),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn idle_workers_retire_and_are_pruned() {
        let controller = controller();
        let (fatal_tx, _fatal_rx) = mpsc::unbounded_channel();
        let mut tasks = JoinSet::new();
        let mut workers = Workers::new();
        let ann = UserId::new(2);
        let bob = UserId::new(3);

        route(&controller, &fatal_tx, &mut tasks, &mut workers, InboundEvent::text(ann, "hello"));
        assert_eq!(tasks.len(), 1);

        tokio::time::sleep(WORKER_IDLE * 2).await;
        tasks.join_next().await.unwrap().unwrap();
        assert!(workers[&ann].tx.is_closed());

        route(&controller, &fatal_tx, &mut tasks, &mut workers, InboundEvent::text(bob, "hello"));
        assert_eq!(workers.len(), 1);
        assert!(workers.contains_key(&bob));

        route(&controller, &fatal_tx, &mut tasks, &mut workers, InboundEvent::text(ann, "again"));
        assert_eq!(workers.len(), 2);
        assert_eq!(tasks.len(), 2);

        drop(workers);
        while let Some(joined) = tasks.join_next().await {
            joined.unwrap();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retired_worker_hands_off_to_its_successor() {
        let controller = controller();
        let (fatal_tx, _fatal_rx) = mpsc::unbounded_channel();
        let mut tasks = JoinSet::new();
        let mut workers = Workers::new();
        let ann = UserId::new(2);

        route(&controller, &fatal_tx, &mut tasks, &mut workers, InboundEvent::text(ann, "hello"));
        tokio::time::sleep(WORKER_IDLE * 2).await;

        // The entry is still routed, so the successor waits on the old worker.
        route(&controller, &fatal_tx, &mut tasks, &mut workers, InboundEvent::text(ann, "again"));
        assert_eq!(workers.len(), 1);
        assert!(!workers[&ann].tx.is_closed());

        drop(workers);
        while let Some(joined) = tasks.join_next().await {
            joined.unwrap();
        }
    }
}
