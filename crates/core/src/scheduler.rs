//! Work-item scheduler (C8): deduplicates discovered work against what is
//! already queued or running, then drives a bounded worker pool with
//! per-item retry.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoffBuilder;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::errors::CoreError;

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;

/// The key work items serialize on: per §4's ordering guarantees, at most
/// one work item per key runs at a time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WorkKey {
    PullRequest { repo: String, number: u64 },
    Commit { repo: String, hash: String },
}

/// One unit of scheduled work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkItem {
    /// Re-evaluate a pull request at the given head revision.
    Check {
        repo: String,
        pr_number: u64,
        revision: String,
    },
    /// Dispatch a newly observed commit comment.
    CommitCommand {
        repo: String,
        commit_hash: String,
        comment_id: u64,
    },
}

impl WorkItem {
    pub fn key(&self) -> WorkKey {
        match self {
            WorkItem::Check { repo, pr_number, .. } => WorkKey::PullRequest {
                repo: repo.clone(),
                number: *pr_number,
            },
            WorkItem::CommitCommand { repo, commit_hash, .. } => WorkKey::Commit {
                repo: repo.clone(),
                hash: commit_hash.clone(),
            },
        }
    }
}

/// Merges newly discovered work with the existing queue: a fresh
/// discovery for a key already queued supersedes it (the PR moved on
/// since it was queued); a key currently running is left alone, since its
/// completion will trigger the next poll's discovery to re-evaluate it.
pub fn reconcile_queue(
    discovered: Vec<WorkItem>,
    queued: &[WorkItem],
    running_keys: &HashSet<WorkKey>,
) -> Vec<WorkItem> {
    let mut by_key: HashMap<WorkKey, WorkItem> = queued.iter().cloned().map(|item| (item.key(), item)).collect();

    for item in discovered {
        let key = item.key();
        if running_keys.contains(&key) {
            continue;
        }
        by_key.insert(key, item);
    }

    by_key.retain(|key, _| !running_keys.contains(key));
    by_key.into_values().collect()
}

/// Runs `work` with exponential backoff and jitter, retrying while the
/// error carries a [`crate::errors::RetryHint::After`] and giving up once
/// `max_elapsed` has passed.
pub async fn run_with_retry<F, Fut, T>(max_elapsed: Duration, mut work: F) -> Result<T, CoreError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, CoreError>>,
{
    let mut backoff = ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(max_elapsed))
        .build();

    loop {
        match work().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let retry_after = match err.retry_hint() {
                    crate::errors::RetryHint::After(d) => Some(d),
                    crate::errors::RetryHint::None | crate::errors::RetryHint::Exhausted => None,
                };
                let Some(hint_delay) = retry_after else {
                    return Err(err);
                };
                let Some(backoff_delay) = backoff.next_backoff() else {
                    warn!(error = %err, "work item exhausted its retry budget");
                    return Err(err);
                };
                let delay = hint_delay.max(backoff_delay);
                debug!(delay_ms = delay.as_millis() as u64, "retrying work item after transient failure");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// A bounded pool of tokio tasks draining a work queue. `capacity` tasks
/// pull from the same channel, so two items for *different* keys run
/// concurrently, but an in-flight key is claimed in a shared set: a second
/// item for that key is parked in a coalescing buffer (superseding any
/// item already parked there, the same supersede-on-requeue rule
/// [`reconcile_queue`] applies) rather than handed to another idle worker,
/// keeping per-key work strictly serial regardless of pool size.
pub struct WorkerPool {
    sender: mpsc::Sender<WorkItem>,
    join_set: JoinSet<()>,
    in_flight: Arc<std::sync::Mutex<HashSet<WorkKey>>>,
    pending: Arc<std::sync::Mutex<HashMap<WorkKey, WorkItem>>>,
}

impl WorkerPool {
    /// Spawns `capacity` worker tasks, each calling `handler` for every
    /// item it receives from the shared queue.
    pub fn spawn<H, Fut>(capacity: usize, queue_capacity: usize, handler: H) -> Self
    where
        H: Fn(WorkItem) -> Fut + Send + Sync + Clone + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel(queue_capacity);
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));
        let in_flight: Arc<std::sync::Mutex<HashSet<WorkKey>>> = Arc::new(std::sync::Mutex::new(HashSet::new()));
        let pending: Arc<std::sync::Mutex<HashMap<WorkKey, WorkItem>>> =
            Arc::new(std::sync::Mutex::new(HashMap::new()));
        let mut join_set = JoinSet::new();

        for _ in 0..capacity {
            let receiver = receiver.clone();
            let handler = handler.clone();
            let in_flight = in_flight.clone();
            let pending = pending.clone();
            join_set.spawn(async move {
                loop {
                    let mut item = {
                        let mut guard = receiver.lock().await;
                        match guard.recv().await {
                            Some(item) => item,
                            None => break,
                        }
                    };

                    loop {
                        let key = item.key();
                        {
                            let mut in_flight = in_flight.lock().unwrap();
                            if in_flight.contains(&key) {
                                pending.lock().unwrap().insert(key, item);
                                break;
                            }
                            in_flight.insert(key.clone());
                        }

                        handler(item).await;

                        let next = pending.lock().unwrap().remove(&key);
                        match next {
                            Some(next_item) => item = next_item,
                            None => {
                                in_flight.lock().unwrap().remove(&key);
                                break;
                            }
                        }
                    }
                }
            });
        }

        Self { sender, join_set, in_flight, pending }
    }

    /// Enqueues a work item, suspending the caller if the queue is full.
    pub async fn submit(&self, item: WorkItem) -> Result<(), CoreError> {
        self.sender
            .send(item)
            .await
            .map_err(|_| CoreError::Fatal("worker pool has shut down".to_string()))
    }

    /// Keys a worker currently holds the claim on, mid-handler.
    pub fn running_keys(&self) -> HashSet<WorkKey> {
        self.in_flight.lock().unwrap().clone()
    }

    /// Items parked behind an in-flight item of the same key, awaiting
    /// their turn once the running item finishes.
    pub fn queued_items(&self) -> Vec<WorkItem> {
        self.pending.lock().unwrap().values().cloned().collect()
    }

    /// Closes the queue and waits for every in-flight item to finish.
    pub async fn shutdown(mut self) {
        drop(self.sender);
        while self.join_set.join_next().await.is_some() {}
    }
}
