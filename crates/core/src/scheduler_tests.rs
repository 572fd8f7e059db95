use std::collections::HashSet;
use std::time::Duration;

use super::*;
use crate::errors::CoreError;
use review_warden_forge::errors::RetryHint;

fn check(repo: &str, pr_number: u64, revision: &str) -> WorkItem {
    WorkItem::Check {
        repo: repo.to_string(),
        pr_number,
        revision: revision.to_string(),
    }
}

fn sorted_keys(items: &[WorkItem]) -> Vec<WorkKey> {
    let mut keys: Vec<WorkKey> = items.iter().map(WorkItem::key).collect();
    keys.sort_by_key(|k| format!("{k:?}"));
    keys
}

#[test]
fn a_fresh_discovery_is_queued() {
    let discovered = vec![check("openjdk/jdk", 1, "rev-1")];

    let queue = reconcile_queue(discovered, &[], &HashSet::new());

    assert_eq!(queue.len(), 1);
}

#[test]
fn a_new_revision_supersedes_the_queued_one_for_the_same_key() {
    let queued = vec![check("openjdk/jdk", 1, "rev-1")];
    let discovered = vec![check("openjdk/jdk", 1, "rev-2")];

    let queue = reconcile_queue(discovered, &queued, &HashSet::new());

    assert_eq!(queue, vec![check("openjdk/jdk", 1, "rev-2")]);
}

#[test]
fn a_key_currently_running_is_not_re_enqueued() {
    let discovered = vec![check("openjdk/jdk", 1, "rev-2")];
    let mut running = HashSet::new();
    running.insert(WorkKey::PullRequest {
        repo: "openjdk/jdk".to_string(),
        number: 1,
    });

    let queue = reconcile_queue(discovered, &[], &running);

    assert!(queue.is_empty());
}

#[test]
fn distinct_keys_are_queued_independently() {
    let discovered = vec![check("openjdk/jdk", 1, "rev-1"), check("openjdk/jdk", 2, "rev-1")];

    let queue = reconcile_queue(discovered.clone(), &[], &HashSet::new());

    assert_eq!(sorted_keys(&queue), sorted_keys(&discovered));
}

#[test]
fn an_already_queued_item_not_rediscovered_is_left_alone() {
    let queued = vec![check("openjdk/jdk", 1, "rev-1")];

    let queue = reconcile_queue(Vec::new(), &queued, &HashSet::new());

    assert_eq!(queue, queued);
}

#[tokio::test]
async fn run_with_retry_returns_the_first_success() {
    let result = run_with_retry(Duration::from_secs(1), || async { Ok::<_, CoreError>(42) }).await;

    assert_eq!(result.unwrap(), 42);
}

#[tokio::test]
async fn run_with_retry_gives_up_immediately_on_a_non_retryable_error() {
    let result: Result<(), CoreError> =
        run_with_retry(Duration::from_secs(1), || async { Err(CoreError::UserInput("bad".to_string())) }).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn run_with_retry_retries_a_transient_error_then_succeeds() {
    let attempts = std::sync::atomic::AtomicU32::new(0);

    let result = run_with_retry(Duration::from_secs(5), || {
        let attempt = attempts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        async move {
            if attempt == 0 {
                Err(CoreError::Transient("flaky".to_string(), RetryHint::After(Duration::from_millis(1))))
            } else {
                Ok(attempt)
            }
        }
    })
    .await;

    assert_eq!(result.unwrap(), 1);
}

#[tokio::test]
async fn worker_pool_processes_submitted_items() {
    let (done_tx, mut done_rx) = tokio::sync::mpsc::channel(4);

    let pool = WorkerPool::spawn(2, 4, move |item| {
        let done_tx = done_tx.clone();
        async move {
            let _ = done_tx.send(item).await;
        }
    });

    pool.submit(check("openjdk/jdk", 1, "rev-1")).await.unwrap();
    let received = done_rx.recv().await.unwrap();
    assert_eq!(received, check("openjdk/jdk", 1, "rev-1"));

    pool.shutdown().await;
}
