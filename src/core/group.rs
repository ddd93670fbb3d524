use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::core::cancel::CancellationController;
use crate::core::models::StageResult;

pub struct GroupTask {
    pub name: String,
    pub fut: BoxFuture<'static, StageResult>,
}

impl GroupTask {
    pub fn new(name: impl Into<String>, fut: BoxFuture<'static, StageResult>) -> Self {
        Self { name: name.into(), fut }
    }
}

#[derive(Debug)]
pub struct GroupOutcome {
    pub results: HashMap<String, StageResult>,
    /// Max of member elapsed times, not the sum; the members ran
    /// concurrently.
    pub elapsed: Duration,
}

/// Bounded worker pool over independently-schedulable stage invocations.
/// Each finished task immediately backfills with the next queued one. Every
/// task is isolated: a panic or error inside one is recorded as that task's
/// failed result and never cancels siblings or the caller. Queued tasks are
/// not started once cancellation is observed, and the call does not return
/// until every submitted task has reached a terminal state.
pub async fn run_group(
    tasks: Vec<GroupTask>,
    max_concurrency: usize,
    cancel: &CancellationController,
) -> GroupOutcome {
    let sem = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut set = JoinSet::new();

    for task in tasks {
        let sem = Arc::clone(&sem);
        let cancel = cancel.clone();
        let GroupTask { name, fut } = task;
        set.spawn(async move {
            let _permit = sem.acquire_owned().await;
            if cancel.is_stopped() {
                tracing::warn!("[{}] not started - scan stopped", name);
                return (name.clone(), StageResult::cancelled(&name));
            }
            let start = Instant::now();
            let mut result = match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(result) => result,
                Err(panic) => StageResult::failed(&name, panic_message(panic)),
            };
            result.elapsed = start.elapsed();
            (name, result)
        });
    }

    let mut results = HashMap::new();
    let mut elapsed = Duration::ZERO;
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((name, result)) => {
                elapsed = elapsed.max(result.elapsed);
                results.insert(name, result);
            }
            Err(err) => {
                // Task body already shields panics; this is a runtime-level
                // failure (e.g. forced shutdown).
                tracing::error!("group task join failed: {}", err);
            }
        }
    }

    GroupOutcome { results, elapsed }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        format!("task panicked: {}", msg)
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        format!("task panicked: {}", msg)
    } else {
        "task panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::StageStatus;
    use tempfile::tempdir;
    use tokio::time::sleep;

    fn ok_after(name: &'static str, delay: Duration) -> GroupTask {
        GroupTask::new(
            name,
            Box::pin(async move {
                sleep(delay).await;
                StageResult::completed(name, std::path::PathBuf::from(name))
            }),
        )
    }

    #[tokio::test]
    async fn one_failing_task_does_not_poison_the_group() {
        let dir = tempdir().unwrap();
        let cancel = CancellationController::new(dir.path());
        let tasks = vec![
            ok_after("one", Duration::from_millis(10)),
            GroupTask::new("two", Box::pin(async { panic!("boom") })),
            ok_after("three", Duration::from_millis(10)),
        ];

        let outcome = run_group(tasks, 4, &cancel).await;
        assert_eq!(outcome.results.len(), 3);
        assert_eq!(outcome.results["one"].status, StageStatus::Completed);
        assert_eq!(outcome.results["two"].status, StageStatus::Failed);
        assert!(outcome.results["two"].detail.as_deref().unwrap().contains("boom"));
        assert_eq!(outcome.results["three"].status, StageStatus::Completed);
    }

    #[tokio::test]
    async fn group_elapsed_is_max_of_members_not_sum() {
        let dir = tempdir().unwrap();
        let cancel = CancellationController::new(dir.path());
        let tasks = vec![
            ok_after("a", Duration::from_millis(40)),
            ok_after("b", Duration::from_millis(120)),
            ok_after("c", Duration::from_millis(20)),
        ];

        let start = Instant::now();
        let outcome = run_group(tasks, 8, &cancel).await;
        let wall = start.elapsed();

        assert!(outcome.elapsed >= Duration::from_millis(120));
        // well under the 180ms a sequential run would need
        assert!(outcome.elapsed < Duration::from_millis(170));
        assert!(wall < Duration::from_millis(170));
    }

    #[tokio::test]
    async fn cancellation_prevents_queued_tasks_from_starting() {
        let dir = tempdir().unwrap();
        let cancel = CancellationController::new(dir.path());
        let cancel_inner = cancel.clone();
        let tasks = vec![
            GroupTask::new(
                "first",
                Box::pin(async move {
                    cancel_inner.request_stop();
                    sleep(Duration::from_millis(20)).await;
                    StageResult::completed("first", std::path::PathBuf::from("first"))
                }),
            ),
            ok_after("queued", Duration::from_millis(5)),
        ];

        // concurrency 1 forces "queued" to wait behind "first"
        let outcome = run_group(tasks, 1, &cancel).await;
        assert_eq!(outcome.results["first"].status, StageStatus::Completed);
        assert_eq!(outcome.results["queued"].status, StageStatus::Cancelled);
    }
}
