/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Bounded-concurrency executor for a fixed task list.
//!
//! A fixed number of logical workers pull from a shared, atomically-advanced
//! cursor. A task error does not stop the pool: the error is recorded (first
//! one wins) and the worker keeps claiming remaining tasks so that a later
//! resume has as much confirmed work as possible. Cancellation is
//! cooperative: it is checked before claiming a task and again before
//! executing a claimed one; work already in flight is never interrupted.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::error;

/// What the pool observed over one run.
#[derive(Debug)]
pub(crate) struct PoolOutcome<T, R> {
    /// Results of tasks that executed successfully, in completion order
    pub(crate) outcomes: Vec<R>,
    /// The first task error encountered, if any
    pub(crate) first_error: Option<error::Error>,
    /// Tasks that were claimed but skipped because cancellation landed
    /// between the claim and the execution
    pub(crate) skipped: Vec<T>,
    /// Whether cancellation was observed
    pub(crate) cancelled: bool,
}

struct State<T, R> {
    outcomes: Vec<R>,
    first_error: Option<error::Error>,
    skipped: Vec<T>,
    cancelled: bool,
}

impl<T, R> State<T, R> {
    fn new() -> Self {
        Self {
            outcomes: Vec::new(),
            first_error: None,
            skipped: Vec::new(),
            cancelled: false,
        }
    }
}

/// Run every task through `execute` with at most `concurrency` in flight.
pub(crate) async fn run<T, R, F>(
    tasks: Vec<T>,
    concurrency: usize,
    cancel: CancellationToken,
    execute: F,
) -> PoolOutcome<T, R>
where
    T: Clone + Send + Sync + 'static,
    R: Send + 'static,
    F: Fn(T) -> BoxFuture<'static, Result<R, error::Error>> + Send + Sync + 'static,
{
    let total = tasks.len();
    let tasks = Arc::new(tasks);
    let cursor = Arc::new(AtomicUsize::new(0));
    let state = Arc::new(Mutex::new(State::new()));
    let execute = Arc::new(execute);

    let mut workers = JoinSet::new();
    for worker in 0..concurrency.max(1) {
        workers.spawn(
            run_worker(
                tasks.clone(),
                cursor.clone(),
                state.clone(),
                cancel.clone(),
                execute.clone(),
            )
            .instrument(tracing::trace_span!("transfer-worker", worker)),
        );
    }

    while let Some(joined) = workers.join_next().await {
        if let Err(err) = joined {
            tracing::error!(error = %err, "worker task failed to join");
            let mut state = state.lock().expect("lock valid");
            if state.first_error.is_none() {
                state.first_error = Some(err.into());
            }
        }
    }

    let mut state = state.lock().expect("lock valid");
    tracing::trace!(
        total,
        completed = state.outcomes.len(),
        cancelled = state.cancelled,
        "worker pool drained"
    );

    PoolOutcome {
        outcomes: std::mem::take(&mut state.outcomes),
        first_error: state.first_error.take(),
        skipped: std::mem::take(&mut state.skipped),
        cancelled: state.cancelled,
    }
}

async fn run_worker<T, R, F>(
    tasks: Arc<Vec<T>>,
    cursor: Arc<AtomicUsize>,
    state: Arc<Mutex<State<T, R>>>,
    cancel: CancellationToken,
    execute: Arc<F>,
) where
    T: Clone + Send + Sync + 'static,
    R: Send + 'static,
    F: Fn(T) -> BoxFuture<'static, Result<R, error::Error>> + Send + Sync + 'static,
{
    loop {
        if cancel.is_cancelled() {
            state.lock().expect("lock valid").cancelled = true;
            break;
        }

        let idx = cursor.fetch_add(1, Ordering::SeqCst);
        if idx >= tasks.len() {
            break;
        }
        let task = tasks[idx].clone();

        // cancellation may land between the claim and the execution
        if cancel.is_cancelled() {
            let mut state = state.lock().expect("lock valid");
            state.cancelled = true;
            state.skipped.push(task);
            break;
        }

        let result = execute(task).await;
        let mut state = state.lock().expect("lock valid");
        match result {
            Ok(outcome) => state.outcomes.push(outcome),
            Err(err) => {
                // keep pulling remaining tasks; the orchestrator surfaces the
                // first error only after everything was attempted
                if state.first_error.is_none() {
                    state.first_error = Some(err);
                }
            }
        }
    }
}
