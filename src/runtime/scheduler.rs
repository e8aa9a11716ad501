//! Batch scheduler
//!
//! Drives the parallel batch through a bounded pool of worker tasks, then
//! the serial batch one command at a time. The coordinating task is the only
//! writer of scheduler state; workers hand results back through the
//! [`JoinSet`].
//!
//! ```text
//! Idle -> RunningParallel -> RunningSerial -> Finalizing -> Done
//!              \                   \
//!               +-------> Halted <--+        (halt-on-error)
//! ```
//!
//! Interruption skips straight to `Finalizing` and is reported through
//! [`ScheduleOutcome::interrupted`].

use crate::core::config::RunConfig;
use crate::core::types::{Command, ExecutionResult};
use crate::runtime::executor::Executor;
use crate::runtime::partition::Batches;
use crate::runtime::progress::{BatchKind, ProgressReporter};
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Lifecycle of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    RunningParallel,
    RunningSerial,
    Finalizing,
    Halted,
    Done,
}

/// Everything the scheduler collected, in the order it was observed
#[derive(Debug, Clone, Default)]
pub struct ScheduleOutcome {
    pub results: Vec<ExecutionResult>,
    pub halted: bool,
    pub interrupted: bool,
}

pub struct Scheduler<'r, W: Write, E: Write> {
    executor: Arc<Executor>,
    jobs: usize,
    halt_on_error: bool,
    keep_order: bool,
    cancel: CancellationToken,
    reporter: &'r mut ProgressReporter<W, E>,
    state: SchedulerState,
    results: Vec<ExecutionResult>,
    halted: bool,
    interrupted: bool,
}

impl<'r, W: Write, E: Write> Scheduler<'r, W, E> {
    pub fn new(
        executor: Executor,
        config: &RunConfig,
        reporter: &'r mut ProgressReporter<W, E>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            executor: Arc::new(executor),
            jobs: config.jobs.max(1),
            halt_on_error: config.halt_on_error,
            keep_order: config.keep_order,
            cancel,
            reporter,
            state: SchedulerState::Idle,
            results: Vec::new(),
            halted: false,
            interrupted: false,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Execute both batches and hand back what was collected
    pub async fn run(&mut self, batches: Batches<'_>) -> ScheduleOutcome {
        if !batches.parallel.is_empty() {
            if batches.is_mixed() {
                self.reporter
                    .batch_header(BatchKind::Parallel, batches.parallel.len());
            }
            self.run_parallel(batches.parallel).await;
        }

        if !batches.serial.is_empty() && self.can_dispatch() {
            if batches.is_mixed() {
                self.reporter
                    .batch_header(BatchKind::Serial, batches.serial.len());
            }
            self.run_serial(batches.serial).await;
        }

        self.transition(SchedulerState::Finalizing);
        let outcome = ScheduleOutcome {
            results: std::mem::take(&mut self.results),
            halted: self.halted,
            interrupted: self.interrupted,
        };
        self.transition(if self.halted {
            SchedulerState::Halted
        } else {
            SchedulerState::Done
        });
        outcome
    }

    async fn run_parallel(&mut self, batch: &[Command]) {
        self.transition(SchedulerState::RunningParallel);

        let mut queue = batch.iter().cloned().enumerate();
        let mut workers: JoinSet<(usize, ExecutionResult)> = JoinSet::new();
        let mut release = OrderedRelease::new(self.keep_order);

        loop {
            while self.can_dispatch() && workers.len() < self.jobs {
                let Some((position, command)) = queue.next() else {
                    break;
                };
                let executor = Arc::clone(&self.executor);
                debug!("Dispatching command #{}", command.number());
                workers.spawn(async move {
                    let result = executor.execute(&command).await;
                    (position, result)
                });
            }

            if workers.is_empty() {
                break;
            }

            let joined = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    self.interrupt();
                    workers.abort_all();
                    // Reap aborted workers so their children are killed
                    // before the caller removes the working directory.
                    while workers.join_next().await.is_some() {}
                    break;
                }
                joined = workers.join_next() => joined,
            };

            match joined {
                Some(Ok((position, result))) => {
                    let failed = !result.succeeded();
                    for ready in release.push(position, result) {
                        self.record(ready);
                    }
                    if failed && self.halt_on_error && !self.halted {
                        self.halt();
                    }
                }
                Some(Err(err)) => error!("Worker task failed: {}", err),
                None => break,
            }
        }

        for ready in release.drain() {
            self.record(ready);
        }
    }

    async fn run_serial(&mut self, batch: &[Command]) {
        self.transition(SchedulerState::RunningSerial);

        for command in batch {
            if !self.can_dispatch() {
                break;
            }
            debug!("Running serial command #{}", command.number());
            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    self.interrupt();
                    break;
                }
                result = self.executor.execute(command) => result,
            };

            let failed = !result.succeeded();
            self.record(result);
            if failed && self.halt_on_error {
                self.halt();
                break;
            }
        }
    }

    /// Whether new work may start; observes a pending cancellation
    fn can_dispatch(&mut self) -> bool {
        if self.cancel.is_cancelled() {
            self.interrupt();
        }
        !self.halted && !self.interrupted
    }

    fn record(&mut self, result: ExecutionResult) {
        self.reporter.report(&result);
        self.results.push(result);
    }

    fn halt(&mut self) {
        info!("Halting execution after a failed command");
        self.reporter.halting();
        self.halted = true;
        self.transition(SchedulerState::Halted);
    }

    fn interrupt(&mut self) {
        if self.interrupted {
            return;
        }
        info!("Run interrupted, no further commands will be started");
        self.reporter.interrupted();
        self.interrupted = true;
    }

    fn transition(&mut self, next: SchedulerState) {
        debug!("Scheduler state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// Holds back out-of-order results when keep-order is requested
///
/// Positions are submission positions within the parallel batch.
struct OrderedRelease {
    keep_order: bool,
    next: usize,
    held: BTreeMap<usize, ExecutionResult>,
}

impl OrderedRelease {
    fn new(keep_order: bool) -> Self {
        Self {
            keep_order,
            next: 0,
            held: BTreeMap::new(),
        }
    }

    fn push(&mut self, position: usize, result: ExecutionResult) -> Vec<ExecutionResult> {
        if !self.keep_order {
            return vec![result];
        }
        self.held.insert(position, result);

        let mut ready = Vec::new();
        while let Some(result) = self.held.remove(&self.next) {
            ready.push(result);
            self.next += 1;
        }
        ready
    }

    /// Whatever is still held, in position order; gaps are skipped
    fn drain(&mut self) -> Vec<ExecutionResult> {
        std::mem::take(&mut self.held).into_values().collect()
    }
}
