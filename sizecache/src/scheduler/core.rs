//! Scheduler core: submission, dispatch, cancellation and write-back.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use super::config::{clamp_max_concurrent, SchedulerConfig};
use super::queue::{Enqueued, PendingQueue};
use super::{ComputeRequest, SchedulerStats, SchedulerStatsSnapshot};
use crate::cache::{CacheKey, CacheStore};
use crate::host::{ComputeError, SizeComputer, SizeRequest};
use crate::item::ItemSize;
use crate::log::Logger;
use crate::{log_debug, log_info, log_warn};

type Waiter = oneshot::Sender<Option<ItemSize>>;

/// Result of [`ComputationScheduler::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// New work was queued.
    Queued,
    /// The key was already queued; its priority changed.
    Reprioritized,
    /// The key was already queued at the same priority.
    AlreadyQueued,
    /// A computation for the key is running.
    AlreadyRunning,
    /// The key already has a size in the current generation.
    AlreadyCached,
    /// The scheduler has been shut down.
    ShutDown,
}

impl SubmitOutcome {
    /// Returns true if the submission created a new unit of work.
    pub fn is_new_work(self) -> bool {
        self == Self::Queued
    }
}

/// Result of [`ComputationScheduler::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The request was still queued and will never run.
    Dequeued,
    /// The request was running; its result will be discarded.
    Revoked,
    /// Nothing was queued or running for the key.
    NotTracked,
}

/// A dispatched computation and the ownership stamps it must still hold
/// when it finishes.
struct Job {
    request: ComputeRequest,
    generation: u64,
    epoch: u64,
    ticket: u64,
}

struct SchedulerState {
    queue: PendingQueue,
    /// Key -> ticket of the execution that currently owns it.
    running: HashMap<CacheKey, u64>,
    /// Executions in progress, including revoked ones still finishing.
    active: usize,
    max_concurrent: usize,
    /// Bumped by `cancel_all`; executions from an older epoch never write back.
    epoch: u64,
    next_ticket: u64,
    waiters: HashMap<CacheKey, Vec<Waiter>>,
}

struct Shared {
    state: Mutex<SchedulerState>,
    store: Arc<CacheStore>,
    computer: RwLock<Option<Arc<dyn SizeComputer>>>,
    handle: Handle,
    logger: Arc<dyn Logger>,
    stats: SchedulerStats,
    shutdown: CancellationToken,
}

/// Runs size computations on the tokio blocking pool.
///
/// Guarantees, per key:
///
/// - at most one queued request and at most one owning execution
/// - a cancelled request that has not started never runs
/// - a result is stored only if its execution still owns the key and the
///   cache generation has not changed since submission
///
/// The ceiling limits how many computations are *started*; a computation
/// that blocks only ties up its own blocking-pool thread.
///
/// Lock order is scheduler state, then cache store. The store never calls
/// back into the scheduler.
#[derive(Clone)]
pub struct ComputationScheduler {
    shared: Arc<Shared>,
}

impl ComputationScheduler {
    /// Creates a scheduler that writes into `store` and spawns on `handle`.
    pub fn new(
        config: SchedulerConfig,
        store: Arc<CacheStore>,
        handle: Handle,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let max_concurrent = clamp_max_concurrent(config.max_concurrent);
        log_debug!(logger, "scheduler created (max_concurrent={})", max_concurrent);

        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SchedulerState {
                    queue: PendingQueue::new(),
                    running: HashMap::new(),
                    active: 0,
                    max_concurrent,
                    epoch: 0,
                    next_ticket: 0,
                    waiters: HashMap::new(),
                }),
                store,
                computer: RwLock::new(None),
                handle,
                logger,
                stats: SchedulerStats::default(),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Installs or removes the size computer. Affects computations started
    /// after the call.
    pub fn set_computer(&self, computer: Option<Arc<dyn SizeComputer>>) {
        *self.shared.computer.write() = computer;
    }

    pub fn has_computer(&self) -> bool {
        self.shared.computer.read().is_some()
    }

    /// Submits one request.
    pub fn submit(&self, request: ComputeRequest) -> SubmitOutcome {
        let (outcome, jobs) = {
            let mut state = self.shared.state.lock();
            let outcome = self.shared.enqueue(&mut state, request);
            (outcome, self.shared.take_ready(&mut state))
        };
        self.shared.spawn(jobs);
        outcome
    }

    /// Submits a batch under one lock. Returns how many created new work.
    pub fn submit_all<I>(&self, requests: I) -> usize
    where
        I: IntoIterator<Item = ComputeRequest>,
    {
        let (queued, jobs) = {
            let mut state = self.shared.state.lock();
            let queued = requests
                .into_iter()
                .map(|request| self.shared.enqueue(&mut state, request))
                .filter(|outcome| outcome.is_new_work())
                .count();
            (queued, self.shared.take_ready(&mut state))
        };
        self.shared.spawn(jobs);
        queued
    }

    /// Submits `request` and returns a receiver for its outcome.
    ///
    /// The receiver yields `Some(size)` once a size for the key is stored,
    /// or `None` if the work is cancelled, fails, or is discarded as stale.
    /// A key that is already cached resolves immediately.
    pub fn submit_and_wait(&self, request: ComputeRequest) -> oneshot::Receiver<Option<ItemSize>> {
        let (tx, rx) = oneshot::channel();
        let key = request.key.clone();

        let jobs = {
            let mut state = self.shared.state.lock();
            match self.shared.enqueue(&mut state, request) {
                SubmitOutcome::ShutDown => {
                    let _ = tx.send(None);
                    return rx;
                }
                SubmitOutcome::AlreadyCached => {
                    let _ = tx.send(self.shared.store.entry(&key).map(|entry| entry.size));
                    return rx;
                }
                _ => state.waiters.entry(key).or_default().push(tx),
            }
            self.shared.take_ready(&mut state)
        };
        self.shared.spawn(jobs);
        rx
    }

    /// Cancels the work for `key`.
    ///
    /// Queued work is removed. Running work is revoked: it finishes, but its
    /// result is dropped, and the key may be submitted again right away.
    pub fn cancel(&self, key: &CacheKey) -> CancelOutcome {
        let (outcome, waiters) = {
            let mut state = self.shared.state.lock();
            let outcome = if state.queue.remove(key).is_some() {
                CancelOutcome::Dequeued
            } else if state.running.remove(key).is_some() {
                CancelOutcome::Revoked
            } else {
                CancelOutcome::NotTracked
            };
            (outcome, state.waiters.remove(key))
        };

        if outcome != CancelOutcome::NotTracked {
            self.shared.stats.record_cancelled(1);
            log_debug!(self.shared.logger, "cancelled {} ({:?})", key, outcome);
        }
        notify(waiters, None);
        outcome
    }

    /// Cancels every key in `keys`. Returns how many were tracked.
    pub fn cancel_many<'a, I>(&self, keys: I) -> usize
    where
        I: IntoIterator<Item = &'a CacheKey>,
    {
        keys.into_iter()
            .map(|key| self.cancel(key))
            .filter(|outcome| *outcome != CancelOutcome::NotTracked)
            .count()
    }

    /// Drops all queued work and revokes everything running.
    ///
    /// Returns how many requests were cancelled.
    pub fn cancel_all(&self) -> usize {
        let (cancelled, waiters) = {
            let mut state = self.shared.state.lock();
            state.epoch += 1;
            let cancelled = state.queue.clear() + state.running.drain().count();
            (cancelled, std::mem::take(&mut state.waiters))
        };

        self.shared.stats.record_cancelled(cancelled as u64);
        if cancelled > 0 {
            log_debug!(self.shared.logger, "cancelled all work ({} requests)", cancelled);
        }
        for (_, senders) in waiters {
            notify(Some(senders), None);
        }
        cancelled
    }

    /// Computes `request` on the calling thread and stores the result.
    ///
    /// The computer sees `is_main_thread = true`. A queued request for the
    /// same key is dropped since this call supersedes it.
    ///
    /// If a background computation already owns the key, the call blocks
    /// until it finishes and returns its size instead of computing a second
    /// time. Inside a tokio runtime blocking is not allowed, so the running
    /// execution is revoked and only this call's result is stored. Either
    /// way two results for one key never both reach the store.
    pub fn compute_now(&self, request: &ComputeRequest) -> Result<ItemSize, ComputeError> {
        self.compute_inline(request, Handle::try_current().is_err())
    }

    /// Like [`compute_now`](Self::compute_now) but never waits: a running
    /// execution for the key is revoked and computed over.
    pub fn compute_now_superseding(
        &self,
        request: &ComputeRequest,
    ) -> Result<ItemSize, ComputeError> {
        self.compute_inline(request, false)
    }

    fn compute_inline(
        &self,
        request: &ComputeRequest,
        may_block: bool,
    ) -> Result<ItemSize, ComputeError> {
        let mut waited = false;

        let generation = loop {
            let (pending, generation) = {
                let mut state = self.shared.state.lock();
                state.queue.remove(&request.key);
                let pending = if state.running.contains_key(&request.key) {
                    if may_block && !waited {
                        let (tx, rx) = oneshot::channel();
                        state.waiters.entry(request.key.clone()).or_default().push(tx);
                        Some(rx)
                    } else {
                        state.running.remove(&request.key);
                        log_debug!(
                            self.shared.logger,
                            "inline computation took over running key {}",
                            request.key
                        );
                        None
                    }
                } else {
                    None
                };
                (pending, self.shared.store.generation())
            };

            match pending {
                Some(receiver) => {
                    waited = true;
                    if let Ok(Some(size)) = receiver.blocking_recv() {
                        self.shared.stats.record_deduplicated();
                        return Ok(size);
                    }
                }
                None => break generation,
            }
        };

        let result = self.shared.compute(&request.to_size_request(true));

        let (stored, waiters) = {
            let mut state = self.shared.state.lock();
            let stored = match &result {
                Ok(size) => self
                    .shared
                    .store
                    .put_if_current(request.key.clone(), *size, generation)
                    .then_some(*size),
                Err(_) => None,
            };
            // A running execution keeps its waiters unless this call answered them.
            let waiters = if stored.is_some() || !state.running.contains_key(&request.key) {
                state.waiters.remove(&request.key)
            } else {
                None
            };
            (stored, waiters)
        };

        match &result {
            Ok(_) if stored.is_none() => self.shared.stats.record_stale_discard(),
            Ok(_) => {}
            Err(error) => {
                self.shared.stats.record_failed();
                log_warn!(
                    self.shared.logger,
                    "inline size computation for {} failed: {}",
                    request.key,
                    error
                );
            }
        }
        notify(waiters, stored);
        result
    }

    /// Changes the ceiling. Raising it starts queued work immediately;
    /// lowering it lets running work drain. Returns the applied value.
    pub fn set_max_concurrency(&self, max_concurrent: usize) -> usize {
        let max_concurrent = clamp_max_concurrent(max_concurrent);
        let jobs = {
            let mut state = self.shared.state.lock();
            state.max_concurrent = max_concurrent;
            self.shared.take_ready(&mut state)
        };
        self.shared.spawn(jobs);
        max_concurrent
    }

    pub fn max_concurrency(&self) -> usize {
        self.shared.state.lock().max_concurrent
    }

    /// Stops dispatching. Queued work is dropped and pending waiters are
    /// answered with `None`; running computations finish on their own.
    pub fn shutdown(&self) {
        if self.shared.shutdown.is_cancelled() {
            return;
        }
        self.shared.shutdown.cancel();

        let (dropped, waiters) = {
            let mut state = self.shared.state.lock();
            (state.queue.clear(), std::mem::take(&mut state.waiters))
        };
        self.shared.stats.record_cancelled(dropped as u64);
        for (_, senders) in waiters {
            notify(Some(senders), None);
        }
        log_info!(
            self.shared.logger,
            "scheduler shut down ({} queued requests dropped)",
            dropped
        );
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.shutdown.is_cancelled()
    }

    /// Token cancelled by [`shutdown`](Self::shutdown).
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shared.shutdown.clone()
    }

    /// Computations currently executing, including revoked ones.
    pub fn in_flight_count(&self) -> usize {
        self.shared.state.lock().active
    }

    pub fn pending_count(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    pub fn is_queued(&self, key: &CacheKey) -> bool {
        self.shared.state.lock().queue.contains(key)
    }

    pub fn is_running(&self, key: &CacheKey) -> bool {
        self.shared.state.lock().running.contains_key(key)
    }

    /// Returns true if `key` is queued or owned by a running computation.
    pub fn is_tracked(&self, key: &CacheKey) -> bool {
        let state = self.shared.state.lock();
        state.queue.contains(key) || state.running.contains_key(key)
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.shared.store
    }

    pub fn stats(&self) -> SchedulerStatsSnapshot {
        let (active, pending) = {
            let state = self.shared.state.lock();
            (state.active, state.queue.len())
        };
        self.shared.stats.snapshot(active, pending)
    }
}

impl std::fmt::Debug for ComputationScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("ComputationScheduler")
            .field("active", &state.active)
            .field("pending", &state.queue.len())
            .field("max_concurrent", &state.max_concurrent)
            .field("epoch", &state.epoch)
            .finish()
    }
}

impl Shared {
    fn enqueue(&self, state: &mut SchedulerState, request: ComputeRequest) -> SubmitOutcome {
        if self.shutdown.is_cancelled() {
            return SubmitOutcome::ShutDown;
        }
        self.stats.record_submitted();

        if state.running.contains_key(&request.key) {
            self.stats.record_deduplicated();
            return SubmitOutcome::AlreadyRunning;
        }
        if self.store.contains(&request.key) {
            self.stats.record_deduplicated();
            return SubmitOutcome::AlreadyCached;
        }

        let generation = self.store.generation();
        match state.queue.push(request, generation) {
            Enqueued::New => SubmitOutcome::Queued,
            Enqueued::Reprioritized => {
                self.stats.record_deduplicated();
                self.stats.record_reprioritized();
                SubmitOutcome::Reprioritized
            }
            Enqueued::Unchanged => {
                self.stats.record_deduplicated();
                SubmitOutcome::AlreadyQueued
            }
        }
    }

    /// Pops work while below the ceiling and marks it running.
    fn take_ready(&self, state: &mut SchedulerState) -> Vec<Job> {
        let mut jobs = Vec::new();
        if self.shutdown.is_cancelled() || state.queue.is_empty() {
            return jobs;
        }

        while state.active < state.max_concurrent {
            let Some(queued) = state.queue.pop() else {
                break;
            };
            if self.store.contains(&queued.request.key) {
                self.stats.record_deduplicated();
                continue;
            }

            let ticket = state.next_ticket;
            state.next_ticket += 1;
            state.running.insert(queued.request.key.clone(), ticket);
            state.active += 1;
            self.stats.record_started(state.active);

            jobs.push(Job {
                request: queued.request,
                generation: queued.generation,
                epoch: state.epoch,
                ticket,
            });
        }
        jobs
    }

    fn spawn(self: &Arc<Self>, jobs: Vec<Job>) {
        for job in jobs {
            let shared = Arc::clone(self);
            self.handle.spawn_blocking(move || shared.execute(job));
        }
    }

    fn execute(self: Arc<Self>, job: Job) {
        let result = self.compute(&job.request.to_size_request(false));
        self.finish(job, result);
    }

    fn compute(&self, request: &SizeRequest) -> Result<ItemSize, ComputeError> {
        let computer = self
            .computer
            .read()
            .clone()
            .ok_or(ComputeError::NoDelegate)?;

        panic::catch_unwind(AssertUnwindSafe(|| computer.compute_size(request)))
            .unwrap_or_else(|payload| Err(ComputeError::Panicked(panic_message(payload.as_ref()))))
    }

    fn finish(self: &Arc<Self>, job: Job, result: Result<ItemSize, ComputeError>) {
        let key = job.request.key;

        let (stored, waiters, jobs) = {
            let mut state = self.state.lock();
            state.active = state.active.saturating_sub(1);

            let owns = state.epoch == job.epoch && state.running.get(&key) == Some(&job.ticket);
            if owns {
                state.running.remove(&key);
            }

            let stored = match &result {
                Ok(size) if owns => self
                    .store
                    .put_if_current(key.clone(), *size, job.generation)
                    .then_some(*size),
                _ => None,
            };
            let waiters = if owns { state.waiters.remove(&key) } else { None };
            (stored, waiters, self.take_ready(&mut state))
        };

        match &result {
            Ok(_) if stored.is_some() => {
                self.stats.record_completed();
                log_debug!(self.logger, "cached {} (generation {})", key, job.generation);
            }
            Ok(_) => {
                self.stats.record_stale_discard();
                log_debug!(self.logger, "discarded stale size for {}", key);
            }
            Err(error) => {
                self.stats.record_failed();
                log_warn!(self.logger, "size computation for {} failed: {}", key, error);
            }
        }

        notify(waiters, stored);
        self.spawn(jobs);
    }
}

fn notify(waiters: Option<Vec<Waiter>>, value: Option<ItemSize>) {
    for waiter in waiters.into_iter().flatten() {
        let _ = waiter.send(value);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ContainerFrame, DependencyMode, ItemPosition};
    use crate::log::NoOpLogger;
    use crate::scheduler::Priority;
    use parking_lot::Condvar;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    #[derive(Default)]
    struct Gate {
        open: Mutex<bool>,
        cv: Condvar,
    }

    impl Gate {
        fn wait(&self) {
            let mut open = self.open.lock();
            while !*open {
                self.cv.wait(&mut open);
            }
        }

        fn open(&self) {
            *self.open.lock() = true;
            self.cv.notify_all();
        }
    }

    fn request(index: usize) -> ComputeRequest {
        let position = ItemPosition::new(0, index);
        ComputeRequest::new(
            CacheKey::from(position),
            position,
            ContainerFrame::from_size(320.0, 640.0),
            DependencyMode::Width,
        )
    }

    fn key(index: usize) -> CacheKey {
        CacheKey::from(ItemPosition::new(0, index))
    }

    fn scheduler(
        max_concurrent: usize,
        computer: Arc<dyn SizeComputer>,
    ) -> (ComputationScheduler, Arc<CacheStore>) {
        let store = Arc::new(CacheStore::new());
        let scheduler = ComputationScheduler::new(
            SchedulerConfig::new(max_concurrent),
            Arc::clone(&store),
            Handle::current(),
            Arc::new(NoOpLogger),
        );
        scheduler.set_computer(Some(computer));
        (scheduler, store)
    }

    /// Counts calls, records positions, optionally blocks on a gate.
    fn counting_computer(
        calls: Arc<AtomicUsize>,
        gate: Option<Arc<Gate>>,
    ) -> Arc<dyn SizeComputer> {
        Arc::new(
            move |request: &SizeRequest| -> Result<ItemSize, ComputeError> {
                calls.fetch_add(1, Ordering::SeqCst);
                if let Some(gate) = &gate {
                    gate.wait();
                }
                Ok(ItemSize::new(
                    request.frame.width,
                    10.0 + request.position.index as f64,
                    request.dependency,
                ))
            },
        )
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    async fn wait_idle(scheduler: &ComputationScheduler) {
        wait_until(|| scheduler.in_flight_count() == 0 && scheduler.pending_count() == 0).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_repeated_submission_computes_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Gate::default());
        let (scheduler, store) = scheduler(4, counting_computer(calls.clone(), Some(gate.clone())));

        assert_eq!(scheduler.submit(request(7)), SubmitOutcome::Queued);
        for _ in 0..5 {
            let outcome = scheduler.submit(request(7));
            assert!(!outcome.is_new_work());
        }
        gate.open();
        wait_idle(&scheduler).await;

        assert_eq!(scheduler.submit(request(7)), SubmitOutcome::AlreadyCached);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(store.contains(&key(7)));
        assert_eq!(scheduler.stats().completed, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_before_start_never_runs() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let gate = Arc::new(Gate::default());
        let computer: Arc<dyn SizeComputer> = {
            let seen = Arc::clone(&seen);
            let gate = Arc::clone(&gate);
            Arc::new(
                move |request: &SizeRequest| -> Result<ItemSize, ComputeError> {
                    seen.lock().push(request.position.index);
                    gate.wait();
                    Ok(ItemSize::new(1.0, 1.0, request.dependency))
                },
            )
        };
        let (scheduler, store) = scheduler(1, computer);

        scheduler.submit(request(0));
        scheduler.submit(request(1));
        scheduler.submit(request(2));
        wait_until(|| seen.lock().len() == 1).await;

        assert_eq!(scheduler.cancel(&key(1)), CancelOutcome::Dequeued);
        gate.open();
        wait_idle(&scheduler).await;

        assert_eq!(*seen.lock(), vec![0, 2]);
        assert!(!store.contains(&key(1)));
        assert_eq!(scheduler.cancel(&key(1)), CancelOutcome::NotTracked);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancelled_running_result_is_discarded() {
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Gate::default());
        let (scheduler, store) = scheduler(2, counting_computer(calls.clone(), Some(gate.clone())));

        scheduler.submit(request(3));
        wait_until(|| calls.load(Ordering::SeqCst) == 1).await;

        assert_eq!(scheduler.cancel(&key(3)), CancelOutcome::Revoked);
        assert!(!scheduler.is_tracked(&key(3)));
        gate.open();
        wait_idle(&scheduler).await;

        assert!(!store.contains(&key(3)));
        assert_eq!(scheduler.stats().stale_discards, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_generation_bump_discards_in_flight_result() {
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Gate::default());
        let (scheduler, store) = scheduler(2, counting_computer(calls.clone(), Some(gate.clone())));

        scheduler.submit(request(5));
        wait_until(|| calls.load(Ordering::SeqCst) == 1).await;

        store.invalidate_all();
        gate.open();
        wait_idle(&scheduler).await;

        assert!(!store.contains(&key(5)));
        assert_eq!(store.stats().stale_discards, 1);

        // Resubmitting after the clear computes again and sticks.
        scheduler.submit(request(5));
        wait_idle(&scheduler).await;
        assert!(store.contains(&key(5)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_all_revokes_everything() {
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Gate::default());
        let (scheduler, store) = scheduler(2, counting_computer(calls.clone(), Some(gate.clone())));

        for i in 0..6 {
            scheduler.submit(request(i));
        }
        wait_until(|| calls.load(Ordering::SeqCst) == 2).await;

        assert_eq!(scheduler.cancel_all(), 6);
        gate.open();
        wait_idle(&scheduler).await;

        assert!(store.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrency_never_exceeds_ceiling() {
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let computer: Arc<dyn SizeComputer> = {
            let current = Arc::clone(&current);
            let peak = Arc::clone(&peak);
            Arc::new(
                move |request: &SizeRequest| -> Result<ItemSize, ComputeError> {
                    let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(10));
                    current.fetch_sub(1, Ordering::SeqCst);
                    Ok(ItemSize::new(1.0, 1.0, request.dependency))
                },
            )
        };
        let (scheduler, store) = scheduler(40, computer);

        let queued = scheduler.submit_all((0..100).map(request));
        assert_eq!(queued, 100);
        wait_idle(&scheduler).await;

        assert_eq!(store.len(), 100);
        assert!(peak.load(Ordering::SeqCst) <= 40);
        assert!(scheduler.stats().peak_active <= 40);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_pending_work_runs_in_priority_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let gate = Arc::new(Gate::default());
        let computer: Arc<dyn SizeComputer> = {
            let seen = Arc::clone(&seen);
            let gate = Arc::clone(&gate);
            Arc::new(
                move |request: &SizeRequest| -> Result<ItemSize, ComputeError> {
                    seen.lock().push(request.position.index);
                    gate.wait();
                    Ok(ItemSize::new(1.0, 1.0, request.dependency))
                },
            )
        };
        let (scheduler, _) = scheduler(1, computer);

        scheduler.submit(request(0));
        wait_until(|| seen.lock().len() == 1).await;

        scheduler.submit(request(10).with_priority(Priority::trailing(1)));
        scheduler.submit(request(20).with_priority(Priority::leading(1)));
        scheduler.submit(request(30).with_priority(Priority::VISIBLE));
        assert_eq!(
            scheduler.submit(request(10).with_priority(Priority::EXPLICIT)),
            SubmitOutcome::Reprioritized
        );
        gate.open();
        wait_idle(&scheduler).await;

        assert_eq!(*seen.lock(), vec![0, 10, 30, 20]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_failure_leaves_key_uncached_and_resubmit_retries() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let computer: Arc<dyn SizeComputer> = {
            let attempts = Arc::clone(&attempts);
            Arc::new(
                move |request: &SizeRequest| -> Result<ItemSize, ComputeError> {
                    if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                        return Err(ComputeError::Unavailable("model not loaded".into()));
                    }
                    Ok(ItemSize::new(1.0, 2.0, request.dependency))
                },
            )
        };
        let (scheduler, store) = scheduler(4, computer);

        scheduler.submit(request(1));
        wait_idle(&scheduler).await;
        assert!(!store.contains(&key(1)));
        assert_eq!(scheduler.stats().failed, 1);

        scheduler.submit(request(1));
        wait_idle(&scheduler).await;
        assert!(store.contains(&key(1)));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_panic_is_contained() {
        let computer: Arc<dyn SizeComputer> = Arc::new(
            |request: &SizeRequest| -> Result<ItemSize, ComputeError> {
                if request.position.index == 13 {
                    panic!("bad row");
                }
                Ok(ItemSize::new(1.0, 1.0, request.dependency))
            },
        );
        let (scheduler, store) = scheduler(4, computer);

        scheduler.submit_all([request(12), request(13), request(14)]);
        wait_idle(&scheduler).await;

        assert!(store.contains(&key(12)));
        assert!(!store.contains(&key(13)));
        assert!(store.contains(&key(14)));
        assert_eq!(scheduler.stats().failed, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_missing_computer_fails_without_caching() {
        let store = Arc::new(CacheStore::new());
        let scheduler = ComputationScheduler::new(
            SchedulerConfig::default(),
            Arc::clone(&store),
            Handle::current(),
            Arc::new(NoOpLogger),
        );

        let rx = scheduler.submit_and_wait(request(0));
        assert_eq!(rx.await.ok().flatten(), None);
        assert!(store.is_empty());
        assert_eq!(
            scheduler.compute_now(&request(0)),
            Err(ComputeError::NoDelegate)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_submit_and_wait_resolves_with_size() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (scheduler, _) = scheduler(4, counting_computer(calls.clone(), None));

        let size = scheduler.submit_and_wait(request(4)).await.ok().flatten();
        assert_eq!(size.map(|s| s.height), Some(14.0));

        // Cached keys resolve without computing again.
        let again = scheduler.submit_and_wait(request(4)).await.ok().flatten();
        assert_eq!(again, size);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_compute_now_runs_on_caller_and_supersedes_queue() {
        let main_thread_calls = Arc::new(AtomicUsize::new(0));
        let computer: Arc<dyn SizeComputer> = {
            let main_thread_calls = Arc::clone(&main_thread_calls);
            Arc::new(
                move |request: &SizeRequest| -> Result<ItemSize, ComputeError> {
                    if request.is_main_thread {
                        main_thread_calls.fetch_add(1, Ordering::SeqCst);
                    }
                    Ok(ItemSize::new(1.0, 1.0, request.dependency))
                },
            )
        };
        let (scheduler, store) = scheduler(1, computer);

        let size = scheduler.compute_now(&request(9));

        assert!(size.is_ok());
        assert!(store.contains(&key(9)));
        assert_eq!(main_thread_calls.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_queued(&key(9)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_after_completion_keeps_stored_size() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (scheduler, store) = scheduler(4, counting_computer(calls.clone(), None));

        scheduler.submit(request(6));
        wait_idle(&scheduler).await;
        assert!(store.contains(&key(6)));

        assert_eq!(scheduler.cancel(&key(6)), CancelOutcome::NotTracked);
        assert_eq!(store.get(&key(6)).map(|s| s.height), Some(16.0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_compute_now_in_runtime_takes_over_running_key() {
        let background_calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Gate::default());
        let computer: Arc<dyn SizeComputer> = {
            let background_calls = Arc::clone(&background_calls);
            let gate = Arc::clone(&gate);
            Arc::new(
                move |request: &SizeRequest| -> Result<ItemSize, ComputeError> {
                    if request.is_main_thread {
                        return Ok(ItemSize::new(1.0, 99.0, request.dependency));
                    }
                    background_calls.fetch_add(1, Ordering::SeqCst);
                    gate.wait();
                    Ok(ItemSize::new(1.0, 1.0, request.dependency))
                },
            )
        };
        let (scheduler, store) = scheduler(2, computer);

        scheduler.submit(request(2));
        wait_until(|| background_calls.load(Ordering::SeqCst) == 1).await;

        let size = scheduler.compute_now(&request(2));
        assert_eq!(size.map(|s| s.height), Ok(99.0));
        assert!(!scheduler.is_running(&key(2)));

        gate.open();
        wait_idle(&scheduler).await;

        assert_eq!(store.get(&key(2)).map(|s| s.height), Some(99.0));
        assert_eq!(scheduler.stats().stale_discards, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_raising_ceiling_starts_queued_work() {
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Gate::default());
        let (scheduler, _) = scheduler(1, counting_computer(calls.clone(), Some(gate.clone())));

        scheduler.submit_all((0..3).map(request));
        wait_until(|| calls.load(Ordering::SeqCst) == 1).await;
        assert_eq!(scheduler.pending_count(), 2);

        assert_eq!(scheduler.set_max_concurrency(3), 3);
        wait_until(|| calls.load(Ordering::SeqCst) == 3).await;
        gate.open();
        wait_idle(&scheduler).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_shutdown_drops_queue_and_rejects_submissions() {
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Gate::default());
        let (scheduler, _) = scheduler(1, counting_computer(calls.clone(), Some(gate.clone())));

        scheduler.submit_all((0..4).map(request));
        wait_until(|| calls.load(Ordering::SeqCst) == 1).await;

        scheduler.shutdown();
        assert!(scheduler.is_shut_down());
        assert_eq!(scheduler.pending_count(), 0);
        assert_eq!(scheduler.submit(request(10)), SubmitOutcome::ShutDown);

        gate.open();
        wait_until(|| scheduler.in_flight_count() == 0).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
