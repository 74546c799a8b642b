//! The layout cache facade.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::runtime::{Handle, Runtime};

use super::builder::LayoutCacheBuilder;
use super::config::{LayoutCacheConfig, LookupMode};
use super::error::ServiceError;
use crate::cache::{CacheKey, CacheStatsSnapshot, CacheStore, KeyResolver};
use crate::frame::FrameTracker;
use crate::host::{ComputeError, ContentIdProvider, HostView, SizeComputer};
use crate::item::{ContainerFrame, DependencyMode, ItemPosition, ItemSize};
use crate::log::{GatedLogger, Logger};
use crate::scheduler::{ComputationScheduler, ComputeRequest, Priority, SchedulerStatsSnapshot};
use crate::window::{ScrollOffset, WindowConfig, WindowInput, WindowPlan, WindowTracker};
use crate::{log_debug, log_info, log_warn};

/// Combined counters of one cache.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutCacheStats {
    pub cache: CacheStatsSnapshot,
    pub scheduler: SchedulerStatsSnapshot,
    /// Keys currently in the prefetch window, scroll-derived and pinned.
    pub window_len: usize,
    pub auto_prefetch: bool,
}

/// Size cache with windowed background prefetching for one scrollable
/// collection.
///
/// The rendering thread calls [`lookup`](Self::lookup) to read sizes and
/// [`position_changed`](Self::position_changed) as the view scrolls. While
/// auto-prefetch is enabled each position change moves a window of keys
/// around the visible range; keys entering the window are computed on the
/// runtime's blocking pool and keys leaving it are cancelled.
///
/// Nothing here returns an error to the caller. A missing or failed size
/// reads as [`ItemSize::zero`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use sizecache::host::{ComputeError, HostSnapshot, SizeRequest};
/// use sizecache::item::{ContainerFrame, ItemPosition, ItemSize};
/// use sizecache::service::LayoutCache;
///
/// let host = Arc::new(HostSnapshot::new(ContainerFrame::from_size(320.0, 640.0), vec![100]));
/// let cache = LayoutCache::new(
///     host,
///     Arc::new(|request: &SizeRequest| -> Result<ItemSize, ComputeError> {
///         Ok(ItemSize::new(request.frame.width, 60.0, request.dependency))
///     }),
/// )
/// .unwrap();
///
/// let position = ItemPosition::new(0, 3);
/// assert!(cache.lookup(position, None, true).is_zero());
/// assert_eq!(cache.size_at(position).height, 60.0);
/// assert_eq!(cache.lookup(position, None, true).height, 60.0);
/// ```
pub struct LayoutCache {
    host: Arc<dyn HostView>,
    store: Arc<CacheStore>,
    resolver: RwLock<KeyResolver>,
    scheduler: ComputationScheduler,
    /// Held while a plan is made and applied, so window updates reach the
    /// scheduler in the order they were made.
    window: Mutex<WindowTracker>,
    frames: FrameTracker,
    logger: Arc<GatedLogger>,
    dependency_mode: RwLock<DependencyMode>,
    lookup_mode: LookupMode,
    handle: Handle,
    /// Present when no runtime was supplied or ambient at build time.
    runtime: Option<Runtime>,
}

impl LayoutCache {
    pub fn builder() -> LayoutCacheBuilder {
        LayoutCacheBuilder::new()
    }

    /// Creates a cache with the default configuration.
    pub fn new(
        host: Arc<dyn HostView>,
        computer: Arc<dyn SizeComputer>,
    ) -> Result<Self, ServiceError> {
        LayoutCacheBuilder::new().host(host).computer(computer).build()
    }

    pub(super) fn assemble(
        host: Arc<dyn HostView>,
        logger: Arc<dyn Logger>,
        handle: Handle,
        runtime: Option<Runtime>,
        config: &LayoutCacheConfig,
    ) -> Self {
        let logger = Arc::new(GatedLogger::with_enabled(logger, config.log_enabled));
        let store = Arc::new(CacheStore::new());
        let scheduler = ComputationScheduler::new(
            config.scheduler,
            Arc::clone(&store),
            handle.clone(),
            logger.clone(),
        );

        log_info!(
            logger,
            "layout cache ready: max_concurrent={}, margins={}/{}, dependency={}, lookup={}",
            scheduler.max_concurrency(),
            config.window.leading_margin,
            config.window.trailing_margin,
            config.dependency_mode,
            config.lookup_mode
        );

        Self {
            frames: FrameTracker::new(Arc::clone(&host)),
            host,
            store,
            resolver: RwLock::new(KeyResolver::new()),
            scheduler,
            window: Mutex::new(WindowTracker::new(config.window)),
            logger,
            dependency_mode: RwLock::new(config.dependency_mode),
            lookup_mode: config.lookup_mode,
            handle,
            runtime,
        }
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Returns the size of the item at `position`.
    ///
    /// `content_id`, when given, is used as the cache key verbatim. A cached
    /// size is returned immediately. On a miss, `only_cache` returns the zero
    /// sentinel without computing; otherwise the size is computed according
    /// to the configured [`LookupMode`], stored, and returned. If a background
    /// computation for the key is already running, its result is used instead
    /// of computing the same key twice.
    ///
    /// Prefetching and [`clear_at`](Self::clear_at) only know positions, so
    /// they key through the installed content-id provider. A `content_id`
    /// passed here and nowhere else produces keys prefetching never fills.
    /// To keep keys stable across reordering *and* get prefetch hits, install
    /// a provider with [`set_content_id_provider`](Self::set_content_id_provider)
    /// and pass `None` here.
    pub fn lookup(
        &self,
        position: ItemPosition,
        content_id: Option<&str>,
        only_cache: bool,
    ) -> ItemSize {
        let mode = self.dependency_mode();
        let key = self.resolver.read().resolve(position, content_id);

        if let Some(size) = self.store.get(&key) {
            return size;
        }
        if only_cache {
            return ItemSize::zero(mode);
        }

        self.warn_if_frame_stale(mode);
        let request = ComputeRequest::new(key, position, self.frames.current_frame(), mode)
            .with_priority(Priority::EXPLICIT);

        let result = match self.lookup_mode {
            LookupMode::Inline => self.scheduler.compute_now(&request),
            LookupMode::Offload { timeout } => self.offload(&request, timeout),
        };
        result.unwrap_or_else(|_| ItemSize::zero(mode))
    }

    /// Cache-filling lookup keyed by position or content-id provider.
    pub fn size_at(&self, position: ItemPosition) -> ItemSize {
        self.lookup(position, None, false)
    }

    fn offload(
        &self,
        request: &ComputeRequest,
        timeout: Duration,
    ) -> Result<ItemSize, ComputeError> {
        // Blocking on the runtime from one of its own threads would panic.
        if Handle::try_current().is_ok() {
            return self.scheduler.compute_now(request);
        }

        let receiver = self.scheduler.submit_and_wait(request.clone());
        match self.handle.block_on(tokio::time::timeout(timeout, receiver)) {
            Ok(Ok(Some(size))) => Ok(size),
            Ok(_) => {
                log_debug!(
                    self.logger,
                    "offloaded lookup for {} produced no size, computing inline",
                    request.key
                );
                self.scheduler.compute_now(request)
            }
            Err(_) => {
                log_debug!(
                    self.logger,
                    "offloaded lookup for {} timed out after {:?}, computing inline",
                    request.key,
                    timeout
                );
                self.scheduler.compute_now_superseding(request)
            }
        }
    }

    // =========================================================================
    // Invalidation
    // =========================================================================

    /// Drops every cached size and cancels all scheduled work.
    ///
    /// The prefetch window keeps its members; they are computed again on the
    /// next position change or [`refresh_window`](Self::refresh_window).
    pub fn clear(&self) {
        let cancelled = self.scheduler.cancel_all();
        let generation = self.store.invalidate_all();
        log_debug!(
            self.logger,
            "cache cleared (generation {}, {} requests cancelled)",
            generation,
            cancelled
        );
    }

    /// Drops the sizes at `positions` and cancels their work.
    pub fn clear_at(&self, positions: &[ItemPosition]) {
        let keys: Vec<CacheKey> = {
            let resolver = self.resolver.read();
            positions
                .iter()
                .map(|&position| resolver.resolve_position(position))
                .collect()
        };
        self.clear_keys(&keys);
    }

    /// Drops the sizes stored under `keys` and cancels their work.
    pub fn clear_keys(&self, keys: &[CacheKey]) {
        let cancelled = self.scheduler.cancel_many(keys);
        let removed = self.store.invalidate(keys);
        log_debug!(
            self.logger,
            "cleared {} of {} keys ({} requests cancelled)",
            removed,
            keys.len(),
            cancelled
        );
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// Changes the concurrency ceiling. Returns the value applied after
    /// clamping.
    pub fn set_max_concurrency(&self, max_concurrent: usize) -> usize {
        self.scheduler.set_max_concurrency(max_concurrent)
    }

    pub fn max_concurrency(&self) -> usize {
        self.scheduler.max_concurrency()
    }

    /// Changes the dependency mode for future computations. Cached sizes
    /// are kept.
    pub fn set_dependency_mode(&self, mode: DependencyMode) {
        *self.dependency_mode.write() = mode;
    }

    pub fn dependency_mode(&self) -> DependencyMode {
        *self.dependency_mode.read()
    }

    /// Installs or removes the size computer.
    pub fn set_delegate(&self, computer: Option<Arc<dyn SizeComputer>>) {
        self.scheduler.set_computer(computer);
    }

    pub fn has_delegate(&self) -> bool {
        self.scheduler.has_computer()
    }

    /// Installs or removes the content-id provider. Keys already cached or
    /// in the window keep the form they were resolved to.
    pub fn set_content_id_provider(&self, provider: Option<Arc<dyn ContentIdProvider>>) {
        self.resolver.write().set_provider(provider);
    }

    pub fn set_log_enabled(&self, enabled: bool) {
        self.logger.set_enabled(enabled);
    }

    pub fn is_log_enabled(&self) -> bool {
        self.logger.enabled()
    }

    pub fn lookup_mode(&self) -> LookupMode {
        self.lookup_mode
    }

    pub fn window_config(&self) -> WindowConfig {
        self.window.lock().config()
    }

    /// Replaces the margins and axis. Applies from the next window update.
    pub fn set_window_config(&self, config: WindowConfig) {
        self.window.lock().set_config(config);
    }

    // =========================================================================
    // Prefetch window
    // =========================================================================

    /// Enables or disables scroll-driven prefetching.
    ///
    /// Enabling computes the window for the current visible range right
    /// away. Disabling cancels the scroll-derived keys; explicitly cached
    /// positions are kept.
    pub fn set_auto_prefetch(&self, enabled: bool) {
        let mut window = self.window.lock();
        if window.is_active() == enabled {
            return;
        }

        let plan = if enabled {
            let input = self.window_input();
            window.activate(&input, &self.resolver.read())
        } else {
            window.deactivate()
        };
        log_debug!(
            self.logger,
            "auto prefetch {}",
            if enabled { "enabled" } else { "disabled" }
        );
        self.apply(plan);
    }

    pub fn is_auto_prefetch(&self) -> bool {
        self.window.lock().is_active()
    }

    /// Handles a scroll event. While auto-prefetch is disabled only the
    /// scroll direction is tracked.
    pub fn position_changed(&self, offset: ScrollOffset) {
        let mut window = self.window.lock();
        let input = self.window_input();
        let plan = window.on_position_changed(offset, &input, &self.resolver.read());
        self.apply(plan);
    }

    /// Recomputes the window for the current visible range without a scroll
    /// event. Also re-requests keys cleared since the last update.
    pub fn refresh_window(&self) {
        let mut window = self.window.lock();
        let input = self.window_input();
        let plan = window.recompute(&input, &self.resolver.read());
        self.apply(plan);
    }

    /// Computes the sizes at `positions` in the background, ahead of any
    /// scroll-derived work. They stay requested until
    /// [`stop_caching`](Self::stop_caching).
    pub fn start_caching(&self, positions: &[ItemPosition]) {
        let mut window = self.window.lock();
        let plan = window.pin(positions, &self.resolver.read());
        self.apply(plan);
    }

    /// Cancels explicit caching of `positions`.
    pub fn stop_caching(&self, positions: &[ItemPosition]) {
        let mut window = self.window.lock();
        let plan = window.unpin(positions, &self.resolver.read());
        self.apply(plan);
    }

    /// Empties the window and cancels all scheduled work. Auto-prefetch
    /// stays enabled if it was.
    pub fn stop_caching_all(&self) {
        let mut window = self.window.lock();
        let dropped = window.clear_all();
        let cancelled = self.scheduler.cancel_all();
        log_debug!(
            self.logger,
            "stopped caching ({} window keys, {} requests cancelled)",
            dropped,
            cancelled
        );
    }

    fn window_input(&self) -> WindowInput {
        WindowInput::from_host(self.host.as_ref(), self.scheduler.max_concurrency())
    }

    /// Called with the window lock held.
    fn apply(&self, plan: WindowPlan) {
        if plan.is_empty() {
            return;
        }

        let cancelled = self.scheduler.cancel_many(&plan.to_cancel);
        let frame = self.frames.current_frame();
        let mode = self.dependency_mode();
        let submitted = plan.to_submit.len();
        let queued = self
            .scheduler
            .submit_all(plan.to_submit.into_iter().map(|(key, planned)| {
                ComputeRequest::new(key, planned.position, frame, mode)
                    .with_priority(planned.priority)
            }));

        log_debug!(
            self.logger,
            "window update: {} cancelled, {} submitted, {} new",
            cancelled,
            submitted,
            queued
        );
    }

    // =========================================================================
    // Frame
    // =========================================================================

    /// Bounds acknowledged by the last [`update_last_frame`](Self::update_last_frame).
    pub fn last_frame(&self) -> ContainerFrame {
        self.frames.last_frame()
    }

    /// Acknowledges the host's current bounds. Cached sizes are not touched;
    /// call [`clear`](Self::clear) first if they no longer apply.
    pub fn update_last_frame(&self) -> ContainerFrame {
        self.frames.update_last_frame()
    }

    /// Bounds the host reports now. Background computations receive the
    /// frame captured when they were requested.
    pub fn current_frame(&self) -> ContainerFrame {
        self.frames.current_frame()
    }

    /// Returns true if the bounds changed on an axis the dependency mode
    /// cares about since the last acknowledgement.
    pub fn frame_is_stale(&self) -> bool {
        let mode = self.dependency_mode();
        self.warn_if_frame_stale(mode);
        self.frames.is_stale(mode)
    }

    fn warn_if_frame_stale(&self, mode: DependencyMode) {
        if let Some(change) = self.frames.check_stale(mode) {
            log_warn!(
                self.logger,
                "container bounds changed from {}x{} to {}x{}; cached sizes may be stale until cleared",
                change.last.width,
                change.last.height,
                change.current.width,
                change.current.height
            );
        }
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    pub fn stats(&self) -> LayoutCacheStats {
        let (window_len, auto_prefetch) = {
            let window = self.window.lock();
            (window.len(), window.is_active())
        };
        LayoutCacheStats {
            cache: self.store.stats(),
            scheduler: self.scheduler.stats(),
            window_len,
            auto_prefetch,
        }
    }

    /// Logs a one-line summary of [`stats`](Self::stats).
    pub fn log_stats(&self) {
        let stats = self.stats();
        log_info!(
            self.logger,
            "cache: {} entries, {:.1}% hit rate, generation {} | scheduler: {} active, {} pending, {} completed, {} failed, {} cancelled, peak {} | window: {} keys",
            stats.cache.entries,
            stats.cache.hit_rate() * 100.0,
            stats.cache.generation,
            stats.scheduler.active,
            stats.scheduler.pending,
            stats.scheduler.completed,
            stats.scheduler.failed,
            stats.scheduler.cancelled,
            stats.scheduler.peak_active,
            stats.window_len
        );
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    pub fn scheduler(&self) -> &ComputationScheduler {
        &self.scheduler
    }

    /// Stops background work. Lookups keep working; inline computation is
    /// unaffected.
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }
}

impl Drop for LayoutCache {
    fn drop(&mut self) {
        self.scheduler.shutdown();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl std::fmt::Debug for LayoutCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutCache")
            .field("entries", &self.store.len())
            .field("scheduler", &self.scheduler)
            .field("dependency_mode", &self.dependency_mode())
            .field("lookup_mode", &self.lookup_mode)
            .field("owns_runtime", &self.runtime.is_some())
            .finish()
    }
}
