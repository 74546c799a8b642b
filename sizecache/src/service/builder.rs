//! Builder for [`LayoutCache`].
//!
//! Collects the host-supplied pieces, picks a runtime and wires the
//! components together.

use std::sync::Arc;

use tokio::runtime::{Handle, Runtime};

use super::config::LayoutCacheConfig;
use super::error::ServiceError;
use super::facade::LayoutCache;
use crate::host::{ContentIdProvider, HostView, SizeComputer};
use crate::log::{Logger, TracingLogger};

/// Name given to threads of a runtime the cache starts for itself.
const WORKER_THREAD_NAME: &str = "sizecache-worker";

/// Builds a [`LayoutCache`].
///
/// Only the host view is required. Without a computer every computation
/// fails with [`ComputeError::NoDelegate`](crate::host::ComputeError) until
/// one is installed with [`LayoutCache::set_delegate`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use sizecache::host::{ComputeError, HostSnapshot, SizeRequest};
/// use sizecache::item::{ContainerFrame, ItemSize};
/// use sizecache::service::{LayoutCacheBuilder, LayoutCacheConfig};
///
/// let host = Arc::new(HostSnapshot::new(ContainerFrame::from_size(320.0, 640.0), vec![100]));
/// let cache = LayoutCacheBuilder::new()
///     .host(host)
///     .computer(Arc::new(|request: &SizeRequest| -> Result<ItemSize, ComputeError> {
///         Ok(ItemSize::new(request.frame.width, 44.0, request.dependency))
///     }))
///     .config(LayoutCacheConfig::default().with_max_concurrent(4))
///     .build()
///     .unwrap();
///
/// assert_eq!(cache.max_concurrency(), 4);
/// ```
#[derive(Default)]
pub struct LayoutCacheBuilder {
    host: Option<Arc<dyn HostView>>,
    computer: Option<Arc<dyn SizeComputer>>,
    content_ids: Option<Arc<dyn ContentIdProvider>>,
    logger: Option<Arc<dyn Logger>>,
    handle: Option<Handle>,
    config: LayoutCacheConfig,
}

impl LayoutCacheBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(mut self, host: Arc<dyn HostView>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn computer(mut self, computer: Arc<dyn SizeComputer>) -> Self {
        self.computer = Some(computer);
        self
    }

    pub fn content_id_provider(mut self, provider: Arc<dyn ContentIdProvider>) -> Self {
        self.content_ids = Some(provider);
        self
    }

    /// Diagnostics sink. Defaults to [`TracingLogger`].
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Runtime whose blocking pool runs computations.
    ///
    /// Without one the cache uses the runtime it is built in, or starts its
    /// own when built outside any runtime.
    pub fn runtime_handle(mut self, handle: Handle) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn config(mut self, config: LayoutCacheConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<LayoutCache, ServiceError> {
        let host = self.host.ok_or(ServiceError::MissingHost)?;
        let (handle, runtime) = select_runtime(self.handle)?;
        let logger = self
            .logger
            .unwrap_or_else(|| Arc::new(TracingLogger) as Arc<dyn Logger>);

        let cache = LayoutCache::assemble(host, logger, handle, runtime, &self.config);
        cache.set_delegate(self.computer);
        cache.set_content_id_provider(self.content_ids);
        if self.config.auto_prefetch {
            cache.set_auto_prefetch(true);
        }
        Ok(cache)
    }
}

impl std::fmt::Debug for LayoutCacheBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutCacheBuilder")
            .field("has_host", &self.host.is_some())
            .field("has_computer", &self.computer.is_some())
            .field("has_content_id_provider", &self.content_ids.is_some())
            .field("config", &self.config)
            .finish()
    }
}

/// Supplied handle, else the ambient runtime, else a dedicated one.
fn select_runtime(handle: Option<Handle>) -> Result<(Handle, Option<Runtime>), ServiceError> {
    if let Some(handle) = handle {
        return Ok((handle, None));
    }
    if let Ok(handle) = Handle::try_current() {
        return Ok((handle, None));
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name(WORKER_THREAD_NAME)
        .enable_all()
        .build()?;
    Ok((runtime.handle().clone(), Some(runtime)))
}
