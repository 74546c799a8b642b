//! Service error types.

use std::io;

use thiserror::Error;

/// Errors that can occur while building a [`LayoutCache`](super::LayoutCache).
///
/// Once built, the cache never reports errors to its caller: lookups
/// degrade to the zero-size sentinel and failed computations are logged.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No host view was supplied to the builder.
    #[error("a host view is required")]
    MissingHost,

    /// No runtime was available and a dedicated one could not be started.
    #[error("failed to start worker runtime: {0}")]
    Runtime(#[from] io::Error),
}
