//! Size computation errors.

use thiserror::Error;

/// Errors produced while computing an item size.
///
/// None of these reach the rendering path: a failed computation leaves the
/// key uncached and the lookup degrades to the zero-size sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComputeError {
    /// No size computer has been installed.
    #[error("no size computer installed")]
    NoDelegate,

    /// The item's content is not available (e.g., model not loaded yet).
    #[error("item content unavailable: {0}")]
    Unavailable(String),

    /// The computation itself failed.
    #[error("size computation failed: {0}")]
    Failed(String),

    /// The computation panicked; the panic was contained.
    #[error("size computation panicked: {0}")]
    Panicked(String),
}
