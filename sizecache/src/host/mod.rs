//! Interfaces consumed from the host view.
//!
//! The cache never reaches into the host: it asks a [`HostView`] for the
//! visible positions, container bounds and collection shape, and asks a
//! [`SizeComputer`] to measure items. Both are supplied by the caller.
//!
//! [`HostSnapshot`] is a ready-made `HostView` for hosts whose real view
//! objects are bound to the UI thread: the UI thread pushes snapshots, the
//! cache reads them from any thread.

mod error;
mod snapshot;
mod traits;

pub use error::ComputeError;
pub use snapshot::HostSnapshot;
pub use traits::{ContentIdProvider, HostView, SizeComputer, SizeRequest};
