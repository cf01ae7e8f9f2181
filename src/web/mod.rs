//! Transport integration surface.
//!
//! This module is the boundary between an HTTP framework and the
//! dispatcher. It handles:
//! - Mapping a framework request to [`RequestMeta`](crate::RequestMeta)
//! - Collecting route values, query values and body bytes into
//!   [`ValueSources`](crate::ValueSources)
//! - Request-id propagation
//!
//! Nothing here authenticates or authorizes. The framework establishes the
//! principal; the pipeline decides what it may do.
//!
//! # Integration Model
//!
//! Framework-specific code should:
//! 1. Build a [`RequestAdapter`] from the framework's request type (or
//!    implement [`ExtractSources`] directly)
//! 2. Call [`Dispatcher::dispatch_extracted`](crate::Dispatcher::dispatch_extracted)
//! 3. Write the returned body or failure payload back with its status
//!
//! ```ignore
//! let adapter = RequestAdapter::from(http_req);
//! match dispatcher.dispatch_extracted(&adapter, token).await {
//!     Ok(ok) => respond(ok.status, ok.body),
//!     Err(failure) => respond(failure.status, serde_json::to_value(failure)?),
//! }
//! ```

mod adapter;
mod extract;

pub use adapter::RequestAdapter;
pub use extract::ExtractSources;
