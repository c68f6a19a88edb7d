//! Dispatch subsystem: the request phase.
//!
//! # Data Flow
//! ```text
//! (method, url)
//!     → request.rs (normalize URL, strip query)
//!     → dispatcher.rs (ANY ++ method bucket, first match; ERROR bucket fallback)
//!     → filters.rs (before chain, may short-circuit)
//!     → handler (closure, controller method, or resolver-provided action)
//!     → filters.rs (after chain)
//!     → Response
//!
//! (name, params, source url)
//!     → reverse.rs (pick variant, substitute, validate)
//!     → URL
//! ```

pub mod dispatcher;
pub mod echo;
pub mod filters;
pub mod request;
pub mod reverse;

pub use dispatcher::{Dispatcher, Resolver, PREFIX_ARG, REQUEST_URI_ARG};
pub use echo::EchoResolver;
pub use filters::BeforeOutcome;
pub use request::{RequestParts, RequestUri};
