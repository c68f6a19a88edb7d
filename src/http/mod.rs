//! HTTP host adapter subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, trace layer)
//!     → absolute URL from Host header + request target
//!     → Dispatcher::dispatch
//!     → text / JSON body, or error status
//! ```

pub mod server;

pub use server::{build_router, AppState, HttpServer};
