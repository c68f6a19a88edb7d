//! Routing subsystem: the build phase.
//!
//! # Data Flow
//! ```text
//! Route Declaration (at startup):
//!     RouteBuilder::get/post/.../group
//!     → group.rs (merge nested scope options)
//!     → RouteDraft[]
//!
//! Route Compilation (RouteBuilder::build):
//!     RouteDraft[]
//!     → pattern.rs (tokenize placeholders, resolve aliases)
//!     → definition.rs (full regex, prefix regex, reverse template)
//!     → table.rs (bucket per method, name index, sort by specificity)
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same input always matches same route
//! - First match wins, so probe order is fixed by specificity rather than
//!   by registration order

pub mod builder;
pub mod definition;
pub mod group;
pub mod handler;
pub mod method;
pub mod pattern;
pub mod table;

pub use builder::{Paths, Registration, RouteBuilder};
pub use definition::{Parameter, RouteDefinition, RouteInfo, Specificity};
pub use group::RouteOptions;
pub use handler::{Action, Args, Controller, Handler, MethodRef, Response};
pub use method::Method;
pub use table::{Manifest, RouteTable};
