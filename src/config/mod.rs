//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! route manifest (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!     → RouteBuilder::from_config → RouteTable
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a rebuilt table
//! - All fields have defaults to allow minimal manifests
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{GroupConfig, ObservabilityConfig, RouteConfig, RouterConfig, ServerConfig};
