//! URL routing and request dispatch.
//!
//! Routes are declared once through [`RouteBuilder`] (or a TOML manifest),
//! frozen into a [`RouteTable`], then matched any number of times by a
//! [`Dispatcher`], which also generates URLs from route names.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod observability;
pub mod routing;

pub use config::schema::RouterConfig;
pub use dispatch::{Dispatcher, Resolver};
pub use error::{ErrorKind, RouterError};
pub use routing::{Args, Handler, Method, RouteBuilder, RouteOptions, RouteTable};
