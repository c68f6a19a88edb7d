//! Router error taxonomy.
//!
//! Every failure the router can produce is a deterministic input or
//! configuration error; nothing here is retried. Variants are grouped into
//! an [`ErrorKind`] so hosts can map them to a response without matching on
//! every detail.

use serde::Serialize;
use thiserror::Error;

/// Errors produced while building, dispatching or reversing routes.
#[derive(Debug, Error)]
pub enum RouterError {
    /// No route matched the request URL.
    #[error("no route found for {url}")]
    RouteNotFound { url: String },

    /// Reverse lookup for a name that was never registered.
    #[error("route {0} not found")]
    UnknownRoute(String),

    /// Reverse lookup with no source URL and nothing dispatched yet.
    #[error("route {0} not found: no source url to resolve against")]
    NoSourceUrl(String),

    /// The HTTP verb is not one the router knows about.
    #[error("method {0} is not allowed")]
    MethodNotAllowed(String),

    /// A class+method handler descriptor does not resolve.
    #[error("method {method} does not exist on {class}")]
    MethodNotExist { class: String, method: String },

    /// A reverse parameter failed its constraint.
    #[error("the parameter {name} is invalid: {value:?}")]
    InvalidParameter { name: String, value: String },

    /// A reverse parameter had no value and no literal fallback.
    #[error("missing parameter {0}")]
    MissingParameter(String),

    /// Several routes share the name but none matches the source URL.
    #[error("no variant of route {0} matches the source url")]
    NoMatchingVariant(String),

    /// A route pattern could not be compiled.
    #[error("invalid route pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The configured base URI is malformed.
    #[error("invalid base uri {0:?}")]
    InvalidBaseUri(String),

    /// A handler descriptor is not written `Class@method`.
    #[error("invalid handler {0:?}: expected Class@method")]
    InvalidHandler(String),

    /// A route references a filter that was never registered.
    #[error("filter {0} is not registered")]
    UnknownFilter(String),

    /// A before filter returned a mapping that is not `{passed, response}`.
    #[error("before filter {filter} must return null, a plain value, or a mapping with keys 'passed' and 'response'")]
    FilterContract { filter: String },
}

/// Coarse classification of [`RouterError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    RouteNotFound,
    MethodNotAllowed,
    MethodNotExist,
    BadRoute,
    FilterContract,
}

impl ErrorKind {
    /// Status code a host should answer with.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::RouteNotFound => 404,
            ErrorKind::MethodNotAllowed => 405,
            ErrorKind::MethodNotExist => 406,
            ErrorKind::BadRoute | ErrorKind::FilterContract => 500,
        }
    }

    /// Whether an error resolver may turn this error into a response.
    pub fn is_resolvable(self) -> bool {
        matches!(
            self,
            ErrorKind::RouteNotFound | ErrorKind::MethodNotAllowed | ErrorKind::MethodNotExist
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::RouteNotFound => "route_not_found",
            ErrorKind::MethodNotAllowed => "method_not_allowed",
            ErrorKind::MethodNotExist => "method_not_exist",
            ErrorKind::BadRoute => "bad_route",
            ErrorKind::FilterContract => "filter_contract",
        }
    }
}

impl RouterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RouterError::RouteNotFound { .. }
            | RouterError::UnknownRoute(_)
            | RouterError::NoSourceUrl(_) => ErrorKind::RouteNotFound,
            RouterError::MethodNotAllowed(_) => ErrorKind::MethodNotAllowed,
            RouterError::MethodNotExist { .. } => ErrorKind::MethodNotExist,
            RouterError::InvalidParameter { .. }
            | RouterError::MissingParameter(_)
            | RouterError::NoMatchingVariant(_)
            | RouterError::InvalidPattern { .. }
            | RouterError::InvalidBaseUri(_)
            | RouterError::InvalidHandler(_)
            | RouterError::UnknownFilter(_) => ErrorKind::BadRoute,
            RouterError::FilterContract { .. } => ErrorKind::FilterContract,
        }
    }
}

pub type Result<T, E = RouterError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let err = RouterError::UnknownRoute("home".into());
        assert_eq!(err.kind(), ErrorKind::RouteNotFound);

        let err = RouterError::MissingParameter("id".into());
        assert_eq!(err.kind(), ErrorKind::BadRoute);
        assert_eq!(err.kind().status_code(), 500);
    }

    #[test]
    fn test_filter_contract_is_never_resolvable() {
        let err = RouterError::FilterContract { filter: "auth".into() };
        assert!(!err.kind().is_resolvable());
        assert!(ErrorKind::MethodNotExist.is_resolvable());
        assert_eq!(ErrorKind::MethodNotExist.status_code(), 406);
    }
}
