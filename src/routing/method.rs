//! HTTP verbs and the two pseudo-buckets (ANY, ERROR).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RouterError;

/// A route bucket key.
///
/// `Any` and `Error` are not verbs: routes filed under `Any` are probed for
/// every request, routes filed under `Error` only when nothing else matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Any,
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Link,
    Error,
}

impl Method {
    pub const VERBS: [Method; 8] = [
        Method::Get,
        Method::Head,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Delete,
        Method::Options,
        Method::Link,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Any => "ANY",
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
            Method::Link => "LINK",
            Method::Error => "ERROR",
        }
    }

    /// Whether a request may carry this method.
    pub fn is_verb(self) -> bool {
        !matches!(self, Method::Any | Method::Error)
    }

    /// Parses a request verb, case-insensitively.
    ///
    /// Bucket names are rejected here: a request never arrives as `ANY`.
    pub fn from_request(verb: &str) -> Result<Method, RouterError> {
        match verb.parse::<Method>() {
            Ok(method) if method.is_verb() => Ok(method),
            _ => Err(RouterError::MethodNotAllowed(verb.to_ascii_uppercase())),
        }
    }
}

impl FromStr for Method {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ANY" => Ok(Method::Any),
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            "OPTIONS" => Ok(Method::Options),
            "LINK" => Ok(Method::Link),
            "ERROR" => Ok(Method::Error),
            other => Err(RouterError::MethodNotAllowed(other.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
