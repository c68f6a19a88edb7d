//! Configuration schema definitions.
//!
//! A route manifest declares the same things the builder API does: routes,
//! nested groups, filters and constraint aliases. Handlers are always
//! `Class@method` descriptors, resolved at dispatch time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root of a route manifest.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Path every route is mounted under (e.g. "/app"); empty for the root.
    pub base_uri: String,

    /// Extra named constraints, merged over the built-in aliases.
    pub patterns: BTreeMap<String, String>,

    /// Filter name → `Class@method` descriptor.
    pub filters: BTreeMap<String, String>,

    /// Top-level routes.
    pub routes: Vec<RouteConfig>,

    /// Option scopes wrapping further routes.
    pub groups: Vec<GroupConfig>,

    /// HTTP adapter settings.
    pub server: ServerConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// One registration: a handler (or a link) under one or more paths.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouteConfig {
    /// HTTP methods, `ANY` or `ERROR`; empty means GET.
    pub methods: Vec<String>,

    /// Path pattern(s). Several paths become grouped siblings.
    #[serde(alias = "path")]
    pub paths: OneOrMany,

    pub name: Option<String>,

    pub prefix: Option<String>,

    /// Pinned host(s).
    pub host: OneOrMany,

    pub scheme: Option<String>,

    pub before: Vec<String>,

    pub after: Vec<String>,

    /// `Class@method` descriptor.
    pub handler: Option<String>,

    /// Declares a LINK route instead: reverse lookup returns this verbatim.
    pub link: Option<String>,
}

/// A nested option scope.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GroupConfig {
    pub prefix: Option<String>,
    pub host: OneOrMany,
    pub scheme: Option<String>,
    pub before: Vec<String>,
    pub after: Vec<String>,
    pub routes: Vec<RouteConfig>,
    pub groups: Vec<GroupConfig>,
}

/// A string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => vec![value.clone()],
            OneOrMany::Many(values) => values.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            OneOrMany::One(_) => false,
            OneOrMany::Many(values) => values.is_empty(),
        }
    }
}

impl Default for OneOrMany {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

/// HTTP adapter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the compact text format.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}
