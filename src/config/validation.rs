//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (routes reference declared filters)
//! - Compile every pattern and alias once so bad regexes fail at load time
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;

use crate::config::schema::{GroupConfig, RouteConfig, RouterConfig};
use crate::routing::builder::normalize_base_uri;
use crate::routing::handler::MethodRef;
use crate::routing::method::Method;
use crate::routing::pattern;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem, located by a dotted field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Checks everything serde cannot.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = normalize_base_uri(&config.base_uri) {
        errors.push(ValidationError::new("base_uri", e.to_string()));
    }

    let mut aliases = pattern::default_aliases();
    for (name, regex) in &config.patterns {
        match Regex::new(regex) {
            Ok(_) => {
                aliases.insert(name.clone(), regex.clone());
            }
            Err(e) => errors.push(ValidationError::new(
                format!("patterns.{}", name),
                format!("invalid regex: {}", e),
            )),
        }
    }

    for (name, handler) in &config.filters {
        if handler.parse::<MethodRef>().is_err() {
            errors.push(ValidationError::new(
                format!("filters.{}", name),
                format!("{:?} must be written Class@method", handler),
            ));
        }
    }

    let ctx = Context {
        aliases: &aliases,
        filters: &config.filters,
    };
    for (i, route) in config.routes.iter().enumerate() {
        ctx.route(&format!("routes[{}]", i), route, &mut errors);
    }
    for (i, group) in config.groups.iter().enumerate() {
        ctx.group(&format!("groups[{}]", i), group, &mut errors);
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level {:?}", config.observability.log_level),
        ));
    }

    if config.server.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("{:?} is not a socket address", config.server.bind_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

struct Context<'a> {
    aliases: &'a BTreeMap<String, String>,
    filters: &'a BTreeMap<String, String>,
}

impl Context<'_> {
    fn route(&self, field: &str, route: &RouteConfig, errors: &mut Vec<ValidationError>) {
        match (&route.handler, &route.link) {
            (Some(_), Some(_)) => errors.push(ValidationError::new(
                field,
                "a route declares either a handler or a link, not both",
            )),
            (None, None) => errors.push(ValidationError::new(field, "missing handler")),
            (Some(handler), None) => {
                if handler.parse::<MethodRef>().is_err() {
                    errors.push(ValidationError::new(
                        format!("{}.handler", field),
                        format!("{:?} must be written Class@method", handler),
                    ));
                }
                if route.paths.is_empty() {
                    errors.push(ValidationError::new(format!("{}.paths", field), "no path declared"));
                }
            }
            (None, Some(_)) => {
                if route.name.is_none() {
                    errors.push(ValidationError::new(format!("{}.name", field), "a link needs a name"));
                }
            }
        }

        for method in &route.methods {
            if method.parse::<Method>().is_err() {
                errors.push(ValidationError::new(
                    format!("{}.methods", field),
                    format!("unknown method {:?}", method),
                ));
            }
        }

        if route.link.is_none() {
            for path in route.paths.to_vec() {
                if let Err(e) = pattern::tokenize(&path, self.aliases) {
                    errors.push(ValidationError::new(format!("{}.paths", field), e.to_string()));
                }
            }
        }

        self.scope(field, &route.scheme, &route.before, &route.after, errors);
    }

    fn group(&self, field: &str, group: &GroupConfig, errors: &mut Vec<ValidationError>) {
        self.scope(field, &group.scheme, &group.before, &group.after, errors);

        for (i, route) in group.routes.iter().enumerate() {
            self.route(&format!("{}.routes[{}]", field, i), route, errors);
        }
        for (i, nested) in group.groups.iter().enumerate() {
            self.group(&format!("{}.groups[{}]", field, i), nested, errors);
        }
    }

    fn scope(
        &self,
        field: &str,
        scheme: &Option<String>,
        before: &[String],
        after: &[String],
        errors: &mut Vec<ValidationError>,
    ) {
        if let Some(scheme) = scheme {
            let valid = scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
            if scheme.is_empty() || !valid {
                errors.push(ValidationError::new(
                    format!("{}.scheme", field),
                    format!("invalid scheme {:?}", scheme),
                ));
            }
        }

        for filter in before.iter().chain(after) {
            if !self.filters.contains_key(filter) {
                errors.push(ValidationError::new(
                    field,
                    format!("filter {:?} is not declared under [filters]", filter),
                ));
            }
        }
    }
}
