//! Build-phase API.
//!
//! # Responsibilities
//! - Collect route registrations under the current group scope
//! - Let `name`/`host`/`scheme` amend the most recent registration only
//! - Hold the filter and controller registries until the table is frozen
//! - Register routes declared in a [`RouterConfig`]
//!
//! # Design Decisions
//! - Registration is infallible; every compile error surfaces from
//!   [`RouteBuilder::build`] so declaration code reads top to bottom
//! - Filters are looked up by name at dispatch time, so they may be added
//!   after the routes that reference them

use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use std::sync::Arc;

use serde_json::Value;

use crate::config::schema::{GroupConfig, RouteConfig, RouterConfig};
use crate::error::{Result, RouterError};
use crate::routing::definition::{RouteDefinition, RouteDraft};
use crate::routing::group::{GroupStack, RouteOptions};
use crate::routing::handler::{Controller, Handler, MethodRef};
use crate::routing::method::Method;
use crate::routing::pattern;
use crate::routing::table::RouteTable;

/// One or several paths handed to a single registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths(Vec<String>);

impl Paths {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for Paths {
    fn from(path: &str) -> Self {
        Paths(vec![path.to_string()])
    }
}

impl From<String> for Paths {
    fn from(path: String) -> Self {
        Paths(vec![path])
    }
}

impl From<Vec<String>> for Paths {
    fn from(paths: Vec<String>) -> Self {
        Paths(paths)
    }
}

impl From<Vec<&str>> for Paths {
    fn from(paths: Vec<&str>) -> Self {
        Paths(paths.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Paths {
    fn from(paths: &[&str]) -> Self {
        Paths(paths.iter().map(|p| p.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Paths {
    fn from(paths: [&str; N]) -> Self {
        Paths(paths.iter().map(|p| p.to_string()).collect())
    }
}

/// Stateful route declaration, frozen into a [`RouteTable`] by [`build`](Self::build).
pub struct RouteBuilder {
    base_uri: String,
    aliases: BTreeMap<String, String>,
    scopes: GroupStack,
    drafts: Vec<RouteDraft>,
    last_batch: Range<usize>,
    filters: HashMap<String, Handler>,
    controllers: HashMap<String, Arc<dyn Controller>>,
}

impl Default for RouteBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteBuilder {
    pub fn new() -> Self {
        Self {
            base_uri: String::new(),
            aliases: pattern::default_aliases(),
            scopes: GroupStack::new(),
            drafts: Vec::new(),
            last_batch: 0..0,
            filters: HashMap::new(),
            controllers: HashMap::new(),
        }
    }

    /// Path every route is mounted under, e.g. `/app`. Validated at build time.
    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = base_uri.into();
        self
    }

    /// Adds or overrides named constraint aliases.
    pub fn with_patterns<I, K, V>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.aliases
            .extend(patterns.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Registers every path in `paths` under `methods`.
    ///
    /// Several paths produce sibling routes flagged as grouped, sharing one
    /// handler and one set of options.
    pub fn register<M>(
        &mut self,
        methods: M,
        paths: impl Into<Paths>,
        options: RouteOptions,
        handler: impl Into<Handler>,
    ) -> Registration<'_>
    where
        M: IntoIterator<Item = Method>,
    {
        let methods: Vec<Method> = methods.into_iter().collect();
        let paths = paths.into();
        let options = self.scopes.current().merge(&options);
        let handler = handler.into();
        let grouped = paths.0.len() > 1;

        let start = self.drafts.len();
        for path in paths.0 {
            self.drafts.push(RouteDraft {
                methods: methods.clone(),
                path,
                options: options.clone(),
                handler: handler.clone(),
                name: None,
                grouped,
            });
        }
        self.last_batch = start..self.drafts.len();

        Registration { builder: self }
    }

    /// Registers with the current scope's options only.
    pub fn map<M>(&mut self, methods: M, paths: impl Into<Paths>, handler: impl Into<Handler>) -> Registration<'_>
    where
        M: IntoIterator<Item = Method>,
    {
        self.register(methods, paths, RouteOptions::new(), handler)
    }

    /// Matched for every request method.
    pub fn any(&mut self, paths: impl Into<Paths>, handler: impl Into<Handler>) -> Registration<'_> {
        self.map([Method::Any], paths, handler)
    }

    pub fn get(&mut self, paths: impl Into<Paths>, handler: impl Into<Handler>) -> Registration<'_> {
        self.map([Method::Get], paths, handler)
    }

    pub fn head(&mut self, paths: impl Into<Paths>, handler: impl Into<Handler>) -> Registration<'_> {
        self.map([Method::Head], paths, handler)
    }

    pub fn post(&mut self, paths: impl Into<Paths>, handler: impl Into<Handler>) -> Registration<'_> {
        self.map([Method::Post], paths, handler)
    }

    pub fn put(&mut self, paths: impl Into<Paths>, handler: impl Into<Handler>) -> Registration<'_> {
        self.map([Method::Put], paths, handler)
    }

    pub fn patch(&mut self, paths: impl Into<Paths>, handler: impl Into<Handler>) -> Registration<'_> {
        self.map([Method::Patch], paths, handler)
    }

    pub fn delete(&mut self, paths: impl Into<Paths>, handler: impl Into<Handler>) -> Registration<'_> {
        self.map([Method::Delete], paths, handler)
    }

    pub fn options(&mut self, paths: impl Into<Paths>, handler: impl Into<Handler>) -> Registration<'_> {
        self.map([Method::Options], paths, handler)
    }

    /// Fallback consulted only when no regular route matches.
    pub fn error(&mut self, paths: impl Into<Paths>, handler: impl Into<Handler>) -> Registration<'_> {
        self.map([Method::Error], paths, handler)
    }

    /// A name-only route: reverse lookup returns `path` as declared.
    pub fn link(&mut self, path: impl Into<String>) -> Registration<'_> {
        self.map([Method::Link], path.into(), Handler::func(|_| Value::Null))
    }

    /// Runs `body` inside a nested option scope.
    pub fn group<F>(&mut self, options: RouteOptions, body: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        self.push_group(options);
        body(self);
        self.pop_group();
        self
    }

    pub fn push_group(&mut self, options: RouteOptions) -> &mut Self {
        self.scopes.push(options);
        self
    }

    pub fn pop_group(&mut self) -> &mut Self {
        self.scopes.pop();
        self
    }

    /// Names every route of the most recent registration.
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        for draft in &mut self.drafts[self.last_batch.clone()] {
            draft.name = Some(name.clone());
        }
        self
    }

    /// Pins the most recent registration to one host.
    pub fn set_host(&mut self, host: impl Into<String>) -> &mut Self {
        let host = host.into();
        self.set_hosts([host])
    }

    pub fn set_hosts<I, S>(&mut self, hosts: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let hosts: Vec<String> = hosts.into_iter().map(Into::into).collect();
        for draft in &mut self.drafts[self.last_batch.clone()] {
            draft.options.hosts = hosts.clone();
        }
        self
    }

    pub fn set_scheme(&mut self, scheme: impl Into<String>) -> &mut Self {
        let scheme = scheme.into();
        for draft in &mut self.drafts[self.last_batch.clone()] {
            draft.options.scheme = Some(scheme.clone());
        }
        self
    }

    /// Registers a named filter; a later registration under the same name wins.
    pub fn filter(&mut self, name: impl Into<String>, handler: impl Into<Handler>) -> &mut Self {
        self.filters.insert(name.into(), handler.into());
        self
    }

    /// Registers the object that `Class@method` handlers named `class` resolve to.
    pub fn controller(&mut self, class: impl Into<String>, controller: Arc<dyn Controller>) -> &mut Self {
        self.controllers.insert(class.into(), controller);
        self
    }

    /// Number of routes declared so far.
    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    /// Compiles every registration and freezes the table.
    pub fn build(self) -> Result<RouteTable> {
        let base_uri = normalize_base_uri(&self.base_uri)?;

        for draft in &self.drafts {
            for filter in draft.options.before.iter().chain(&draft.options.after) {
                if !self.filters.contains_key(filter) {
                    tracing::warn!(
                        filter = %filter,
                        path = %draft.path,
                        "route references an unregistered filter"
                    );
                }
            }
        }

        let definitions = self
            .drafts
            .into_iter()
            .map(|draft| RouteDefinition::compile(draft, &base_uri, &self.aliases))
            .collect::<Result<Vec<_>>>()?;

        let table = RouteTable::assemble(base_uri, definitions, self.filters, self.controllers);

        tracing::info!(
            base_uri = %table.base_uri(),
            routes = table.len(),
            prefixes = table.prefixes().len(),
            "route table frozen"
        );

        Ok(table)
    }

    /// A builder pre-loaded with every route, group and filter in `config`.
    ///
    /// Code may keep registering (controllers in particular) before building.
    pub fn from_config(config: &RouterConfig) -> Result<Self> {
        let mut builder = RouteBuilder::new()
            .with_base_uri(config.base_uri.clone())
            .with_patterns(config.patterns.clone());

        for (name, handler) in &config.filters {
            builder.filter(name.clone(), parse_handler(handler)?);
        }
        for route in &config.routes {
            builder.register_config(route)?;
        }
        for group in &config.groups {
            builder.register_group_config(group)?;
        }

        Ok(builder)
    }

    fn register_config(&mut self, route: &RouteConfig) -> Result<()> {
        let registration = match &route.link {
            Some(link) => self.link(link.clone()),
            None => {
                let handler = route
                    .handler
                    .as_deref()
                    .ok_or_else(|| RouterError::InvalidHandler(String::new()))?;
                let handler = parse_handler(handler)?;
                let mut methods = route
                    .methods
                    .iter()
                    .map(|m| m.parse::<Method>())
                    .collect::<Result<Vec<_>>>()?;
                if methods.is_empty() {
                    methods.push(Method::Get);
                }
                self.register(methods, route.paths.to_vec(), route_options(route), handler)
            }
        };

        if let Some(name) = &route.name {
            registration.name(name.clone());
        }
        Ok(())
    }

    fn register_group_config(&mut self, group: &GroupConfig) -> Result<()> {
        let mut options = RouteOptions::new()
            .hosts(group.host.to_vec())
            .before(group.before.iter().cloned())
            .after(group.after.iter().cloned());
        if let Some(prefix) = &group.prefix {
            options = options.prefix(prefix);
        }
        if let Some(scheme) = &group.scheme {
            options = options.scheme(scheme.clone());
        }

        self.push_group(options);
        for route in &group.routes {
            self.register_config(route)?;
        }
        for nested in &group.groups {
            self.register_group_config(nested)?;
        }
        self.pop_group();
        Ok(())
    }
}

/// Handle on the routes produced by the latest registration.
pub struct Registration<'a> {
    builder: &'a mut RouteBuilder,
}

impl Registration<'_> {
    pub fn name(self, name: impl Into<String>) -> Self {
        self.builder.set_name(name);
        self
    }

    pub fn host(self, host: impl Into<String>) -> Self {
        self.builder.set_host(host);
        self
    }

    pub fn hosts<I, S>(self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.builder.set_hosts(hosts);
        self
    }

    pub fn scheme(self, scheme: impl Into<String>) -> Self {
        self.builder.set_scheme(scheme);
        self
    }
}

fn route_options(route: &RouteConfig) -> RouteOptions {
    let mut options = RouteOptions::new()
        .hosts(route.host.to_vec())
        .before(route.before.iter().cloned())
        .after(route.after.iter().cloned());
    if let Some(prefix) = &route.prefix {
        options = options.prefix(prefix);
    }
    if let Some(scheme) = &route.scheme {
        options = options.scheme(scheme.clone());
    }
    options
}

fn parse_handler(descriptor: &str) -> Result<Handler> {
    descriptor
        .parse::<MethodRef>()
        .map(Handler::Method)
        .map_err(|_| RouterError::InvalidHandler(descriptor.to_string()))
}

/// Trims a trailing slash; the result is empty or an absolute path.
pub fn normalize_base_uri(base_uri: &str) -> Result<String> {
    let trimmed = base_uri.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    let malformed = !trimmed.starts_with('/')
        || trimmed.starts_with("//")
        || trimmed.chars().any(|c| matches!(c, '?' | '#' | '{' | '}' | ' '));
    if malformed {
        return Err(RouterError::InvalidBaseUri(base_uri.to_string()));
    }
    Ok(trimmed.to_string())
}
