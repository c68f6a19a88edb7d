//! Request-time dispatch.
//!
//! # Responsibilities
//! - Match (method, URL) against the frozen table, first match wins
//! - Fall back to the ERROR bucket before giving up
//! - Run the before chain, the handler, then the after chain
//! - Resolve `Class@method` handlers through controllers or a [`Resolver`]
//! - Generate URLs from route names
//!
//! # Design Decisions
//! - The table is shared (`Arc`); the only per-instance state is the last
//!   matched route and URL, so concurrent callers each clone a dispatcher
//! - A [`Resolver`] may turn not-found/not-allowed/not-exist failures into a
//!   response; filter contract violations always propagate

use std::sync::Arc;
use std::time::Instant;

use regex::Regex;

use crate::dispatch::filters::{self, BeforeOutcome};
use crate::dispatch::request::{RequestParts, RequestUri};
use crate::dispatch::reverse;
use crate::error::{ErrorKind, Result, RouterError};
use crate::observability::metrics;
use crate::routing::definition::RouteDefinition;
use crate::routing::handler::{Action, Args, Handler, MethodRef, Response};
use crate::routing::method::Method;
use crate::routing::table::RouteTable;

/// Argument carrying the parsed request URL.
pub const REQUEST_URI_ARG: &str = "_requesturi";
/// Argument carrying the matched route's static prefix.
pub const PREFIX_ARG: &str = "_prefix";

/// Host-provided hook for handler construction and error pages.
pub trait Resolver: Send + Sync {
    /// Turns a `Class@method` descriptor into something callable.
    fn resolve(&self, method: &MethodRef) -> Option<Action>;

    /// Whether [`resolve_errors`](Self::resolve_errors) should be consulted.
    fn parse_errors(&self) -> bool {
        false
    }

    /// Produces the response for a resolvable failure.
    fn resolve_errors(&self, kind: ErrorKind, request: &RequestParts) -> Response {
        let _ = request;
        serde_json::json!({ "error": kind.as_str(), "status": kind.status_code() })
    }
}

/// Matches requests against a [`RouteTable`] and runs the winning route.
#[derive(Clone)]
pub struct Dispatcher {
    table: Arc<RouteTable>,
    resolver: Option<Arc<dyn Resolver>>,
    last_route: Option<Arc<RouteDefinition>>,
    last_url: Option<String>,
}

impl Dispatcher {
    pub fn new(table: Arc<RouteTable>) -> Self {
        Self {
            table,
            resolver: None,
            last_route: None,
            last_url: None,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn table(&self) -> &Arc<RouteTable> {
        &self.table
    }

    /// The route matched by the latest successful match on this instance.
    pub fn last_matched_route(&self) -> Option<&Arc<RouteDefinition>> {
        self.last_route.as_ref()
    }

    /// Dispatches one request and returns the handler's (or a filter's) response.
    pub fn dispatch(&mut self, method: &str, url: &str) -> Result<Response> {
        let started = Instant::now();
        let result = self.run(method, url);

        let (result, outcome) = match result {
            Ok(response) => (Ok(response), "ok"),
            Err(err) => match &self.resolver {
                Some(resolver) if resolver.parse_errors() && err.kind().is_resolvable() => {
                    tracing::debug!(error = %err, "dispatch failure handed to resolver");
                    let parts = RequestParts::new(method, url);
                    (Ok(resolver.resolve_errors(err.kind(), &parts)), "resolved")
                }
                _ => {
                    let outcome = err.kind().as_str();
                    (Err(err), outcome)
                }
            },
        };

        let label = Method::from_request(method)
            .map(Method::as_str)
            .unwrap_or("UNKNOWN");
        metrics::record_dispatch(label, outcome, started.elapsed());

        result
    }

    fn run(&mut self, verb: &str, url: &str) -> Result<Response> {
        self.last_url = Some(url.to_string());
        let method = Method::from_request(verb).inspect_err(|_| {
            tracing::warn!(method = %verb, url = %url, "method not allowed");
        })?;
        let uri = RequestUri::parse(url);

        let (route, mut args) = self.find(method, &uri).ok_or_else(|| {
            tracing::warn!(method = %method, url = %url, "no route matched");
            RouterError::RouteNotFound {
                url: url.to_string(),
            }
        })?;

        tracing::debug!(
            method = %method,
            url = %url,
            route = %route.pattern(),
            name = route.name().unwrap_or(""),
            "route matched"
        );

        args.insert(REQUEST_URI_ARG, uri.to_value());
        args.insert(PREFIX_ARG, route.prefix());
        self.last_route = Some(Arc::clone(&route));

        let outcome = filters::run_before(route.before(), &mut args, |name, args| self.call_filter(name, args))?;
        if let BeforeOutcome::ShortCircuit(response) = outcome {
            return Ok(response);
        }

        let response = self.invoke(route.handler(), &args)?;
        filters::run_after(route.after(), &args, |name, args| self.call_filter(name, args))?;

        Ok(response)
    }

    /// First route whose regex matches; the ERROR bucket is probed with the
    /// unanchored-end variant only when nothing else matched.
    fn find(&self, method: Method, uri: &RequestUri) -> Option<(Arc<RouteDefinition>, Args)> {
        let subject = uri.subject();

        let hit = self
            .table
            .candidates(method)
            .find_map(|route| captures(route.regex(), subject).map(|args| (route, args)))
            .or_else(|| {
                self.table
                    .error_routes()
                    .iter()
                    .find_map(|route| captures(route.relaxed_regex(), subject).map(|args| (route, args)))
            });

        hit.map(|(route, args)| (Arc::clone(route), args))
    }

    fn call_filter(&self, name: &str, args: &Args) -> Result<Response> {
        let handler = self
            .table
            .filter(name)
            .ok_or_else(|| RouterError::UnknownFilter(name.to_string()))?;
        self.invoke(handler, args)
    }

    fn invoke(&self, handler: &Handler, args: &Args) -> Result<Response> {
        match handler {
            Handler::Action(action) => Ok(action.call(args)),
            Handler::Method(method) => {
                let missing = || RouterError::MethodNotExist {
                    class: method.class.clone(),
                    method: method.method.clone(),
                };

                if let Some(controller) = self.table.controller(&method.class) {
                    if !controller.has_method(&method.method) {
                        return Err(missing());
                    }
                    return Ok(controller.invoke(&method.method, args));
                }

                let action = self
                    .resolver
                    .as_ref()
                    .and_then(|resolver| resolver.resolve(method))
                    .ok_or_else(missing)?;
                Ok(action.call(args))
            }
        }
    }

    /// URL of route `name`, resolved against `source` or, when absent, the
    /// last dispatched URL. Fails when neither is known.
    pub fn reverse_url(&self, name: &str, params: &Args, source: Option<&str>) -> Result<String> {
        let source = source
            .or(self.last_url.as_deref())
            .ok_or_else(|| RouterError::NoSourceUrl(name.to_string()))?;
        reverse::reverse_url(&self.table, name, params, &RequestUri::parse(source))
    }
}

fn captures(regex: &Regex, subject: &str) -> Option<Args> {
    let caps = regex.captures(subject)?;
    let mut args = Args::new();
    for name in regex.capture_names().flatten() {
        if let Some(m) = caps.name(name) {
            args.insert(name, m.as_str());
        }
    }
    Some(args)
}
