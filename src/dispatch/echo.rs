//! A resolver for manifests served without application code.
//!
//! Every `Class@method` descriptor resolves to an action that reports which
//! handler was reached and with which arguments. The binaries use it to
//! serve or probe a route manifest before any controller exists.

use serde_json::{json, Value};

use crate::dispatch::dispatcher::{Resolver, REQUEST_URI_ARG};
use crate::dispatch::request::RequestParts;
use crate::error::ErrorKind;
use crate::routing::handler::{Action, MethodRef, Response};

#[derive(Debug, Clone, Default)]
pub struct EchoResolver {
    intercept_errors: bool,
}

impl EchoResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer not-found/not-allowed/not-exist with an error document
    /// instead of failing the dispatch.
    pub fn intercept_errors(mut self, enabled: bool) -> Self {
        self.intercept_errors = enabled;
        self
    }
}

impl Resolver for EchoResolver {
    fn resolve(&self, method: &MethodRef) -> Option<Action> {
        let handler = method.to_string();
        Some(Action::mapping(move |args| {
            let mut args = args.as_map().clone();
            args.remove(REQUEST_URI_ARG);
            json!({ "handler": handler, "args": Value::Object(args) })
        }))
    }

    fn parse_errors(&self) -> bool {
        self.intercept_errors
    }

    fn resolve_errors(&self, kind: ErrorKind, request: &RequestParts) -> Response {
        json!({
            "error": kind,
            "status": kind.status_code(),
            "method": request.method,
            "url": request.url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::handler::Args;

    #[test]
    fn test_echoes_handler_and_args() {
        let action = EchoResolver::new().resolve(&MethodRef::new("Items", "show")).unwrap();
        let args: Args = [("id", json!("4")), (REQUEST_URI_ARG, json!({}))].into_iter().collect();

        assert_eq!(action.call(&args), json!({"handler": "Items@show", "args": {"id": "4"}}));
    }

    #[test]
    fn test_error_document() {
        let resolver = EchoResolver::new().intercept_errors(true);
        assert!(resolver.parse_errors());

        let doc = resolver.resolve_errors(ErrorKind::RouteNotFound, &RequestParts::new("get", "http://h/x"));
        assert_eq!(doc["status"], 404);
        assert_eq!(doc["method"], "GET");
        assert_eq!(doc["error"], "route_not_found");
    }
}
