//! Reverse routing: route name + parameters → URL.
//!
//! # Data Flow
//! ```text
//! name → RouteTable::named (most specific first)
//!     → pick variant (only one, or first whose prefix regex matches the source)
//!     → caller params, then ambient values on top: prefix captures,
//!       source scheme and host
//!     → an empty value counts as absent
//!     → substitute every {placeholder} in the reverse template
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use crate::dispatch::request::RequestUri;
use crate::error::{Result, RouterError};
use crate::routing::definition::RouteDefinition;
use crate::routing::handler::Args;
use crate::routing::pattern::{self, DEFAULT_CONSTRAINT, HOST_PARAM, SCHEME_PARAM};
use crate::routing::table::RouteTable;

/// Builds the URL of route `name` as seen from `source`.
pub fn reverse_url(table: &RouteTable, name: &str, params: &Args, source: &RequestUri) -> Result<String> {
    let routes = table.named(name);
    let route = select(routes, source).ok_or_else(|| match routes {
        [] => RouterError::UnknownRoute(name.to_string()),
        _ => RouterError::NoMatchingVariant(name.to_string()),
    })?;

    if route.is_link() {
        return Ok(route.pattern().to_string());
    }

    let values = ambient_values(route, source, params)?;
    substitute(route, &values)
}

/// The route to reverse: the only one, or the first whose prefix matches.
fn select<'a>(routes: &'a [Arc<RouteDefinition>], source: &RequestUri) -> Option<&'a Arc<RouteDefinition>> {
    match routes {
        [only] => Some(only),
        routes => routes
            .iter()
            .find(|route| route.prefix_regex().is_match(source.subject())),
    }
}

fn ambient_values(route: &RouteDefinition, source: &RequestUri, params: &Args) -> Result<HashMap<String, String>> {
    let mut values = HashMap::new();

    for (name, value) in params.iter() {
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => continue,
            other => {
                return Err(RouterError::InvalidParameter {
                    name: name.clone(),
                    value: other.to_string(),
                })
            }
        };
        values.insert(name.clone(), text);
    }

    // Values recovered from the source URL take precedence over params.
    if let Some(caps) = route.prefix_regex().captures(source.subject()) {
        for name in route.prefix_regex().capture_names().flatten() {
            if let Some(m) = caps.name(name) {
                values.insert(name.to_string(), m.as_str().to_string());
            }
        }
    }

    if source.is_absolute() {
        values.insert(SCHEME_PARAM.to_string(), source.scheme.clone());
        let host = source.authority();
        let host = match route.hosts() {
            // An alternation keeps the requesting host when it is listed.
            [_, _, ..] if !route.hosts().contains(&source.host) && !route.hosts().contains(&host) => {
                route.hosts()[0].clone()
            }
            _ => host,
        };
        values.insert(HOST_PARAM.to_string(), host);
    }

    Ok(values)
}

fn substitute(route: &RouteDefinition, values: &HashMap<String, String>) -> Result<String> {
    let template = route.reverse();
    let mut url = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        url.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after.find('}').ok_or_else(|| RouterError::InvalidPattern {
            pattern: template.to_string(),
            reason: "unclosed placeholder in reverse template".to_string(),
        })?;
        let name = &after[..close];
        url.push_str(&resolve(route, name, values)?);
        rest = &after[close + 1..];
    }
    url.push_str(rest);

    Ok(url)
}

fn resolve(route: &RouteDefinition, name: &str, values: &HashMap<String, String>) -> Result<String> {
    if name == SCHEME_PARAM || name == HOST_PARAM {
        return values
            .get(name)
            .filter(|v| !v.is_empty())
            .cloned()
            .ok_or_else(|| RouterError::MissingParameter(name.to_string()));
    }

    let constraint = route
        .parameter(name)
        .and_then(|p| p.constraint.as_deref());

    match values.get(name).filter(|v| !v.is_empty()) {
        Some(value) => {
            let check = constraint.unwrap_or(DEFAULT_CONSTRAINT);
            let anchored = Regex::new(&format!("^(?:{})$", check)).map_err(|e| RouterError::InvalidPattern {
                pattern: check.to_string(),
                reason: e.to_string(),
            })?;
            if anchored.is_match(value) {
                Ok(value.clone())
            } else {
                Err(RouterError::InvalidParameter {
                    name: name.to_string(),
                    value: value.clone(),
                })
            }
        }
        None => match constraint {
            Some(literal) if pattern::is_literal(literal) => Ok(literal.to_string()),
            _ => Err(RouterError::MissingParameter(name.to_string())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::builder::RouteBuilder;
    use crate::routing::group::RouteOptions;
    use crate::routing::handler::Handler;
    use serde_json::json;

    fn noop() -> Handler {
        Handler::func(|_| Value::Null)
    }

    fn table() -> RouteTable {
        let mut b = RouteBuilder::new();
        b.get("/viewitem/{id:[0-9]+}/", noop()).name("viewitem").scheme("https");
        b.get("/page/{lang:en}/{slug}", noop()).name("page");
        b.get("/multi/", noop()).name("multi").hosts(["a.dev", "b.dev"]);
        b.group(RouteOptions::new().prefix("en"), |b| {
            b.get("/", noop()).name("home");
        });
        b.group(RouteOptions::new().prefix("es"), |b| {
            b.get("/", noop()).name("home");
        });
        b.get("/", noop()).name("home");
        b.build().unwrap()
    }

    fn reverse(name: &str, params: serde_json::Value, source: &str) -> Result<String> {
        let params: Args = match params {
            Value::Object(map) => map.into(),
            _ => Args::new(),
        };
        reverse_url(&table(), name, &params, &RequestUri::parse(source))
    }

    #[test]
    fn test_pinned_scheme_wins_over_source() {
        assert_eq!(
            reverse("viewitem", json!({"id": 65}), "http://routes.dev").unwrap(),
            "https://routes.dev/viewitem/65/"
        );
    }

    #[test]
    fn test_invalid_value_rejected() {
        let err = reverse("viewitem", json!({"id": "re"}), "http://routes.dev").unwrap_err();
        assert!(matches!(err, RouterError::InvalidParameter { .. }));
    }

    #[test]
    fn test_literal_constraint_fallback() {
        assert_eq!(
            reverse("page", json!({"slug": "about"}), "http://h").unwrap(),
            "http://h/page/en/about"
        );
        let err = reverse("page", json!({}), "http://h").unwrap_err();
        assert!(matches!(err, RouterError::MissingParameter(ref n) if n == "slug"));
    }

    #[test]
    fn test_empty_value_counts_as_absent() {
        assert_eq!(
            reverse("page", json!({"lang": "", "slug": "about"}), "http://h").unwrap(),
            "http://h/page/en/about"
        );
        let err = reverse("viewitem", json!({"id": ""}), "http://routes.dev").unwrap_err();
        assert!(matches!(err, RouterError::MissingParameter(ref n) if n == "id"));
    }

    #[test]
    fn test_variant_by_source_prefix() {
        assert_eq!(reverse("home", json!({}), "http://h/en/x").unwrap(), "http://h/en/");
        assert_eq!(reverse("home", json!({}), "http://h/es").unwrap(), "http://h/es/");
        assert_eq!(reverse("home", json!({}), "http://h/fr/x").unwrap(), "http://h/");
    }

    #[test]
    fn test_multi_host_keeps_listed_source_host() {
        assert_eq!(reverse("multi", json!({}), "http://b.dev/x").unwrap(), "http://b.dev/multi/");
        assert_eq!(reverse("multi", json!({}), "http://c.dev/x").unwrap(), "http://a.dev/multi/");
    }

    #[test]
    fn test_unknown_name() {
        let err = reverse("nope", json!({}), "http://h").unwrap_err();
        assert!(matches!(err, RouterError::UnknownRoute(_)));
    }

    #[test]
    fn test_relative_source_cannot_fill_host() {
        let err = reverse("page", json!({"slug": "x"}), "/page").unwrap_err();
        assert!(matches!(err, RouterError::MissingParameter(ref n) if n == "_scheme"));
    }
}
