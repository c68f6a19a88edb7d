//! Compiled routes.
//!
//! # Responsibilities
//! - Turn one declared path plus its merged options into three artifacts:
//!   a full-match regex, a prefix-match regex and a reverse template
//! - Record per-parameter constraints for reverse validation
//! - Expose the specificity key used to order route lists
//!
//! # Design Decisions
//! - Matchers run against `scheme://host/path`, so scheme and host pins are
//!   part of the regex rather than separate checks
//! - A trailing slash is always tolerated at match time; a declared trailing
//!   slash is kept when generating URLs
//! - Definitions are immutable once compiled and shared behind `Arc`

use std::cmp::Ordering;
use std::collections::BTreeMap;

use regex::Regex;
use serde::Serialize;

use crate::error::RouterError;
use crate::routing::group::RouteOptions;
use crate::routing::handler::Handler;
use crate::routing::method::Method;
use crate::routing::pattern::{self, Token, HOST_PARAM, SCHEME_PARAM};

/// A route as declared, before compilation.
#[derive(Debug, Clone)]
pub struct RouteDraft {
    pub methods: Vec<Method>,
    pub path: String,
    pub options: RouteOptions,
    pub handler: Handler,
    pub name: Option<String>,
    /// One of several sibling paths sharing a single registration.
    pub grouped: bool,
}

/// A placeholder and its constraint (`None` for a bare `{name}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub constraint: Option<String>,
}

/// Composite ordering key: more specific routes sort first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Specificity {
    pub scheme_fixed: bool,
    pub host_fixed: bool,
    /// Segments of the prefix key; a prefixed variant outranks an open one.
    pub prefix_segments: usize,
    pub segments: usize,
    pub params: usize,
}

impl Ord for Specificity {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.scheme_fixed, other.host_fixed, other.prefix_segments, other.segments)
            .cmp(&(self.scheme_fixed, self.host_fixed, self.prefix_segments, self.segments))
            .then(self.params.cmp(&other.params))
    }
}

impl PartialOrd for Specificity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A compiled, immutable route.
#[derive(Debug, Clone)]
pub struct RouteDefinition {
    pattern: String,
    uri: String,
    regex: Regex,
    relaxed: Regex,
    prefix_regex: Regex,
    reverse: String,
    parameters: Vec<Parameter>,
    methods: Vec<Method>,
    name: Option<String>,
    scheme: Option<String>,
    hosts: Vec<String>,
    prefix: String,
    before: Vec<String>,
    after: Vec<String>,
    handler: Handler,
    grouped: bool,
    specificity: Specificity,
}

impl RouteDefinition {
    /// Compiles `draft` under `base_uri`, resolving named constraint aliases.
    pub fn compile(
        draft: RouteDraft,
        base_uri: &str,
        aliases: &BTreeMap<String, String>,
    ) -> Result<Self, RouterError> {
        let options = &draft.options;
        let prefix = options.static_prefix();
        let appends = options.uri_appends();

        let mut path = draft.path.trim().to_string();
        if !path.starts_with('/') {
            path.insert(0, '/');
        }
        // Dynamic prefix segments only apply to single-path registrations;
        // grouped siblings spell out their own ambient segment.
        if !appends.is_empty() && !draft.grouped {
            path = format!("/{}{}", appends.join("/"), path);
        }

        let close_tag = path.ends_with('/');
        let route_path = path.strip_suffix('/').unwrap_or(&path).to_string();

        let mut base = base_uri.to_string();
        if !prefix.is_empty() {
            base.push('/');
            base.push_str(&prefix);
        }
        let uri = format!("{}{}", base, route_path);

        let tokens = pattern::tokenize(&uri, aliases)?;

        // The prefix key covers base, static prefix and ambient segments: the
        // queued appends for single paths, the first own segment for grouped
        // siblings.
        let mut key = base;
        if !appends.is_empty() && !draft.grouped {
            key.push('/');
            key.push_str(&appends.join("/"));
        }
        if draft.grouped {
            let own: Vec<&str> = route_path.split('/').filter(|s| !s.is_empty()).collect();
            if own.len() > 1 {
                key.push('/');
                key.push_str(own[0]);
            }
        }
        let prefix_segments = key.split('/').filter(|s| !s.is_empty()).count();
        // Constraints for ambient segments come from the full path.
        let key_tokens = with_constraints(pattern::tokenize(&key, &BTreeMap::new())?, &tokens);

        let scheme = options.scheme.clone().filter(|s| !s.is_empty());
        let hosts = options.hosts.clone();
        let head = format!(
            "{}://{}",
            pattern::scheme_regex(scheme.as_deref()),
            pattern::host_regex(&hosts)
        );
        let body = pattern::render_regex(&tokens);

        let regex = build_regex(&draft.path, &format!("^{}{}/?$", head, body))?;
        let relaxed = build_regex(&draft.path, &format!("^{}{}/?", head, body))?;
        let prefix_regex = build_regex(
            &draft.path,
            &format!("^{}{}(?:/|$)", head, pattern::render_regex(&key_tokens)),
        )?;

        let reverse_head = format!(
            "{}://{}",
            scheme.clone().unwrap_or_else(|| format!("{{{}}}", SCHEME_PARAM)),
            match hosts.as_slice() {
                [host] => host.clone(),
                _ => format!("{{{}}}", HOST_PARAM),
            }
        );
        let mut reverse = format!("{}{}", reverse_head, pattern::render_template(&tokens));
        if close_tag {
            reverse.push('/');
        }

        let parameters: Vec<Parameter> = tokens
            .iter()
            .filter_map(|token| match token {
                Token::Param { name, constraint } => Some(Parameter {
                    name: name.clone(),
                    constraint: constraint.clone(),
                }),
                Token::Literal(_) => None,
            })
            .collect();

        let specificity = Specificity {
            scheme_fixed: scheme.is_some(),
            host_fixed: !hosts.is_empty(),
            prefix_segments,
            segments: uri.split('/').filter(|s| !s.is_empty()).count(),
            params: pattern::param_count(&tokens),
        };

        Ok(Self {
            pattern: draft.path,
            uri,
            regex,
            relaxed,
            prefix_regex,
            reverse,
            parameters,
            methods: draft.methods,
            name: draft.name,
            scheme,
            hosts,
            prefix,
            before: options.before.clone(),
            after: options.after.clone(),
            handler: draft.handler,
            grouped: draft.grouped,
            specificity,
        })
    }

    /// The path exactly as declared.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Full path template (base URI, prefix, path), constraints intact.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Full-match regex without the end anchor, used for the ERROR bucket.
    pub fn relaxed_regex(&self) -> &Regex {
        &self.relaxed
    }

    pub fn prefix_regex(&self) -> &Regex {
        &self.prefix_regex
    }

    /// URL template with constraints stripped.
    pub fn reverse(&self) -> &str {
        &self.reverse
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Static prefix, as handed to handlers under `_prefix`.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn before(&self) -> &[String] {
        &self.before
    }

    pub fn after(&self) -> &[String] {
        &self.after
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn is_grouped(&self) -> bool {
        self.grouped
    }

    pub fn is_link(&self) -> bool {
        self.methods.contains(&Method::Link)
    }

    pub fn specificity(&self) -> Specificity {
        self.specificity
    }

    /// Serializable description of this route.
    pub fn info(&self) -> RouteInfo {
        RouteInfo {
            methods: self.methods.clone(),
            name: self.name.clone(),
            pattern: self.pattern.clone(),
            uri: self.uri.clone(),
            regex: self.regex.as_str().to_string(),
            prefix_regex: self.prefix_regex.as_str().to_string(),
            reverse: self.reverse.clone(),
            parameters: self.parameters.clone(),
            scheme: self.scheme.clone(),
            hosts: self.hosts.clone(),
            prefix: self.prefix.clone(),
            before: self.before.clone(),
            after: self.after.clone(),
            handler: self.handler.describe(),
            grouped: self.grouped,
        }
    }
}

/// Copies constraints from `source` onto same-named placeholders in `tokens`.
fn with_constraints(tokens: Vec<Token>, source: &[Token]) -> Vec<Token> {
    tokens
        .into_iter()
        .map(|token| match token {
            Token::Param { name, constraint } => {
                let constraint = source
                    .iter()
                    .find_map(|t| match t {
                        Token::Param { name: n, constraint: c } if *n == name => Some(c.clone()),
                        _ => None,
                    })
                    .unwrap_or(constraint);
                Token::Param { name, constraint }
            }
            literal => literal,
        })
        .collect()
}

fn build_regex(pattern: &str, source: &str) -> Result<Regex, RouterError> {
    Regex::new(source).map_err(|e| RouterError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// Descriptor of a compiled route, for manifests and introspection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteInfo {
    pub methods: Vec<Method>,
    pub name: Option<String>,
    pub pattern: String,
    pub uri: String,
    pub regex: String,
    pub prefix_regex: String,
    pub reverse: String,
    pub parameters: Vec<Parameter>,
    pub scheme: Option<String>,
    pub hosts: Vec<String>,
    pub prefix: String,
    pub before: Vec<String>,
    pub after: Vec<String>,
    pub handler: String,
    pub grouped: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn draft(path: &str, options: RouteOptions) -> RouteDraft {
        RouteDraft {
            methods: vec![Method::Get],
            path: path.to_string(),
            options,
            handler: Handler::func(|_| Value::Null),
            name: None,
            grouped: false,
        }
    }

    fn compile(path: &str, options: RouteOptions) -> RouteDefinition {
        RouteDefinition::compile(draft(path, options), "", &BTreeMap::new()).unwrap()
    }

    #[test]
    fn test_full_regex_binds_params() {
        let route = compile("/item/{id:[0-9]+}", RouteOptions::new());
        let caps = route.regex().captures("http://routes.dev/item/43").unwrap();
        assert_eq!(&caps["id"], "43");
        assert_eq!(&caps["_scheme"], "http");
        assert_eq!(&caps["_host"], "routes.dev");
        assert!(route.regex().is_match("http://routes.dev/item/43/"));
        assert!(!route.regex().is_match("http://routes.dev/item/abc"));
    }

    #[test]
    fn test_trailing_slash_tolerance() {
        let route = compile("/items/", RouteOptions::new());
        assert!(route.regex().is_match("http://routes.dev/items"));
        assert!(route.regex().is_match("http://routes.dev/items/"));
        assert_eq!(route.reverse(), "{_scheme}://{_host}/items/");
    }

    #[test]
    fn test_index_route() {
        let route = compile("/", RouteOptions::new());
        assert!(route.regex().is_match("http://routes.dev"));
        assert!(route.regex().is_match("http://routes.dev/"));
        assert!(!route.regex().is_match("http://routes.dev/x"));
        assert_eq!(route.reverse(), "{_scheme}://{_host}/");
    }

    #[test]
    fn test_pinned_scheme_and_host() {
        let options = RouteOptions::new().scheme("https").host("routes2.dev");
        let route = compile("/viewitem/{id:[0-9]+}/", options);
        assert!(route.regex().is_match("https://routes2.dev/viewitem/65"));
        assert!(!route.regex().is_match("http://routes2.dev/viewitem/65"));
        assert!(!route.regex().is_match("https://routes2xdev/viewitem/65"));
        assert_eq!(route.reverse(), "https://routes2.dev/viewitem/{id}/");
    }

    #[test]
    fn test_prefix_regex_stops_at_segment_boundary() {
        let route = compile("/", RouteOptions::new().prefix("en"));
        assert_eq!(route.uri(), "/en");
        assert!(route.prefix_regex().is_match("http://routes.dev/en/demo"));
        assert!(route.prefix_regex().is_match("http://routes.dev/en"));
        assert!(!route.prefix_regex().is_match("http://routes.dev/enx"));
    }

    #[test]
    fn test_dynamic_prefix_is_part_of_path_and_key() {
        let options = RouteOptions::new().prefix_segments(["{lang:en|es}", "shop"]);
        let route = compile("/cart", options);
        assert_eq!(route.uri(), "/shop/{lang:en|es}/cart");
        assert_eq!(route.prefix(), "shop");

        let caps = route.prefix_regex().captures("http://h/shop/es/anything").unwrap();
        assert_eq!(&caps["lang"], "es");
    }

    #[test]
    fn test_grouped_key_includes_first_segment() {
        let mut d = draft("/en/group/", RouteOptions::new());
        d.grouped = true;
        let route = RouteDefinition::compile(d, "", &BTreeMap::new()).unwrap();
        assert!(route.prefix_regex().is_match("http://h/en/other"));
        assert!(!route.prefix_regex().is_match("http://h/fr/other"));
    }

    #[test]
    fn test_bad_constraint_is_rejected() {
        let result = RouteDefinition::compile(draft("/x/{id:[0-9}", RouteOptions::new()), "", &BTreeMap::new());
        assert!(matches!(result, Err(RouterError::InvalidPattern { .. })));
    }

    #[test]
    fn test_specificity_ordering() {
        let pinned = compile("/itemsr/", RouteOptions::new().host("routes2.dev")).specificity();
        let open = compile("/itemsr/", RouteOptions::new()).specificity();
        let deep = compile("/a/b/c", RouteOptions::new()).specificity();
        let param = compile("/a/{b}/c", RouteOptions::new()).specificity();

        assert!(pinned < open);
        assert!(deep < param);
        assert!(param < open);
    }

    #[test]
    fn test_prefixed_variant_outranks_open_route() {
        let open = compile("/home/", RouteOptions::new()).specificity();
        let prefixed = compile("/", RouteOptions::new().prefix("en")).specificity();

        assert_eq!(open.segments, prefixed.segments);
        assert!(prefixed < open);
    }
}
