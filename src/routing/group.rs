//! Nested option scopes.
//!
//! # Responsibilities
//! - Hold the options a registration inherits (prefix, host, scheme, filters)
//! - Compose nested scopes: prefixes and filter lists concatenate, host and
//!   scheme are overridden by the innermost declaration
//! - Separate dynamic prefix segments (`{lang}`) from the static prefix

use serde::Serialize;

/// Options contributed by a group scope or a single registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouteOptions {
    /// Prefix segments, outermost first.
    pub prefix: Vec<String>,
    /// Pinned hosts; empty means any host.
    pub hosts: Vec<String>,
    /// Pinned scheme; `None` means any scheme.
    pub scheme: Option<String>,
    /// Before filter names, run in order.
    pub before: Vec<String>,
    /// After filter names, run in order.
    pub after: Vec<String>,
}

impl RouteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends prefix segments; `"a/b"` contributes two segments.
    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix.extend(split_segments(prefix));
        self
    }

    pub fn prefix_segments<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for segment in segments {
            self.prefix.extend(split_segments(segment.as_ref()));
        }
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.hosts = vec![host.into()];
        self
    }

    pub fn hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    pub fn before<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.before.extend(filters.into_iter().map(Into::into));
        self
    }

    pub fn after<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.after.extend(filters.into_iter().map(Into::into));
        self
    }

    /// Composes `child` inside `self`.
    pub fn merge(&self, child: &RouteOptions) -> RouteOptions {
        RouteOptions {
            prefix: self.prefix.iter().chain(&child.prefix).cloned().collect(),
            hosts: if child.hosts.is_empty() {
                self.hosts.clone()
            } else {
                child.hosts.clone()
            },
            scheme: child.scheme.clone().or_else(|| self.scheme.clone()),
            before: self.before.iter().chain(&child.before).cloned().collect(),
            after: self.after.iter().chain(&child.after).cloned().collect(),
        }
    }

    /// Static prefix segments joined with `/`, without leading or trailing slash.
    pub fn static_prefix(&self) -> String {
        self.prefix
            .iter()
            .filter(|segment| !is_dynamic(segment))
            .cloned()
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Parameterized prefix segments, prepended to single-path registrations.
    pub fn uri_appends(&self) -> Vec<String> {
        self.prefix
            .iter()
            .filter(|segment| is_dynamic(segment))
            .cloned()
            .collect()
    }
}

fn is_dynamic(segment: &str) -> bool {
    segment.contains('{')
}

fn split_segments(prefix: &str) -> impl Iterator<Item = String> + '_ {
    prefix
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Stack of merged option frames, one per open group.
#[derive(Debug, Clone, Default)]
pub struct GroupStack {
    frames: Vec<RouteOptions>,
}

impl GroupStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a scope whose frame is the merge of the current top and `options`.
    pub fn push(&mut self, options: RouteOptions) {
        let frame = self.current().merge(&options);
        self.frames.push(frame);
    }

    /// Closes the innermost scope; closing with no open scope is a no-op.
    pub fn pop(&mut self) -> Option<RouteOptions> {
        self.frames.pop()
    }

    /// Options in effect for the next registration.
    pub fn current(&self) -> RouteOptions {
        self.frames.last().cloned().unwrap_or_default()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes_concatenate() {
        let mut stack = GroupStack::new();
        stack.push(RouteOptions::new().prefix("a"));
        stack.push(RouteOptions::new().prefix("/b/"));
        assert_eq!(stack.current().static_prefix(), "a/b");

        stack.pop();
        assert_eq!(stack.current().static_prefix(), "a");
        stack.pop();
        assert_eq!(stack.current(), RouteOptions::default());
    }

    #[test]
    fn test_innermost_host_and_scheme_win() {
        let mut stack = GroupStack::new();
        stack.push(RouteOptions::new().host("outer.dev").scheme("http"));
        stack.push(RouteOptions::new().host("inner.dev"));

        let options = stack.current();
        assert_eq!(options.hosts, vec!["inner.dev"]);
        assert_eq!(options.scheme.as_deref(), Some("http"));
    }

    #[test]
    fn test_filters_run_parent_first() {
        let mut stack = GroupStack::new();
        stack.push(RouteOptions::new().before(["auth"]).after(["log"]));
        stack.push(RouteOptions::new().before(["admin"]).after(["audit"]));

        let options = stack.current();
        assert_eq!(options.before, vec!["auth", "admin"]);
        assert_eq!(options.after, vec!["log", "audit"]);
    }

    #[test]
    fn test_dynamic_prefix_becomes_uri_append() {
        let options = RouteOptions::new().prefix_segments(["{lang:en|es}", "shop"]);
        assert_eq!(options.static_prefix(), "shop");
        assert_eq!(options.uri_appends(), vec!["{lang:en|es}"]);
    }
}
