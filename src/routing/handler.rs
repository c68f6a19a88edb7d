//! Handler capabilities and the argument mapping they receive.
//!
//! # Design Decisions
//! - No reflection: a handler either takes the whole [`Args`] mapping, or
//!   declares its parameter names up front and receives positional values.
//! - Class+method descriptors ([`MethodRef`]) are resolved at dispatch time,
//!   against registered [`Controller`]s or an external resolver.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

/// Whatever a handler or filter produces.
pub type Response = Value;

/// Named arguments handed to handlers and filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Args(Map<String, Value>);

impl Args {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// String view of an argument; numbers and booleans are not coerced.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    /// Later entries win.
    pub fn merge(&mut self, other: Map<String, Value>) {
        self.0.extend(other);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Args {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Args {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A declared handler parameter: `"id"` or `"page=1"`.
///
/// Defaults are parsed as JSON when possible (`page=1` yields a number),
/// otherwise kept as a string.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub name: String,
    pub default: Option<Value>,
}

impl ParamDecl {
    pub fn parse(decl: &str) -> Self {
        match decl.split_once('=') {
            Some((name, default)) => Self {
                name: name.trim().to_string(),
                default: Some(
                    serde_json::from_str(default.trim())
                        .unwrap_or_else(|_| Value::String(default.trim().to_string())),
                ),
            },
            None => Self {
                name: decl.trim().to_string(),
                default: None,
            },
        }
    }
}

type MappingFn = dyn Fn(&Args) -> Response + Send + Sync;
type PositionalFn = dyn Fn(&[Value]) -> Response + Send + Sync;

/// A directly invokable handler.
#[derive(Clone)]
pub enum Action {
    /// Receives the full argument mapping.
    Mapping(Arc<MappingFn>),
    /// Receives one value per declared parameter, in declaration order.
    Positional {
        params: Arc<[ParamDecl]>,
        call: Arc<PositionalFn>,
    },
}

impl Action {
    pub fn mapping<F, R>(f: F) -> Self
    where
        F: Fn(&Args) -> R + Send + Sync + 'static,
        R: Into<Value>,
    {
        Action::Mapping(Arc::new(move |args| f(args).into()))
    }

    pub fn positional<I, S, F, R>(params: I, f: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&[Value]) -> R + Send + Sync + 'static,
        R: Into<Value>,
    {
        let params: Vec<ParamDecl> = params.into_iter().map(|p| ParamDecl::parse(p.as_ref())).collect();
        Action::Positional {
            params: params.into(),
            call: Arc::new(move |values| f(values).into()),
        }
    }

    pub fn call(&self, args: &Args) -> Response {
        match self {
            Action::Mapping(f) => f(args),
            Action::Positional { params, call } => call(&project(params, args)),
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Mapping(_) => f.write_str("Action::Mapping"),
            Action::Positional { params, .. } => f
                .debug_struct("Action::Positional")
                .field("params", params)
                .finish(),
        }
    }
}

/// Projects the mapping onto declared parameters.
///
/// A present, non-null value wins; otherwise the declared default; otherwise
/// null. Entries with no matching parameter are ignored.
pub fn project(params: &[ParamDecl], args: &Args) -> Vec<Value> {
    params
        .iter()
        .map(|param| match args.get(&param.name) {
            Some(value) if !value.is_null() => value.clone(),
            _ => param.default.clone().unwrap_or(Value::Null),
        })
        .collect()
}

/// A class+method capability descriptor, written `Class@method`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MethodRef {
    pub class: String,
    pub method: String,
}

impl MethodRef {
    pub fn new(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            method: method.into(),
        }
    }
}

impl FromStr for MethodRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (class, method) = s
            .split_once('@')
            .or_else(|| s.split_once("::"))
            .ok_or_else(|| format!("handler {:?} must be written Class@method", s))?;
        if class.is_empty() || method.is_empty() {
            return Err(format!("handler {:?} must be written Class@method", s));
        }
        Ok(Self::new(class, method))
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.class, self.method)
    }
}

/// What a route or filter runs.
#[derive(Debug, Clone)]
pub enum Handler {
    Action(Action),
    Method(MethodRef),
}

impl Handler {
    /// Shorthand for a mapping handler.
    pub fn func<F, R>(f: F) -> Self
    where
        F: Fn(&Args) -> R + Send + Sync + 'static,
        R: Into<Value>,
    {
        Handler::Action(Action::mapping(f))
    }

    pub fn method(class: impl Into<String>, method: impl Into<String>) -> Self {
        Handler::Method(MethodRef::new(class, method))
    }

    /// Human-readable form used in manifests and logs.
    pub fn describe(&self) -> String {
        match self {
            Handler::Action(Action::Mapping(_)) => "<closure>".to_string(),
            Handler::Action(Action::Positional { params, .. }) => {
                let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
                format!("<closure({})>", names.join(", "))
            }
            Handler::Method(method) => method.to_string(),
        }
    }
}

impl From<Action> for Handler {
    fn from(action: Action) -> Self {
        Handler::Action(action)
    }
}

impl From<MethodRef> for Handler {
    fn from(method: MethodRef) -> Self {
        Handler::Method(method)
    }
}

/// An object exposing named methods, the target of [`MethodRef`] handlers.
pub trait Controller: Send + Sync {
    fn has_method(&self, method: &str) -> bool;

    fn invoke(&self, method: &str, args: &Args) -> Response;
}
