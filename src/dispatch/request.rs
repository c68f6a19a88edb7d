//! Request URL normalization.

use serde::Serialize;
use serde_json::Value;
use url::Url;

/// The parts of a request URL the router cares about.
///
/// Parsing never fails: a relative URL keeps its path and query but has an
/// empty scheme and host, so it can only reach routes that pin both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestUri {
    pub scheme: String,
    pub host: String,
    pub port: Option<u16>,
    pub path: String,
    pub query: Option<String>,
    /// The URL with query and fragment removed; what route regexes run against.
    #[serde(skip)]
    subject: String,
}

impl RequestUri {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let subject = raw
            .split(|c| c == '?' || c == '#')
            .next()
            .unwrap_or_default()
            .to_string();

        match Url::parse(raw) {
            Ok(url) => Self {
                scheme: url.scheme().to_string(),
                host: url.host_str().unwrap_or_default().to_string(),
                port: url.port(),
                path: url.path().to_string(),
                query: url.query().map(str::to_string),
                subject,
            },
            Err(_) => {
                let query = raw
                    .split_once('?')
                    .map(|(_, rest)| rest.split('#').next().unwrap_or_default().to_string());
                Self {
                    path: subject.clone(),
                    query,
                    subject,
                    ..Self::default()
                }
            }
        }
    }

    /// `scheme://host[:port]/path`, the string route regexes match.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Host with its explicit port, as substituted for `{_host}`.
    pub fn authority(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        }
    }

    pub fn is_absolute(&self) -> bool {
        !self.scheme.is_empty()
    }

    /// The `_requesturi` argument handed to filters and handlers.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// What an error resolver learns about the failed request.
#[derive(Debug, Clone, Serialize)]
pub struct RequestParts {
    pub method: String,
    pub url: String,
    pub uri: RequestUri,
}

impl RequestParts {
    pub fn new(method: &str, url: &str) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            url: url.to_string(),
            uri: RequestUri::parse(url),
        }
    }
}
