//! Placeholder parsing for route patterns.
//!
//! A pattern is literal text interleaved with `{name}` or `{name:regex}`
//! placeholders. Constraints may contain balanced braces (`{year:[0-9]{4}}`).
//! Literal text is regex-escaped when rendered into a matcher, so parentheses
//! and dots in a path never change the structure of the compiled regex.

use std::collections::{BTreeMap, HashSet};

use crate::error::RouterError;

/// Constraint used when a placeholder declares none.
pub const DEFAULT_CONSTRAINT: &str = "[^/]+";

/// Capture name for the request scheme.
pub const SCHEME_PARAM: &str = "_scheme";
/// Capture name for the request host.
pub const HOST_PARAM: &str = "_host";

const SCHEME_CONSTRAINT: &str = "[^:]+";

/// Named constraints available to every table: `{id:number}`.
pub fn default_aliases() -> BTreeMap<String, String> {
    [
        ("number", "[0-9]+"),
        ("word", "[a-zA-Z]+"),
        ("alphanum_dash", "[a-zA-Z0-9-_]+"),
        ("slug", "[a-z0-9-]+"),
    ]
    .into_iter()
    .map(|(name, regex)| (name.to_string(), regex.to_string()))
    .collect()
}

/// One piece of a parsed pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Literal(String),
    Param {
        name: String,
        constraint: Option<String>,
    },
}

/// Splits `pattern` into literal and placeholder tokens.
///
/// Named aliases (`{id:number}`) are resolved against `aliases` here so every
/// later stage only ever sees concrete regex text.
pub fn tokenize(pattern: &str, aliases: &BTreeMap<String, String>) -> Result<Vec<Token>, RouterError> {
    let invalid = |reason: &str| RouterError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut seen = HashSet::new();
    let mut chars = pattern.char_indices();

    while let Some((start, c)) = chars.next() {
        match c {
            '{' => {
                let mut depth = 1;
                let mut end = None;
                for (i, c) in chars.by_ref() {
                    match c {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                end = Some(i);
                                break;
                            }
                        }
                        _ => {}
                    }
                }
                let end = end.ok_or_else(|| invalid("unclosed placeholder"))?;
                let inner = &pattern[start + 1..end];

                let (name, constraint) = match inner.split_once(':') {
                    Some((name, constraint)) => (name, Some(constraint)),
                    None => (inner, None),
                };
                if !is_param_name(name) {
                    return Err(invalid(&format!("bad placeholder name {:?}", name)));
                }
                if name == SCHEME_PARAM || name == HOST_PARAM {
                    return Err(invalid(&format!("{} is reserved", name)));
                }
                if !seen.insert(name.to_string()) {
                    return Err(invalid(&format!("duplicate placeholder {}", name)));
                }

                let constraint = match constraint {
                    Some("") => return Err(invalid(&format!("empty constraint for {}", name))),
                    Some(text) => Some(aliases.get(text).cloned().unwrap_or_else(|| text.to_string())),
                    None => None,
                };

                if !literal.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut literal)));
                }
                tokens.push(Token::Param {
                    name: name.to_string(),
                    constraint,
                });
            }
            '}' => return Err(invalid("unbalanced '}'")),
            c => literal.push(c),
        }
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    Ok(tokens)
}

/// Capture names must be valid regex group names.
fn is_param_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Whether a constraint is a fixed literal usable as a reverse fallback.
pub fn is_literal(constraint: &str) -> bool {
    !constraint.chars().any(|c| {
        matches!(
            c,
            '[' | ']' | '(' | ')' | '{' | '}' | '.' | '*' | '+' | '?' | '^' | '$' | '|' | '\\'
        )
    })
}

/// Renders tokens as regex source with named captures.
pub fn render_regex(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|token| match token {
            Token::Literal(text) => regex::escape(text),
            Token::Param { name, constraint } => capture(name, constraint.as_deref().unwrap_or(DEFAULT_CONSTRAINT)),
        })
        .collect()
}

/// Renders tokens as a reverse template: placeholders keep only their name.
pub fn render_template(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|token| match token {
            Token::Literal(text) => text.clone(),
            Token::Param { name, .. } => format!("{{{}}}", name),
        })
        .collect()
}

pub fn capture(name: &str, constraint: &str) -> String {
    format!("(?P<{}>{})", name, constraint)
}

/// Regex for the scheme part: a literal when pinned, otherwise a capture.
pub fn scheme_regex(scheme: Option<&str>) -> String {
    match scheme {
        Some(scheme) => regex::escape(scheme),
        None => capture(SCHEME_PARAM, SCHEME_CONSTRAINT),
    }
}

/// Regex for the host part.
///
/// One pinned host is a literal; several pinned hosts become an alternation
/// captured as `_host` so reverse routing can keep the requesting host.
pub fn host_regex(hosts: &[String]) -> String {
    match hosts {
        [] => capture(HOST_PARAM, DEFAULT_CONSTRAINT),
        [host] => regex::escape(host),
        hosts => {
            let alternatives: Vec<String> = hosts.iter().map(|h| regex::escape(h)).collect();
            capture(HOST_PARAM, &alternatives.join("|"))
        }
    }
}

/// Number of placeholders among `tokens`.
pub fn param_count(tokens: &[Token]) -> usize {
    tokens
        .iter()
        .filter(|token| matches!(token, Token::Param { .. }))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_aliases() -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    #[test]
    fn test_tokenize_static() {
        let tokens = tokenize("/items", &no_aliases()).unwrap();
        assert_eq!(tokens, vec![Token::Literal("/items".into())]);
    }

    #[test]
    fn test_tokenize_params() {
        let tokens = tokenize("/item/{id:[0-9]+}/{slug}", &no_aliases()).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Literal("/item/".into()),
                Token::Param { name: "id".into(), constraint: Some("[0-9]+".into()) },
                Token::Literal("/".into()),
                Token::Param { name: "slug".into(), constraint: None },
            ]
        );
    }

    #[test]
    fn test_tokenize_nested_braces() {
        let tokens = tokenize("/archive/{year:[0-9]{4}}", &no_aliases()).unwrap();
        assert_eq!(
            tokens[1],
            Token::Param { name: "year".into(), constraint: Some("[0-9]{4}".into()) }
        );
    }

    #[test]
    fn test_tokenize_alias() {
        let mut aliases = BTreeMap::new();
        aliases.insert("number".to_string(), "[0-9]+".to_string());
        let tokens = tokenize("/item/{id:number}", &aliases).unwrap();
        assert_eq!(
            tokens[1],
            Token::Param { name: "id".into(), constraint: Some("[0-9]+".into()) }
        );
    }

    #[test]
    fn test_tokenize_rejects_malformed() {
        assert!(tokenize("/item/{id", &no_aliases()).is_err());
        assert!(tokenize("/item/id}", &no_aliases()).is_err());
        assert!(tokenize("/item/{}", &no_aliases()).is_err());
        assert!(tokenize("/item/{1d}", &no_aliases()).is_err());
        assert!(tokenize("/{id}/{id}", &no_aliases()).is_err());
        assert!(tokenize("/{_host}", &no_aliases()).is_err());
    }

    #[test]
    fn test_render_escapes_literals() {
        let tokens = tokenize("/feed(1).xml/{id:[0-9]+}", &no_aliases()).unwrap();
        assert_eq!(render_regex(&tokens), r"/feed\(1\)\.xml/(?P<id>[0-9]+)");
        assert_eq!(render_template(&tokens), "/feed(1).xml/{id}");
    }

    #[test]
    fn test_is_literal() {
        assert!(is_literal("en"));
        assert!(is_literal("page-1"));
        assert!(!is_literal("[0-9]+"));
        assert!(!is_literal("en|es"));
    }

    #[test]
    fn test_host_regex() {
        assert_eq!(host_regex(&[]), "(?P<_host>[^/]+)");
        assert_eq!(host_regex(&["routes2.dev".to_string()]), r"routes2\.dev");
        assert_eq!(
            host_regex(&["a.dev".to_string(), "b.dev".to_string()]),
            r"(?P<_host>a\.dev|b\.dev)"
        );
    }
}
