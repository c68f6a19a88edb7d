//! Before/after filter chains.
//!
//! # Responsibilities
//! - Run before filters in declared order and interpret each result
//! - Run after filters for their side effects
//!
//! A before filter may return:
//! - `null`: continue with the arguments unchanged
//! - any non-object value: that value is the final response
//! - `{passed, response}`: a falsy `passed` ends dispatch with `response`;
//!   a truthy one merges `response` (when it is an object) into the
//!   arguments and continues
//!
//! Any other object breaks the contract and fails the dispatch outright.

use serde_json::Value;

use crate::error::{Result, RouterError};
use crate::routing::handler::{Args, Response};

/// What the before chain decided.
#[derive(Debug, Clone, PartialEq)]
pub enum BeforeOutcome {
    Continue,
    ShortCircuit(Response),
}

/// Interprets one before-filter result, merging passed-through values into `args`.
pub fn classify(filter: &str, result: Value, args: &mut Args) -> Result<BeforeOutcome> {
    match result {
        Value::Null => Ok(BeforeOutcome::Continue),
        Value::Object(mut map) => {
            if !(map.contains_key("passed") && map.contains_key("response")) {
                return Err(RouterError::FilterContract {
                    filter: filter.to_string(),
                });
            }
            let passed = map.remove("passed").map(|v| is_truthy(&v)).unwrap_or(false);
            let response = map.remove("response").unwrap_or(Value::Null);

            if !passed {
                return Ok(BeforeOutcome::ShortCircuit(response));
            }
            if let Value::Object(extra) = response {
                args.merge(extra);
            }
            Ok(BeforeOutcome::Continue)
        }
        other => Ok(BeforeOutcome::ShortCircuit(other)),
    }
}

/// Runs `filters` in order through `call` until one short-circuits.
pub fn run_before<F>(filters: &[String], args: &mut Args, mut call: F) -> Result<BeforeOutcome>
where
    F: FnMut(&str, &Args) -> Result<Response>,
{
    for filter in filters {
        let result = call(filter, args)?;
        if let BeforeOutcome::ShortCircuit(response) = classify(filter, result, args)? {
            tracing::debug!(filter = %filter, "before filter short-circuited dispatch");
            return Ok(BeforeOutcome::ShortCircuit(response));
        }
    }
    Ok(BeforeOutcome::Continue)
}

/// Runs `filters` in order; their results are discarded.
pub fn run_after<F>(filters: &[String], args: &Args, mut call: F) -> Result<()>
where
    F: FnMut(&str, &Args) -> Result<Response>,
{
    for filter in filters {
        call(filter, args)?;
    }
    Ok(())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}
