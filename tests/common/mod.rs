//! Shared fixtures for the integration suites.
//!
//! `fixture_table` declares the routes.dev application used across the
//! dispatch, reverse and HTTP suites.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::Value;
use switchboard::dispatch::Dispatcher;
use switchboard::routing::{Action, Args, Handler, RouteBuilder, RouteOptions, RouteTable};

/// A handler that always answers `body`.
pub fn text(body: &'static str) -> Handler {
    Handler::func(move |_: &Args| body)
}

/// One field of the `_requesturi` argument, or "".
pub fn uri_part(args: &Args, field: &str) -> String {
    args.get("_requesturi")
        .and_then(|uri| uri.get(field))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub fn fixture_builder() -> RouteBuilder {
    let mut router = RouteBuilder::new();

    router.filter("notauth", text("not auth"));
    router.filter("auth", Handler::func(|_: &Args| Value::Null));
    router.filter(
        "params",
        Action::positional(["id", "_requesturi"], |values: &[Value]| {
            format!("filter params {} {}", as_text(&values[0]), as_text(&values[1]["scheme"]))
        }),
    );

    router.get("/", text("controller index")).name("index");
    router.any("/any/", text("controller any")).name("any");
    router.map(
        [switchboard::Method::Get, switchboard::Method::Post],
        "/map/",
        text("controller map"),
    );
    router.get(["/group/", "/en/group/", "/fr/group/"], text("controller group"));
    router.put("/put/", text("controller put"));
    router.post("/", text("controller index post"));
    router.get("/items/", text("controller items")).name("items");

    router.get(
        "/itemsr/",
        Handler::func(|args: &Args| {
            format!("controller itemsr {} {}", uri_part(args, "scheme"), uri_part(args, "host"))
        }),
    );

    router.group(RouteOptions::new().prefix("prefixitem"), |router| {
        router.get(
            "/itemsr2/",
            Handler::func(|args: &Args| {
                format!(
                    "controller itemsr2 {} {} {}",
                    uri_part(args, "scheme"),
                    uri_part(args, "host"),
                    args.get_str("_prefix").unwrap_or_default()
                )
            }),
        );
    });

    router
        .get(
            "/itemsr/",
            Handler::func(|args: &Args| {
                format!("controller itemsr {} {}", uri_part(args, "scheme"), uri_part(args, "host"))
            }),
        )
        .host("routes2.dev");

    router.get("/items2", text("controller items")).name("items2");
    router.get("/itemsview", text("controller itemsview"));
    router.get(
        "/item/{id:[0-9]+}",
        Action::positional(["id"], |values: &[Value]| format!("controller item {}", as_text(&values[0]))),
    );
    router
        .get(
            "/viewitem/{id:[0-9]+}/",
            Action::positional(["id"], |values: &[Value]| format!("view item {}", as_text(&values[0]))),
        )
        .name("viewitem")
        .scheme("https");

    router.group(RouteOptions::new().before(["params"]), |router| {
        router.get(
            "/filterparams/{id:[0-9]+}/",
            Action::positional(["id"], |values: &[Value]| {
                format!("controller filter params {}", as_text(&values[0]))
            }),
        );
    });
    router.group(RouteOptions::new().before(["auth"]), |router| {
        router.get("/before/", text("controller index with before filter"));
    });
    router.group(RouteOptions::new().before(["notauth"]), |router| {
        router.get("/before/not/", text("controller index with before filter"));
    });
    router.group(RouteOptions::new().after(["auth"]), |router| {
        router.get("/after/", text("controller index with after filter"));
    });
    router.group(RouteOptions::new().after(["notauth"]), |router| {
        router.get("/after/not/", text("controller index with after filter"));
    });

    router.group(RouteOptions::new().prefix("name-prefix"), |router| {
        router.get("/", text("controller prefix name-prefix"));
        router
            .get("/", text("controller https prefix name-prefix"))
            .scheme("https");
        router
            .get("/", text("controller routes2 prefix name-prefix"))
            .host("routes2.dev");
        router.get("/route1", text("controller prefix name-prefix route1"));

        router.group(RouteOptions::new().prefix("sub-prefix"), |router| {
            router.get("/", text("controller prefix name-prefix/sub-prefix"));
            router.get("/route1/", text("controller prefix name-prefix/sub-prefix route1"));
        });
    });

    router.group(RouteOptions::new().prefix("en"), |router| {
        router.get("/", text("home with prefix en")).name("home");
    });
    router.group(RouteOptions::new().prefix("es"), |router| {
        router.get("/", text("home with prefix es")).name("home");
    });
    router.get("/home/", text("home without prefix")).name("home");

    router
        .get(
            "/home/{id:[0-9]+}/",
            Action::positional(["id", "_requesturi", "_prefix"], |values: &[Value]| {
                format!(
                    "home without prefix {} {} {} {}",
                    as_text(&values[0]),
                    as_text(&values[1]["scheme"]),
                    as_text(&values[1]["host"]),
                    as_text(&values[2])
                )
            }),
        )
        .scheme("https");

    router
}

pub fn fixture_table() -> Arc<RouteTable> {
    Arc::new(fixture_builder().build().expect("fixture routes compile"))
}

pub fn dispatcher() -> Dispatcher {
    Dispatcher::new(fixture_table())
}
