use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use switchboard::config::load_config;
use switchboard::dispatch::{Dispatcher, EchoResolver};
use switchboard::routing::{Args, RouteBuilder, RouteTable};

#[derive(Parser)]
#[command(name = "routes-cli")]
#[command(about = "Inspect and probe a switchboard route manifest", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "routes.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the manifest and print the compiled table
    Check,
    /// Dispatch a request and print the handler it reaches
    Match {
        /// HTTP method
        method: String,
        /// Absolute URL, e.g. http://example.com/item/4
        url: String,
    },
    /// Generate the URL of a named route
    Url {
        name: String,
        /// Parameters as key=value
        #[arg(short, long = "param")]
        params: Vec<String>,
        /// URL the link is generated from (supplies scheme, host, locale)
        #[arg(short, long)]
        from: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let table: Arc<RouteTable> = Arc::new(RouteBuilder::from_config(&config)?.build()?);
    let mut dispatcher = Dispatcher::new(Arc::clone(&table)).with_resolver(Arc::new(EchoResolver::new()));

    let output = match cli.command {
        Commands::Check => serde_json::to_value(table.manifest())?,
        Commands::Match { method, url } => {
            let response = dispatcher.dispatch(&method, &url)?;
            let route = dispatcher.last_matched_route().map(|route| route.info());
            json!({ "route": route, "response": response })
        }
        Commands::Url { name, params, from } => {
            let params = parse_params(&params)?;
            Value::String(dispatcher.reverse_url(&name, &params, Some(&from))?)
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn parse_params(raw: &[String]) -> Result<Args, String> {
    raw.iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| format!("parameter {:?} must be key=value", pair))
        })
        .collect()
}
