//! waypoint CLI
//!
//! Command-line tool for checking route tables, resolving paths against
//! them and building URLs by route name.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use waypoint_path::Params;
use waypoint_router::{
    routes_from_json, Children, MemoryOutlet, Route, Router, RouterConfig, Window,
    DEFAULT_DOCUMENT_URL,
};

/// Inspect client-side route tables.
#[derive(Parser)]
#[command(name = "waypoint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base URL the routes are mounted under.
    #[arg(short, long, env = "WAYPOINT_BASE_URL")]
    base_url: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a route table and print its tree.
    Check {
        /// JSON route table.
        routes: PathBuf,
    },

    /// Render a path headlessly and print the outcome.
    Resolve {
        /// JSON route table.
        routes: PathBuf,

        /// Path to render, with optional query and fragment.
        path: String,
    },

    /// Build the URL of a named route.
    UrlFor {
        /// JSON route table.
        routes: PathBuf,

        /// Route name, or component tag for unnamed routes.
        name: String,

        /// Params as a JSON object.
        #[arg(short, long, default_value = "{}")]
        params: String,
    },
}

fn load_routes(path: &Path) -> anyhow::Result<Vec<Route>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read route table {}", path.display()))?;
    let routes = routes_from_json(&json)
        .with_context(|| format!("invalid route table {}", path.display()))?;
    debug!(count = routes.len(), file = %path.display(), "route table loaded");
    Ok(routes)
}

fn json_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_params(json: &str) -> anyhow::Result<Params> {
    let value: Value = serde_json::from_str(json).context("--params is not valid JSON")?;
    let Value::Object(map) = value else {
        bail!("--params must be a JSON object");
    };

    let mut params = Params::new();
    for (key, value) in map {
        match value {
            Value::Array(items) => params.insert(key, items.iter().map(json_scalar).collect::<Vec<_>>()),
            other => params.insert(key, json_scalar(&other)),
        }
    }
    Ok(params)
}

fn print_routes(routes: &[Arc<Route>], depth: usize) {
    for route in routes {
        let mut line = format!("{:indent$}{}", "", route.path, indent = depth * 2);
        if let Some(name) = &route.name {
            line.push_str(&format!(" name={name}"));
        }
        if let Some(component) = &route.component {
            line.push_str(&format!(" component={component}"));
        }
        if let Some(redirect) = &route.redirect {
            line.push_str(&format!(" redirect={redirect}"));
        }
        if route.bundle.is_some() {
            line.push_str(" bundle");
        }
        println!("{line}");

        if let Children::Static(children) = &route.children {
            print_routes(children, depth + 1);
        }
    }
}

fn build_router(config: RouterConfig, routes: Vec<Route>) -> anyhow::Result<(Router, Arc<MemoryOutlet>)> {
    let outlet = Arc::new(MemoryOutlet::new());
    let router = Router::builder()
        .window(Window::new(DEFAULT_DOCUMENT_URL)?)
        .outlet(outlet.clone())
        .config(config)
        .detached()
        .build()?;
    let _ = router.set_routes(routes, true)?;
    Ok((router, outlet))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = RouterConfig {
        base_url: cli.base_url,
    };

    match cli.command {
        Commands::Check { routes } => {
            let table = load_routes(&routes)?;
            let (router, _) = build_router(config, table)?;
            info!("Route table is valid.");
            print_routes(&router.routes(), 0);
        }

        Commands::Resolve { routes, path } => {
            let (router, outlet) = build_router(config, load_routes(&routes)?)?;

            let Some(location) = router.render(path.as_str(), true).await? else {
                bail!("render of {path} was superseded");
            };

            println!("pathname: {}", location.pathname);
            if !location.search.is_empty() {
                println!("search:   {}", location.search);
            }
            if !location.hash.is_empty() {
                println!("hash:     {}", location.hash);
            }
            if let Some(from) = &location.redirect_from {
                println!("redirected from: {from}");
            }

            let mut params: Vec<_> = location.params.iter().collect();
            params.sort_by_key(|(key, _)| *key);
            for (key, value) in params {
                println!("param {key} = {value}");
            }

            let chain: Vec<String> = location.routes.iter().map(|route| route.path.to_string()).collect();
            println!("routes:   {}", chain.join(" > "));
            println!();
            print!("{}", outlet.render_tree());
        }

        Commands::UrlFor {
            routes,
            name,
            params,
        } => {
            let (router, _) = build_router(config, load_routes(&routes)?)?;
            let params = parse_params(&params)?;
            println!("{}", router.url_for_name(&name, &params)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_params() {
        let params = parse_params(r#"{"id": 5, "name": "ada", "path": ["a", "b"]}"#).unwrap();
        assert_eq!(params.get("id"), Some("5"));
        assert_eq!(params.get("name"), Some("ada"));
        assert_eq!(params.get_all("path"), Some(&["a".to_string(), "b".to_string()][..]));
    }

    #[test]
    fn test_parse_params_rejects_non_objects() {
        assert!(parse_params("[1, 2]").is_err());
        assert!(parse_params("{").is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["waypoint", "url-for", "routes.json", "user", "--params", "{\"id\": 1}"])
            .unwrap();
        assert!(matches!(cli.command, Commands::UrlFor { ref name, .. } if name == "user"));
    }
}
