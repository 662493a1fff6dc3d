//! nav-router command line.
//!
//! # Commands
//!
//! ```text
//! nav-router --routes routes.toml resolve /list/42
//! nav-router --routes routes.toml plan /home /list/42 [--json]
//! nav-router --routes routes.toml simulate /home /list/1 /list/2 [--delay-ms 250] [--watch]
//! ```
//!
//! `simulate` runs a real router against a timer-driven updater, queueing
//! every URL behind the previous one, and prints each operation as the
//! updater receives it. With `--watch` it keeps running and hot-reloads the
//! routes file until Ctrl+C.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use nav_router::config::loader::load_config;
use nav_router::config::watcher::RoutesWatcher;
use nav_router::observability::logging::init_logging;
use nav_router::routing::{diff, RouteTree};
use nav_router::screen::ScreenDescriptor;
use nav_router::updater::TimedUpdater;
use nav_router::{NavUrl, Router, RouterConfig};

#[derive(Parser)]
#[command(name = "nav-router")]
#[command(about = "Resolve, diff and simulate URL-driven navigation", long_about = None)]
struct Cli {
    /// Routes file (TOML). Missing file means an empty configuration.
    #[arg(short, long, default_value = "routes.toml")]
    routes: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the match path of a URL
    Resolve { url: String },
    /// Print the operations that move the stack from one URL to another
    Plan {
        from: String,
        to: String,
        /// Print JSON instead of one operation per line
        #[arg(long)]
        json: bool,
    },
    /// Run queued transitions through a timer-driven updater
    Simulate {
        urls: Vec<String>,
        /// Duration of each animated operation
        #[arg(long, default_value_t = 250)]
        delay_ms: u64,
        /// Keep running and reload routes when the file changes
        #[arg(long)]
        watch: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = if cli.routes.exists() {
        load_config(&cli.routes)?
    } else {
        RouterConfig::default()
    };
    init_logging(&config.observability)?;

    tracing::debug!(
        routes_file = %cli.routes.display(),
        routes = config.routes.len(),
        "Configuration loaded"
    );

    match cli.command {
        Commands::Resolve { url } => {
            let tree = RouteTree::build(|r| config.register_into(r))?;
            let path = tree.resolve(&NavUrl::parse(&url))?;
            for (depth, node) in path.iter().enumerate() {
                println!("{:>2} {} [{}]", depth, node, node.id());
            }
            if path.is_empty() {
                println!("(empty)");
            }
        }
        Commands::Plan { from, to, json } => {
            let tree = RouteTree::build(|r| config.register_into(r))?;
            let current = tree.resolve(&NavUrl::parse(&from))?;
            let target = tree.resolve(&NavUrl::parse(&to))?;
            let operations = diff(&current, &target, config.transitions.animated);
            if json {
                println!("{}", serde_json::to_string_pretty(&operations)?);
            } else if operations.is_empty() {
                println!("(no operations)");
            } else {
                for operation in &operations {
                    println!("{}", operation);
                }
            }
        }
        Commands::Simulate {
            urls,
            delay_ms,
            watch,
        } => simulate(&cli.routes, &config, urls, Duration::from_millis(delay_ms), watch).await?,
    }

    Ok(())
}

async fn simulate(
    routes_file: &std::path::Path,
    config: &RouterConfig,
    urls: Vec<String>,
    delay: Duration,
    watch: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let updater = TimedUpdater::current(delay)?.inspect(|update| {
        let screen = update
            .screen
            .as_ref()
            .and_then(|s| s.downcast_ref::<ScreenDescriptor>())
            .map(|s| format!(" -> {}", s.name))
            .unwrap_or_default();
        println!("  {}{}", update.operation, screen);
    });
    let router = Router::builder().config(config)?.updater(updater).build();

    let (done_tx, mut done_rx) = mpsc::unbounded_channel();
    let total = urls.len();
    for url in urls {
        let done_tx = done_tx.clone();
        router
            .transition()
            .to(url.as_str())
            .queued()
            .on_complete(move |result| {
                let _ = done_tx.send((url, result));
            })
            .start();
    }
    drop(done_tx);

    for _ in 0..total {
        let Some((url, result)) = done_rx.recv().await else {
            break;
        };
        match result {
            Ok(report) => println!("{} ({} operations)", report.to, report.operations),
            Err(e) => println!("{}: {}", url, e),
        }
    }
    println!("current: {}", router.current_url());

    if watch {
        let (watcher, mut updates) = RoutesWatcher::new(routes_file);
        let _watcher = watcher.run()?;
        loop {
            tokio::select! {
                Some(new_config) = updates.recv() => {
                    match router.update_routes(|r| new_config.register_into(r)) {
                        Ok(()) => println!("routes reloaded ({} routes)", router.routes().len()),
                        Err(e) => tracing::error!(error = %e, "Rejected reloaded routes"),
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received");
                    break;
                }
            }
        }
    }

    Ok(())
}
