//! Routes file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::RouterConfig;

/// A watcher that monitors the routes file for changes.
///
/// Reloaded configurations are sent over a channel; the receiving side
/// applies them on the router's home context.
pub struct RoutesWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<RouterConfig>,
}

impl RoutesWatcher {
    /// Create a new RoutesWatcher.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<RouterConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file. The returned watcher must be kept alive.
    ///
    /// Reloads that fail to load or validate are logged and dropped, so the
    /// router keeps its current routes.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let RoutesWatcher { path, update_tx } = self;
        let routes_file = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::error!(error = %e, "Routes watcher error");
                        return;
                    }
                };
                let touched = event.paths.is_empty()
                    || event.paths.iter().any(|p| p.ends_with(routes_file.file_name().unwrap_or_default()));
                if !(event.kind.is_modify() || event.kind.is_create()) || !touched {
                    return;
                }

                match load_config(&routes_file) {
                    Ok(config) => {
                        tracing::info!(
                            path = %routes_file.display(),
                            routes = config.routes.len(),
                            "Routes file reloaded"
                        );
                        if update_tx.send(config).is_err() {
                            tracing::debug!("Routes receiver gone; dropping reload");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Rejected routes reload; keeping current routes");
                    }
                }
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;
        tracing::info!(path = %path.display(), "Routes watcher started");
        Ok(watcher)
    }
}
