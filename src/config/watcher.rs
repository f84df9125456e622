//! Configuration file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::BridgeConfig;

/// A watcher that monitors the configuration file for changes.
#[derive(Clone)]
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<BridgeConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<BridgeConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Reload the file once and forward it if it is valid.
    pub fn reload(&self) -> bool {
        reload_into(&self.path, &self.update_tx)
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for events to keep flowing.
    pub fn run(&self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!("Config file change detected, reloading...");
                        reload_into(&path, &tx);
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

fn reload_into(path: &Path, tx: &mpsc::UnboundedSender<BridgeConfig>) -> bool {
    match load_config(path) {
        Ok(new_config) => tx.send(new_config).is_ok(),
        Err(e) => {
            tracing::error!("Failed to reload config: {}. Keeping current configuration.", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_forwards_valid_config() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        std::fs::write(
            file.path(),
            "[[mappings]]\ntopic_pattern = \"a\"\nudp_ip = \"127.0.0.1\"\nudp_port = 9\n",
        )
        .unwrap();

        let (watcher, mut rx) = ConfigWatcher::new(file.path());
        assert!(watcher.reload());
        let config = rx.try_recv().unwrap();
        assert_eq!(config.mappings[0].trigger_name, "Sensor1");
    }

    #[test]
    fn test_reload_rejects_invalid_config() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        std::fs::write(file.path(), "[[mappings]]\ntopic_pattern = \"a\"\nudp_ip = \"\"\nudp_port = 0\n").unwrap();

        let (watcher, mut rx) = ConfigWatcher::new(file.path());
        assert!(!watcher.reload());
        assert!(rx.try_recv().is_err());
    }
}
