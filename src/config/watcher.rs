//! Hot reload of the breaker configuration file.
//!
//! The parent directory is watched rather than the file itself. Editors that
//! save by renaming a temp file over the original replace the inode, which
//! would silently end a watch placed on the file.

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::ServiceConfig;

/// Sends a freshly loaded [`ServiceConfig`] whenever the file changes.
///
/// Configs that fail to load are logged and dropped.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<ServiceConfig>,
}

impl ConfigWatcher {
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<ServiceConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching. Updates flow until the returned handle is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let directory = watch_directory(&self.path);
        let file_name = self.path.file_name().map(OsString::from).ok_or_else(|| {
            notify::Error::generic("config path has no file name")
        })?;
        let path = self.path;
        let tx = self.update_tx;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if touches_file(&event, &file_name) => reload(&path, &tx),
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&directory, RecursiveMode::NonRecursive)?;

        tracing::info!(directory = ?directory, "Config watcher started");
        Ok(watcher)
    }
}

fn watch_directory(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// A write, create or rename that lands on the config file.
fn touches_file(event: &Event, file_name: &OsString) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}

fn reload(path: &Path, tx: &mpsc::UnboundedSender<ServiceConfig>) {
    match load_config(path) {
        Ok(config) => {
            tracing::info!(breakers = config.breakers.len(), "Config file changed, reloaded");
            let _ = tx.send(config);
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
        }
    }
}
