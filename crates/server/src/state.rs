//! Shared state handed to every handler, mirroring the teacher's
//! `AppState` — configuration behind an `RwLock` for hot-reload, the
//! long-lived service facade as a single `Arc`.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use parking_lot::RwLock;
use podcast_config::{load_settings, Settings};
use podcast_runner::Runner;

#[derive(Clone)]
pub struct AppState {
    /// Settings as loaded at startup. Wrapped in a lock so `/admin/reload-config`
    /// can pick up on-disk changes to config endpoints (pool sizes, cleanup
    /// policy, etc.) without a restart; the `Runner`'s own collaborators
    /// (HTTP clients, worker pools) are fixed at construction and are not
    /// affected by a reload, matching the teacher's note that some settings
    /// only take effect at startup.
    config: Arc<RwLock<Settings>>,
    runner: Arc<Runner>,
    metrics_handle: PrometheusHandle,
    env: Option<String>,
}

impl AppState {
    pub fn new(config: Settings, runner: Arc<Runner>, metrics_handle: PrometheusHandle, env: Option<String>) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            runner,
            metrics_handle,
            env,
        }
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    pub fn config(&self) -> parking_lot::RwLockReadGuard<'_, Settings> {
        self.config.read()
    }

    pub fn metrics_handle(&self) -> &PrometheusHandle {
        &self.metrics_handle
    }

    pub fn reload_config(&self) -> Result<(), String> {
        let new_config = load_settings(self.env.as_deref()).map_err(|e| format!("failed to reload config: {e}"))?;
        *self.config.write() = new_config;
        tracing::info!("configuration reloaded");
        Ok(())
    }
}
