// src/core/engine.rs
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::config::Config;
use crate::server::{self, AppState};
use super::{
    has_changed, run_daily, ContentFetcher, DataStore, JsonFileStore, MonitoringScheduler,
};

/// Main orchestration engine wiring the fetcher, store and scheduler
pub struct Engine {
    config: Config,
    fetcher: Arc<ContentFetcher>,
    scheduler: Arc<MonitoringScheduler>,
}

impl Engine {
    /// Create a new engine instance from configuration
    pub async fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = Config::load_or_default(config_path)?;

        debug!("Loaded configuration: {:?}", config);

        let store: Arc<dyn DataStore> = Arc::new(JsonFileStore::new(&config.store.path));
        let fetcher = Arc::new(ContentFetcher::new(&config.monitoring)?);
        let scheduler = Arc::new(MonitoringScheduler::new(store, fetcher.clone()));

        Ok(Self {
            config,
            fetcher,
            scheduler,
        })
    }

    /// Write a default configuration file
    pub async fn init(&self, path: Option<PathBuf>) -> Result<()> {
        let target_dir = path.unwrap_or_else(|| PathBuf::from("."));
        let config_path = target_dir.join("Pagesentry.toml");

        Config::default().save(&config_path)?;
        info!("✅ Wrote default configuration to {}", config_path.display());
        Ok(())
    }

    /// One-off fetch + compare for a single URL; prints the JSON result
    pub async fn check(&self, url: &str, last_hash: Option<&str>) -> Result<()> {
        let fetched = self.fetcher.fetch(url).await?;
        let changed = has_changed(&fetched.hash, last_hash);

        let mut result = serde_json::json!({
            "changed": changed,
            "newHash": fetched.hash,
            "checkedAt": chrono::Utc::now(),
        });
        if changed || last_hash.is_none() {
            result["text"] = serde_json::Value::String(fetched.text);
        }

        println!("{}", serde_json::to_string_pretty(&result)?);
        Ok(())
    }

    /// Run a single sweep against the configured store
    pub async fn sweep(&self) -> Result<()> {
        match self.scheduler.run_tick().await? {
            Some(report) => {
                info!(
                    "Sweep finished: {} changed, {} unchanged, {} skipped, {} failed",
                    report.changed(),
                    report.unchanged(),
                    report.skipped(),
                    report.failed()
                );
            }
            None => info!("A sweep was already running, nothing to do"),
        }
        Ok(())
    }

    /// Run the daemon: HTTP trigger surface plus the daily schedule loop
    pub async fn serve(&self, bind: Option<String>) -> Result<()> {
        let bind_addr = bind.unwrap_or_else(|| self.config.server.bind_addr.clone());

        let hour = self.config.monitoring.schedule_hour;
        let minute = self.config.monitoring.schedule_minute;
        let scheduler = self.scheduler.clone();
        tokio::spawn(async move {
            run_daily(scheduler, hour, minute).await;
        });

        let state = Arc::new(AppState::new(self.fetcher.clone(), self.scheduler.clone()));
        server::serve(state, &bind_addr).await?;
        Ok(())
    }
}
