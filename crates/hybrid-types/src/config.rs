//! Configuration loading for the hybrid NRT pipeline.
//!
//! Layered config: defaults -> config file -> env vars.
//! Default config file lives in the platform config dir under `hybrid-nrt/config`.

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::HybridError;

/// Largest queue capacity accepted by validation.
pub const MAX_QUEUE_CAPACITY: usize = 1 << 24;

/// Pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Maximum number of documents waiting for the live index
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Number of background consumer workers
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// How long shutdown keeps draining queued documents (ms).
    /// 0 discards whatever is still queued.
    #[serde(default)]
    pub shutdown_grace_ms: u64,

    /// Maximum documents a worker takes per wakeup
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Memory budget for the live index writer in MB
    #[serde(default = "default_writer_memory_mb")]
    pub writer_memory_mb: usize,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_queue_capacity() -> usize {
    1000
}

fn default_worker_count() -> usize {
    1
}

fn default_batch_size() -> usize {
    100
}

fn default_writer_memory_mb() -> usize {
    15
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            worker_count: default_worker_count(),
            shutdown_grace_ms: 0,
            batch_size: default_batch_size(),
            writer_memory_mb: default_writer_memory_mb(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Default config file (optional)
    /// 3. Explicit config file (required when given)
    /// 4. Environment variables (HYBRID_*)
    ///
    /// The result is validated before it is returned.
    pub fn load(config_path: Option<&str>) -> Result<Self, HybridError> {
        let config_dir = ProjectDirs::from("", "", "hybrid-nrt")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("queue_capacity", default_queue_capacity() as i64)
            .map_err(|e| HybridError::Config(e.to_string()))?
            .set_default("worker_count", default_worker_count() as i64)
            .map_err(|e| HybridError::Config(e.to_string()))?
            .set_default("shutdown_grace_ms", 0i64)
            .map_err(|e| HybridError::Config(e.to_string()))?
            .set_default("batch_size", default_batch_size() as i64)
            .map_err(|e| HybridError::Config(e.to_string()))?
            .set_default("writer_memory_mb", default_writer_memory_mb() as i64)
            .map_err(|e| HybridError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| HybridError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // HYBRID_QUEUE_CAPACITY, HYBRID_WORKER_COUNT, ...
        builder = builder.add_source(Environment::with_prefix("HYBRID").try_parsing(true));

        let settings: Settings = builder
            .build()
            .map_err(|e| HybridError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| HybridError::Config(e.to_string()))?;

        settings.validate()?;
        debug!(
            queue_capacity = settings.queue_capacity,
            worker_count = settings.worker_count,
            batch_size = settings.batch_size,
            "Loaded hybrid settings"
        );
        Ok(settings)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), HybridError> {
        if self.queue_capacity == 0 {
            return Err(HybridError::Config("queue_capacity must be > 0".to_string()));
        }
        if self.queue_capacity > MAX_QUEUE_CAPACITY {
            return Err(HybridError::Config(format!(
                "queue_capacity must be <= {}",
                MAX_QUEUE_CAPACITY
            )));
        }
        if self.worker_count == 0 {
            return Err(HybridError::Config("worker_count must be > 0".to_string()));
        }
        if self.batch_size == 0 {
            return Err(HybridError::Config("batch_size must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}
