//! Workspace configuration.
//!
//! Layers, lowest precedence first: built-in defaults, a TOML file
//! (`draftdesk.toml` in the working directory unless a path is given), and
//! `DRAFTDESK__*` environment variables, e.g. `DRAFTDESK__BIND_ADDR` or
//! `DRAFTDESK__QUEUE__TICK_MS`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cost::{EstimationMethod, TokenPricing};
use crate::error::WorkspaceResult;
use crate::queue::QueueConfig;
use crate::runtime::FIFTEEN_MINUTES_SECS;

/// Prefix for environment overrides.
pub const CONFIG_ENV_PREFIX: &str = "DRAFTDESK";

/// Config file looked up when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "draftdesk.toml";

/// Default location of the state document.
pub const DEFAULT_STATE_PATH: &str = "workspace_state.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Path of the JSON state document
    pub state_path: PathBuf,
    /// Address the HTTP binding listens on
    pub bind_addr: String,
    /// Token prices used by the cost ledger
    pub pricing: TokenPricing,
    /// Task queue delays
    pub queue: QueueConfig,
    /// Heuristic used when the generator reports no usage
    pub estimation: EstimationMethod,
    /// Segment length beats are budgeted against, in seconds
    pub runtime_budget_secs: f64,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            bind_addr: "127.0.0.1:5000".to_string(),
            pricing: TokenPricing::default(),
            queue: QueueConfig::default(),
            estimation: EstimationMethod::default(),
            runtime_budget_secs: FIFTEEN_MINUTES_SECS,
        }
    }
}

impl WorkspaceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from defaults, file and environment.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> WorkspaceResult<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false),
        };

        let settings = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: WorkspaceConfig = settings.try_deserialize()?;
        tracing::debug!(
            state_path = %config.state_path.display(),
            bind_addr = %config.bind_addr,
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn with_state_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_path = path.into();
        self
    }

    pub fn with_bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    pub fn with_pricing(mut self, pricing: TokenPricing) -> Self {
        self.pricing = pricing;
        self
    }
}
