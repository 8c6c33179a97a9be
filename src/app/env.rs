//! Runtime settings read from the process environment (and `.env`).

use crate::error::AppError;
use crate::prior::DEFAULT_SEED;

pub const ENV_MAX_WORKERS: &str = "ARCHEO_MAX_WORKERS";
pub const ENV_RANDOM_SEED: &str = "ARCHEO_RANDOM_SEED";
pub const ENV_LOG: &str = "ARCHEO_LOG";

const DEFAULT_LOG: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeEnv {
    /// Worker threads; `None` lets rayon use every core.
    pub max_workers: Option<usize>,
    pub seed: u64,
    /// `tracing_subscriber::EnvFilter` directives.
    pub log: String,
}

impl Default for RuntimeEnv {
    fn default() -> Self {
        Self {
            max_workers: None,
            seed: DEFAULT_SEED,
            log: DEFAULT_LOG.to_string(),
        }
    }
}

impl RuntimeEnv {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut env = Self::default();
        if let Some(raw) = non_empty(lookup(ENV_MAX_WORKERS)) {
            let n: usize = raw
                .parse()
                .map_err(|_| AppError::config(format!("{ENV_MAX_WORKERS} must be a positive integer (got '{raw}').")))?;
            if n == 0 {
                return Err(AppError::config(format!("{ENV_MAX_WORKERS} must be at least 1.")));
            }
            env.max_workers = Some(n);
        }
        if let Some(raw) = non_empty(lookup(ENV_RANDOM_SEED)) {
            env.seed = raw
                .parse()
                .map_err(|_| AppError::config(format!("{ENV_RANDOM_SEED} must be an unsigned integer (got '{raw}').")))?;
        }
        if let Some(raw) = non_empty(lookup(ENV_LOG)) {
            env.log = raw;
        }
        Ok(env)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
