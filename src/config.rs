//! Runtime configuration, resolved once at startup from `GLYCORISK_*` variables.

use std::path::PathBuf;

use crate::adapters::logistic::{verifying_key_from_b64, ModelTrust};
use crate::domain::{LabZeroPolicy, RulePolicy};

pub const MODEL_DIR_ENV: &str = "GLYCORISK_MODEL_DIR";
pub const PLAN_DIR_ENV: &str = "GLYCORISK_PLAN_DIR";
pub const RULE_POLICY_ENV: &str = "GLYCORISK_RULE_POLICY";
pub const LAB_ZERO_ENV: &str = "GLYCORISK_LAB_ZERO";
pub const PUBKEY_B64_ENV: &str = "GLYCORISK_MODEL_PUBKEY_B64";
pub const PUBKEY_FILE_ENV: &str = "GLYCORISK_MODEL_PUBKEY_B64_FILE";
pub const ALLOW_UNSIGNED_ENV: &str = "GLYCORISK_ALLOW_UNSIGNED_MODELS";
pub const LOG_MODE_ENV: &str = "GLYCORISK_LOG_MODE";
pub const LOG_FILE_ENV: &str = "GLYCORISK_LOG_FILE";

const DEFAULT_MODEL_DIR: &str = "models";
const DEFAULT_PLAN_DIR: &str = "plans";
const DEFAULT_LOG_FILE: &str = "glycorisk.log";

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error("Failed to read {key} file {path:?}: {source}")]
    Unreadable {
        key: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where log output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

/// Settings for one process.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model_dir: PathBuf,
    pub plan_dir: PathBuf,
    pub rule_policy: RulePolicy,
    pub lab_zero: LabZeroPolicy,
    pub trust: ModelTrust,
    pub log_target: LogTarget,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            plan_dir: PathBuf::from(DEFAULT_PLAN_DIR),
            rule_policy: RulePolicy::default(),
            lab_zero: LabZeroPolicy::default(),
            trust: ModelTrust::default(),
            log_target: LogTarget::Stderr,
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "TRUE" | "yes" | "YES")
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    /// Returns `ConfigError` for unparseable values or unreadable key files.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns `ConfigError` for unparseable values or unreadable key files.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(dir) = get(MODEL_DIR_ENV) {
            config.model_dir = PathBuf::from(dir.trim());
        }
        if let Some(dir) = get(PLAN_DIR_ENV) {
            config.plan_dir = PathBuf::from(dir.trim());
        }
        if let Some(v) = get(RULE_POLICY_ENV) {
            config.rule_policy = v.parse().map_err(|reason| ConfigError::InvalidValue {
                key: RULE_POLICY_ENV,
                reason,
            })?;
        }
        if let Some(v) = get(LAB_ZERO_ENV) {
            config.lab_zero = v.parse().map_err(|reason| ConfigError::InvalidValue {
                key: LAB_ZERO_ENV,
                reason,
            })?;
        }

        // Inline key wins over key file.
        let pubkey_b64 = match (get(PUBKEY_B64_ENV), get(PUBKEY_FILE_ENV)) {
            (Some(b64), _) => Some((PUBKEY_B64_ENV, b64)),
            (None, Some(path)) => {
                let path = PathBuf::from(path.trim());
                let b64 = std::fs::read_to_string(&path).map_err(|source| {
                    ConfigError::Unreadable {
                        key: PUBKEY_FILE_ENV,
                        path,
                        source,
                    }
                })?;
                Some((PUBKEY_FILE_ENV, b64))
            }
            (None, None) => None,
        };
        if let Some((key, b64)) = pubkey_b64 {
            let verifying_key = verifying_key_from_b64(&b64).map_err(|e| {
                ConfigError::InvalidValue {
                    key,
                    reason: e.to_string(),
                }
            })?;
            config.trust.verifying_key = Some(verifying_key);
        }
        config.trust.allow_unsigned = get(ALLOW_UNSIGNED_ENV).is_some_and(|v| parse_bool(&v));

        config.log_target = match get(LOG_MODE_ENV).as_deref().map(str::trim) {
            None | Some("stderr") => LogTarget::Stderr,
            Some("file") => LogTarget::File(
                get(LOG_FILE_ENV)
                    .map(|p| PathBuf::from(p.trim()))
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            ),
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: LOG_MODE_ENV,
                    reason: format!("unknown log mode '{other}' (expected stderr or file)"),
                })
            }
        };

        Ok(config)
    }
}
