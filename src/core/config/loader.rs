// SPDX-License-Identifier: MIT OR Apache-2.0

//! YAML configuration loading with `${VAR}` / `${VAR:-default}` environment
//! substitution, plus a hot-reload channel that re-loads and re-validates on
//! every watched tick.

use super::{validate, SubstrateConfig};
use crate::core::exception::ConfigError;
use regex::Regex;
use std::path::Path;
use std::time::Duration;
use tokio::sync::watch;

/// Load and validate a `SubstrateConfig` from a YAML file, expanding environment
/// variables first.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<SubstrateConfig, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let expanded = expand_env_vars(&raw)?;
    let config: SubstrateConfig =
        serde_yaml::from_str(&expanded).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate(&config)?;
    Ok(config)
}

fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(:-[^}]*)?\}")
        .expect("static regex is valid");
    let mut out = String::with_capacity(content.len());
    let mut last_end = 0;
    for caps in re.captures_iter(content) {
        let whole = caps.get(0).unwrap();
        out.push_str(&content[last_end..whole.start()]);
        let var_name = &caps[1];
        let default = caps.get(2).map(|m| &m.as_str()[2..]);
        match (std::env::var(var_name).ok(), default) {
            (Some(v), _) => out.push_str(&v),
            (None, Some(d)) => out.push_str(d),
            (None, None) => {
                return Err(ConfigError::Parse(format!(
                    "environment variable `{var_name}` is not set and no default was given"
                )))
            }
        }
        last_end = whole.end();
    }
    out.push_str(&content[last_end..]);
    Ok(out)
}

/// Spawns a background watcher that re-reads `path` every `poll_interval` and
/// publishes newly validated configurations on the returned `watch::Receiver`.
/// A load or validation failure is logged and the previous configuration is kept.
pub fn watch_file(
    path: impl Into<std::path::PathBuf>,
    poll_interval: Duration,
) -> Result<watch::Receiver<SubstrateConfig>, ConfigError> {
    let path = path.into();
    let initial = load_from_file(&path)?;
    let (tx, rx) = watch::channel(initial);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(poll_interval);
        loop {
            ticker.tick().await;
            match load_from_file(&path) {
                Ok(next) => {
                    if *tx.borrow() != next {
                        tracing::info!(path = %path.display(), "configuration reloaded");
                        if tx.send(next).is_err() {
                            break;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "configuration reload failed, keeping previous");
                }
            }
        }
    });
    Ok(rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_var_with_default_when_unset() {
        std::env::remove_var("VSM_SUBSTRATE_TEST_VAR_UNSET");
        let out = expand_env_vars("capacity: ${VSM_SUBSTRATE_TEST_VAR_UNSET:-1000}").unwrap();
        assert_eq!(out, "capacity: 1000");
    }

    #[test]
    fn expands_var_from_environment() {
        std::env::set_var("VSM_SUBSTRATE_TEST_VAR_SET", "42");
        let out = expand_env_vars("capacity: ${VSM_SUBSTRATE_TEST_VAR_SET}").unwrap();
        assert_eq!(out, "capacity: 42");
        std::env::remove_var("VSM_SUBSTRATE_TEST_VAR_SET");
    }

    #[test]
    fn missing_var_without_default_errors() {
        std::env::remove_var("VSM_SUBSTRATE_TEST_VAR_MISSING");
        assert!(expand_env_vars("x: ${VSM_SUBSTRATE_TEST_VAR_MISSING}").is_err());
    }

    #[test]
    fn load_from_file_parses_and_validates_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        use std::io::Write;
        writeln!(file, "producer:\n  buffer_capacity: 500\n  poll_interval_ms: 100").unwrap();
        let cfg = load_from_file(file.path()).unwrap();
        assert_eq!(cfg.producer.buffer_capacity, 500);
    }
}
