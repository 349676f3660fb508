// SPDX-License-Identifier: MIT OR Apache-2.0

use super::SubstrateConfig;
use crate::core::exception::ConfigError;

/// Checks cross-field and range invariants a parsed `SubstrateConfig` must hold.
/// Collects every violation rather than failing on the first one, so a `validate`
/// CLI subcommand can report everything wrong with a config file in one pass.
pub fn validate(config: &SubstrateConfig) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.producer.buffer_capacity == 0 {
        errors.push("producer.buffer_capacity must be greater than zero".to_string());
    }

    let weights = &config.attention.weights;
    let sum = weights.novelty + weights.urgency + weights.relevance + weights.intensity + weights.coherence;
    if (sum - 1.0).abs() > 1e-6 {
        errors.push(format!(
            "attention weights must sum to 1.0, got {sum:.4}"
        ));
    }
    for (name, w) in [
        ("novelty", weights.novelty),
        ("urgency", weights.urgency),
        ("relevance", weights.relevance),
        ("intensity", weights.intensity),
        ("coherence", weights.coherence),
    ] {
        if !(0.0..=1.0).contains(&w) {
            errors.push(format!("attention.weights.{name} must be in [0, 1], got {w}"));
        }
    }

    if !(0.0..=1.0).contains(&config.coordinator.low_attention_threshold) {
        errors.push("coordinator.low_attention_threshold must be in [0, 1]".to_string());
    }
    if config.coordinator.bypass_threshold < config.coordinator.low_attention_threshold {
        errors.push(
            "coordinator.bypass_threshold must be >= coordinator.low_attention_threshold"
                .to_string(),
        );
    }
    if config.coordinator.base_rate_per_sec <= 0.0 {
        errors.push("coordinator.base_rate_per_sec must be positive".to_string());
    }

    for lane in [
        ("high_priority", &config.processor.high_priority),
        ("normal_priority", &config.processor.normal_priority),
        ("analytics", &config.processor.analytics),
        ("pattern_matching", &config.processor.pattern_matching),
    ] {
        if lane.1.concurrency == 0 {
            errors.push(format!("processor.{}.concurrency must be > 0", lane.0));
        }
        if lane.1.batch_size == 0 {
            errors.push(format!("processor.{}.batch_size must be > 0", lane.0));
        }
    }

    if config.pattern.window_ms == 0 {
        errors.push("pattern.window_ms must be > 0".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&SubstrateConfig::default()).is_ok());
    }

    #[test]
    fn zero_buffer_capacity_is_rejected() {
        let mut cfg = SubstrateConfig::default();
        cfg.producer.buffer_capacity = 0;
        let err = validate(&cfg).unwrap_err();
        match err {
            ConfigError::Invalid(errors) => {
                assert!(errors.iter().any(|e| e.contains("buffer_capacity")));
            }
            _ => panic!("expected Invalid"),
        }
    }

    #[test]
    fn unbalanced_attention_weights_are_rejected() {
        let mut cfg = SubstrateConfig::default();
        cfg.attention.weights.novelty = 0.9;
        assert!(validate(&cfg).is_err());
    }
}
