use codesift_sandbox::{FetchPolicy, IngestLimits};
use codesift_segmenter::SegmenterConfig;
use codesift_validator::ValidatorConfig;
use serde::{Deserialize, Serialize};

/// Configuration for the extraction pipeline
///
/// Composes the per-stage configs so a caller tunes everything in one
/// place. Validation concurrency is resolved at process level (see
/// `CODESIFT_VALIDATION_CONCURRENCY`), not here, so two pipelines in one
/// process cannot fight over the same cores with different limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub segmenter: SegmenterConfig,
    pub validator: ValidatorConfig,
    /// Secret scanning stops after this many bytes per fragment
    pub secret_scan_cap_bytes: usize,
    #[serde(skip)]
    pub ingest: IngestLimits,
    #[serde(skip)]
    pub fetch: FetchPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            segmenter: SegmenterConfig::default(),
            validator: ValidatorConfig::default(),
            secret_scan_cap_bytes: 100_000,
            ingest: IngestLimits::default(),
            fetch: FetchPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Extraction tuned for chat transcripts: smaller blocks, laxer density
    pub fn aggressive() -> Self {
        Self {
            segmenter: SegmenterConfig::aggressive(),
            ..Self::default()
        }
    }

    /// Extraction tuned for precision over recall
    pub fn conservative() -> Self {
        Self {
            segmenter: SegmenterConfig::conservative(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.segmenter.validate()?;
        self.validator.validate()?;
        if self.secret_scan_cap_bytes == 0 {
            return Err("secret_scan_cap_bytes must be > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
        assert!(EngineConfig::aggressive().validate().is_ok());
        assert!(EngineConfig::conservative().validate().is_ok());
    }

    #[test]
    fn test_zero_scan_cap_is_rejected() {
        let config = EngineConfig {
            secret_scan_cap_bytes: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_child_config_propagates() {
        let mut config = EngineConfig::default();
        config.validator.pattern_density_floor = 3.0;
        assert!(config.validate().is_err());
    }
}
