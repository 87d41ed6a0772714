//! Processor configuration and validation.

use serde::{Deserialize, Serialize};
use std::path::Path;
use w3pi_core::{Result, W3piError};
use w3pi_physics::{IsolationConfig, OrderingConfig, SelectionCuts, TrigMode};

/// Which ordering implementation feeds the top-K stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Partitioned bitonic sort + merge network
    #[default]
    Partitioned,
    /// Whole-array stable sort (ties by original index)
    Reference,
}

/// Full configuration of an [`crate::EventProcessor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProcessorConfig {
    /// Admission cuts
    #[serde(default)]
    pub selection: SelectionCuts,

    /// Block partition of the sort network
    #[serde(default)]
    pub ordering: OrderingConfig,

    #[serde(default)]
    pub sort_mode: SortMode,

    /// cos/cosh evaluation for pair masses
    #[serde(default)]
    pub trig: TrigMode,

    /// Seed / isolation engine settings
    #[serde(default)]
    pub isolation: IsolationConfig,

    /// Run the isolation engine alongside scoring
    #[serde(default)]
    pub enable_isolation: bool,

    /// Keep intermediate arrays (mask, sorted array, features) in the outcome
    #[serde(default)]
    pub collect_diagnostics: bool,
}

impl ProcessorConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ProcessorConfigBuilder {
        ProcessorConfigBuilder::default()
    }

    /// Loads and validates a TOML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        log::info!("Loaded processor config from {}", path.display());
        Ok(config)
    }

    /// Parses and validates a TOML document. Missing tables take their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: ProcessorConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| W3piError::config(e.to_string()))
    }

    /// Validates the configuration.
    ///
    /// Returns an error if any constraints are violated.
    pub fn validate(&self) -> Result<()> {
        self.ordering.validate()?;
        self.isolation.validate()?;

        if self.selection.min_id > self.selection.max_id {
            return Err(W3piError::config(format!(
                "selection id range {}..={} is empty",
                self.selection.min_id, self.selection.max_id
            )));
        }
        if self.selection.eta_cut < 0 {
            return Err(W3piError::config(format!(
                "eta_cut must be non-negative, got {}",
                self.selection.eta_cut
            )));
        }
        Ok(())
    }
}

/// Builder for ProcessorConfig.
#[derive(Debug, Default)]
pub struct ProcessorConfigBuilder {
    config: ProcessorConfig,
}

impl ProcessorConfigBuilder {
    pub fn selection(mut self, cuts: SelectionCuts) -> Self {
        self.config.selection = cuts;
        self
    }

    pub fn ordering(mut self, ordering: OrderingConfig) -> Self {
        self.config.ordering = ordering;
        self
    }

    pub fn sort_mode(mut self, mode: SortMode) -> Self {
        self.config.sort_mode = mode;
        self
    }

    pub fn trig(mut self, trig: TrigMode) -> Self {
        self.config.trig = trig;
        self
    }

    /// Enables the isolation engine with the given settings.
    pub fn isolation(mut self, isolation: IsolationConfig) -> Self {
        self.config.isolation = isolation;
        self.config.enable_isolation = true;
        self
    }

    pub fn diagnostics(mut self, enabled: bool) -> Self {
        self.config.collect_diagnostics = enabled;
        self
    }

    pub fn build(self) -> Result<ProcessorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use w3pi_physics::{IsolationCut, MaskPolicy};

    #[test]
    fn test_config_validation() {
        let mut config = ProcessorConfig::default();
        assert!(config.validate().is_ok());

        config.ordering.block_count = 6;
        assert!(config.validate().is_err());

        config.ordering = OrderingConfig::preset_16x13();
        config.selection.min_id = 6;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = ProcessorConfig::builder()
            .ordering(OrderingConfig::preset_8x26())
            .sort_mode(SortMode::Reference)
            .trig(TrigMode::Exact)
            .isolation(IsolationConfig {
                mask_policy: MaskPolicy::SeedOnly,
                ..Default::default()
            })
            .build()
            .unwrap();

        assert_eq!(config.ordering.sort_width(), 208);
        assert_eq!(config.sort_mode, SortMode::Reference);
        assert!(config.enable_isolation);
        assert!(!config.collect_diagnostics);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ProcessorConfig::from_toml_str(
            r#"
            sort_mode = "reference"

            [isolation]
            max_seeds = 4
            cut = { kind = "scaled", factor = 0.5 }
            "#,
        )
        .unwrap();
        assert_eq!(config.sort_mode, SortMode::Reference);
        assert_eq!(config.isolation.max_seeds, 4);
        assert_eq!(config.isolation.cut, IsolationCut::Scaled { factor: 0.5 });
        assert_eq!(config.isolation.dr_max, 0.4);
        assert_eq!(config.ordering, OrderingConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        let err = ProcessorConfig::from_toml_str("[ordering]\nblock_count = 16\nblock_size = 14\n")
            .unwrap_err();
        assert!(matches!(err, W3piError::ConfigError(_)));

        let err = ProcessorConfig::from_toml_str("sort_mode = 3").unwrap_err();
        assert!(matches!(err, W3piError::TomlError(_)));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ProcessorConfig::builder()
            .ordering(OrderingConfig::preset_16x13())
            .diagnostics(true)
            .build()
            .unwrap();
        let text = config.to_toml_string().unwrap();
        assert_eq!(ProcessorConfig::from_toml_str(&text).unwrap(), config);
    }
}
