use metrics_extraction::CurrencyScale;
use property_core::{DomainStandards, EngineError};
use std::path::Path;

pub const CURRENCY_SCALE_VAR: &str = "DEAL_CURRENCY_SCALE";
pub const STANDARDS_PATH_VAR: &str = "DEAL_STANDARDS_PATH";

/// Engine settings. Everything defaults to the built-in tables.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub currency_scale: CurrencyScale,
    pub standards: DomainStandards,
}

impl EngineConfig {
    /// Read `DEAL_CURRENCY_SCALE` and `DEAL_STANDARDS_PATH` from the environment.
    pub fn from_env() -> Result<Self, EngineError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EngineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = EngineConfig::default();
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(scale) = value(CURRENCY_SCALE_VAR) {
            config.currency_scale = scale.parse()?;
        }
        if let Some(path) = value(STANDARDS_PATH_VAR) {
            config.standards = load_standards(Path::new(path.trim()))?;
        }

        tracing::debug!(
            "Engine config: currency_scale={}",
            config.currency_scale.as_str()
        );
        Ok(config)
    }

    pub fn with_currency_scale(mut self, scale: CurrencyScale) -> Self {
        self.currency_scale = scale;
        self
    }

    pub fn with_standards(mut self, standards: DomainStandards) -> Self {
        self.standards = standards;
        self
    }
}

/// Load and validate a JSON standards table.
pub fn load_standards(path: &Path) -> Result<DomainStandards, EngineError> {
    let json = std::fs::read_to_string(path).map_err(|e| {
        EngineError::Config(format!("cannot read standards file {}: {}", path.display(), e))
    })?;
    let standards = DomainStandards::from_json(&json)?;
    tracing::info!("Loaded domain standards from {}", path.display());
    Ok(standards)
}
