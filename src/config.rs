// ⚙️ Engine Configuration
// A store is configured once: which ledger shape it holds, and how many
// entries a top-N query returns when the caller does not say.

use crate::error::{EngineError, EngineResult};
use crate::ledger::Flavor;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Ledger shape for every entity in the store
    #[serde(default)]
    pub flavor: Flavor,

    /// Size of a top-N view when no `n` is given
    #[serde(default = "default_top_n")]
    pub default_top_n: usize,
}

fn default_top_n() -> usize {
    3
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            flavor: Flavor::default(),
            default_top_n: default_top_n(),
        }
    }
}

impl EngineConfig {
    pub fn new(flavor: Flavor) -> Self {
        EngineConfig {
            flavor,
            ..EngineConfig::default()
        }
    }

    /// Parse a JSON config, filling missing fields with defaults
    ///
    /// Example: `{"flavor": "line_items", "default_top_n": 5}`
    pub fn from_json_str(json: &str) -> EngineResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| EngineError::invalid(format!("config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.default_top_n == 0 {
            return Err(EngineError::invalid("default_top_n must be at least 1"));
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
