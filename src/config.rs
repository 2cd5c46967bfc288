//! Analysis configuration
//!
//! One explicit value threaded through the pipeline; nothing reads options
//! from global state. Loadable from TOML, with command-line flags applied on
//! top by the binary.
//!
//! # Example TOML
//! ```toml
//! ignore_tiers = ["UC1"]
//! masking_tiers = ["EE1"]
//! limiting_tier = "on_air"
//! overlap = false
//! delimiter = "comma"
//! activation = "set"
//! ```

use crate::csv_output::Delimiter;
use crate::error::{AnalysisError, Result};
use crate::sweep::{ActivationMode, SweepOptions};
use crate::tiers::DEFAULT_IGNORED_TIERS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Options controlling tier selection, sweep restrictions and report shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Tiers excluded from every pass, in addition to the built-in list
    pub ignore_tiers: Vec<String>,

    /// Only time during which this tier is active is counted
    pub limiting_tier: Option<String>,

    /// Time during which any of these tiers is active is not counted
    pub masking_tiers: Vec<String>,

    /// Run the category (CDS/ADS/BOTH) pass
    pub xds: bool,

    /// Emit multi-tier combination rows
    pub overlap: bool,

    /// Emit per-file totals rows and the grand-total row
    pub totals: bool,

    pub delimiter: Delimiter,

    pub activation: ActivationMode,

    /// Tier kind carrying category codes (`xds` for `xds@FA1`)
    pub category_tier_prefix: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            ignore_tiers: Vec::new(),
            limiting_tier: None,
            masking_tiers: Vec::new(),
            xds: true,
            overlap: true,
            totals: true,
            delimiter: Delimiter::Tab,
            activation: ActivationMode::Set,
            category_tier_prefix: "xds".to_string(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a TOML file
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| AnalysisError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Reject contradictory or malformed options
    pub fn validate(&self) -> Result<()> {
        let lists = [
            ("ignore_tiers", &self.ignore_tiers),
            ("masking_tiers", &self.masking_tiers),
        ];
        for (field, tiers) in lists {
            if tiers.iter().any(|tier| tier.trim().is_empty()) {
                return Err(AnalysisError::Config(format!(
                    "{} contains an empty tier name",
                    field
                )));
            }
        }

        if let Some(limiting) = &self.limiting_tier {
            if limiting.trim().is_empty() {
                return Err(AnalysisError::Config(
                    "limiting_tier must not be empty".to_string(),
                ));
            }
            if self.masking_tiers.contains(limiting) {
                return Err(AnalysisError::Config(format!(
                    "tier '{}' cannot be both limiting and masking",
                    limiting
                )));
            }
            if self.is_ignored(limiting) {
                return Err(AnalysisError::Config(format!(
                    "limiting tier '{}' is ignored",
                    limiting
                )));
            }
        }

        if let Some(tier) = self.masking_tiers.iter().find(|t| self.is_ignored(t)) {
            return Err(AnalysisError::Config(format!(
                "masking tier '{}' is ignored",
                tier
            )));
        }

        let prefix = self.category_tier_prefix.trim();
        if prefix.is_empty() || prefix.contains('@') {
            return Err(AnalysisError::Config(format!(
                "invalid category tier prefix {:?}",
                self.category_tier_prefix
            )));
        }

        Ok(())
    }

    /// True for built-in and configured ignored tiers
    pub fn is_ignored(&self, tier: &str) -> bool {
        DEFAULT_IGNORED_TIERS.contains(&tier) || self.ignore_tiers.iter().any(|t| t == tier)
    }

    /// Masking tiers followed by the limiting tier, without duplicates
    pub fn control_tiers(&self) -> Vec<String> {
        let mut tiers: Vec<String> = Vec::new();
        for tier in self.masking_tiers.iter().chain(self.limiting_tier.iter()) {
            if !tiers.contains(tier) {
                tiers.push(tier.clone());
            }
        }
        tiers
    }

    /// Sweep restrictions derived from this configuration
    pub fn sweep_options(&self) -> SweepOptions {
        SweepOptions {
            masking: self.masking_tiers.iter().cloned().collect(),
            limiting: self.limiting_tier.clone(),
            activation: self.activation,
        }
    }
}
