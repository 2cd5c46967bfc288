//! Tier selection
//!
//! Annotation files name dependent tiers `<kind>@<base>` (`lex@CHI`,
//! `xds@FA1`). The base tiers reported on are the distinct `<base>` parts;
//! category tiers are those whose kind is the configured category prefix.

use crate::config::AnalysisConfig;
use std::collections::BTreeSet;

/// Separator between tier kind and base tier
pub const TIER_SEPARATOR: char = '@';

/// Tiers that never carry speaker time
pub const DEFAULT_IGNORED_TIERS: [&str; 4] = ["code_num", "on_off", "context", "code"];

/// Base tier of a tier name (the part after the last `@`)
pub fn base_tier(name: &str) -> &str {
    name.rsplit(TIER_SEPARATOR).next().unwrap_or(name)
}

/// Tiers taking part in one file's analysis
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierSelection {
    /// Reported base tiers, sorted
    pub base: Vec<String>,
    /// Category tiers (e.g., `xds@FA1`), in file order
    pub category: Vec<String>,
    /// Masking/limiting tiers present in the file
    pub control: Vec<String>,
}

impl TierSelection {
    pub fn select(tier_names: &[&str], config: &AnalysisConfig) -> Self {
        let control_tiers = config.control_tiers();
        let is_control = |name: &str| control_tiers.iter().any(|c| c == name);

        let base: BTreeSet<&str> = tier_names
            .iter()
            .filter(|name| name.contains(TIER_SEPARATOR))
            .map(|name| base_tier(name))
            .filter(|base| !base.is_empty() && !config.is_ignored(base) && !is_control(*base))
            .collect();

        let prefix = format!("{}{}", config.category_tier_prefix, TIER_SEPARATOR);
        let category = tier_names
            .iter()
            .filter(|name| name.contains(&prefix))
            .filter(|name| {
                let base = base_tier(name);
                !config.is_ignored(name) && !config.is_ignored(base) && !is_control(base)
            })
            .map(|name| name.to_string())
            .collect();

        let mut control = Vec::new();
        for tier in control_tiers {
            if tier_names.contains(&tier.as_str()) {
                control.push(tier);
            } else {
                tracing::warn!("Control tier {} not present in file", tier);
            }
        }

        Self {
            base: base.into_iter().map(str::to_string).collect(),
            category,
            control,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMES: [&str; 12] = [
        "CHI",
        "lex@CHI",
        "FA1",
        "xds@FA1",
        "MA1",
        "xds@MA1",
        "EE1",
        "xds@EE1",
        "code",
        "context",
        "on_off@X",
        "code_num",
    ];

    #[test]
    fn test_base_tier() {
        assert_eq!(base_tier("xds@FA1"), "FA1");
        assert_eq!(base_tier("a@b@CHI"), "CHI");
        assert_eq!(base_tier("CHI"), "CHI");
    }

    #[test]
    fn test_default_selection() {
        let selection = TierSelection::select(&NAMES, &AnalysisConfig::default());

        assert_eq!(selection.base, vec!["CHI", "EE1", "FA1", "MA1", "X"]);
        assert_eq!(selection.category, vec!["xds@FA1", "xds@MA1", "xds@EE1"]);
        assert!(selection.control.is_empty());
    }

    #[test]
    fn test_ignored_tiers_dropped_everywhere() {
        let config = AnalysisConfig {
            ignore_tiers: vec!["MA1".to_string(), "X".to_string()],
            ..Default::default()
        };
        let selection = TierSelection::select(&NAMES, &config);

        assert_eq!(selection.base, vec!["CHI", "EE1", "FA1"]);
        assert_eq!(selection.category, vec!["xds@FA1", "xds@EE1"]);
    }

    #[test]
    fn test_control_tiers_not_reported() {
        let config = AnalysisConfig {
            masking_tiers: vec!["EE1".to_string()],
            limiting_tier: Some("on_air".to_string()),
            ..Default::default()
        };
        let selection = TierSelection::select(&NAMES, &config);

        assert_eq!(selection.base, vec!["CHI", "FA1", "MA1", "X"]);
        assert_eq!(selection.category, vec!["xds@FA1", "xds@MA1"]);
        // on_air is absent from the file
        assert_eq!(selection.control, vec!["EE1"]);
    }

    #[test]
    fn test_custom_category_prefix() {
        let config = AnalysisConfig {
            category_tier_prefix: "lex".to_string(),
            ..Default::default()
        };
        let selection = TierSelection::select(&NAMES, &config);
        assert_eq!(selection.category, vec!["lex@CHI"]);
    }
}
