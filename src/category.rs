//! Category classification of annotation values
//!
//! Category tiers (`xds@FA1`) carry a value code per segment. The
//! [`CategoryTable`] maps codes to named categories; each category is swept
//! on its own, with the masking/limiting tiers merged back in, and the
//! resulting section sums become the category columns of the report.
//!
//! # Example TOML
//! ```toml
//! [[category]]
//! name = "cds"
//! column = "CDS"
//! codes = ["C", "T"]
//! ```

use crate::error::{AnalysisError, Result};
use crate::record::FileReport;
use crate::segment::Event;
use crate::sweep::{sweep, SweepOptions};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

/// Separator between base tier and value code in category event labels
pub const CODE_SEPARATOR: char = ':';

/// Field names already taken by the fixed report columns
const RESERVED_NAMES: [&str; 2] = ["exclusive", "total"];

/// One named category and the value codes that belong to it
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CategoryDefinition {
    /// Field name (e.g., "cds")
    pub name: String,

    /// Report column header (e.g., "CDS")
    pub column: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Value codes mapped to this category (e.g., ["C", "T"])
    pub codes: Vec<String>,
}

/// Code → category lookup table
#[derive(Debug, Clone)]
pub struct CategoryTable {
    categories: Vec<CategoryDefinition>,
    code_to_category: HashMap<String, usize>,
}

#[derive(Deserialize)]
struct CategoryFile {
    category: Vec<CategoryDefinition>,
}

impl CategoryTable {
    /// Built-in table: `C`/`T` → cds, `A` → ads, `B` → both
    pub fn default_table() -> Result<Self> {
        const DEFAULT_TOML: &str = include_str!("../categories-default.toml");
        Self::from_toml_str(DEFAULT_TOML)
    }

    /// Load a category table from a TOML file
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| AnalysisError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CategoryFile = toml::from_str(content)?;
        Self::new(file.category)
    }

    /// Build and validate a table from definitions
    pub fn new(categories: Vec<CategoryDefinition>) -> Result<Self> {
        if categories.is_empty() {
            return Err(AnalysisError::CategoryTable(
                "at least one category is required".to_string(),
            ));
        }

        let mut names = BTreeSet::new();
        let mut code_to_category = HashMap::new();

        for (index, category) in categories.iter().enumerate() {
            if category.name.is_empty() {
                return Err(AnalysisError::CategoryTable(
                    "category name must not be empty".to_string(),
                ));
            }
            if RESERVED_NAMES.contains(&category.name.as_str()) {
                return Err(AnalysisError::CategoryTable(format!(
                    "category name '{}' is reserved",
                    category.name
                )));
            }
            if !names.insert(category.name.as_str()) {
                return Err(AnalysisError::CategoryTable(format!(
                    "duplicate category '{}'",
                    category.name
                )));
            }
            if category.codes.is_empty() {
                return Err(AnalysisError::CategoryTable(format!(
                    "category '{}' has no codes",
                    category.name
                )));
            }

            for code in &category.codes {
                if code.is_empty() || code.trim() != code || code.contains(CODE_SEPARATOR) {
                    return Err(AnalysisError::CategoryTable(format!(
                        "invalid code {:?} in category '{}'",
                        code, category.name
                    )));
                }
                if let Some(existing) = code_to_category.insert(code.clone(), index) {
                    return Err(AnalysisError::CategoryTable(format!(
                        "duplicate code '{}' in categories '{}' and '{}'",
                        code, categories[existing].name, category.name
                    )));
                }
            }
        }

        Ok(Self {
            categories,
            code_to_category,
        })
    }

    /// Column index of the category a value code belongs to
    pub fn classify(&self, code: &str) -> Option<usize> {
        self.code_to_category.get(code.trim()).copied()
    }

    /// All categories in column order
    pub fn categories(&self) -> &[CategoryDefinition] {
        &self.categories
    }
}

/// Split a category event label (`FA1:C`) into base tier and code
pub fn split_code(label: &str) -> Option<(&str, &str)> {
    label.split_once(CODE_SEPARATOR)
}

/// Sort category events into one bucket per category, relabeled to the
/// base tier. Events with unknown codes are dropped.
pub fn bucket_events(events: Vec<Event>, table: &CategoryTable) -> Vec<Vec<Event>> {
    let mut buckets: Vec<Vec<Event>> = vec![Vec::new(); table.categories().len()];
    let mut unknown = BTreeSet::new();

    for mut event in events {
        let Some((base, code)) = split_code(&event.label) else {
            unknown.insert(String::new());
            continue;
        };
        let Some(index) = table.classify(code) else {
            unknown.insert(code.to_string());
            continue;
        };
        let base = base.to_string();
        event.label = base;
        buckets[index].push(event);
    }

    for code in unknown {
        tracing::warn!("Ignoring annotations with unknown category code {:?}", code);
    }

    buckets
}

/// Run the category pass and add its subtotals to `report`
///
/// `labels` are the combination labels found by the unrestricted sweep;
/// `control_events` are the masking/limiting tier events, merged into every
/// bucket so the same restrictions apply.
pub fn process_categories(
    events: Vec<Event>,
    control_events: &[Event],
    labels: &[String],
    options: &SweepOptions,
    table: &CategoryTable,
    report: &mut FileReport,
) {
    let buckets = bucket_events(events, table);

    for (category, mut bucket) in table.categories().iter().zip(buckets) {
        if bucket.is_empty() {
            continue;
        }
        tracing::debug!("Category {}: {} events", category.name, bucket.len());

        bucket.extend_from_slice(control_events);
        let result = sweep(bucket, options);

        for label in labels {
            report.add_category(label, &category.name, result.get(label));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FileReport;
    use crate::segment::{events_from_segments, tier_label, Segment};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn category_label(segment: &Segment) -> String {
        let base = segment.tier.rsplit('@').next().unwrap_or(&segment.tier);
        format!("{}{}{}", base, CODE_SEPARATOR, segment.value)
    }

    #[test]
    fn test_default_table() {
        let table = CategoryTable::default_table().unwrap();

        let names: Vec<&str> = table.categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["cds", "ads", "both"]);

        let name_of = |code: &str| table.classify(code).map(|i| table.categories()[i].name.as_str());
        assert_eq!(name_of("C"), Some("cds"));
        assert_eq!(name_of("T"), Some("cds"));
        assert_eq!(name_of(" A "), Some("ads"));
        assert_eq!(name_of("B"), Some("both"));
        assert_eq!(name_of("X"), None);
        assert_eq!(table.categories()[2].column, "BOTH");
    }

    #[test]
    fn test_from_toml_file() -> anyhow::Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            r#"
[[category]]
name = "child"
column = "CHILD"
codes = ["C", "T", "K"]
"#
        )?;
        file.flush()?;

        let table = CategoryTable::from_toml(file.path())?;
        assert_eq!(table.categories().len(), 1);
        assert_eq!(table.classify("K"), Some(0));
        assert_eq!(table.categories()[0].column, "CHILD");
        Ok(())
    }

    #[test]
    fn test_duplicate_code_error() {
        let result = CategoryTable::from_toml_str(
            r#"
[[category]]
name = "a"
column = "A"
codes = ["C"]

[[category]]
name = "b"
column = "B"
codes = ["C"]
"#,
        );
        let err = result.unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("duplicate code"));
    }

    #[test]
    fn test_reserved_and_empty_definitions_rejected() {
        let reserved = CategoryTable::from_toml_str(
            "[[category]]\nname = \"total\"\ncolumn = \"T\"\ncodes = [\"C\"]\n",
        );
        assert!(reserved.unwrap_err().to_string().contains("reserved"));

        let no_codes =
            CategoryTable::from_toml_str("[[category]]\nname = \"x\"\ncolumn = \"X\"\ncodes = []\n");
        assert!(no_codes.unwrap_err().to_string().contains("no codes"));

        let padded = CategoryTable::from_toml_str(
            "[[category]]\nname = \"x\"\ncolumn = \"X\"\ncodes = [\" C\"]\n",
        );
        assert!(padded.unwrap_err().to_string().contains("invalid code"));

        assert!(CategoryTable::new(Vec::new()).is_err());
    }

    #[test]
    fn test_bucket_events_strips_codes() {
        let table = CategoryTable::default_table().unwrap();
        let segments = vec![
            Segment::new("xds@FA1", 0, 10, "C"),
            Segment::new("xds@MA1", 0, 10, "A"),
            Segment::new("xds@FA1", 20, 30, "T"),
            Segment::new("xds@FA1", 40, 50, "?"),
        ];
        let buckets = bucket_events(events_from_segments(&segments, category_label), &table);

        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].len(), 4);
        assert!(buckets[0].iter().all(|e| e.label == "FA1"));
        assert_eq!(buckets[1].len(), 2);
        assert!(buckets[1].iter().all(|e| e.label == "MA1"));
        assert!(buckets[2].is_empty());
    }

    #[test]
    fn test_process_categories_fills_report() {
        let table = CategoryTable::default_table().unwrap();
        let mut report = FileReport::new("f", vec!["FA1".to_string(), "MA1".to_string()]);
        let labels = vec!["FA1".to_string(), "FA1+MA1".to_string(), "MA1".to_string()];

        let segments = vec![
            Segment::new("xds@FA1", 0, 10, "C"),
            Segment::new("xds@MA1", 5, 15, "C"),
            Segment::new("xds@MA1", 20, 30, "A"),
        ];
        process_categories(
            events_from_segments(&segments, category_label),
            &[],
            &labels,
            &SweepOptions::default(),
            &table,
            &mut report,
        );

        assert_eq!(report.record("FA1").unwrap().category("cds"), 5);
        assert_eq!(report.record("FA1+MA1").unwrap().category("cds"), 5);
        assert_eq!(report.record("MA1").unwrap().category("cds"), 5);
        assert_eq!(report.record("MA1").unwrap().category("ads"), 10);
        assert_eq!(report.totals().category("cds"), 15);
        assert_eq!(report.totals().category("ads"), 10);
        assert_eq!(report.totals().category("both"), 0);
    }

    #[test]
    fn test_control_events_mask_category_sweep() {
        let table = CategoryTable::default_table().unwrap();
        let mut report = FileReport::new("f", vec!["FA1".to_string()]);
        let labels = vec!["FA1".to_string()];
        let options = SweepOptions {
            masking: ["EE1".to_string()].into_iter().collect(),
            ..Default::default()
        };

        let control = events_from_segments(&[Segment::new("EE1", 0, 4, "")], tier_label);
        let segments = vec![Segment::new("xds@FA1", 0, 10, "C")];
        process_categories(
            events_from_segments(&segments, category_label),
            &control,
            &labels,
            &options,
            &table,
            &mut report,
        );

        assert_eq!(report.record("FA1").unwrap().category("cds"), 6);
    }

    #[test]
    fn test_empty_bucket_is_skipped() {
        let table = CategoryTable::default_table().unwrap();
        let mut report = FileReport::new("f", vec!["FA1".to_string()]);
        let control = events_from_segments(&[Segment::new("L", 0, 100, "")], tier_label);

        process_categories(
            Vec::new(),
            &control,
            &["FA1".to_string()],
            &SweepOptions::default(),
            &table,
            &mut report,
        );

        assert!(report.totals().categories.is_empty());
        assert!(report.record("FA1").is_none());
    }
}
