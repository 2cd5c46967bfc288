//! Per-file output records and cross-file grand totals

use crate::sweep::{SweepResult, LABEL_SEPARATOR};
use std::collections::BTreeMap;

/// Label of the per-file totals record
pub const TOTALS_LABEL: &str = "Totals";

/// File column of the grand-total record
pub const GRAND_TOTALS_FILE: &str = "Grand Totals";

/// One report row: accumulated durations for a (file, label) pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputRecord {
    pub file_id: String,
    pub label: String,
    /// Time during which exactly this combination was active
    pub exclusive: i64,
    /// Time during which this tier was active in any combination
    pub total: i64,
    /// Category subtotals keyed by category name
    pub categories: BTreeMap<String, i64>,
}

impl OutputRecord {
    pub fn new(file_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn category(&self, name: &str) -> i64 {
        self.categories.get(name).copied().unwrap_or(0)
    }

    pub fn add_category(&mut self, name: &str, duration: i64) {
        *self.categories.entry(name.to_string()).or_default() += duration;
    }

    /// Field-by-field additive merge of `other` into `self`
    pub fn merge(&mut self, other: &OutputRecord) {
        self.exclusive += other.exclusive;
        self.total += other.total;
        for (name, duration) in &other.categories {
            self.add_category(name, *duration);
        }
    }
}

/// True if `label` is a combination containing `tier` as a whole name
pub fn label_contains_tier(label: &str, tier: &str) -> bool {
    label.split(LABEL_SEPARATOR).any(|name| name == tier)
}

/// Every output record produced for one annotation file
#[derive(Debug, Clone)]
pub struct FileReport {
    pub file_id: String,
    /// Base tiers in report order
    pub tiers: Vec<String>,
    records: BTreeMap<String, OutputRecord>,
    totals: OutputRecord,
}

impl FileReport {
    pub fn new(file_id: impl Into<String>, tiers: Vec<String>) -> Self {
        let file_id = file_id.into();
        Self {
            totals: OutputRecord::new(file_id.clone(), TOTALS_LABEL),
            file_id,
            tiers,
            records: BTreeMap::new(),
        }
    }

    /// Build records from the unrestricted sweep of a file
    pub fn from_sweep(file_id: impl Into<String>, tiers: Vec<String>, result: &SweepResult) -> Self {
        let mut report = Self::new(file_id, tiers);

        for label in result.labels() {
            let duration = result.get(label);
            report.record_mut(label).exclusive += duration;
            report.totals.exclusive += duration;
        }

        for tier in report.tiers.clone() {
            let total: i64 = result
                .labels()
                .filter(|label| label_contains_tier(label, &tier))
                .map(|label| result.get(label))
                .sum();
            if total > 0 {
                report.record_mut(&tier).total += total;
                report.totals.total += total;
            }
        }

        report
    }

    fn record_mut(&mut self, label: &str) -> &mut OutputRecord {
        let file_id = &self.file_id;
        self.records
            .entry(label.to_string())
            .or_insert_with(|| OutputRecord::new(file_id.clone(), label))
    }

    /// Add a category subtotal to `label` and to the file totals
    pub fn add_category(&mut self, label: &str, category: &str, duration: i64) {
        if duration == 0 {
            return;
        }
        self.record_mut(label).add_category(category, duration);
        self.totals.add_category(category, duration);
    }

    pub fn record(&self, label: &str) -> Option<&OutputRecord> {
        self.records.get(label)
    }

    pub fn totals(&self) -> &OutputRecord {
        &self.totals
    }

    /// Records in report order
    ///
    /// Single-tier rows in tier order, then (with `overlap`) combination rows
    /// sorted by label, then (with `totals`) the file's totals row.
    pub fn rows(&self, overlap: bool, totals: bool) -> Vec<&OutputRecord> {
        let mut rows: Vec<&OutputRecord> = self
            .tiers
            .iter()
            .filter_map(|tier| self.records.get(tier))
            .collect();

        if overlap {
            rows.extend(
                self.records
                    .iter()
                    .filter(|(label, _)| !self.tiers.contains(*label))
                    .map(|(_, record)| record),
            );
        }

        if totals {
            rows.push(&self.totals);
        }

        rows
    }
}

/// Cross-file accumulator fed by each file's totals record
#[derive(Debug, Clone)]
pub struct GrandTotals {
    record: OutputRecord,
    files: usize,
}

impl Default for GrandTotals {
    fn default() -> Self {
        Self {
            record: OutputRecord::new(GRAND_TOTALS_FILE, ""),
            files: 0,
        }
    }
}

impl GrandTotals {

    pub fn merge(&mut self, report: &FileReport) {
        self.record.merge(report.totals());
        self.files += 1;
    }

    /// Number of file reports merged so far
    pub fn files(&self) -> usize {
        self.files
    }

    pub fn record(&self) -> &OutputRecord {
        &self.record
    }
}
