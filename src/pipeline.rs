//! Per-file analysis and the multi-file driver
//!
//! Each file is analyzed independently into a [`FileReport`]. The driver
//! writes reports in argument order and is the only place the grand total
//! is updated, so running files on a worker pool does not change the output.

use crate::category::{process_categories, CategoryTable, CODE_SEPARATOR};
use crate::config::AnalysisConfig;
use crate::csv_output::CsvReport;
use crate::record::{FileReport, GrandTotals};
use crate::segment::{events_from_segments, tier_label, Segment};
use crate::source::{collect_segments, AnnotationDocument, AnnotationSource};
use crate::sweep::{sweep, SweepOptions};
use crate::tiers::{base_tier, TierSelection};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Extension of the annotation files the JSON documents are exported from
const EAF_EXTENSION: &str = ".eaf";

/// Report identifier of an annotation file: its name without extension
///
/// A leftover `.eaf` (`session01.eaf.json`) is dropped as well.
pub fn file_id(path: &Path) -> String {
    let stem = path
        .file_stem()
        .or_else(|| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    match stem.strip_suffix(EAF_EXTENSION) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => stem,
    }
}

/// Category event label: base tier and value code (`xds@FA1` + `C` → `FA1:C`)
fn category_label(segment: &Segment) -> String {
    format!(
        "{}{}{}",
        base_tier(&segment.tier),
        CODE_SEPARATOR,
        segment.value.trim()
    )
}

/// Analyzes annotation files under one configuration
#[derive(Debug)]
pub struct Analyzer<'a> {
    config: &'a AnalysisConfig,
    categories: &'a CategoryTable,
    options: SweepOptions,
}

impl<'a> Analyzer<'a> {
    pub fn new(config: &'a AnalysisConfig, categories: &'a CategoryTable) -> Self {
        Self {
            config,
            categories,
            options: config.sweep_options(),
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        self.config
    }

    /// Analyze one file's annotations
    ///
    /// Returns `None` (with a warning) when the selected tiers hold no
    /// segments at all.
    pub fn analyze<S: AnnotationSource + ?Sized>(&self, file_id: &str, source: &S) -> Option<FileReport> {
        let tier_names = source.tier_names();
        let selection = TierSelection::select(&tier_names, self.config);
        tracing::debug!("{}: base tiers {:?}", file_id, selection.base);

        let segments = collect_segments(source, &selection.base);
        if segments.is_empty() {
            tracing::warn!("{}: no segments found for the selected tiers, skipping", file_id);
            return None;
        }
        tracing::debug!("{}: found {} segments", file_id, segments.len());

        let control_segments = collect_segments(source, &selection.control);
        let control_events = events_from_segments(&control_segments, tier_label);

        let mut events = events_from_segments(&segments, tier_label);
        events.extend_from_slice(&control_events);

        let result = sweep(events, &self.options);
        tracing::debug!(
            "{}: union sum {} ms, gaps {} ms, {} section types",
            file_id,
            result.union_sum,
            result.gap_sum(),
            result.labels().count()
        );

        let mut report = FileReport::from_sweep(file_id, selection.base.clone(), &result);

        if self.config.xds {
            let category_segments = collect_segments(source, &selection.category);
            tracing::debug!(
                "{}: category tiers {:?}, {} segments",
                file_id,
                selection.category,
                category_segments.len()
            );

            let labels: Vec<String> = result.labels().map(str::to_string).collect();
            process_categories(
                events_from_segments(&category_segments, category_label),
                &control_events,
                &labels,
                &self.options,
                self.categories,
                &mut report,
            );
        }

        Some(report)
    }

    /// Load and analyze one annotation document
    ///
    /// Unreadable or undecodable files are logged and skipped.
    pub fn analyze_path(&self, path: &Path) -> Option<FileReport> {
        tracing::info!("Processing {}", path.display());

        match AnnotationDocument::from_path(path) {
            Ok(document) => self.analyze(&file_id(path), &document),
            Err(e) => {
                tracing::error!("Skipping {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Analyze every path, in order, using up to `jobs` worker threads
    pub fn analyze_all(&self, paths: &[PathBuf], jobs: usize) -> Result<Vec<Option<FileReport>>> {
        if jobs <= 1 || paths.len() <= 1 {
            return Ok(paths.iter().map(|path| self.analyze_path(path)).collect());
        }

        let (job_tx, job_rx) = crossbeam::channel::unbounded::<(usize, &Path)>();
        let (result_tx, result_rx) = crossbeam::channel::unbounded();

        for (index, path) in paths.iter().enumerate() {
            job_tx
                .send((index, path.as_path()))
                .map_err(|_| anyhow::anyhow!("Failed to queue {}", path.display()))?;
        }
        drop(job_tx);

        crossbeam::scope(|scope| {
            for _ in 0..jobs.min(paths.len()) {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move |_| {
                    for (index, path) in job_rx.iter() {
                        if result_tx.send((index, self.analyze_path(path))).is_err() {
                            break;
                        }
                    }
                });
            }
        })
        .map_err(|_| anyhow::anyhow!("Analysis worker thread panicked"))?;
        drop(result_tx);

        let mut reports: Vec<Option<FileReport>> = vec![None; paths.len()];
        for (index, report) in result_rx.iter() {
            reports[index] = report;
        }
        Ok(reports)
    }
}

/// Outcome of a multi-file run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub files_reported: usize,
    pub files_skipped: usize,
    pub grand_totals: GrandTotals,
}

/// Analyze `paths` and write the full report to `writer`
pub fn run<W: Write>(
    analyzer: &Analyzer<'_>,
    csv: &CsvReport,
    paths: &[PathBuf],
    jobs: usize,
    writer: &mut W,
) -> Result<RunSummary> {
    let config = analyzer.config();
    csv.write_header(writer).context("Failed to write report header")?;

    let reports = analyzer.analyze_all(paths, jobs)?;

    let mut grand_totals = GrandTotals::default();
    let mut files_skipped = 0;

    for report in reports {
        let Some(report) = report else {
            files_skipped += 1;
            continue;
        };

        for record in report.rows(config.overlap, config.totals) {
            csv.write_record(writer, record)
                .with_context(|| format!("Failed to write rows for {}", report.file_id))?;
        }
        grand_totals.merge(&report);
    }

    if config.totals && paths.len() > 1 {
        csv.write_record(writer, grand_totals.record())
            .context("Failed to write grand totals")?;
    }
    writer.flush().context("Failed to flush report")?;

    Ok(RunSummary {
        files_reported: grand_totals.files(),
        files_skipped,
        grand_totals,
    })
}
