//! Input boundary: tiered annotation data
//!
//! The analysis only needs, per file, the tier names in file order and the
//! `(start, end, value)` annotations of each tier. Anything that can answer
//! those two questions implements [`AnnotationSource`]; the crate ships a
//! JSON document form of the same shape.
//!
//! # Example JSON
//! ```json
//! {
//!   "tiers": [
//!     { "name": "lex@CHI", "annotations": [] },
//!     { "name": "CHI", "annotations": [ { "start": 0, "end": 1200, "value": "0." } ] }
//!   ]
//! }
//! ```

use crate::error::{AnalysisError, Result};
use crate::segment::Segment;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One raw annotation: milliseconds and the annotation text
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Annotation {
    pub start: i64,
    pub end: i64,
    #[serde(default)]
    pub value: String,
}

/// Provider of tier names and per-tier annotations for one file
pub trait AnnotationSource {
    /// All tier names, in file order
    fn tier_names(&self) -> Vec<&str>;

    /// Annotations of `tier`, or `None` if the file has no such tier
    fn annotations(&self, tier: &str) -> Option<&[Annotation]>;
}

/// A named tier and its annotations
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TierData {
    pub name: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// JSON annotation document
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AnnotationDocument {
    pub tiers: Vec<TierData>,
}

impl AnnotationDocument {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| AnalysisError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| AnalysisError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Add a tier (builder style, mostly for tests)
    pub fn with_tier(mut self, name: &str, annotations: &[(i64, i64, &str)]) -> Self {
        self.tiers.push(TierData {
            name: name.to_string(),
            annotations: annotations
                .iter()
                .map(|&(start, end, value)| Annotation {
                    start,
                    end,
                    value: value.to_string(),
                })
                .collect(),
        });
        self
    }
}

impl AnnotationSource for AnnotationDocument {
    fn tier_names(&self) -> Vec<&str> {
        self.tiers.iter().map(|t| t.name.as_str()).collect()
    }

    fn annotations(&self, tier: &str) -> Option<&[Annotation]> {
        self.tiers
            .iter()
            .find(|t| t.name == tier)
            .map(|t| t.annotations.as_slice())
    }
}

/// Collect the segments of `tiers` from `source`, tier by tier
///
/// Tiers missing from the source contribute nothing.
pub fn collect_segments<S: AnnotationSource + ?Sized>(source: &S, tiers: &[String]) -> Vec<Segment> {
    let mut segments = Vec::new();
    for tier in tiers {
        let Some(annotations) = source.annotations(tier) else {
            tracing::debug!("Tier {} has no annotation data", tier);
            continue;
        };
        segments.extend(
            annotations
                .iter()
                .map(|a| Segment::new(tier.as_str(), a.start, a.end, a.value.as_str())),
        );
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_from_path() -> anyhow::Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(
            file,
            r#"{{"tiers": [
                {{"name": "lex@CHI", "annotations": []}},
                {{"name": "CHI", "annotations": [{{"start": 0, "end": 1200, "value": "0."}}]}},
                {{"name": "FA1"}}
            ]}}"#
        )?;
        file.flush()?;

        let doc = AnnotationDocument::from_path(file.path())?;
        assert_eq!(doc.tier_names(), vec!["lex@CHI", "CHI", "FA1"]);
        assert_eq!(doc.annotations("CHI").unwrap()[0].end, 1200);
        assert!(doc.annotations("FA1").unwrap().is_empty());
        assert!(doc.annotations("MA1").is_none());
        Ok(())
    }

    #[test]
    fn test_decode_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{\"tiers\": 3}}").unwrap();
        file.flush().unwrap();

        let err = AnnotationDocument::from_path(file.path()).unwrap_err();
        assert!(matches!(err, AnalysisError::Decode { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_missing_file() {
        let err = AnnotationDocument::from_path("/nonexistent/file.json").unwrap_err();
        assert!(matches!(err, AnalysisError::Io { .. }));
    }

    #[test]
    fn test_collect_segments_in_tier_order() {
        let doc = AnnotationDocument::default()
            .with_tier("FA1", &[(5, 15, "b")])
            .with_tier("CHI", &[(0, 10, "a"), (20, 30, "c")]);

        let segments = collect_segments(&doc, &["CHI".to_string(), "FA1".to_string(), "X".to_string()]);
        let tiers: Vec<&str> = segments.iter().map(|s| s.tier.as_str()).collect();
        assert_eq!(tiers, vec!["CHI", "CHI", "FA1"]);
        assert_eq!(segments[1].value, "c");
    }
}
