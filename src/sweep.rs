//! Sweep-line section accounting
//!
//! Walks a chronologically sorted event stream and sums, for every distinct
//! combination of simultaneously active labels, how long that combination
//! held. Masking and limiting tiers restrict which sections are counted.
//!
//! # Coincident timestamps
//!
//! All events sharing a timestamp are applied as one batch: the section that
//! ends at the timestamp is accounted from the active set as it stood, then
//! the batch's net delta per label is applied. A segment that ends exactly
//! where the next one on the same tier begins therefore never drops out of
//! the active set, and zero-length segments leave it untouched.
//!
//! # Example
//!
//! ```
//! use eafsum::segment::{events_from_segments, tier_label, Segment};
//! use eafsum::sweep::{sweep, SweepOptions};
//!
//! let segments = vec![Segment::new("A", 0, 10, ""), Segment::new("B", 5, 15, "")];
//! let result = sweep(events_from_segments(&segments, tier_label), &SweepOptions::default());
//!
//! assert_eq!(result.union_sum, 15);
//! assert_eq!(result.section_sums["A+B"], 5);
//! ```

use crate::segment::Event;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Separator between tier names in a combination label
pub const LABEL_SEPARATOR: char = '+';

/// How repeated activations of the same label are counted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ActivationMode {
    /// A label is either on or off; overlapping segments on one tier collapse
    #[default]
    Set,
    /// Reference counted; a tier stays on until every open segment has ended
    Multiset,
}

/// Labels currently "on" during the sweep
#[derive(Debug, Clone, Default)]
pub struct ActiveSet {
    mode: ActivationMode,
    counts: BTreeMap<String, u32>,
}

impl ActiveSet {
    pub fn new(mode: ActivationMode) -> Self {
        Self {
            mode,
            counts: BTreeMap::new(),
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.counts.contains_key(label)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Sorted, `+`-joined label of the active set, leaving out `exclude`
    pub fn combination_label(&self, exclude: Option<&str>) -> String {
        let mut label = String::new();
        for name in self.counts.keys() {
            if Some(name.as_str()) == exclude {
                continue;
            }
            if !label.is_empty() {
                label.push(LABEL_SEPARATOR);
            }
            label.push_str(name);
        }
        label
    }

    /// Apply the net activation change of `label` at `timestamp`
    pub fn apply(&mut self, label: &str, net: i64, timestamp: i64) {
        if net == 0 {
            return;
        }

        match self.mode {
            ActivationMode::Set => {
                if net > 0 {
                    if net > 1 || self.contains(label) {
                        tracing::warn!("Label {} already active at {} ms", label, timestamp);
                    }
                    self.counts.insert(label.to_string(), 1);
                } else if self.counts.remove(label).is_none() || net < -1 {
                    tracing::warn!("Label {} not active at {} ms", label, timestamp);
                }
            }
            ActivationMode::Multiset => {
                let current = i64::from(self.counts.get(label).copied().unwrap_or(0));
                let mut updated = current + net;
                if updated < 0 {
                    tracing::warn!("Label {} not active at {} ms", label, timestamp);
                    updated = 0;
                }
                if updated == 0 {
                    self.counts.remove(label);
                } else {
                    let count = u32::try_from(updated).unwrap_or(u32::MAX);
                    self.counts.insert(label.to_string(), count);
                }
            }
        }
    }
}

/// Masking/limiting rules and activation semantics for one sweep
#[derive(Debug, Clone, Default)]
pub struct SweepOptions {
    /// Any section with one of these labels active is dropped
    pub masking: BTreeSet<String>,
    /// Only sections with this label active are counted; it is left out of
    /// reported labels
    pub limiting: Option<String>,
    pub activation: ActivationMode,
}

impl SweepOptions {
    /// True when the section described by `active` must not be counted
    pub fn is_masked(&self, active: &ActiveSet) -> bool {
        if self.masking.iter().any(|label| active.contains(label)) {
            return true;
        }
        match &self.limiting {
            Some(limiting) => !active.contains(limiting),
            None => false,
        }
    }
}

/// Output of one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepResult {
    /// Duration of all counted, non-empty sections
    pub union_sum: i64,
    /// Summed duration per combination label; the empty label holds gaps
    pub section_sums: BTreeMap<String, i64>,
}

impl SweepResult {
    /// Summed duration for `label`, zero if it never occurred
    pub fn get(&self, label: &str) -> i64 {
        self.section_sums.get(label).copied().unwrap_or(0)
    }

    /// Non-empty combination labels, sorted
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.section_sums
            .keys()
            .map(String::as_str)
            .filter(|label| !label.is_empty())
    }

    /// Total of the gaps where nothing was active
    pub fn gap_sum(&self) -> i64 {
        self.get("")
    }
}

/// Run the sweep-line over `events` (any order)
pub fn sweep(mut events: Vec<Event>, options: &SweepOptions) -> SweepResult {
    let mut result = SweepResult::default();
    if events.is_empty() {
        return result;
    }

    // Stable, so batches keep input order for trace output
    events.sort_by_key(|event| event.timestamp);

    let mut active = ActiveSet::new(options.activation);
    let limiting = options.limiting.as_deref();
    let mut section_start = events[0].timestamp;

    for batch in events.chunk_by(|a, b| a.timestamp == b.timestamp) {
        let timestamp = batch[0].timestamp;
        let duration = timestamp.saturating_sub(section_start);

        if duration > 0 && !options.is_masked(&active) {
            let label = active.combination_label(limiting);
            if !label.is_empty() {
                result.union_sum = result.union_sum.saturating_add(duration);
            }
            let sum = result.section_sums.entry(label).or_default();
            *sum = sum.saturating_add(duration);
        }

        let mut net: BTreeMap<&str, i64> = BTreeMap::new();
        for event in batch {
            tracing::trace!("Event: {}", event);
            *net.entry(event.label.as_str()).or_default() += event.delta.signum();
        }
        for (label, delta) in net {
            active.apply(label, delta, timestamp);
        }

        section_start = timestamp;
    }

    if !active.is_empty() {
        tracing::warn!(
            "{} label(s) still active after the last event: {}",
            active.len(),
            active.combination_label(None)
        );
    }

    result
}
