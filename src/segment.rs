//! Annotated segments and the start/end events derived from them

use std::fmt;

/// Largest accepted timestamp magnitude (about 34 years of milliseconds)
///
/// Keeps every section, tier total and per-file sum well inside `i64`.
pub const MAX_TIMESTAMP_MS: i64 = 1 << 40;

/// One annotated interval on a tier, in milliseconds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub tier: String,
    pub start: i64,
    pub end: i64,
    pub value: String,
}

impl Segment {
    pub fn new(tier: impl Into<String>, start: i64, end: i64, value: impl Into<String>) -> Self {
        Self {
            tier: tier.into(),
            start,
            end,
            value: value.into(),
        }
    }

    /// Duration in milliseconds (negative for inverted intervals)
    pub fn duration(&self) -> i64 {
        self.end.saturating_sub(self.start)
    }

    /// True when both endpoints lie within [`MAX_TIMESTAMP_MS`] of zero
    pub fn in_range(&self) -> bool {
        self.start.abs() <= MAX_TIMESTAMP_MS && self.end.abs() <= MAX_TIMESTAMP_MS
    }
}

/// Direction of an activation change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delta {
    Start,
    End,
}

impl Delta {
    /// Signed activation change (+1 / -1)
    pub fn signum(self) -> i64 {
        match self {
            Delta::Start => 1,
            Delta::End => -1,
        }
    }
}

/// Start or end marker of a segment, driving the sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub timestamp: i64,
    pub label: String,
    pub delta: Delta,
    pub annotation: String,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:10} {:+} {} -- {}",
            self.timestamp,
            self.delta.signum(),
            self.label,
            self.annotation
        )
    }
}

/// Default event label: the segment's tier name
pub fn tier_label(segment: &Segment) -> String {
    segment.tier.clone()
}

/// Turn segments into start/end events
///
/// Two events per segment, unsorted. Inverted segments are kept as-is and
/// reported with a warning; segments with out-of-range timestamps are
/// dropped with a warning.
pub fn events_from_segments<F>(segments: &[Segment], label_fn: F) -> Vec<Event>
where
    F: Fn(&Segment) -> String,
{
    let mut events = Vec::with_capacity(segments.len() * 2);

    for segment in segments {
        if !segment.in_range() {
            tracing::warn!(
                "Dropping segment on tier {} with out-of-range timestamps {}..{} ({:?})",
                segment.tier,
                segment.start,
                segment.end,
                segment.value
            );
            continue;
        }
        if segment.duration() < 0 {
            tracing::warn!(
                "Negative duration on tier {}: {} > {} ({:?})",
                segment.tier,
                segment.start,
                segment.end,
                segment.value
            );
        }

        let label = label_fn(segment);
        events.push(Event {
            timestamp: segment.start,
            label: label.clone(),
            delta: Delta::Start,
            annotation: segment.value.clone(),
        });
        events.push(Event {
            timestamp: segment.end,
            label,
            delta: Delta::End,
            annotation: segment.value.clone(),
        });
    }

    events
}
