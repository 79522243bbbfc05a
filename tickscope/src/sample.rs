//! Sample and metric-key primitives.
//!
//! A [`Sample`] is one observation of a metric: a millisecond timestamp and
//! a value. Metric names are plain strings restricted to `[A-Za-z0-9._-]`;
//! [`sanitize_key`] rewrites anything else so hosts can feed raw
//! identifiers (dimension ids, entity type ids) straight into the store.

use std::borrow::Cow;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// A single observation of a metric.
///
/// Immutable once created; the store copies samples by value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// The observed value.
    pub value: f64,
}

impl Sample {
    /// Creates a sample from a timestamp in milliseconds and a value.
    pub fn new(timestamp: u64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Returns the current wall-clock time in milliseconds since the Unix epoch.
#[allow(clippy::cast_possible_truncation)] // millis since 1970 fit u64 for ~585M years
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Rewrites a string into a valid metric key.
///
/// Characters outside `[A-Za-z0-9._-]` become `_`; an empty input becomes
/// `"_"` so the write path never has to reject a name. Borrows when the
/// input is already clean, which it is for every built-in series name.
pub fn sanitize_key(input: &str) -> Cow<'_, str> {
    if input.is_empty() {
        return Cow::Borrowed("_");
    }

    if input.chars().all(is_key_char) {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(
            input
                .chars()
                .map(|c| if is_key_char(c) { c } else { '_' })
                .collect(),
        )
    }
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}
