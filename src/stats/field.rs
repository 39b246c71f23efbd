//! Per-field statistics.

use crate::segment::{IndexOptions, TermDictionaryStats};

/// Storage composition of one field within a group.
///
/// Accumulators only add. The percentage is produced by
/// [`FieldStatistics::finalize`] and reading it earlier is a logic error that
/// panics in debug builds.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldStatistics {
    name: String,
    index_options: IndexOptions,
    stored_bytes: u64,
    terms: TermDictionaryStats,
    sample: Option<String>,
    percentage: Option<f64>,
}

impl FieldStatistics {
    /// Create an empty accumulator for a field.
    pub fn new<S: Into<String>>(name: S) -> Self {
        FieldStatistics {
            name: name.into(),
            index_options: IndexOptions::None,
            stored_bytes: 0,
            terms: TermDictionaryStats::default(),
            sample: None,
            percentage: None,
        }
    }

    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add one segment's term dictionary statistics.
    pub fn accumulate_terms(&mut self, terms: &TermDictionaryStats, index_options: IndexOptions) {
        self.terms.add(terms);
        self.index_options = self.index_options.max(index_options);
        self.percentage = None;
    }

    /// Add measured (or estimated) stored-payload bytes.
    pub fn accumulate_stored_bytes(&mut self, bytes: u64) {
        self.stored_bytes += bytes;
        self.percentage = None;
    }

    /// Offer a sample value; the first one offered is kept.
    pub fn accumulate_sample(&mut self, sample: String) {
        if self.sample.is_none() {
            self.sample = Some(sample);
        }
    }

    /// Fold another accumulator for the same field into this one.
    pub fn merge(&mut self, other: FieldStatistics) {
        debug_assert_eq!(self.name, other.name);
        self.accumulate_terms(&other.terms, other.index_options);
        self.accumulate_stored_bytes(other.stored_bytes);
        if let Some(sample) = other.sample {
            self.accumulate_sample(sample);
        }
    }

    /// Highest index options seen across segments.
    pub fn index_options(&self) -> IndexOptions {
        self.index_options
    }

    /// Stored-payload bytes.
    pub fn stored_bytes(&self) -> u64 {
        self.stored_bytes
    }

    /// Term dictionary byte breakdown.
    pub fn terms(&self) -> &TermDictionaryStats {
        &self.terms
    }

    /// Captured sample value.
    pub fn sample(&self) -> Option<&str> {
        self.sample.as_deref()
    }

    /// Stored bytes plus every term dictionary category.
    pub fn total(&self) -> u64 {
        self.stored_bytes + self.terms.total_bytes()
    }

    /// Compute the share of `group_total` this field accounts for.
    pub fn finalize(&mut self, group_total: u64) {
        self.percentage = Some(super::percentage(self.total(), group_total));
    }

    /// Whether [`FieldStatistics::finalize`] has run since the last accumulation.
    pub fn is_finalized(&self) -> bool {
        self.percentage.is_some()
    }

    /// Percentage of the group's calculated total.
    pub fn percentage(&self) -> f64 {
        debug_assert!(
            self.percentage.is_some(),
            "percentage of field {} read before finalize",
            self.name
        );
        self.percentage.unwrap_or(0.0)
    }
}
