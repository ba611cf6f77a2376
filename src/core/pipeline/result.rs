//! Output of a terminal collection call.

use crate::core::stats::StatsSnapshot;
use serde::Serialize;
use std::ops::Deref;

/// The collected sequence plus the stats for the run that produced it.
///
/// Dereferences to a slice, so `len`, indexing, `get` and `iter` work as on
/// a `Vec`. Equality compares the data only.
#[derive(Debug, Clone, Serialize)]
pub struct ResultSet<T> {
    data: Vec<T>,
    stats: StatsSnapshot,
}

impl<T> ResultSet<T> {
    pub(crate) fn new(data: Vec<T>, stats: StatsSnapshot) -> Self {
        Self { data, stats }
    }

    /// Counters and duration for this run
    pub fn stats(&self) -> &StatsSnapshot {
        &self.stats
    }

    /// Human-readable statistics report for a console
    pub fn stats_report(&self) -> String {
        self.stats.to_string()
    }

    /// Borrow the collected values
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Take the collected values
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Take the collected values and the stats
    pub fn into_parts(self) -> (Vec<T>, StatsSnapshot) {
        (self.data, self.stats)
    }
}

impl<T> Deref for ResultSet<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.data
    }
}

impl<T> IntoIterator for ResultSet<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a ResultSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl<T: PartialEq> PartialEq for ResultSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl<T: PartialEq> PartialEq<Vec<T>> for ResultSet<T> {
    fn eq(&self, other: &Vec<T>) -> bool {
        self.data == *other
    }
}

impl<T: PartialEq> PartialEq<[T]> for ResultSet<T> {
    fn eq(&self, other: &[T]) -> bool {
        self.data == other
    }
}
