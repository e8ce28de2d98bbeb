use crate::error::Error;
use crate::event::TestRecord;
use crate::snapshot::Snapshot;
use crate::student::{StudentRecord, StudentStore};
use std::sync::Arc;

/// Arithmetic mean of the scores in a history.
///
/// Returns `None` for an empty history. The student store never holds one,
/// since a student is only created together with their first test.
///
/// # Examples
///
/// ```
/// use scorefold::{mean, TestRecord};
///
/// let history = [TestRecord::new(12345, 0.75), TestRecord::new(98765, 0.25)];
/// assert_eq!(mean(&history), Some(0.5));
/// assert_eq!(mean(&[]), None);
/// ```
pub fn mean(history: &[TestRecord]) -> Option<f64> {
    if history.is_empty() {
        return None;
    }
    let sum: f64 = history.iter().map(|t| t.score).sum();
    Some(sum / history.len() as f64)
}

/// Recomputes derived statistics over the student store.
///
/// Stateless: the batch cadence that decides when to run it belongs to the
/// [`IngestLoop`](crate::IngestLoop), which calls [`Aggregator::settle`] at
/// every batch boundary.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator;

impl Aggregator {
    /// Rewrite one record's average from its full history. An empty history
    /// leaves the average as it was.
    pub fn refresh_average(record: &mut StudentRecord) {
        if let Some(average) = mean(&record.history) {
            record.average = average;
        }
    }

    /// Rewrite every student's average from their full history, in one
    /// exclusive sweep. Returns the number of students visited.
    pub fn recompute_all(students: &StudentStore) -> usize {
        students.recompute_with(Aggregator::refresh_average)
    }

    /// Recompute every average and publish a fresh snapshot, as one
    /// critical section against writers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialize`] if the snapshot cannot be serialized;
    /// the averages are still updated and the previous snapshot stays
    /// published.
    pub fn settle(students: &StudentStore) -> Result<Arc<Snapshot>, Error> {
        students.settle_with(Aggregator::refresh_average)
    }
}
