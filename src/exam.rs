use crate::event::ExamId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every score recorded for one exam, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExamRecord {
    pub scores: Vec<f64>,
}

/// Exam id → recorded scores, behind one store-wide lock.
///
/// Written by the single ingest loop, read by any number of query threads.
/// Lookups hand out clones so no caller ever holds the lock.
#[derive(Debug, Default)]
pub struct ExamStore {
    exams: Mutex<BTreeMap<ExamId, ExamRecord>>,
}

impl ExamStore {
    pub fn new() -> Self {
        ExamStore::default()
    }

    /// Look up an exam by id.
    pub fn get(&self, id: ExamId) -> Option<ExamRecord> {
        self.exams.lock().get(&id).cloned()
    }

    /// Append `score` to the exam, creating it on first sight.
    ///
    /// Not idempotent: each call is a distinct occurrence and appends again.
    pub fn record_score(&self, id: ExamId, score: f64) {
        self.exams.lock().entry(id).or_default().scores.push(score);
    }

    /// Ids of every exam seen so far, ascending.
    ///
    /// This is a copy of the keys at call time; exams recorded afterwards
    /// are not reflected.
    pub fn list_ids(&self) -> Vec<ExamId> {
        self.exams.lock().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.exams.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.exams.lock().is_empty()
    }
}
