use crate::aggregate::Aggregator;
use crate::error::Error;
use crate::event::TestRecord;
use crate::snapshot::Snapshot;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A student's test history and the average derived from it.
///
/// `average` is only as fresh as the last aggregation pass: tests recorded
/// since then are in `history` but not yet reflected in `average`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    #[serde(rename = "Exams")]
    pub history: Vec<TestRecord>,

    #[serde(rename = "Average")]
    pub average: f64,
}

impl StudentRecord {
    fn first(test: TestRecord) -> Self {
        StudentRecord {
            history: vec![test],
            average: test.score,
        }
    }
}

struct Students {
    records: BTreeMap<String, StudentRecord>,
    generation: u64,
}

/// Student id → [`StudentRecord`], plus a cached serialization of the whole
/// map.
///
/// The map sits behind one store-wide mutex. The published [`Snapshot`] sits
/// behind its own lock and is only replaced while the map mutex is held, so
/// it always matches the map as of some instant, and reading it never waits
/// on an aggregation sweep.
pub struct StudentStore {
    students: Mutex<Students>,
    published: RwLock<Arc<Snapshot>>,
}

impl std::fmt::Debug for StudentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudentStore")
            .field("students", &self.len())
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

impl Default for StudentStore {
    fn default() -> Self {
        StudentStore::new()
    }
}

impl StudentStore {
    /// Create an empty store. Its initial snapshot is `{}` at generation 0.
    pub fn new() -> Self {
        StudentStore {
            students: Mutex::new(Students {
                records: BTreeMap::new(),
                generation: 0,
            }),
            published: RwLock::new(Arc::new(Snapshot::from_json("{}".to_string(), 0))),
        }
    }

    /// Look up a student by id. The average may be stale.
    pub fn get(&self, id: &str) -> Option<StudentRecord> {
        self.students.lock().records.get(id).cloned()
    }

    /// Append a test to the student's history.
    ///
    /// A new student starts with `average = test.score`. For an existing
    /// student the average is left alone until the next
    /// [`recompute_averages`](Self::recompute_averages).
    pub fn record_test(&self, id: &str, test: TestRecord) {
        let mut students = self.students.lock();
        match students.records.get_mut(id) {
            Some(record) => record.history.push(test),
            None => {
                students
                    .records
                    .insert(id.to_string(), StudentRecord::first(test));
            }
        }
    }

    /// Set every student's average from their full history.
    ///
    /// Holds the store lock for the whole sweep, so no history changes
    /// part way through. Returns the number of students visited.
    pub fn recompute_averages(&self) -> usize {
        self.recompute_with(Aggregator::refresh_average)
    }

    /// Run `pass` over every record under one hold of the store lock.
    /// Returns the number of students visited.
    pub fn recompute_with<F>(&self, pass: F) -> usize
    where
        F: FnMut(&mut StudentRecord),
    {
        let mut students = self.students.lock();
        sweep(&mut students.records, pass)
    }

    /// Serialize the current map and publish it as the new snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialize`] if serialization fails; the previously
    /// published snapshot stays in place.
    pub fn refresh_snapshot(&self) -> Result<Arc<Snapshot>, Error> {
        let mut students = self.students.lock();
        self.publish(&mut students)
    }

    /// Recompute every average and publish a fresh snapshot as one critical
    /// section, so the snapshot always carries the averages of its own
    /// histories.
    ///
    /// # Errors
    ///
    /// See [`refresh_snapshot`](Self::refresh_snapshot).
    pub fn settle(&self) -> Result<Arc<Snapshot>, Error> {
        self.settle_with(Aggregator::refresh_average)
    }

    /// [`settle`](Self::settle) with a caller-supplied per-record pass.
    ///
    /// # Errors
    ///
    /// See [`refresh_snapshot`](Self::refresh_snapshot).
    pub fn settle_with<F>(&self, pass: F) -> Result<Arc<Snapshot>, Error>
    where
        F: FnMut(&mut StudentRecord),
    {
        let mut students = self.students.lock();
        sweep(&mut students.records, pass);
        self.publish(&mut students)
    }

    /// The most recently published snapshot. Never recomputes.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.published.read().clone()
    }

    pub fn len(&self) -> usize {
        self.students.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.lock().records.is_empty()
    }

    fn publish(&self, students: &mut Students) -> Result<Arc<Snapshot>, Error> {
        let generation = students.generation + 1;
        let snapshot = Snapshot::encode(&students.records, generation).map_err(Error::Serialize)?;
        students.generation = generation;

        let snapshot = Arc::new(snapshot);
        *self.published.write() = Arc::clone(&snapshot);
        Ok(snapshot)
    }
}

fn sweep<F>(records: &mut BTreeMap<String, StudentRecord>, mut pass: F) -> usize
where
    F: FnMut(&mut StudentRecord),
{
    records.values_mut().for_each(&mut pass);
    records.len()
}
