use crate::error::Error;
use crate::event::ExamId;
use crate::exam::ExamStore;
use crate::snapshot::Snapshot;
use crate::student::{StudentRecord, StudentStore};
use std::sync::Arc;

/// Read-only access to both stores, for the API layer.
///
/// Cheap to clone; every clone shares the same stores. None of these calls
/// wait for an aggregation pass to finish except lookups on the student
/// store itself.
///
/// An id nobody has sent an event for is reported as
/// [`Error::StudentNotFound`] / [`Error::ExamNotFound`], never as an empty
/// record. A known exam always has at least one score.
#[derive(Debug, Clone)]
pub struct QueryService {
    exams: Arc<ExamStore>,
    students: Arc<StudentStore>,
}

impl QueryService {
    pub fn new(exams: Arc<ExamStore>, students: Arc<StudentStore>) -> Self {
        QueryService { exams, students }
    }

    /// Every student as of the last batch boundary, already serialized.
    pub fn list_students(&self) -> Arc<Snapshot> {
        self.students.snapshot()
    }

    /// The current record for one student. History is up to date; the
    /// average may lag until the next batch boundary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StudentNotFound`] for an unknown id.
    pub fn get_student(&self, id: &str) -> Result<StudentRecord, Error> {
        self.students
            .get(id)
            .ok_or_else(|| Error::StudentNotFound(id.to_string()))
    }

    /// [`get_student`](Self::get_student), serialized as
    /// `{"Exams":[{"ExamID":..,"Score":..}],"Average":..}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StudentNotFound`] for an unknown id.
    pub fn get_student_json(&self, id: &str) -> Result<Vec<u8>, Error> {
        let record = self.get_student(id)?;
        serde_json::to_vec(&record).map_err(Error::Serialize)
    }

    /// Ids of every exam seen so far, ascending.
    pub fn list_exams(&self) -> Vec<ExamId> {
        self.exams.list_ids()
    }

    /// Exam ids as a JSON array of strings, e.g. `["12","10775"]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialize`] if serialization fails.
    pub fn list_exams_json(&self) -> Result<Vec<u8>, Error> {
        let ids: Vec<String> = self.list_exams().iter().map(ExamId::to_string).collect();
        serde_json::to_vec(&ids).map_err(Error::Serialize)
    }

    /// Every score recorded for an exam, in arrival order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExamNotFound`] for an exam that was never seen.
    pub fn get_exam_scores(&self, id: ExamId) -> Result<Vec<f64>, Error> {
        self.exams
            .get(id)
            .map(|exam| exam.scores)
            .ok_or_else(|| Error::ExamNotFound(id.to_string()))
    }

    /// [`get_exam_scores`](Self::get_exam_scores) for an id taken straight
    /// from a request path. An id that is not an integer cannot name an
    /// exam and is reported as not found.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExamNotFound`] for an unknown or non-numeric id.
    pub fn get_exam_scores_by_str(&self, id: &str) -> Result<Vec<f64>, Error> {
        let exam_id: ExamId = id
            .parse()
            .map_err(|_| Error::ExamNotFound(id.to_string()))?;
        self.get_exam_scores(exam_id)
    }

    /// Exam scores as a JSON array of numbers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExamNotFound`] for an unknown or non-numeric id.
    pub fn get_exam_scores_json(&self, id: &str) -> Result<Vec<u8>, Error> {
        let scores = self.get_exam_scores_by_str(id)?;
        serde_json::to_vec(&scores).map_err(Error::Serialize)
    }
}
