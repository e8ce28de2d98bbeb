use crate::error::DecodeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Integer identifier of an exam.
///
/// Serialized as a bare integer inside a [`TestRecord`]; the exam listing
/// renders it as a decimal string.
///
/// # Examples
///
/// ```
/// use scorefold::ExamId;
///
/// let id: ExamId = "10775".parse().unwrap();
/// assert_eq!(id, ExamId(10775));
/// assert_eq!(id.to_string(), "10775");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExamId(pub i64);

impl fmt::Display for ExamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExamId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ExamId)
    }
}

impl From<i64> for ExamId {
    fn from(id: i64) -> Self {
        ExamId(id)
    }
}

/// One decoded score event from the upstream stream.
///
/// On the wire this is a JSON object with `studentId`, `exam` and `score`.
/// Unknown fields are ignored. The event is ephemeral: it is applied to
/// both stores and then dropped.
///
/// # Examples
///
/// ```
/// use scorefold::{decode, ExamId};
///
/// let event = decode(br#"{"studentId":"Angelina.Jones","exam":10775,"score":0.77}"#).unwrap();
/// assert_eq!(event.student_id, "Angelina.Jones");
/// assert_eq!(event.exam_id, ExamId(10775));
/// assert_eq!(event.score, 0.77);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEvent {
    #[serde(rename = "studentId")]
    pub student_id: String,

    #[serde(rename = "exam")]
    pub exam_id: ExamId,

    /// Conventionally in `[0, 1]`; not enforced.
    pub score: f64,
}

impl ScoreEvent {
    pub fn new(student_id: impl Into<String>, exam_id: impl Into<ExamId>, score: f64) -> Self {
        ScoreEvent {
            student_id: student_id.into(),
            exam_id: exam_id.into(),
            score,
        }
    }

    /// The history entry this event contributes to its student.
    pub fn test_record(&self) -> TestRecord {
        TestRecord {
            exam_id: self.exam_id,
            score: self.score,
        }
    }
}

/// A single exam result in a student's history. Immutable once created.
///
/// Serialized as `{"ExamID": <int>, "Score": <float>}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    #[serde(rename = "ExamID")]
    pub exam_id: ExamId,

    #[serde(rename = "Score")]
    pub score: f64,
}

impl TestRecord {
    pub fn new(exam_id: impl Into<ExamId>, score: f64) -> Self {
        TestRecord {
            exam_id: exam_id.into(),
            score,
        }
    }
}

/// Decode one raw message payload into a [`ScoreEvent`].
///
/// Leading and trailing whitespace is ignored. Anything that is not a JSON
/// object carrying `studentId` (string), `exam` (integer) and `score`
/// (number) is rejected.
///
/// # Errors
///
/// Returns [`DecodeError::Empty`] for a blank payload and
/// [`DecodeError::Malformed`] for everything else that fails to parse.
pub fn decode(raw: &[u8]) -> Result<ScoreEvent, DecodeError> {
    let payload = raw.trim_ascii();
    if payload.is_empty() {
        return Err(DecodeError::Empty);
    }
    Ok(serde_json::from_slice(payload)?)
}
