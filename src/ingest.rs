use crate::aggregate::Aggregator;
use crate::config::Config;
use crate::error::{DecodeError, Error};
use crate::event::{ScoreEvent, decode};
use crate::exam::ExamStore;
use crate::query::QueryService;
use crate::snapshot::Snapshot;
use crate::source::EventSource;
use crate::student::StudentStore;
use log::{debug, error, info, trace, warn};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Where the loop is in handling a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestState {
    /// Waiting for the next message.
    Idle,
    /// Applying one decoded event to the stores.
    Applying,
}

/// The outcome of applying one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The event was recorded; `pending` events now await the next batch
    /// boundary.
    Buffered { pending: usize },
    /// The event closed a batch: averages were recomputed and a snapshot of
    /// `generation` was published.
    Settled { generation: u64 },
    /// The event closed a batch and averages were recomputed, but the new
    /// snapshot could not be published; `generation` is the one still
    /// being served.
    SettleFailed { generation: u64 },
}

/// Counters accumulated over the life of a loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Events decoded and applied to both stores.
    pub applied: u64,
    /// Messages dropped because they failed to decode.
    pub rejected: u64,
    /// Batch boundaries reached.
    pub batches: u64,
    /// Set when the loop stopped on a source read failure rather than a
    /// clean close.
    pub source_error: Option<String>,
}

/// The single consumer of the score-event stream.
///
/// Each message is decoded, recorded against its exam and then its student,
/// and counted. Every `batch_size` applied events the loop settles the
/// student store (recompute every average, publish a fresh snapshot) and
/// resets its counter. Messages that fail to decode are logged and dropped
/// before either store is touched.
///
/// # Examples
///
/// ```
/// use scorefold::{Config, pipeline};
///
/// let config = Config::builder().batch_size(2).build().unwrap();
/// let (mut ingest, query) = pipeline(&config).unwrap();
///
/// ingest.apply(br#"{"studentId":"a","exam":1,"score":0.75}"#).unwrap();
/// ingest.apply(br#"{"studentId":"a","exam":2,"score":0.25}"#).unwrap();
///
/// assert_eq!(query.get_student("a").unwrap().average, 0.5);
/// assert_eq!(ingest.pending(), 0);
/// ```
#[derive(Debug)]
pub struct IngestLoop {
    exams: Arc<ExamStore>,
    students: Arc<StudentStore>,
    batch_size: usize,
    pending: usize,
    state: IngestState,
    report: IngestReport,
}

impl IngestLoop {
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `config` has a zero batch size.
    pub fn new(
        exams: Arc<ExamStore>,
        students: Arc<StudentStore>,
        config: &Config,
    ) -> Result<Self, Error> {
        config.validate()?;
        Ok(IngestLoop {
            exams,
            students,
            batch_size: config.batch_size,
            pending: 0,
            state: IngestState::Idle,
            report: IngestReport::default(),
        })
    }

    /// Decode and apply one raw message.
    ///
    /// # Errors
    ///
    /// Returns the [`DecodeError`] for a malformed message. The message is
    /// dropped and neither the stores nor the batch counter change.
    pub fn apply(&mut self, raw: &[u8]) -> Result<Applied, DecodeError> {
        match decode(raw) {
            Ok(event) => Ok(self.apply_event(&event)),
            Err(e) => {
                self.report.rejected += 1;
                warn!(
                    "scorefold: dropping score event ({} bytes): {e}",
                    raw.len()
                );
                Err(e)
            }
        }
    }

    /// Apply an already decoded event: exam first, then student.
    pub fn apply_event(&mut self, event: &ScoreEvent) -> Applied {
        self.state = IngestState::Applying;
        trace!(
            "scorefold: applying exam {} score {} for '{}'",
            event.exam_id, event.score, event.student_id
        );

        self.exams.record_score(event.exam_id, event.score);
        self.students
            .record_test(&event.student_id, event.test_record());
        self.report.applied += 1;
        self.pending += 1;

        let applied = if self.pending >= self.batch_size {
            self.close_batch()
        } else {
            Applied::Buffered {
                pending: self.pending,
            }
        };
        self.state = IngestState::Idle;
        applied
    }

    /// Consume `source` until it closes, returning the counters so far.
    ///
    /// A closed source is a clean stop. A source read failure is logged,
    /// recorded in the report, and also ends the loop.
    pub fn run<S: EventSource>(&mut self, mut source: S) -> IngestReport {
        info!(
            "scorefold: ingest loop started (batch size {})",
            self.batch_size
        );
        loop {
            match source.next_message() {
                Ok(raw) => {
                    // Decode failures are logged and counted by `apply`.
                    let _ = self.apply(&raw);
                }
                Err(Error::UpstreamClosed) => break,
                Err(e) => {
                    error!("scorefold: event source failed, stopping ingest: {e}");
                    self.report.source_error = Some(e.to_string());
                    break;
                }
            }
        }
        info!(
            "scorefold: ingest loop stopped: {} applied, {} rejected, {} batches, {} pending",
            self.report.applied, self.report.rejected, self.report.batches, self.pending
        );
        self.report.clone()
    }

    /// Run the loop on a dedicated thread.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the thread could not be spawned.
    pub fn spawn<S>(mut self, source: S) -> Result<IngestHandle, Error>
    where
        S: EventSource + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name("scorefold-ingest".to_string())
            .spawn(move || self.run(source))?;
        Ok(IngestHandle { handle })
    }

    /// Events applied since the last batch boundary.
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn state(&self) -> IngestState {
        self.state
    }

    pub fn report(&self) -> &IngestReport {
        &self.report
    }

    fn close_batch(&mut self) -> Applied {
        self.pending = 0;
        self.report.batches += 1;
        let settled = Aggregator::settle(&self.students);
        self.batch_outcome(settled)
    }

    fn batch_outcome(&self, settled: Result<Arc<Snapshot>, Error>) -> Applied {
        match settled {
            Ok(snapshot) => {
                debug!(
                    "scorefold: batch {} settled, snapshot generation {} ({} bytes, {} students)",
                    self.report.batches,
                    snapshot.generation(),
                    snapshot.len(),
                    self.students.len()
                );
                Applied::Settled {
                    generation: snapshot.generation(),
                }
            }
            Err(e) => {
                error!("scorefold: failed to publish student snapshot: {e}");
                Applied::SettleFailed {
                    generation: self.students.snapshot().generation(),
                }
            }
        }
    }
}

/// Handle to an ingest loop running on its own thread.
#[derive(Debug)]
pub struct IngestHandle {
    handle: JoinHandle<IngestReport>,
}

impl IngestHandle {
    /// Wait for the loop to stop (its source closed) and return its report.
    ///
    /// # Errors
    ///
    /// Returns the panic payload if the ingest thread panicked.
    pub fn join(self) -> thread::Result<IngestReport> {
        self.handle.join()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Create both stores and wire an [`IngestLoop`] and a [`QueryService`] to
/// them.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] for a zero batch size.
pub fn pipeline(config: &Config) -> Result<(IngestLoop, QueryService), Error> {
    let exams = Arc::new(ExamStore::new());
    let students = Arc::new(StudentStore::new());
    let query = QueryService::new(Arc::clone(&exams), Arc::clone(&students));
    let ingest = IngestLoop::new(exams, students, config)?;
    Ok((ingest, query))
}
