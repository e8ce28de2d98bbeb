mod common;

use common::{apply_n, payload, pipeline_with_batch, sse_frame};
use scorefold::{
    Applied, Config, Error, EventSource, ExamId, IngestState, SseSource, channel, pipeline,
};
use std::io;
use std::thread;

#[test]
fn test_batch_boundary_at_default_size() {
    let (mut ingest, query) = pipeline(&Config::default()).unwrap();
    assert_eq!(ingest.batch_size(), 20);

    apply_n(&mut ingest, 19);
    assert_eq!(ingest.pending(), 19);
    assert_eq!(ingest.report().batches, 0);
    assert_eq!(query.list_students().generation(), 0);

    let applied = ingest.apply(&payload("student_0", 100, 0.5)).unwrap();
    assert_eq!(applied, Applied::Settled { generation: 1 });
    assert_eq!(ingest.pending(), 0);
    assert_eq!(ingest.report().batches, 1);
    assert_eq!(query.list_students().generation(), 1);
}

#[test]
fn test_settles_exactly_once_per_batch() {
    let (mut ingest, query) = pipeline_with_batch(20);
    let mut settled = 0;
    for i in 0..45 {
        if let Applied::Settled { .. } = ingest.apply(&payload("s", i, 0.5)).unwrap() {
            settled += 1;
        }
    }
    assert_eq!(settled, 2);
    assert_eq!(ingest.pending(), 5);
    assert_eq!(query.list_students().generation(), 2);
}

#[test]
fn test_averages_stale_until_batch_closes() {
    let (mut ingest, query) = pipeline_with_batch(3);
    ingest.apply(&payload("s", 1, 0.9)).unwrap();
    ingest.apply(&payload("s", 2, 0.6)).unwrap();
    assert_eq!(query.get_student("s").unwrap().average, 0.9);

    ingest.apply(&payload("s", 3, 0.3)).unwrap();
    let average = query.get_student("s").unwrap().average;
    assert!((average - 0.6).abs() < 1e-12, "{average}");
}

#[test]
fn test_missing_student_id_leaves_stores_unchanged() {
    let (mut ingest, query) = pipeline_with_batch(1);
    assert!(ingest.apply(br#"{"exam":10775,"score":0.5}"#).is_err());

    assert!(query.list_exams().is_empty());
    assert_eq!(query.list_students().bytes(), b"{}");
    assert_eq!(ingest.report().rejected, 1);
    assert_eq!(ingest.report().batches, 0);
}

#[test]
fn test_exam_and_student_counts_match_events() {
    let (mut ingest, query) = pipeline_with_batch(4);
    apply_n(&mut ingest, 30);

    for s in 0..3 {
        let record = query.get_student(&format!("student_{s}")).unwrap();
        assert_eq!(record.history.len(), 10);
    }
    assert_eq!(query.get_exam_scores(ExamId(100)).unwrap().len(), 15);
    assert_eq!(query.get_exam_scores(ExamId(101)).unwrap().len(), 15);
    assert_eq!(ingest.state(), IngestState::Idle);
}

#[test]
fn test_run_until_channel_closes() {
    let (mut ingest, query) = pipeline_with_batch(20);
    let (tx, rx) = channel();

    for i in 0..40 {
        tx.send(payload(&format!("s{}", i % 4), 7, 0.25)).unwrap();
    }
    tx.send(b"{broken".to_vec()).unwrap();
    drop(tx);

    let report = ingest.run(rx);
    assert_eq!(report.applied, 40);
    assert_eq!(report.rejected, 1);
    assert_eq!(report.batches, 2);
    assert!(report.source_error.is_none());
    assert_eq!(query.get_exam_scores(ExamId(7)).unwrap().len(), 40);
}

#[test]
fn test_spawned_loop_with_concurrent_readers() {
    let (ingest, query) = pipeline_with_batch(20);
    let (tx, rx) = channel();
    let handle = ingest.spawn(rx).unwrap();

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let query = query.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    let snap = query.list_students();
                    let _: serde_json::Value = serde_json::from_slice(snap.bytes()).unwrap();
                    let _ = query.list_exams_json().unwrap();
                }
            })
        })
        .collect();

    for i in 0..200 {
        tx.send(payload(&format!("s{}", i % 5), i % 3, 0.5)).unwrap();
    }
    drop(tx);

    let report = handle.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(report.applied, 200);
    assert_eq!(report.batches, 10);
    assert_eq!(query.list_students().generation(), 10);
    assert_eq!(query.list_exams(), vec![ExamId(0), ExamId(1), ExamId(2)]);
    for s in 0..5 {
        let record = query.get_student(&format!("s{s}")).unwrap();
        assert_eq!(record.history.len(), 40);
        assert_eq!(record.average, 0.5);
    }
}

#[test]
fn test_run_over_sse_stream() {
    let (mut ingest, query) = pipeline_with_batch(2);
    let mut stream = String::from(": keep-alive\n\n");
    stream.push_str(&sse_frame("score", "a", 1, 0.75));
    stream.push_str(&sse_frame("heartbeat", "ignored", 99, 0.0));
    stream.push_str(&sse_frame("score", "a", 2, 0.25));

    let source = SseSource::new(stream.as_bytes()).with_event_name("score");
    let report = ingest.run(source);

    assert_eq!(report.applied, 2);
    assert_eq!(report.batches, 1);
    assert_eq!(query.get_student("a").unwrap().average, 0.5);
    assert!(query.get_exam_scores(ExamId(99)).is_err());
}

struct FailingSource {
    remaining: Vec<Vec<u8>>,
}

impl EventSource for FailingSource {
    fn next_message(&mut self) -> Result<Vec<u8>, Error> {
        match self.remaining.pop() {
            Some(raw) => Ok(raw),
            None => Err(Error::Io(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "stream reset",
            ))),
        }
    }
}

#[test]
fn test_source_failure_stops_loop() {
    let (mut ingest, query) = pipeline_with_batch(20);
    let source = FailingSource {
        remaining: vec![payload("a", 1, 0.5)],
    };
    let report = ingest.run(source);

    assert_eq!(report.applied, 1);
    let message = report.source_error.unwrap();
    assert!(message.contains("stream reset"), "{message}");
    assert_eq!(query.get_student("a").unwrap().history.len(), 1);
}
