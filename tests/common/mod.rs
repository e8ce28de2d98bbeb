#![allow(dead_code)]

use scorefold::{Config, IngestLoop, QueryService, ScoreEvent, pipeline};

pub const ANGELINA: &str = "Angelina.Jones";
pub const BRADEN: &str = "Braden.Altstatt";
pub const ANGELINA_SCORE: f64 = 0.7789680185088161;

pub fn payload(student: &str, exam: i64, score: f64) -> Vec<u8> {
    serde_json::to_vec(&ScoreEvent::new(student, exam, score)).unwrap()
}

pub fn sse_frame(event: &str, student: &str, exam: i64, score: f64) -> String {
    let data = String::from_utf8(payload(student, exam, score)).unwrap();
    format!("event: {event}\ndata: {data}\n\n")
}

pub fn pipeline_with_batch(batch_size: usize) -> (IngestLoop, QueryService) {
    let config = Config::builder().batch_size(batch_size).build().unwrap();
    pipeline(&config).unwrap()
}

/// Apply `n` events, cycling through three students and two exams.
pub fn apply_n(ingest: &mut IngestLoop, n: usize) {
    for i in 0..n {
        let student = format!("student_{}", i % 3);
        let exam = 100 + (i % 2) as i64;
        ingest.apply(&payload(&student, exam, 0.5)).unwrap();
    }
}
