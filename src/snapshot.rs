//! Published, immutable serializations of the student store.

use serde::Serialize;
use std::fmt;

/// Compute the xxh64 hash of a serialized buffer, hex-encoded.
pub fn content_hash(bytes: &[u8]) -> String {
    let hash = xxhash_rust::xxh64::xxh64(bytes, 0);
    format!("{:016x}", hash)
}

/// A serialized copy of the student store as of one batch boundary.
///
/// Snapshots are produced by
/// [`StudentStore::refresh_snapshot`](crate::StudentStore::refresh_snapshot)
/// and handed out behind an `Arc`, so a reader holding one keeps seeing the
/// same bytes even after a newer snapshot is published.
///
/// The buffer is compact JSON, ready to be written to a response as is:
///
/// ```text
/// {"Angelina.Jones":{"Exams":[{"ExamID":10775,"Score":0.77}],"Average":0.77}}
/// ```
#[derive(Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Snapshot {
    json: String,

    /// Hex-encoded xxh64 of the serialized bytes. Stable for identical
    /// contents, so it doubles as a cache validator for the API layer.
    hash: String,

    /// Number of refreshes up to and including this one. The empty
    /// snapshot a store starts with is generation 0.
    generation: u64,
}

impl Snapshot {
    /// Serialize `state` into a new snapshot.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if `state` cannot be serialized.
    pub fn encode<S: Serialize + ?Sized>(
        state: &S,
        generation: u64,
    ) -> Result<Self, serde_json::Error> {
        let json = serde_json::to_string(state)?;
        Ok(Snapshot::from_json(json, generation))
    }

    pub(crate) fn from_json(json: String, generation: u64) -> Self {
        let hash = content_hash(json.as_bytes());
        Snapshot {
            json,
            hash,
            generation,
        }
    }

    /// The serialized store contents.
    pub fn bytes(&self) -> &[u8] {
        self.json.as_bytes()
    }

    /// The serialized store contents as UTF-8 text.
    pub fn as_str(&self) -> &str {
        &self.json
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.json.len()
    }

    pub fn is_empty(&self) -> bool {
        self.json.is_empty()
    }
}

impl AsRef<[u8]> for Snapshot {
    fn as_ref(&self) -> &[u8] {
        self.json.as_bytes()
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("generation", &self.generation)
            .field("hash", &self.hash)
            .field("len", &self.json.len())
            .finish()
    }
}
