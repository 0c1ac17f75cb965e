//! Run fingerprinting
//!
//! Every run records a SHA-256 of the context it reasoned over, so two
//! printed runs can be compared for identical inputs.

use crate::Result;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::io::Write;

/// SHA-256 (hex) of the context plus goal.
/// Streams the JSON serialization straight into the hasher.
pub fn compute_context_hash<T: Serialize + ?Sized>(context: &T, goal: &str) -> Result<String> {
    let mut hasher = Sha256::new();

    serde_json::to_writer(&mut HashWriter(&mut hasher), context)?;
    hasher.update(goal.as_bytes());

    Ok(hex::encode(hasher.finalize()))
}

/// Adapter to allow writing into Sha256 via std::io::Write
struct HashWriter<'a, H: Digest>(&'a mut H);

impl<'a, H: Digest> Write for HashWriter<'a, H> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
