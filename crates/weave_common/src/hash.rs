//! Digests of serialized graphs.

use crate::result::{InternalError, Stage, WeaveResult};
use serde::Serialize;
use std::fmt;

/// XXH3-128 digest of a value's JSON form.
///
/// Exporters compare the digest of two exports of the same authored graph to
/// check that optimization is deterministic.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash(u128);

impl ContentHash {
    /// Hashes the compact JSON serialization of `value`.
    pub fn of_json<T: Serialize + ?Sized>(value: &T) -> WeaveResult<Self> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| InternalError::new(Stage::Serialization, e.to_string()))?;
        Ok(Self(xxhash_rust::xxh3::xxh3_128(&bytes)))
    }

    /// The first twelve hex digits, enough to tell exports apart in a log line.
    pub fn short(&self) -> String {
        format!("{:032x}", self.0)[..12].to_string()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.short())
    }
}
