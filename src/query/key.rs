//! Cache keys for remote read operations.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Identity of one cached read: an operation name plus a hash of its
/// serialized parameters. Two requests with equal keys share one cache
/// entry and one in-flight network call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
  op: &'static str,
  params_hash: String,
}

impl CacheKey {
  /// Build a key from an operation name and its parameters.
  ///
  /// Parameters are serialized with serde_json (struct field order is
  /// deterministic) and hashed for a stable, fixed-length key.
  pub fn new<P: Serialize>(op: &'static str, params: &P) -> Self {
    let bytes = serde_json::to_vec(params).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Self {
      op,
      params_hash: hex::encode(hasher.finalize()),
    }
  }

  pub fn op(&self) -> &'static str {
    self.op
  }
}

impl std::fmt::Display for CacheKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    // Short hash prefix is enough for log lines
    write!(f, "{}#{}", self.op, &self.params_hash[..8.min(self.params_hash.len())])
  }
}
