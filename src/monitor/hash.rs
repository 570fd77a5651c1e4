//! Content hashing for change detection.

use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of the given bytes.
///
/// Deterministic across runs and platforms; used as the sole fingerprint of
/// file identity-and-content, so a rename shows up as delete+add.
pub fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Hash a file's full content.
pub fn digest_file(path: &Path) -> io::Result<String> {
    Ok(digest(&std::fs::read(path)?))
}
