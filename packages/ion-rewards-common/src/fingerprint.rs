use sha2::{Digest, Sha256};

/// Hex-encoded sha256 of a snapshot file's bytes.
///
/// Recorded in the run summary so a snapshot handed to the differ later can
/// be matched against the run that produced it.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
