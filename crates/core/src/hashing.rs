//! Shared SHA-256 hex digest utility.
//!
//! Used by `idempotency` for request keys and by `audit` for the entry
//! integrity chain.

use sha2::{Digest, Sha256};

/// Length of a SHA-256 digest rendered as lowercase hex.
pub const SHA256_HEX_LEN: usize = 64;

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}
