//! Record file naming for the file backend.
//!
//! File name format: `{hex(sha256(key))}.json`. Keys are arbitrary media
//! references, so they are never used as paths directly.

use sha2::{Digest, Sha256};

pub const RECORD_EXTENSION: &str = "json";

/// File name of the record holding `key`.
pub fn record_file_name(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!("{}.{}", hex::encode(digest), RECORD_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_stable_and_flat() {
        let a = record_file_name("../../etc/passwd");
        assert_eq!(a, record_file_name("../../etc/passwd"));
        assert!(!a.contains('/'));
        assert_eq!(a.len(), 64 + 5);
        assert_ne!(a, record_file_name("/uploads/x.png"));
    }
}
