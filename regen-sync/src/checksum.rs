//! SHA-256 content checksums.
//!
//! Bytes are hashed exactly as stored: no line-ending normalization, so a
//! CRLF/LF flip counts as a change.

use std::io::ErrorKind;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{io_err, SyncError};

/// Lowercase hex SHA-256 of `bytes`.
pub fn of_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Checksum of the file at `path`, or `None` if it does not exist.
pub fn of_file(path: &Path) -> Result<Option<String>, SyncError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(of_bytes(&bytes))),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn known_digest() {
        assert_eq!(
            of_bytes(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn line_endings_are_significant() {
        assert_ne!(of_bytes(b"a\r\nb\r\n"), of_bytes(b"a\nb\n"));
    }

    #[test]
    fn missing_file_is_none() {
        let tmp = TempDir::new().expect("tmp");
        assert_eq!(of_file(&tmp.path().join("absent")).unwrap(), None);
    }

    #[test]
    fn file_matches_bytes() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("a.swift");
        std::fs::write(&path, "let x = 1\n").unwrap();
        assert_eq!(of_file(&path).unwrap(), Some(of_bytes(b"let x = 1\n")));
    }
}
