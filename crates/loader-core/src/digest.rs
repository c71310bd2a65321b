//! Streaming SHA-256 content digests

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Read buffer used when hashing. Files are never materialized whole.
pub const READ_BUFFER_SIZE: usize = 4096;

/// Hash everything `reader` yields, returning the lowercase hex digest.
pub fn digest_reader<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; READ_BUFFER_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

pub fn digest_file(path: &Path) -> io::Result<String> {
    digest_reader(File::open(path)?)
}

pub fn digest_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Hex digests compare case-insensitively.
pub fn digests_match(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_empty_input() {
        assert_eq!(digest_bytes(b""), EMPTY_SHA256);
        assert_eq!(digest_reader(io::empty()).unwrap(), EMPTY_SHA256);
    }

    #[test]
    fn test_file_digest_spans_several_buffers() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let content: Vec<u8> = (0..READ_BUFFER_SIZE * 3 + 17).map(|i| i as u8).collect();
        file.write_all(&content).unwrap();
        file.flush().unwrap();

        assert_eq!(digest_file(file.path()).unwrap(), digest_bytes(&content));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = digest_file(&dir.path().join("absent")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    proptest! {
        #[test]
        fn prop_streaming_matches_one_shot(data in proptest::collection::vec(any::<u8>(), 0..20_000)) {
            prop_assert_eq!(digest_reader(&data[..]).unwrap(), digest_bytes(&data));
        }

        #[test]
        fn prop_case_insensitive_compare(data in proptest::collection::vec(any::<u8>(), 0..256)) {
            let digest = digest_bytes(&data);
            prop_assert!(digests_match(&digest, &digest.to_uppercase()));
        }

        #[test]
        fn prop_different_content_never_matches(a in "[a-z]{1,32}", b in "[a-z]{1,32}") {
            prop_assume!(a != b);
            prop_assert!(!digests_match(&digest_bytes(a.as_bytes()), &digest_bytes(b.as_bytes())));
        }
    }
}
