use std::io::Read;

use blake2::digest::consts::{U20, U32, U48};
use digest::DynDigest;
use ocfl_types::DigestAlgorithm;

use crate::error::ChecksumResult;

/// A type-erased incremental hasher.
pub type BoxedHasher = Box<dyn DynDigest + Send>;

const READ_BUFFER: usize = 64 * 1024;

/// Create an incremental hasher for `algorithm`.
///
/// The BLAKE2b variants are parameterised by output size (not truncated
/// BLAKE2b-512), matching the OCFL digest algorithm registry.
pub fn new_hasher(algorithm: DigestAlgorithm) -> BoxedHasher {
    match algorithm {
        DigestAlgorithm::Md5 => Box::new(md5::Md5::default()),
        DigestAlgorithm::Sha1 => Box::new(sha1::Sha1::default()),
        DigestAlgorithm::Sha256 => Box::new(sha2::Sha256::default()),
        DigestAlgorithm::Sha512 => Box::new(sha2::Sha512::default()),
        DigestAlgorithm::Blake2b160 => Box::new(blake2::Blake2b::<U20>::default()),
        DigestAlgorithm::Blake2b256 => Box::new(blake2::Blake2b::<U32>::default()),
        DigestAlgorithm::Blake2b384 => Box::new(blake2::Blake2b::<U48>::default()),
        DigestAlgorithm::Blake2b512 => Box::new(blake2::Blake2b512::default()),
    }
}

/// Lowercase hex digest of `data`.
pub fn digest_bytes(algorithm: DigestAlgorithm, data: &[u8]) -> String {
    let mut hasher = new_hasher(algorithm);
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Lowercase hex digest of everything `reader` yields, on the calling thread.
pub fn digest_reader<R: Read>(algorithm: DigestAlgorithm, mut reader: R) -> ChecksumResult<String> {
    let mut hasher = new_hasher(algorithm);
    let mut buf = vec![0u8; READ_BUFFER];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_empty_digests() {
        assert_eq!(
            digest_bytes(DigestAlgorithm::Md5, b""),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
        assert_eq!(
            digest_bytes(DigestAlgorithm::Sha1, b""),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
        assert_eq!(
            digest_bytes(DigestAlgorithm::Sha256, b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn sha256_of_object_id() {
        // The digest behind the hashed n-tuple layout vectors.
        assert_eq!(
            digest_bytes(DigestAlgorithm::Sha256, b"object-01"),
            "3c0ff4240c1e116dba14c7627f2319b58aa3d77606d0d90dfc6161608ac987d4"
        );
    }

    #[test]
    fn output_lengths_match_algorithm() {
        for alg in DigestAlgorithm::ALL {
            let hex = digest_bytes(alg, b"ocfl");
            assert_eq!(hex.len(), alg.hex_len(), "{alg}");
            assert!(alg.is_valid_digest(&hex));
        }
    }

    #[test]
    fn blake2b_sizes_are_not_truncations() {
        let full = digest_bytes(DigestAlgorithm::Blake2b512, b"abc");
        let short = digest_bytes(DigestAlgorithm::Blake2b256, b"abc");
        assert_ne!(&full[..64], short);
    }

    #[test]
    fn reader_matches_bytes() {
        let data = vec![7u8; READ_BUFFER * 2 + 17];
        for alg in DigestAlgorithm::ALL {
            assert_eq!(
                digest_reader(alg, data.as_slice()).unwrap(),
                digest_bytes(alg, &data)
            );
        }
    }
}
