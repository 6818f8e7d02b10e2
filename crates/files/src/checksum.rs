//! Running MD5 and SHA-1 digests of a download

use sha1::{Digest, Sha1};

pub struct Checksums {
    md5: md5::Context,
    sha1: Sha1,
}

/// Finalized digests as uppercase hex
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumDigests {
    pub md5_hex: String,
    pub sha1_hex: String,
}

impl Checksums {
    pub fn new() -> Self {
        Self {
            md5: md5::Context::new(),
            sha1: Sha1::new(),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.md5.consume(data);
        self.sha1.update(data);
    }

    pub fn finalize(self) -> ChecksumDigests {
        ChecksumDigests {
            md5_hex: hex::encode_upper(self.md5.compute().0),
            sha1_hex: hex::encode_upper(self.sha1.finalize()),
        }
    }
}

impl Default for Checksums {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digests() {
        let mut sums = Checksums::new();
        sums.update(b"hello ");
        sums.update(b"world");
        let digests = sums.finalize();

        assert_eq!(digests.md5_hex, "5EB63BBBE01EEED093CB22BB8F5ACDC3");
        assert_eq!(digests.sha1_hex, "2AAE6C35C94FCFB415DBE95F408B9CE91EE846ED");
    }

    #[test]
    fn test_empty_input() {
        let digests = Checksums::new().finalize();
        assert_eq!(digests.md5_hex, "D41D8CD98F00B204E9800998ECF8427E");
        assert_eq!(digests.sha1_hex, "DA39A3EE5E6B4B0D3255BFEF95601890AFD80709");
    }
}
