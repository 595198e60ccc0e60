use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::strong::{Md5, Sha1, StrongDigest};

/// Digest algorithm requested for a file's signature.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ChecksumKind {
    /// No signature is computed or sent.
    #[default]
    None,
    /// 16-byte MD5 signature.
    Md5,
    /// 20-byte SHA-1 signature.
    Sha1,
}

impl ChecksumKind {
    /// Returns the signature width in bytes, `0` for [`ChecksumKind::None`].
    #[must_use]
    pub const fn digest_len(self) -> usize {
        match self {
            Self::None => 0,
            Self::Md5 => Md5::DIGEST_LEN,
            Self::Sha1 => Sha1::DIGEST_LEN,
        }
    }

    /// Returns the lowercase name used in configuration and log output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
        }
    }
}

impl fmt::Display for ChecksumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a checksum name is not recognised.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("unknown checksum algorithm: \"{name}\"")]
pub struct ParseChecksumKindError {
    name: String,
}

impl ParseChecksumKindError {
    /// Returns the name that failed to parse.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for ChecksumKind {
    type Err = ParseChecksumKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "md5" => Ok(Self::Md5),
            "sha1" | "sha-1" => Ok(Self::Sha1),
            _ => Err(ParseChecksumKindError { name: s.to_owned() }),
        }
    }
}

/// Finalised file signature.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Signature {
    /// MD5 digest.
    Md5([u8; 16]),
    /// SHA-1 digest.
    Sha1([u8; 20]),
}

impl Signature {
    /// Returns the algorithm that produced this signature.
    #[must_use]
    pub const fn kind(&self) -> ChecksumKind {
        match self {
            Self::Md5(_) => ChecksumKind::Md5,
            Self::Sha1(_) => ChecksumKind::Sha1,
        }
    }

    /// Returns the raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Md5(bytes) => bytes,
            Self::Sha1(bytes) => bytes,
        }
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

#[derive(Clone, Debug)]
enum Hasher {
    None,
    Md5(Md5),
    Sha1(Sha1),
}

/// Running digest for one file.
///
/// Created when a file's options request a signature, fed every block read
/// from disk before compression or sparse elision, and consumed by
/// [`finalize`](Self::finalize).
#[derive(Clone, Debug)]
pub struct ChecksumState {
    hasher: Hasher,
    updated: bool,
}

impl ChecksumState {
    /// Creates a state for `kind`.
    #[must_use]
    pub fn new(kind: ChecksumKind) -> Self {
        let hasher = match kind {
            ChecksumKind::None => Hasher::None,
            ChecksumKind::Md5 => Hasher::Md5(Md5::new()),
            ChecksumKind::Sha1 => Hasher::Sha1(Sha1::new()),
        };
        Self {
            hasher,
            updated: false,
        }
    }

    /// Returns the algorithm selected at construction.
    #[must_use]
    pub const fn kind(&self) -> ChecksumKind {
        match self.hasher {
            Hasher::None => ChecksumKind::None,
            Hasher::Md5(_) => ChecksumKind::Md5,
            Hasher::Sha1(_) => ChecksumKind::Sha1,
        }
    }

    /// Reports whether any bytes have been hashed.
    #[must_use]
    pub const fn is_updated(&self) -> bool {
        self.updated
    }

    /// Feeds a block of file content into the digest.
    pub fn update(&mut self, data: &[u8]) {
        match &mut self.hasher {
            Hasher::None => return,
            Hasher::Md5(hasher) => hasher.update(data),
            Hasher::Sha1(hasher) => hasher.update(data),
        }
        self.updated = true;
    }

    /// Consumes the state and returns the signature, or `None` when no
    /// algorithm was selected.
    #[must_use]
    pub fn finalize(self) -> Option<Signature> {
        match self.hasher {
            Hasher::None => None,
            Hasher::Md5(hasher) => Some(Signature::Md5(hasher.finalize())),
            Hasher::Sha1(hasher) => Some(Signature::Sha1(hasher.finalize())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn md5_always_finalizes_to_sixteen_bytes() {
        let mut state = ChecksumState::new(ChecksumKind::Md5);
        state.update(b"block one");
        let signature = state.finalize().expect("md5 signature");
        assert_eq!(signature.as_bytes().len(), 16);
        assert_eq!(signature.kind(), ChecksumKind::Md5);
    }

    #[test]
    fn sha1_always_finalizes_to_twenty_bytes() {
        let state = ChecksumState::new(ChecksumKind::Sha1);
        let signature = state.finalize().expect("sha1 signature");
        assert_eq!(signature.as_bytes().len(), 20);
    }

    #[test]
    fn none_emits_no_signature() {
        let mut state = ChecksumState::new(ChecksumKind::None);
        state.update(b"ignored");
        assert!(!state.is_updated());
        assert!(state.finalize().is_none());
    }

    #[test]
    fn updated_flag_tracks_input() {
        let mut state = ChecksumState::new(ChecksumKind::Sha1);
        assert!(!state.is_updated());
        state.update(b"");
        assert!(state.is_updated());
    }

    #[test]
    fn digest_len_matches_kind() {
        assert_eq!(ChecksumKind::None.digest_len(), 0);
        assert_eq!(ChecksumKind::Md5.digest_len(), 16);
        assert_eq!(ChecksumKind::Sha1.digest_len(), 20);
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("MD5".parse::<ChecksumKind>(), Ok(ChecksumKind::Md5));
        assert_eq!("sha1".parse::<ChecksumKind>(), Ok(ChecksumKind::Sha1));
        assert_eq!("none".parse::<ChecksumKind>(), Ok(ChecksumKind::None));
        let error = "crc32".parse::<ChecksumKind>().unwrap_err();
        assert_eq!(error.name(), "crc32");
        assert_eq!(error.to_string(), "unknown checksum algorithm: \"crc32\"");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&ChecksumKind::Sha1).expect("serialize");
        assert_eq!(json, "\"sha1\"");
        let parsed: ChecksumKind = serde_json::from_str("\"md5\"").expect("deserialize");
        assert_eq!(parsed, ChecksumKind::Md5);
    }

    proptest! {
        #[test]
        fn chunked_updates_match_single_update(
            data in proptest::collection::vec(any::<u8>(), 0..4096),
            split in 0usize..4096,
        ) {
            let split = split.min(data.len());
            for kind in [ChecksumKind::Md5, ChecksumKind::Sha1] {
                let mut chunked = ChecksumState::new(kind);
                chunked.update(&data[..split]);
                chunked.update(&data[split..]);

                let mut whole = ChecksumState::new(kind);
                whole.update(&data);

                prop_assert_eq!(chunked.finalize(), whole.finalize());
            }
        }
    }
}
