//! Strong digest wrappers used for per-file signatures.

use std::fmt;

use digest::Digest as _;

/// Streaming digest with a fixed output width.
pub trait StrongDigest: Sized {
    /// Output produced by [`finalize`](Self::finalize).
    type Digest: AsRef<[u8]> + Copy;

    /// Width of [`Self::Digest`] in bytes.
    const DIGEST_LEN: usize;

    /// Creates a hasher with an empty state.
    fn new() -> Self;

    /// Feeds additional bytes into the digest state.
    fn update(&mut self, data: &[u8]);

    /// Consumes the hasher and returns the digest.
    fn finalize(self) -> Self::Digest;

    /// Computes the digest of `data` in one shot.
    fn digest(data: &[u8]) -> Self::Digest {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }
}

macro_rules! signature_hasher {
    ($(#[$doc:meta])* $name:ident, $backend:ty, $len:literal) => {
        $(#[$doc])*
        #[derive(Clone, Default)]
        pub struct $name($backend);

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(stringify!($name))
            }
        }

        impl StrongDigest for $name {
            type Digest = [u8; $len];
            const DIGEST_LEN: usize = $len;

            fn new() -> Self {
                Self(<$backend>::new())
            }

            fn update(&mut self, data: &[u8]) {
                self.0.update(data);
            }

            fn finalize(self) -> Self::Digest {
                self.0.finalize().into()
            }
        }
    };
}

signature_hasher!(
    /// MD5 signature hasher, 16-byte output.
    Md5,
    md5::Md5,
    16
);

signature_hasher!(
    /// SHA-1 signature hasher, 20-byte output.
    Sha1,
    sha1::Sha1,
    20
);
