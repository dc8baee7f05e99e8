use grove_types::Fingerprint;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag that is prepended to every hash
/// computation, so a file whose bytes happen to equal a commit's identity
/// material still gets a different fingerprint.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for file contents.
    pub const BLOB: Self = Self {
        domain: "grove-blob-v1",
    };
    /// Hasher for commit identities.
    pub const COMMIT: Self = Self {
        domain: "grove-commit-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> Fingerprint {
        let mut hasher = self.start();
        hasher.update(data);
        Fingerprint::from_hash(*hasher.finalize().as_bytes())
    }

    /// Hash a sequence of fields, each terminated by a NUL byte so that
    /// `["ab", "c"]` and `["a", "bc"]` never collide.
    pub fn hash_fields<I, T>(&self, fields: I) -> Fingerprint
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let mut hasher = self.start();
        for field in fields {
            hasher.update(field.as_ref());
            hasher.update(b"\0");
        }
        Fingerprint::from_hash(*hasher.finalize().as_bytes())
    }

    /// Verify that data produces the expected fingerprint.
    pub fn verify(&self, data: &[u8], expected: &Fingerprint) -> bool {
        self.hash(data) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }

    fn start(&self) -> blake3::Hasher {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher
    }
}
