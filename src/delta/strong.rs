use md5::Digest;

/// Capability required from a strong block hasher: restartable streaming
/// writes and a fixed-width digest. The signature side and the delta side
/// must agree on the implementation.
pub trait StrongHasher {
    /// Digest width in bytes.
    fn digest_len(&self) -> usize;

    /// Restart the hasher for a new block.
    fn reset(&mut self);

    /// Feed block bytes.
    fn update(&mut self, data: &[u8]);

    /// Digest of the bytes fed since the last reset.
    fn finalize(&mut self) -> Vec<u8>;
}

/// BLAKE3 truncated to 128 bits, the default strong hash.
pub struct Blake3 {
    inner: blake3::Hasher,
}

impl Blake3 {
    pub fn new() -> Self {
        Self {
            inner: blake3::Hasher::new(),
        }
    }
}

impl Default for Blake3 {
    fn default() -> Self {
        Self::new()
    }
}

impl StrongHasher for Blake3 {
    fn digest_len(&self) -> usize {
        16
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    fn finalize(&mut self) -> Vec<u8> {
        self.inner.finalize().as_bytes()[..16].to_vec()
    }
}

/// MD5 through the RustCrypto digest stack, for rsync-flavored setups.
pub struct Md5 {
    inner: md5::Md5,
}

impl Md5 {
    pub fn new() -> Self {
        Self {
            inner: md5::Md5::new(),
        }
    }
}

impl Default for Md5 {
    fn default() -> Self {
        Self::new()
    }
}

impl StrongHasher for Md5 {
    fn digest_len(&self) -> usize {
        16
    }

    fn reset(&mut self) {
        Digest::reset(&mut self.inner);
    }

    fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    fn finalize(&mut self) -> Vec<u8> {
        self.inner.finalize_reset().to_vec()
    }
}
