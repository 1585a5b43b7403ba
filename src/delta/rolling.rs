use crate::error::RdeltaError;
use crate::Result;

/// Adler-32 modulus.
const MOD_ADLER: u32 = 65521;

/// Rolling Adler-32 checksum over a sliding byte window.
///
/// Equal in value to the classical Adler-32 of the window contents:
///
/// a = (1 + s[0] + ... + s[n-1]) mod 65521
/// b = (n*s[0] + (n-1)*s[1] + ... + 1*s[n-1] + n) mod 65521
///
/// Checksum = (b << 16) | a
///
/// `write_all` recomputes (a, b) from scratch; after that the window
/// slides one byte at a time in O(1).
pub struct RollingAdler32 {
    a: u32,
    b: u32,
    /// Window length, kept out of the buffer so roll() never recounts it.
    n: u32,
    /// Rotating buffer; `head` is the slot holding the oldest byte.
    window: Vec<u8>,
    head: usize,
}

impl RollingAdler32 {
    pub fn new() -> Self {
        Self {
            a: 1,
            b: 0,
            n: 0,
            window: Vec::new(),
            head: 0,
        }
    }

    /// Return to the empty state.
    pub fn reset(&mut self) {
        self.a = 1;
        self.b = 0;
        self.n = 0;
        self.window.clear();
        self.head = 0;
    }

    /// Replace the window with `p` and recompute the checksum from
    /// scratch. Writing an empty slice is a no-op; a slice of a different
    /// length resizes the window. Afterwards `sum32()` equals the
    /// classical Adler-32 of `p`.
    pub fn write_all(&mut self, p: &[u8]) {
        if p.is_empty() {
            return;
        }
        self.window.clear();
        self.window.extend_from_slice(p);
        self.n = p.len() as u32;
        self.head = 0;

        // Accumulate in u64 so the modular reduction happens once at the
        // end instead of per byte.
        let mut a: u64 = 1;
        let mut b: u64 = 0;
        for &byte in p {
            a += u64::from(byte);
            b += a;
        }
        self.a = (a % u64::from(MOD_ADLER)) as u32;
        self.b = (b % u64::from(MOD_ADLER)) as u32;
    }

    /// Slide the window by one byte: the oldest byte leaves and is
    /// returned, `entering` takes its slot.
    ///
    /// Fails with [`RdeltaError::EmptyWindow`] when no `write_all` has
    /// initialized the window yet.
    pub fn roll(&mut self, entering: u8) -> Result<u8> {
        if self.n == 0 {
            return Err(RdeltaError::EmptyWindow);
        }
        let leaving = u32::from(self.window[self.head]);
        self.window[self.head] = entering;
        self.head = (self.head + 1) % self.window.len();

        // The added multiples of the modulus keep every intermediate
        // value non-negative in u32.
        self.a = (self.a + MOD_ADLER + u32::from(entering) - leaving) % MOD_ADLER;
        self.b = (self.b + (self.n * leaving / MOD_ADLER + 1) * MOD_ADLER + self.a
            - self.n * leaving
            - 1)
            % MOD_ADLER;

        Ok(leaving as u8)
    }

    /// The Adler-32 checksum of the current window.
    pub fn sum32(&self) -> u32 {
        self.b << 16 | self.a & 0xffff
    }

    /// The window bytes in logical order, oldest first.
    pub fn window_content(&self) -> Vec<u8> {
        let mut content = Vec::with_capacity(self.window.len());
        content.extend_from_slice(&self.window[self.head..]);
        content.extend_from_slice(&self.window[..self.head]);
        content
    }
}

impl Default for RollingAdler32 {
    fn default() -> Self {
        Self::new()
    }
}
