//! Big-endian word codec for fixed-layout device records
//!
//! The IT8951 exchanges records whose fields are all 32-bit words in
//! big-endian order. Each record type lists its fields once in a
//! [`WireRecord`] impl; [`to_wire`] / [`from_wire`] do the framing for all of
//! them. No record is ever reinterpreted from raw memory.

/// Bytes per device word.
pub const WORD_LEN: usize = 4;

/// Decode failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// Fewer bytes than the record's fixed wire length.
    #[error("record truncated: need {expected} bytes, got {actual}")]
    Truncated {
        /// Fixed wire length of the record.
        expected: usize,
        /// Bytes supplied.
        actual: usize,
    },
    /// A wave-mode word outside the protocol's closed set.
    #[error("unknown wave mode {0}")]
    InvalidWaveMode(u32),
}

/// A record made only of 32-bit words, serialized field by field.
pub trait WireRecord: Sized {
    /// Number of 32-bit words on the wire.
    const WORDS: usize;

    /// Fixed wire length in bytes.
    // SAFETY: record sizes are small compile-time constants (< 64 words).
    #[allow(clippy::arithmetic_side_effects)]
    const WIRE_LEN: usize = Self::WORDS * WORD_LEN;

    /// Append every field, in wire order.
    fn write_words(&self, out: &mut WordWriter<'_>);

    /// Consume every field, in wire order.
    fn read_words(input: &mut WordReader<'_>) -> Result<Self, WireError>;
}

/// Serialize `record` to its big-endian wire form.
pub fn to_wire<T: WireRecord>(record: &T) -> Vec<u8> {
    let mut buf = Vec::with_capacity(T::WIRE_LEN);
    record.write_words(&mut WordWriter::new(&mut buf));
    buf
}

/// Decode a record from the first [`WireRecord::WIRE_LEN`] bytes of `bytes`.
///
/// Trailing bytes are ignored.
pub fn from_wire<T: WireRecord>(bytes: &[u8]) -> Result<T, WireError> {
    if bytes.len() < T::WIRE_LEN {
        return Err(WireError::Truncated {
            expected: T::WIRE_LEN,
            actual: bytes.len(),
        });
    }
    T::read_words(&mut WordReader::new(bytes))
}

// ---------------------------------------------------------------------------
// Word cursors
// ---------------------------------------------------------------------------

/// Append-only big-endian word sink.
pub struct WordWriter<'a> {
    buf: &'a mut Vec<u8>,
}

impl<'a> WordWriter<'a> {
    /// Write into `buf`, after any bytes already there.
    pub fn new(buf: &'a mut Vec<u8>) -> Self {
        Self { buf }
    }

    /// Append one word.
    pub fn put(&mut self, word: u32) {
        self.buf.extend_from_slice(&word.to_be_bytes());
    }

    /// Append each word of `words`.
    pub fn put_all(&mut self, words: &[u32]) {
        for w in words {
            self.put(*w);
        }
    }

    /// Append a nested record.
    pub fn put_record<T: WireRecord>(&mut self, record: &T) {
        record.write_words(self);
    }
}

/// Big-endian word source over a byte slice.
pub struct WordReader<'a> {
    rest: &'a [u8],
    consumed: usize,
}

impl<'a> WordReader<'a> {
    /// Read from the start of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            rest: bytes,
            consumed: 0,
        }
    }

    /// Take one word.
    pub fn take(&mut self) -> Result<u32, WireError> {
        let (word, rest) = match (self.rest.get(..WORD_LEN), self.rest.get(WORD_LEN..)) {
            (Some(w), Some(r)) => (w, r),
            _ => {
                return Err(WireError::Truncated {
                    expected: self.consumed.saturating_add(WORD_LEN),
                    actual: self.consumed.saturating_add(self.rest.len()),
                })
            }
        };
        self.rest = rest;
        self.consumed = self.consumed.saturating_add(WORD_LEN);
        let mut b = [0u8; WORD_LEN];
        b.copy_from_slice(word);
        Ok(u32::from_be_bytes(b))
    }

    /// Take `N` consecutive words.
    pub fn take_array<const N: usize>(&mut self) -> Result<[u32; N], WireError> {
        let mut out = [0u32; N];
        for slot in &mut out {
            *slot = self.take()?;
        }
        Ok(out)
    }

    /// Take a nested record.
    pub fn take_record<T: WireRecord>(&mut self) -> Result<T, WireError> {
        T::read_words(self)
    }
}
