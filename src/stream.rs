use crate::bytestring::ByteString;
use crate::error::{CrackError, Result};
use std::fmt;

/// Endless repetition of a non-empty byte string
///
/// The stream holds no cursor: every consumer starts at offset 0 of the
/// cycle, so repeated XORs against the same stream are independent.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct InfiniteStream {
    source: ByteString,
}

impl InfiniteStream {
    pub fn new(source: ByteString) -> Result<Self> {
        if source.is_empty() {
            return Err(CrackError::EmptySource);
        }
        Ok(Self { source })
    }

    /// Length of one cycle
    pub fn period(&self) -> usize {
        self.source.len()
    }

    pub fn source(&self) -> &ByteString {
        &self.source
    }

    pub fn byte_at(&self, index: usize) -> u8 {
        self.source.as_bytes()[index % self.period()]
    }

    /// Fresh iterator over the cycle, starting at offset 0
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.source.iter().copied().cycle()
    }

    /// Materialize the first `n` bytes of the stream
    pub fn take(&self, n: usize) -> ByteString {
        self.iter().take(n).collect()
    }
}

impl fmt::Debug for InfiniteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".. {:?} ..", self.source)
    }
}
