use crate::conv::{decode_base, encode_base, Base};
use crate::error::{CrackError, Result};
use crate::stream::InfiniteStream;
use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::{Bound, RangeBounds};
use std::sync::Arc;

/// Immutable string of bytes with value semantics
///
/// Clones share the same buffer; every derivation (slice, concat, xor)
/// allocates a new one. Equality, ordering and hashing are structural.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteString(Arc<[u8]>);

impl ByteString {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Arc::from(bytes.into()))
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, u8> {
        self.0.iter()
    }

    /// Get a single byte; negative indexes count from the end
    pub fn get(&self, index: isize) -> Result<u8> {
        let len = self.len() as isize;
        let idx = if index < 0 { index + len } else { index };
        if idx < 0 || idx >= len {
            return Err(CrackError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        Ok(self.0[idx as usize])
    }

    /// Copy a contiguous range of bytes into a new byte string
    pub fn slice<R: RangeBounds<usize>>(&self, range: R) -> Result<Self> {
        let len = self.len();
        let out_of_range = |index: usize| CrackError::IndexOutOfRange {
            index: isize::try_from(index).unwrap_or(isize::MAX),
            len,
        };
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.checked_add(1).ok_or_else(|| out_of_range(s))?,
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => e.checked_add(1).ok_or_else(|| out_of_range(e))?,
            Bound::Excluded(&e) => e,
            Bound::Unbounded => len,
        };
        if end > len {
            return Err(out_of_range(end));
        }
        if start > end {
            return Err(out_of_range(start));
        }
        Ok(Self::from(&self.0[start..end]))
    }

    /// Sequence slicing with optional bounds and a step
    ///
    /// Negative indexes count from the end and a negative step walks
    /// backwards (`slice_stepped(None, None, -1)` reverses the string).
    /// Explicit indexes outside `[-len, len]` are rejected.
    pub fn slice_stepped(
        &self,
        start: Option<isize>,
        stop: Option<isize>,
        step: isize,
    ) -> Result<Self> {
        if step == 0 {
            return Err(CrackError::InvalidArgument(
                "slice step cannot be zero".into(),
            ));
        }

        let len = self.len() as isize;
        let resolve = |index: isize| -> Result<isize> {
            if index < -len || index > len {
                return Err(CrackError::IndexOutOfRange {
                    index,
                    len: self.len(),
                });
            }
            Ok(if index < 0 { index + len } else { index })
        };

        let mut out = Vec::new();
        if step > 0 {
            let mut i = match start {
                Some(s) => resolve(s)?,
                None => 0,
            };
            let stop = match stop {
                Some(s) => resolve(s)?,
                None => len,
            };
            while i < stop {
                out.push(self.0[i as usize]);
                i = match i.checked_add(step) {
                    Some(next) => next,
                    None => break,
                };
            }
        } else {
            let mut i = match start {
                Some(s) => resolve(s)?.min(len - 1),
                None => len - 1,
            };
            let stop = match stop {
                Some(s) => resolve(s)?,
                None => -1,
            };
            while i > stop {
                out.push(self.0[i as usize]);
                i += step;
            }
        }
        Ok(Self::new(out))
    }

    pub fn concat(&self, other: &ByteString) -> Self {
        let mut out = Vec::with_capacity(self.len() + other.len());
        out.extend_from_slice(&self.0);
        out.extend_from_slice(&other.0);
        Self::new(out)
    }

    /// Repeat the byte string `n` times; zero yields an empty string
    pub fn repeat(&self, n: usize) -> Self {
        Self::new(self.0.repeat(n))
    }

    /// XOR two byte strings of the same length
    pub fn xor(&self, other: &ByteString) -> Result<Self> {
        if self.len() != other.len() {
            return Err(CrackError::LengthMismatch {
                left: self.len(),
                right: other.len(),
            });
        }
        Ok(self
            .iter()
            .zip(other.iter())
            .map(|(a, b)| a ^ b)
            .collect())
    }

    /// XOR against a repeating stream, consuming `self.len()` bytes from
    /// the start of its cycle
    pub fn xor_stream(&self, stream: &InfiniteStream) -> Self {
        self.iter()
            .zip(stream.iter())
            .map(|(a, b)| a ^ b)
            .collect()
    }

    /// View this byte string as an endless repetition of itself
    pub fn inf(&self) -> Result<InfiniteStream> {
        InfiniteStream::new(self.clone())
    }

    pub fn encode(&self, base: Base) -> String {
        encode_base(&self.0, base)
    }

    pub fn decode(text: &str, base: Base) -> Result<Self> {
        decode_base(text, base).map(Self::new)
    }

    /// Push `other` in from the right, dropping bytes on the left so the
    /// length stays the same
    pub fn shift_in(&self, other: &[u8]) -> Self {
        let n = other.len();
        let len = self.len();
        if n >= len {
            return Self::from(&other[n - len..]);
        }
        let mut out = Vec::with_capacity(len);
        out.extend_from_slice(&self.0[n..]);
        out.extend_from_slice(other);
        Self::new(out)
    }

    /// PKCS#7 padding up to a multiple of `block_size`
    pub fn pad_pkcs7(&self, block_size: usize) -> Result<Self> {
        if block_size == 0 || block_size > 255 {
            return Err(CrackError::InvalidArgument(format!(
                "PKCS#7 block size must be between 1 and 255, got {}",
                block_size
            )));
        }
        let npad = block_size - (self.len() % block_size);
        let mut out = self.to_vec();
        out.extend(std::iter::repeat(npad as u8).take(npad));
        Ok(Self::new(out))
    }

    pub fn unpad_pkcs7(&self) -> Result<Self> {
        let n = match self.0.last() {
            Some(&n) => n as usize,
            None => return Err(CrackError::Padding("empty byte string".into())),
        };
        if n == 0 || n > self.len() || self.0[self.len() - n..].iter().any(|&b| b as usize != n) {
            return Err(CrackError::Padding(format!(
                "PKCS#7 padding with last byte {:#04x} is malformed",
                n
            )));
        }
        self.slice(..self.len() - n)
    }

    /// Number of bits set
    pub fn count_ones(&self) -> u64 {
        self.iter().map(|b| b.count_ones() as u64).sum()
    }

    /// Number of differing bits between two byte strings of the same length
    pub fn hamming_distance(&self, other: &ByteString) -> Result<u64> {
        Ok(self.xor(other)?.count_ones())
    }

    /// Overlapping windows of `n` bytes
    pub fn ngrams(&self, n: usize) -> Result<Vec<ByteString>> {
        if n == 0 || self.len() < n {
            return Err(CrackError::InvalidArgument(format!(
                "The byte string has only {} bytes. It is not possible to create even a single ngram of length {}",
                self.len(),
                n
            )));
        }
        Ok(self.0.windows(n).map(ByteString::from).collect())
    }

    /// Byte histogram
    pub fn freq(&self) -> [usize; 256] {
        let mut counts = [0usize; 256];
        for &b in self.iter() {
            counts[b as usize] += 1;
        }
        counts
    }

    /// The `n` most frequent bytes, ties broken by the lower byte value
    pub fn most_common(&self, n: usize) -> Vec<u8> {
        let counts = self.freq();
        let mut present: Vec<(u8, usize)> = counts
            .iter()
            .enumerate()
            .filter(|(_, &c)| c > 0)
            .map(|(b, &c)| (b as u8, c))
            .collect();
        present.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        present.into_iter().take(n).map(|(b, _)| b).collect()
    }

    /// Shannon entropy of the byte distribution in nats
    pub fn entropy(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let total = self.len() as f64;
        self.freq()
            .iter()
            .filter(|&&c| c > 0)
            .map(|&c| {
                let p = c as f64 / total;
                -p * p.ln()
            })
            .sum()
    }
}

impl Default for ByteString {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<u8>> for ByteString {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for ByteString {
    fn from(bytes: &[u8]) -> Self {
        Self(Arc::from(bytes))
    }
}

impl<const N: usize> From<[u8; N]> for ByteString {
    fn from(bytes: [u8; N]) -> Self {
        Self::from(&bytes[..])
    }
}

impl<const N: usize> From<&[u8; N]> for ByteString {
    fn from(bytes: &[u8; N]) -> Self {
        Self::from(&bytes[..])
    }
}

impl From<&str> for ByteString {
    fn from(text: &str) -> Self {
        Self::from(text.as_bytes())
    }
}

impl From<u8> for ByteString {
    fn from(byte: u8) -> Self {
        Self::new(vec![byte])
    }
}

impl FromIterator<u8> for ByteString {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect::<Vec<u8>>())
    }
}

impl<'a> IntoIterator for &'a ByteString {
    type Item = &'a u8;
    type IntoIter = std::slice::Iter<'a, u8>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl AsRef<[u8]> for ByteString {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for ByteString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in self.iter() {
            match b {
                b'\\' => f.write_str("\\\\")?,
                b'\n' => f.write_str("\\n")?,
                0x20..=0x7e => write!(f, "{}", b as char)?,
                _ => write!(f, "\\x{:02x}", b)?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ByteString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self)
    }
}

/// Serialized as lowercase hex
impl Serialize for ByteString {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(&self.0))
    }
}
