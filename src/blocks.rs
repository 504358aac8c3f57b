use crate::bytestring::ByteString;
use crate::error::{CrackError, Result};

/// Split a byte string into consecutive blocks of `n` bytes
/// The last block holds the remainder and may be shorter
pub fn nblocks(s: &ByteString, n: usize) -> Result<Vec<ByteString>> {
    if n == 0 {
        return Err(CrackError::InvalidArgument(
            "block size must be greater than zero".into(),
        ));
    }
    Ok(s.as_bytes().chunks(n).map(ByteString::from).collect())
}

/// Concatenate blocks back into one byte string
pub fn join_bytestrings(blocks: &[ByteString]) -> ByteString {
    let mut out = Vec::with_capacity(blocks.iter().map(ByteString::len).sum());
    for block in blocks {
        out.extend_from_slice(block.as_bytes());
    }
    ByteString::new(out)
}

/// Drop every block shorter than `length` and truncate the longer ones
pub fn uniform_length(blocks: &[ByteString], length: usize) -> Vec<ByteString> {
    blocks
        .iter()
        .filter(|b| b.len() >= length)
        .map(|b| {
            if b.len() == length {
                b.clone()
            } else {
                ByteString::from(&b.as_bytes()[..length])
            }
        })
        .collect()
}

/// Pick a common length that drops at most a `drop` fraction of the
/// shortest blocks, then apply [`uniform_length`] with it
///
/// `drop = 0` keeps every block (cut to the shortest), `drop = 1` keeps
/// only the longest ones. Block order is preserved.
pub fn uniform_length_by_drop(blocks: &[ByteString], drop: f64) -> Result<Vec<ByteString>> {
    if !(0.0..=1.0).contains(&drop) {
        return Err(CrackError::InvalidArgument(format!(
            "drop must be a fraction between 0 and 1, got {}",
            drop
        )));
    }
    if blocks.is_empty() {
        return Ok(Vec::new());
    }

    let mut lengths: Vec<usize> = blocks.iter().map(ByteString::len).collect();
    lengths.sort_unstable();
    let idx = ((drop * blocks.len() as f64) as usize).min(blocks.len() - 1);
    Ok(uniform_length(blocks, lengths[idx]))
}

/// Stack the blocks as rows of a matrix and return its columns
///
/// With `allow_holes` the blocks may have different lengths and shorter
/// blocks contribute nothing to the columns beyond their end.
pub fn transpose(blocks: &[ByteString], allow_holes: bool) -> Result<Vec<ByteString>> {
    let first = match blocks.first() {
        Some(b) => b.len(),
        None => return Ok(Vec::new()),
    };

    if !allow_holes {
        if let Some((index, block)) = blocks.iter().enumerate().find(|(_, b)| b.len() != first) {
            return Err(CrackError::RaggedBlocks {
                expected: first,
                index,
                found: block.len(),
            });
        }
    }

    let width = blocks.iter().map(ByteString::len).max().unwrap_or(0);
    Ok((0..width)
        .map(|i| {
            blocks
                .iter()
                .filter_map(|b| b.as_bytes().get(i).copied())
                .collect()
        })
        .collect())
}

/// Transpose ragged blocks filling the holes with `fill`
pub fn transpose_filled(blocks: &[ByteString], fill: u8) -> Vec<ByteString> {
    let width = blocks.iter().map(ByteString::len).max().unwrap_or(0);
    (0..width)
        .map(|i| {
            blocks
                .iter()
                .map(|b| b.as_bytes().get(i).copied().unwrap_or(fill))
                .collect()
        })
        .collect()
}

/// Which index of a duplicated pair to report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateIndex {
    First,
    #[default]
    Second,
    Both,
}

/// Indexes of items equal to the item `distance + 1` positions before
/// (`distance = 0` means consecutive items)
pub fn iduplicates<T: PartialEq>(items: &[T], distance: usize, which: DuplicateIndex) -> Vec<usize> {
    let gap = distance + 1;
    let mut out = Vec::new();
    if items.len() <= gap {
        return out;
    }
    for idx in 0..items.len() - gap {
        if items[idx] == items[idx + gap] {
            if matches!(which, DuplicateIndex::First | DuplicateIndex::Both) {
                out.push(idx);
            }
            if matches!(which, DuplicateIndex::Second | DuplicateIndex::Both) {
                out.push(idx + gap);
            }
        }
    }
    out
}

pub fn has_duplicates<T: PartialEq>(items: &[T], distance: usize) -> bool {
    let gap = distance + 1;
    items.len() > gap && (0..items.len() - gap).any(|i| items[i] == items[i + gap])
}
