//! Byte-range planning and block-size inference.
//!
//! Planning is two-level: the file splits into per-worker super-ranges whose
//! lengths are multiples of the block size (except the last, clamped to the
//! file end), and each super-range splits into the block-sized ranges that are
//! hashed individually. Both levels produce contiguous, non-overlapping,
//! ascending ranges that cover the file exactly.

use crate::error::EtagError;

/// Smallest block size multipart uploads use: 1 MiB.
/// Inference starts here and doubles until the part count fits.
pub const MIN_MULTIPART_BLOCK_SIZE: u64 = 1 << 20;

/// A half-open byte range `[start, end)` within a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Number of blocks a file of `file_len` bytes splits into.
/// A zero-length file still occupies one (empty) block.
pub fn block_count(file_len: u64, block_size: u64) -> u64 {
    if file_len == 0 {
        1
    } else {
        file_len.div_ceil(block_size)
    }
}

/// Split `[0, file_len)` into consecutive `block_size` ranges; the last range
/// holds the remainder. A zero-length file yields a single empty range, which
/// hashes to the digest of zero bytes.
pub fn block_ranges(file_len: u64, block_size: u64) -> Result<Vec<ByteRange>, EtagError> {
    if block_size == 0 {
        return Err(EtagError::InvalidInput(
            "block size must be positive".to_string(),
        ));
    }
    Ok(split_range(
        ByteRange {
            start: 0,
            end: file_len,
        },
        block_size,
    ))
}

/// Block-size splitting of a single (super-)range. The range start must be
/// block-aligned for the split to reproduce whole-file block boundaries.
pub fn split_range(range: ByteRange, block_size: u64) -> Vec<ByteRange> {
    debug_assert!(block_size > 0);
    if range.is_empty() {
        return vec![range];
    }
    let mut ranges = Vec::with_capacity(block_count(range.len(), block_size) as usize);
    let mut start = range.start;
    while start < range.end {
        let end = start.saturating_add(block_size).min(range.end);
        ranges.push(ByteRange { start, end });
        start = end;
    }
    ranges
}

/// Partition `[0, file_len)` into at most `worker_count` super-ranges, each a
/// whole number of blocks except the last, which is clamped to the file end.
/// Never produces more ranges than there are blocks.
pub fn super_ranges(file_len: u64, block_size: u64, worker_count: usize) -> Vec<ByteRange> {
    debug_assert!(block_size > 0);
    let total_blocks = block_count(file_len, block_size);
    let workers = (worker_count as u64).clamp(1, total_blocks);
    let stride = total_blocks.div_ceil(workers).saturating_mul(block_size);

    let mut ranges = Vec::with_capacity(workers as usize);
    let mut start = 0u64;
    while start < file_len {
        let end = start.saturating_add(stride).min(file_len);
        ranges.push(ByteRange { start, end });
        start = end;
    }
    if ranges.is_empty() {
        // Zero-length file: one empty super-range so the pipeline still
        // produces the digest of zero bytes.
        ranges.push(ByteRange { start: 0, end: 0 });
    }
    log::debug!(
        "planned {} super-range(s) over {} block(s) of {} bytes",
        ranges.len(),
        total_blocks,
        block_size
    );
    ranges
}

/// Recover the block size that produced `reference` for a file of `file_len`
/// bytes.
///
/// A tag without a part-count suffix was not a multipart upload; the returned
/// sentinel (`file_len + 1`) makes the planner treat the whole file as one
/// block. Otherwise the trailing integer is the part count, and the search
/// doubles from 1 MiB until that many parts suffice. Multipart uploaders pick
/// part sizes exactly this way, so the search reconstructs the original choice
/// (or one with the same part count, which splits the file identically).
pub fn infer_block_size(file_len: u64, reference: &str) -> Result<u64, EtagError> {
    let tag = reference.trim_matches('"');
    if tag.is_empty() {
        return Err(EtagError::InvalidInput("empty reference tag".to_string()));
    }
    let Some((_, suffix)) = tag.rsplit_once('-') else {
        return Ok(file_len + 1);
    };
    let part_count: u64 = suffix.parse().map_err(|_| {
        EtagError::InvalidInput(format!("non-integer part count in tag {tag:?}"))
    })?;
    if part_count == 0 {
        return Err(EtagError::InvalidInput(format!(
            "zero part count in tag {tag:?}"
        )));
    }

    let mut block_size = MIN_MULTIPART_BLOCK_SIZE;
    while block_count(file_len, block_size) > part_count {
        block_size = block_size.saturating_mul(2);
    }
    log::debug!(
        "inferred block size {} from {} part(s) over {} bytes",
        block_size,
        part_count,
        file_len
    );
    Ok(block_size)
}
