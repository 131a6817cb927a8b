use paretag::plan::{
    block_count, block_ranges, infer_block_size, split_range, super_ranges, ByteRange,
    MIN_MULTIPART_BLOCK_SIZE,
};
use paretag::EtagError;

/// Every plan must be contiguous, non-overlapping, ascending, and cover the
/// file exactly.
fn assert_covers(ranges: &[ByteRange], file_len: u64) {
    assert!(!ranges.is_empty());
    assert_eq!(ranges[0].start, 0);
    for pair in ranges.windows(2) {
        assert_eq!(pair[0].end, pair[1].start);
        assert!(pair[0].start < pair[0].end);
    }
    assert_eq!(ranges.last().unwrap().end, file_len);
}

#[test]
fn block_ranges_cover_file_with_remainder() {
    let ranges = block_ranges(1000, 300).unwrap();
    assert_eq!(
        ranges,
        vec![
            ByteRange { start: 0, end: 300 },
            ByteRange { start: 300, end: 600 },
            ByteRange { start: 600, end: 900 },
            ByteRange { start: 900, end: 1000 },
        ]
    );
    assert_covers(&ranges, 1000);
}

#[test]
/// An exact multiple of the block size leaves the last range full, not empty.
fn block_ranges_exact_multiple() {
    let ranges = block_ranges(900, 300).unwrap();
    assert_eq!(ranges.len(), 3);
    assert_eq!(ranges.last().unwrap().len(), 300);
    assert_covers(&ranges, 900);
}

#[test]
fn block_ranges_empty_file_yields_one_empty_block() {
    let ranges = block_ranges(0, 300).unwrap();
    assert_eq!(ranges, vec![ByteRange { start: 0, end: 0 }]);
    assert_eq!(block_count(0, 300), 1);
}

#[test]
fn block_ranges_zero_block_size_is_invalid() {
    let err = block_ranges(1000, 0).unwrap_err();
    assert!(matches!(err, EtagError::InvalidInput(_)));
}

#[test]
fn super_ranges_are_block_aligned_and_cover() {
    let bs = 100;
    let file_len = 10 * bs + 7; // 11 blocks
    let supers = super_ranges(file_len, bs, 3);
    assert_eq!(supers.len(), 3);
    assert_covers(&supers, file_len);
    for range in &supers[..supers.len() - 1] {
        assert_eq!(range.start % bs, 0);
        assert_eq!(range.len() % bs, 0);
    }
}

#[test]
/// Workers beyond the block count would sit idle; the plan caps at one block
/// per worker instead.
fn super_ranges_never_outnumber_blocks() {
    let supers = super_ranges(250, 100, 8); // 3 blocks
    assert_eq!(supers.len(), 3);
    assert_covers(&supers, 250);
}

#[test]
fn super_ranges_single_worker_is_whole_file() {
    let supers = super_ranges(1234, 100, 1);
    assert_eq!(supers, vec![ByteRange { start: 0, end: 1234 }]);
}

#[test]
fn super_range_split_reproduces_whole_file_blocks() {
    let bs = 128;
    let file_len = 9 * bs + 31;
    let whole = block_ranges(file_len, bs).unwrap();
    let mut rejoined = Vec::new();
    for sup in super_ranges(file_len, bs, 4) {
        rejoined.extend(split_range(sup, bs));
    }
    assert_eq!(rejoined, whole);
}

#[test]
fn infer_suffixless_tag_spans_whole_file() {
    let block_size = infer_block_size(1000, "d41d8cd98f00b204e9800998ecf8427e").unwrap();
    assert!(block_size > 1000);
    assert_eq!(block_count(1000, block_size), 1);
}

#[test]
fn infer_starts_at_one_mib() {
    let file_len = 5 * MIN_MULTIPART_BLOCK_SIZE + 3;
    let tag = "0123456789abcdef0123456789abcdef-6";
    assert_eq!(infer_block_size(file_len, tag).unwrap(), MIN_MULTIPART_BLOCK_SIZE);
}

#[test]
fn infer_doubles_until_part_count_fits() {
    // 100 MiB in 13 parts needs 8 MiB blocks: 1, 2 and 4 MiB all overshoot.
    let file_len = 100 * (1 << 20);
    let tag = "0123456789abcdef0123456789abcdef-13";
    assert_eq!(infer_block_size(file_len, tag).unwrap(), 8 << 20);
}

#[test]
/// Inference recovers a size with the same part count as the original, which
/// is all recomputation needs to reproduce the split.
fn infer_is_left_inverse_on_part_count() {
    for original in [1u64 << 20, 1 << 22, 1 << 25] {
        let file_len = 3 * original + 11;
        let parts = block_count(file_len, original);
        let tag = format!("0123456789abcdef0123456789abcdef-{parts}");
        let inferred = infer_block_size(file_len, &tag).unwrap();
        assert_eq!(block_count(file_len, inferred), parts, "original {original}");
    }
}

#[test]
fn infer_strips_surrounding_quotes() {
    let file_len = 2 * MIN_MULTIPART_BLOCK_SIZE;
    let quoted = "\"0123456789abcdef0123456789abcdef-2\"";
    assert_eq!(infer_block_size(file_len, quoted).unwrap(), MIN_MULTIPART_BLOCK_SIZE);
}

#[test]
fn infer_rejects_malformed_tags() {
    for bad in ["", "abcdef-three", "abcdef-", "abcdef-0"] {
        let err = infer_block_size(1000, bad).unwrap_err();
        assert!(matches!(err, EtagError::InvalidInput(_)), "tag {bad:?}");
    }
}
