//! Parallel S3-style multipart ETag computation and verification.
//!
//! Current behavior:
//! - Reproduces the S3 multipart ETag scheme: per-block MD5, combined MD5 over
//!   the concatenated block digests, `-<blockCount>` suffix for multipart.
//! - Compute: splits the file into block-aligned super-ranges, one worker
//!   thread per super-range, each with its own file handle; digests are merged
//!   back in range order, never arrival order.
//! - Verify: recovers the block size from the reference tag (doubling search
//!   from 1 MiB), recomputes, and compares case-insensitively.
//! - Sequential mode and single-block files hash on the calling thread and
//!   produce bit-identical tags to the parallel path.
//!
//! The reference tag is supplied as a string; nothing here talks to a network.

pub mod error;
pub mod hash;
pub mod plan;

pub use error::EtagError;
pub use plan::{infer_block_size, ByteRange};

use std::fs::File;
use std::path::Path;
use std::thread;

use crossbeam_channel::unbounded;

use hash::BlockDigest;

/// Read buffer per worker: 1 MiB, or the block size when smaller.
const READ_BUF_SIZE: u64 = 1 << 20;

/// Tuning for `compute_etag`.
pub struct EtagOptions {
    /// Upper bound on hashing threads; the plan never uses more workers than
    /// there are blocks.
    pub max_workers: usize,
    /// Force single-threaded, in-order reads (e.g. for sequential media).
    pub sequential: bool,
}

impl Default for EtagOptions {
    fn default() -> Self {
        Self {
            max_workers: num_cpus::get().saturating_sub(1).max(1),
            sequential: false,
        }
    }
}

/// Compute the ETag an S3-compatible store would assign to `path` when
/// uploaded with parts of `block_size` bytes.
///
/// The result matches `^[0-9a-f]{32}(-[0-9]+)?$`: plain hex for files that fit
/// in one block, `-<blockCount>`-suffixed for multipart.
pub fn compute_etag<P: AsRef<Path>>(
    path: P,
    block_size: u64,
    options: &EtagOptions,
) -> Result<String, EtagError> {
    let path = path.as_ref();
    if block_size == 0 {
        return Err(EtagError::InvalidInput(
            "block size must be positive".to_string(),
        ));
    }
    let file_len = std::fs::metadata(path)?.len();
    let workers = if options.sequential {
        1
    } else {
        options.max_workers.max(1)
    };
    let supers = plan::super_ranges(file_len, block_size, workers);
    log::debug!(
        "hashing {} ({} bytes, block size {}) on {} worker(s)",
        path.display(),
        file_len,
        block_size,
        supers.len()
    );

    let digests = if supers.len() == 1 {
        let mut file = File::open(path)?;
        hash_super_range(&mut file, supers[0], block_size)?
    } else {
        hash_parallel(path, &supers, block_size)?
    };
    Ok(hash::combine_digests(&digests))
}

/// Check `path` against a previously observed ETag.
///
/// The block size is inferred from the tag itself. Surrounding double quotes
/// (as returned in S3 response headers) are ignored, and the comparison is
/// case-insensitive. Computation errors propagate; a mismatch is `Ok(false)`.
pub fn verify_etag<P: AsRef<Path>>(path: P, reference: &str) -> Result<bool, EtagError> {
    let path = path.as_ref();
    let reference = reference.trim_matches('"');
    let file_len = std::fs::metadata(path)?.len();
    let block_size = plan::infer_block_size(file_len, reference)?;
    let computed = compute_etag(path, block_size, &EtagOptions::default())?;
    let matched = computed.eq_ignore_ascii_case(reference);
    if !matched {
        log::debug!(
            "etag mismatch for {}: computed {}, reference {}",
            path.display(),
            computed,
            reference
        );
    }
    Ok(matched)
}

/// Hash every block inside one super-range, in order, on the current thread.
fn hash_super_range(
    file: &mut File,
    range: ByteRange,
    block_size: u64,
) -> Result<Vec<BlockDigest>, EtagError> {
    let mut buf = vec![0u8; block_size.min(READ_BUF_SIZE) as usize];
    let blocks = plan::split_range(range, block_size);
    let mut digests = Vec::with_capacity(blocks.len());
    for block in blocks {
        digests.push(hash::hash_range(file, block, &mut buf)?);
    }
    Ok(digests)
}

/// Fan the super-ranges out across worker threads, one range per worker, and
/// merge the per-worker digest runs back in range order.
///
/// Each worker opens its own handle onto the file, so there is no shared
/// cursor and no locking. On failure every in-flight worker is allowed to
/// finish; the first failed range's error is returned wrapped as
/// `EtagError::Worker` (a panicked worker surfaces the same way) and no
/// partial digest list is ever surfaced.
pub fn hash_parallel(
    path: &Path,
    supers: &[ByteRange],
    block_size: u64,
) -> Result<Vec<BlockDigest>, EtagError> {
    let (tx, rx) = unbounded();
    let mut handles = Vec::with_capacity(supers.len());
    for (index, range) in supers.iter().copied().enumerate() {
        let tx = tx.clone();
        let path = path.to_path_buf();
        handles.push(thread::spawn(move || {
            let result = File::open(&path)
                .map_err(EtagError::from)
                .and_then(|mut file| hash_super_range(&mut file, range, block_size));
            // The receiver outlives every worker, so send cannot fail.
            tx.send((index, result)).expect("result channel closed");
        }));
    }
    drop(tx);

    // Slot results by range index; arrival order is meaningless.
    let mut slots: Vec<Option<Result<Vec<BlockDigest>, EtagError>>> =
        supers.iter().map(|_| None).collect();
    for (index, result) in rx {
        slots[index] = Some(result);
    }
    for handle in handles {
        // A panicking worker unwinds before it reports; its slot stays empty
        // and is surfaced as a Worker error below.
        let _ = handle.join();
    }
    log::debug!("joined {} hash worker(s)", supers.len());

    let mut digests = Vec::with_capacity(supers.len());
    for slot in slots {
        match slot {
            Some(Ok(mut part)) => digests.append(&mut part),
            Some(Err(e)) => return Err(EtagError::Worker(Box::new(e))),
            None => {
                return Err(EtagError::Worker(Box::new(EtagError::Io(
                    std::io::Error::other("hash worker panicked"),
                ))))
            }
        }
    }
    Ok(digests)
}
