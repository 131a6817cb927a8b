//! MD5 block hashing and multipart digest combination.
//!
//! MD5 is what S3 derives ETags from; it is used here for wire compatibility,
//! not security. The multipart form is `hex(md5(concat(block_digests)))-count`,
//! so digest order is part of the hash input and must follow the byte-range
//! plan exactly.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use md5::{Digest, Md5};

use crate::error::EtagError;
use crate::plan::ByteRange;

/// Raw MD5 digest of one block.
pub type BlockDigest = [u8; 16];

/// Hash exactly the bytes of `range`, streaming through `buf` to bound memory.
/// Never reads past `range.end`; hitting EOF earlier than `range.end` is an
/// error, since correct planning sizes every range to the file.
pub fn hash_range(file: &mut File, range: ByteRange, buf: &mut [u8]) -> Result<BlockDigest, EtagError> {
    file.seek(SeekFrom::Start(range.start))?;
    let mut hasher = Md5::new();
    let mut remaining = range.len();
    while remaining > 0 {
        let want = remaining.min(buf.len() as u64) as usize;
        let n = file.read(&mut buf[..want])?;
        if n == 0 {
            return Err(EtagError::ShortRead {
                expected: range.len(),
                got: range.len() - remaining,
            });
        }
        hasher.update(&buf[..n]);
        remaining -= n as u64;
    }
    Ok(hasher.finalize().into())
}

/// Combine an ordered digest list into the final tag string.
///
/// A single digest means the object was not multipart: the tag is its plain
/// lowercase hex. Multiple digests are concatenated (raw bytes, plan order),
/// hashed once more, and suffixed with `-<count>`. Plans always carry at
/// least one block, so an empty list only arises from direct callers; it
/// degrades to the zero-byte digest rather than a nonsense `-0` tag.
pub fn combine_digests(digests: &[BlockDigest]) -> String {
    match digests {
        [] => hex::encode(Md5::digest(b"")),
        [single] => hex::encode(single),
        _ => {
            let mut hasher = Md5::new();
            for digest in digests {
                hasher.update(digest);
            }
            let combined: BlockDigest = hasher.finalize().into();
            format!("{}-{}", hex::encode(combined), digests.len())
        }
    }
}
