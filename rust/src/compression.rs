//! Node payload compression.
//!
//! The list only needs a byte-to-byte codec that may decline to compress.
//! [`Lz4Compressor`] is the default; callers can plug in their own codec
//! through [`Compressor`].

use crate::error::{QuickListError, QuickListResult};

/// Payloads smaller than this are never worth compressing.
pub const MIN_COMPRESS_BYTES: usize = 48;

/// Compressed output must save at least this many bytes to be kept.
pub const MIN_COMPRESS_IMPROVE: usize = 8;

/// Byte codec used for cold nodes.
pub trait Compressor {
    /// Compress `data`, or return `None` when the result would not be worth keeping.
    fn compress(&self, data: &[u8]) -> Option<Vec<u8>>;

    /// Invert [`Compressor::compress`]. `original_size` is the length of the input
    /// that produced `data`.
    fn decompress(&self, data: &[u8], original_size: usize) -> QuickListResult<Vec<u8>>;
}

/// LZ4 block compressor (fast mode, no size prefix; the node keeps the original size).
#[derive(Debug, Clone, Copy, Default)]
pub struct Lz4Compressor;

impl Compressor for Lz4Compressor {
    fn compress(&self, data: &[u8]) -> Option<Vec<u8>> {
        if data.len() < MIN_COMPRESS_BYTES {
            return None;
        }
        let compressed =
            lz4::block::compress(data, Some(lz4::block::CompressionMode::FAST(1)), false).ok()?;
        (compressed.len() + MIN_COMPRESS_IMPROVE <= data.len()).then_some(compressed)
    }

    fn decompress(&self, data: &[u8], original_size: usize) -> QuickListResult<Vec<u8>> {
        let size = i32::try_from(original_size)
            .map_err(|_| QuickListError::compression("lz4 decompress", "size exceeds i32"))?;
        let decompressed = lz4::block::decompress(data, Some(size))
            .map_err(|e| QuickListError::compression("lz4 decompress", &e.to_string()))?;
        if decompressed.len() != original_size {
            return Err(QuickListError::compression(
                "lz4 decompress",
                &format!("expected {} bytes, got {}", original_size, decompressed.len()),
            ));
        }
        Ok(decompressed)
    }
}
