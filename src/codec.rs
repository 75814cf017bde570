//! Compression codecs invoked once per entry.
//!
//! The archive engine never compresses by itself: the serializer hands each
//! entry's bytes to a [`Compressor`] (or an [`AsyncCompressor`] for the
//! asynchronous pass) and stores whatever comes back.

use std::io::{self, Read, Write};
use std::sync::Arc;

use async_trait::async_trait;
use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;

/// Upper bound for trusting a size hint when allocating output.
const MAX_PREALLOC: usize = 64 << 20;

/// Raw deflate in both directions.
pub trait Compressor {
    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>>;

    /// Inflate `data`; `size_hint` is the expected output length and may be wrong.
    fn decompress(&self, data: &[u8], size_hint: usize) -> io::Result<Vec<u8>>;
}

/// Suspending form of [`Compressor`].
#[async_trait]
pub trait AsyncCompressor: Send + Sync {
    async fn compress_async(&self, data: Vec<u8>) -> io::Result<Vec<u8>>;
}

/// Deflate codec backed by `flate2`.
#[derive(Debug, Clone, Copy)]
pub struct Deflater {
    level: Compression,
}

impl Deflater {
    pub fn new(level: Compression) -> Self {
        Self { level }
    }

    pub fn level(&self) -> Compression {
        self.level
    }
}

impl Default for Deflater {
    fn default() -> Self {
        Self::new(Compression::default())
    }
}

impl Compressor for Deflater {
    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        let mut encoder = DeflateEncoder::new(Vec::with_capacity(data.len() / 2), self.level);
        encoder.write_all(data)?;
        encoder.finish()
    }

    fn decompress(&self, data: &[u8], size_hint: usize) -> io::Result<Vec<u8>> {
        // Headers are untrusted, so the hint only seeds the allocation.
        let mut out = Vec::with_capacity(size_hint.min(MAX_PREALLOC));
        DeflateDecoder::new(data).read_to_end(&mut out)?;
        Ok(out)
    }
}

#[async_trait]
impl AsyncCompressor for Deflater {
    async fn compress_async(&self, data: Vec<u8>) -> io::Result<Vec<u8>> {
        let codec = *self;
        tokio::task::spawn_blocking(move || codec.compress(&data))
            .await
            .map_err(io::Error::other)?
    }
}

#[async_trait]
impl<C: AsyncCompressor + ?Sized> AsyncCompressor for Arc<C> {
    async fn compress_async(&self, data: Vec<u8>) -> io::Result<Vec<u8>> {
        (**self).compress_async(data).await
    }
}
