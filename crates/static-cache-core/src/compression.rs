//! Gzip encoding for buffered and streamed bodies
//!
//! Buffered contents are encoded in one pass on the blocking pool and the
//! result is cached on the entry. Streamed bodies are encoded chunk by chunk,
//! so a large file never has to be held in memory.

use crate::error::{Result, StaticCacheError};
use bytes::Bytes;
use flate2::Compression;
use flate2::read::GzEncoder;
use flate2::write::GzEncoder as GzWriter;
use futures::StreamExt;
use futures::stream;
use static_cache_http::{BoxError, StreamBody};
use std::io::{Read, Write};

/// Bodies of this many bytes or fewer are never compressed
pub const MIN_COMPRESS_SIZE: u64 = 1024;

/// Gzip-encodes `data` in memory.
///
/// # Errors
///
/// Returns [`StaticCacheError::Compression`] if the encoder fails.
pub fn gzip(data: &[u8]) -> Result<Bytes> {
	let mut encoder = GzEncoder::new(data, Compression::default());
	let mut compressed = Vec::new();
	encoder
		.read_to_end(&mut compressed)
		.map_err(|e| StaticCacheError::Compression(e.to_string()))?;
	Ok(Bytes::from(compressed))
}

/// Gzip-encodes `data` on tokio's blocking pool
///
/// # Errors
///
/// Fails if encoding fails or the blocking task is cancelled.
pub async fn gzip_blocking(data: Bytes) -> Result<Bytes> {
	tokio::task::spawn_blocking(move || gzip(&data)).await?
}

struct GzipStreamState {
	inner: StreamBody,
	encoder: Option<GzWriter<Vec<u8>>>,
}

/// Wraps a byte stream in an online gzip encoder.
///
/// Each input chunk is fed to the encoder and whatever compressed output is
/// ready gets emitted; the gzip trailer follows the last input chunk. An
/// error from the inner stream is forwarded and ends the stream.
pub fn gzip_stream(inner: StreamBody) -> StreamBody {
	let state = GzipStreamState {
		inner,
		encoder: Some(GzWriter::new(Vec::new(), Compression::default())),
	};

	Box::pin(stream::unfold(state, |mut state| async move {
		loop {
			let encoder = state.encoder.as_mut()?;
			match state.inner.next().await {
				Some(Ok(chunk)) => {
					if let Err(error) = encoder.write_all(&chunk) {
						state.encoder = None;
						return Some((Err(Box::new(error) as BoxError), state));
					}
					let ready = std::mem::take(encoder.get_mut());
					if !ready.is_empty() {
						return Some((Ok(Bytes::from(ready)), state));
					}
				}
				Some(Err(error)) => {
					state.encoder = None;
					return Some((Err(error), state));
				}
				None => {
					let encoder = state.encoder.take()?;
					let item = encoder
						.finish()
						.map(Bytes::from)
						.map_err(|e| Box::new(e) as BoxError);
					return Some((item, state));
				}
			}
		}
	}))
}
