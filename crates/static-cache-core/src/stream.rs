//! File body streams

use crate::entry::SharedEntry;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt, stream};
use md5::{Digest, Md5};
use static_cache_http::{BoxError, StreamBody};
use std::time::SystemTime;
use tokio_util::io::ReaderStream;
use tracing::trace;

/// Streams an open file in chunks
pub fn file_stream(file: tokio::fs::File) -> StreamBody {
	Box::pin(ReaderStream::new(file).map_err(|e| Box::new(e) as BoxError))
}

struct HashingState {
	inner: StreamBody,
	hasher: Option<Md5>,
	entry: SharedEntry,
	observed: SystemTime,
}

/// Passes `inner` through unchanged while computing its MD5.
///
/// When the stream ends cleanly the base64 digest is stored as the entry's
/// `content_hash`, unless the entry's `last_modified` no longer equals
/// `observed` (the file was reloaded while streaming). A failed stream records
/// nothing.
pub fn hashing_stream(inner: StreamBody, entry: SharedEntry, observed: SystemTime) -> StreamBody {
	let state = HashingState {
		inner,
		hasher: Some(Md5::new()),
		entry,
		observed,
	};

	Box::pin(stream::unfold(state, |mut state| async move {
		let hasher = state.hasher.as_mut()?;
		match state.inner.next().await {
			Some(Ok(chunk)) => {
				hasher.update(&chunk);
				Some((Ok::<Bytes, BoxError>(chunk), state))
			}
			Some(Err(error)) => {
				state.hasher = None;
				Some((Err(error), state))
			}
			None => {
				let digest = state.hasher.take()?.finalize();
				let mut file = state.entry.write();
				if file.last_modified == state.observed {
					file.content_hash = Some(STANDARD.encode(digest));
				} else {
					trace!(path = %file.path.display(), "discarding hash of a stale stream");
				}
				None
			}
		}
	}))
}
