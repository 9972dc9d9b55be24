//! Conditional request evaluation
//!
//! Decides whether a client's cached copy is still fresh given the entry's
//! validators, following the usual `If-None-Match` / `If-Modified-Since`
//! precedence.

use static_cache_http::HeaderMap;
use static_cache_http::header::{CACHE_CONTROL, IF_MODIFIED_SINCE, IF_NONE_MATCH};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Formats a timestamp as an HTTP date.
///
/// Times before the Unix epoch are clamped to it.
///
/// # Examples
///
/// ```rust
/// use static_cache_core::conditional::http_date;
/// use std::time::{Duration, UNIX_EPOCH};
///
/// let time = UNIX_EPOCH + Duration::from_secs(784_111_777);
/// assert_eq!(http_date(time), "Sun, 06 Nov 1994 08:49:37 GMT");
/// ```
pub fn http_date(time: SystemTime) -> String {
	httpdate::fmt_http_date(truncate_to_secs(time))
}

/// Drops sub-second precision, the resolution of HTTP dates
fn truncate_to_secs(time: SystemTime) -> SystemTime {
	let secs = time
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_secs())
		.unwrap_or(0);
	UNIX_EPOCH + Duration::from_secs(secs)
}

/// Splits a comma-separated header into trimmed, non-empty tokens
fn parse_token_list(value: &str) -> impl Iterator<Item = &str> {
	value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Returns `true` if the request carries `Cache-Control: no-cache`
fn has_no_cache(headers: &HeaderMap) -> bool {
	headers
		.get_all(CACHE_CONTROL)
		.iter()
		.filter_map(|v| v.to_str().ok())
		.any(|v| parse_token_list(v).any(|d| d.eq_ignore_ascii_case("no-cache")))
}

/// Compares ETags, ignoring a weak `W/` prefix on either side
fn etag_matches(candidate: &str, etag: &str) -> bool {
	let strip = |tag: &str| tag.strip_prefix("W/").unwrap_or(tag).to_string();
	candidate == etag || strip(candidate) == strip(etag)
}

/// Returns `true` if the client's cached representation is still fresh.
///
/// - Without `If-None-Match` and `If-Modified-Since` nothing is fresh.
/// - `Cache-Control: no-cache` in the request forces a full response.
/// - `If-None-Match` (other than `*`) needs a matching `etag`.
/// - `If-Modified-Since` needs `last_modified` at or before the given date,
///   compared at one-second resolution. Unparseable dates are never fresh.
///
/// Both validators must pass when both are present.
///
/// # Examples
///
/// ```rust
/// use static_cache_core::conditional::is_fresh;
/// use static_cache_http::HeaderMap;
/// use static_cache_http::header::IF_NONE_MATCH;
/// use std::time::SystemTime;
///
/// let mut headers = HeaderMap::new();
/// headers.insert(IF_NONE_MATCH, "\"abc\"".parse().unwrap());
/// assert!(is_fresh(&headers, Some("\"abc\""), SystemTime::now()));
/// assert!(!is_fresh(&headers, Some("\"xyz\""), SystemTime::now()));
/// ```
pub fn is_fresh(headers: &HeaderMap, etag: Option<&str>, last_modified: SystemTime) -> bool {
	let none_match: Vec<&str> = headers
		.get_all(IF_NONE_MATCH)
		.iter()
		.filter_map(|v| v.to_str().ok())
		.flat_map(parse_token_list)
		.collect();
	let modified_since = headers
		.get(IF_MODIFIED_SINCE)
		.and_then(|v| v.to_str().ok());

	if none_match.is_empty() && modified_since.is_none() {
		return false;
	}
	if has_no_cache(headers) {
		return false;
	}

	if !none_match.is_empty() && !none_match.contains(&"*") {
		let Some(etag) = etag else {
			return false;
		};
		if !none_match.iter().any(|candidate| etag_matches(candidate, etag)) {
			return false;
		}
	}

	if let Some(since) = modified_since {
		let Ok(since) = httpdate::parse_http_date(since) else {
			return false;
		};
		if truncate_to_secs(last_modified) > since {
			return false;
		}
	}

	true
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use static_cache_http::header::HeaderValue;

	const ETAG: &str = "\"DMF1ucDxtqgxw5niaXcmYQ==\"";

	fn mtime() -> SystemTime {
		UNIX_EPOCH + Duration::from_millis(1_700_000_000_250)
	}

	fn request_headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
		let mut map = HeaderMap::new();
		for (name, value) in pairs {
			map.append(*name, HeaderValue::from_str(value).unwrap());
		}
		map
	}

	#[rstest]
	fn test_no_validators_is_stale() {
		assert!(!is_fresh(&HeaderMap::new(), Some(ETAG), mtime()));
	}

	#[rstest]
	#[case(ETAG, true)]
	#[case("\"other\"", false)]
	#[case("\"other\", \"DMF1ucDxtqgxw5niaXcmYQ==\"", true)]
	#[case("W/\"DMF1ucDxtqgxw5niaXcmYQ==\"", true)]
	#[case("*", true)]
	fn test_if_none_match(#[case] value: &str, #[case] expected: bool) {
		let headers = request_headers(&[("if-none-match", value)]);
		assert_eq!(is_fresh(&headers, Some(ETAG), mtime()), expected);
	}

	#[rstest]
	fn test_if_none_match_without_etag() {
		let headers = request_headers(&[("if-none-match", ETAG)]);
		assert!(!is_fresh(&headers, None, mtime()));

		let wildcard = request_headers(&[("if-none-match", "*")]);
		assert!(is_fresh(&wildcard, None, mtime()));
	}

	#[rstest]
	fn test_if_modified_since_second_resolution() {
		// mtime carries 250ms; the HTTP date of the same second is still fresh
		let same_second = http_date(mtime());
		let headers = request_headers(&[("if-modified-since", same_second.as_str())]);
		assert!(is_fresh(&headers, None, mtime()));
	}

	#[rstest]
	fn test_if_modified_since_older_date_is_stale() {
		let earlier = http_date(mtime() - Duration::from_secs(60));
		let headers = request_headers(&[("if-modified-since", earlier.as_str())]);
		assert!(!is_fresh(&headers, Some(ETAG), mtime()));
	}

	#[rstest]
	fn test_if_modified_since_invalid_date() {
		let headers = request_headers(&[("if-modified-since", "yesterday-ish")]);
		assert!(!is_fresh(&headers, Some(ETAG), mtime()));
	}

	#[rstest]
	#[case("no-cache")]
	#[case("max-age=0, no-cache")]
	#[case("No-Cache")]
	fn test_no_cache_forces_stale(#[case] cache_control: &str) {
		let headers = request_headers(&[("if-none-match", ETAG), ("cache-control", cache_control)]);
		assert!(!is_fresh(&headers, Some(ETAG), mtime()));
	}

	#[rstest]
	fn test_max_age_zero_is_not_no_cache() {
		let headers = request_headers(&[("if-none-match", ETAG), ("cache-control", "max-age=0")]);
		assert!(is_fresh(&headers, Some(ETAG), mtime()));
	}

	#[rstest]
	fn test_both_validators_must_pass() {
		let later = http_date(mtime() + Duration::from_secs(60));
		let earlier = http_date(mtime() - Duration::from_secs(60));

		let fresh = request_headers(&[("if-none-match", ETAG), ("if-modified-since", later.as_str())]);
		assert!(is_fresh(&fresh, Some(ETAG), mtime()));

		let stale_date = request_headers(&[("if-none-match", ETAG), ("if-modified-since", earlier.as_str())]);
		assert!(!is_fresh(&stale_date, Some(ETAG), mtime()));

		let stale_tag = request_headers(&[("if-none-match", "\"x\""), ("if-modified-since", later.as_str())]);
		assert!(!is_fresh(&stale_tag, Some(ETAG), mtime()));
	}

	#[rstest]
	fn test_http_date_clamps_before_epoch() {
		let before = UNIX_EPOCH - Duration::from_secs(10);
		assert_eq!(http_date(before), "Thu, 01 Jan 1970 00:00:00 GMT");
	}
}
