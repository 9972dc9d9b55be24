//! Accept-Encoding negotiation and compressibility

/// Parsed Accept-Encoding entry with quality value
#[derive(Debug, Clone, PartialEq)]
struct AcceptEncoding {
	encoding: String,
	quality: f32,
}

impl AcceptEncoding {
	/// Parses an Accept-Encoding entry (e.g., "gzip;q=0.8" or "br")
	fn parse(s: &str) -> Option<Self> {
		let mut parts = s.trim().split(';');
		let encoding = parts.next()?.trim().to_lowercase();
		if encoding.is_empty() {
			return None;
		}

		let quality = parts
			.filter_map(|param| param.trim().strip_prefix("q="))
			.find_map(|q| q.trim().parse::<f32>().ok())
			.unwrap_or(1.0);

		Some(AcceptEncoding { encoding, quality })
	}
}

/// Returns `true` if the client's `Accept-Encoding` selects gzip.
///
/// A missing header accepts only the identity encoding. An explicit `gzip`
/// (or its `x-gzip` alias) entry decides on its own; otherwise a `*`
/// wildcard with a non-zero quality accepts gzip.
///
/// # Examples
///
/// ```rust
/// use static_cache_core::negotiation::accepts_gzip;
///
/// assert!(accepts_gzip(Some("gzip, deflate, br")));
/// assert!(accepts_gzip(Some("*")));
/// assert!(!accepts_gzip(Some("gzip;q=0, *")));
/// assert!(!accepts_gzip(None));
/// ```
pub fn accepts_gzip(accept_encoding: Option<&str>) -> bool {
	let Some(header) = accept_encoding else {
		return false;
	};

	let accepted: Vec<AcceptEncoding> = header.split(',').filter_map(AcceptEncoding::parse).collect();

	let explicit = accepted
		.iter()
		.filter(|a| a.encoding == "gzip" || a.encoding == "x-gzip")
		.map(|a| a.quality)
		.reduce(f32::max);
	if let Some(quality) = explicit {
		return quality > 0.0;
	}

	accepted
		.iter()
		.any(|a| a.encoding == "*" && a.quality > 0.0)
}

/// Returns `true` if a response of this content type benefits from gzip.
///
/// Parameters such as `charset` are ignored.
///
/// # Examples
///
/// ```rust
/// use static_cache_core::negotiation::is_compressible;
///
/// assert!(is_compressible("text/css; charset=utf-8"));
/// assert!(is_compressible("application/javascript"));
/// assert!(!is_compressible("image/png"));
/// ```
pub fn is_compressible(content_type: &str) -> bool {
	let essence = content_type
		.split(';')
		.next()
		.unwrap_or_default()
		.trim()
		.to_ascii_lowercase();
	let Some((kind, subtype)) = essence.split_once('/') else {
		return false;
	};

	if kind == "text" {
		return true;
	}
	if subtype.ends_with("+json") || subtype.ends_with("+xml") || subtype.ends_with("+text") {
		return true;
	}

	matches!(
		(kind, subtype),
		("application", "javascript")
			| ("application", "x-javascript")
			| ("application", "ecmascript")
			| ("application", "json")
			| ("application", "xml")
			| ("application", "wasm")
			| ("application", "x-sh")
			| ("application", "x-tar")
			| ("application", "toml")
			| ("application", "yaml")
			| ("application", "x-yaml")
			| ("application", "vnd.ms-fontobject")
			| ("application", "x-font-ttf")
			| ("font", "ttf")
			| ("font", "otf")
			| ("image", "svg+xml")
			| ("image", "x-icon")
			| ("image", "vnd.microsoft.icon")
			| ("image", "bmp")
	)
}
