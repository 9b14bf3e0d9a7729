use crate::{IngestError, Result};
use url::Url;

/// File extensions that mark a URL as an image without further heuristics.
/// Covers common raster/vector formats plus the RAW types suppliers send.
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "svg", "tiff", "tif", "avif",
    "heic", "heif", "ico", "raw", "cr2", "nef",
];

/// Hosts that serve images regardless of how their paths look.
/// Matched exactly or as any subdomain.
const IMAGE_HOSTS: &[&str] = &[
    "images.unsplash.com",
    "unsplash.com",
    "imgur.com",
    "cloudinary.com",
    "pexels.com",
    "pixabay.com",
    "staticflickr.com",
    "flickr.com",
    "googleusercontent.com",
    "amazonaws.com",
];

/// Substrings in the path or query that suggest an image resource.
const IMAGE_HINTS: &[&str] = &["image", "photo", "pic"];

/// Validates a candidate image URL before any network access.
///
/// Rules apply in order and short-circuit on the first failure:
/// 1. non-empty after trimming whitespace
/// 2. parses as an absolute `http`/`https` URL
/// 3. plausibly references an image: known extension, known host, or an
///    "image"/"photo"/"pic" hint in the path or query
///
/// Pure and deterministic; the same input always yields the same result.
pub fn validate_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(IngestError::InvalidUrl("Image URL cannot be empty".into()));
    }

    let url = Url::parse(trimmed).map_err(|_| {
        IngestError::InvalidUrl(
            "Invalid URL format: must be an absolute http(s) URL".into(),
        )
    })?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(IngestError::InvalidUrl(format!(
                "Invalid URL format: unsupported scheme '{}'",
                other
            )));
        }
    }

    if !looks_like_image(&url) {
        return Err(IngestError::InvalidUrl(
            "URL does not appear to reference an image".into(),
        ));
    }

    Ok(url)
}

fn looks_like_image(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();

    if let Some(ext) = path.rsplit('.').next() {
        // rsplit always yields at least one element; require a real dot
        if path.contains('.') && IMAGE_EXTENSIONS.contains(&ext) {
            return true;
        }
    }

    if let Some(host) = url.host_str() {
        let host = host.to_ascii_lowercase();
        if IMAGE_HOSTS
            .iter()
            .any(|h| host == *h || host.ends_with(&format!(".{}", h)))
        {
            return true;
        }
    }

    let query = url.query().unwrap_or("").to_ascii_lowercase();
    IMAGE_HINTS
        .iter()
        .any(|hint| path.contains(hint) || query.contains(hint))
}
