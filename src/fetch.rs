use crate::config::IngestConfig;
use crate::{IngestError, Result};
use bytes::BytesMut;
use futures::StreamExt;
use reqwest::Client;
use url::Url;

/// Declared MIME types accepted without an `image/` prefix check.
/// Anything else with an `image/` prefix is also allowed through; the
/// decoder is the real gate for whether the bytes are usable.
const ACCEPTED_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/bmp",
    "image/svg+xml",
    "image/tiff",
    "image/avif",
];

/// Raw bytes retrieved from the source URL plus what the server claimed
/// they are. Owned by a single pipeline invocation and dropped once the
/// optimizer produces its own buffer.
#[derive(Debug)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub declared_content_type: String,
}

impl FetchedImage {
    pub fn byte_length(&self) -> usize {
        self.bytes.len()
    }
}

/// Builds the shared HTTP client used by both network stages.
pub fn build_client(cfg: &IngestConfig) -> Result<Client> {
    Client::builder()
        .user_agent(cfg.user_agent.clone())
        .build()
        .map_err(|e| IngestError::Fetch(e.to_string()))
}

/// Retrieves the URL content with a bounded size and bounded time.
///
/// Single GET, no retries: a failed attempt is terminal for the whole
/// pipeline. The size cap is checked against `Content-Length` before the
/// body is read and again chunk-by-chunk while streaming, so a server
/// that lies about its length still cannot exceed the ceiling.
///
/// Transport failures map onto the closed error taxonomy:
/// connect/DNS failure -> `HostUnreachable`, HTTP 404 -> `NotFound`,
/// HTTP 403 -> `AccessDenied`, timeout -> `Timeout`, anything else ->
/// `Fetch` wrapping the original message. A downloaded body whose
/// declared content type is not an accepted image type fails with
/// `UnsupportedFormat` without any decode attempt.
pub async fn fetch_image(client: &Client, url: &Url, cfg: &IngestConfig) -> Result<FetchedImage> {
    let resp = client
        .get(url.clone())
        .timeout(cfg.fetch_timeout)
        .send()
        .await
        .map_err(classify_transport)?;

    let status = resp.status();
    if !status.is_success() {
        return Err(match status.as_u16() {
            404 => IngestError::NotFound(
                "Image not found at the provided URL (404 error).".into(),
            ),
            403 => IngestError::AccessDenied(
                "Access to the image was denied by the remote server (403 error).".into(),
            ),
            _ => IngestError::Fetch(format!("Upstream status: {}", status)),
        });
    }

    let declared = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !is_accepted_content_type(&declared) {
        return Err(IngestError::UnsupportedFormat(format!(
            "Unsupported content type '{}': URL does not serve a supported image format",
            declared
        )));
    }

    // Pre-flight check; streaming below is the authoritative enforcement
    if let Some(len) = resp.content_length() {
        if len as usize > cfg.max_download_bytes {
            return Err(too_large_transfer(cfg.max_download_bytes));
        }
    }

    let mut buf = BytesMut::with_capacity(8192);
    let mut stream = resp.bytes_stream();

    while let Some(chunk) = stream.next().await.transpose().map_err(classify_transport)? {
        if buf.len() + chunk.len() > cfg.max_download_bytes {
            return Err(too_large_transfer(cfg.max_download_bytes));
        }
        buf.extend_from_slice(&chunk);
    }

    tracing::debug!(
        bytes = buf.len(),
        content_type = %declared,
        "Fetched source image"
    );

    Ok(FetchedImage {
        bytes: buf.to_vec(),
        declared_content_type: declared,
    })
}

fn too_large_transfer(cap: usize) -> IngestError {
    IngestError::Fetch(format!(
        "Image download exceeds the {} MiB size limit",
        cap / (1024 * 1024)
    ))
}

/// Accepts the fixed allow-list or any `image/` subtype. The MIME header
/// may carry parameters (`image/png; charset=...`), so only the essence
/// is compared when it parses.
pub fn is_accepted_content_type(declared: &str) -> bool {
    let essence = declared
        .parse::<mime::Mime>()
        .map(|m| m.essence_str().to_ascii_lowercase())
        .unwrap_or_else(|_| declared.trim().to_ascii_lowercase());

    ACCEPTED_TYPES.contains(&essence.as_str()) || essence.starts_with("image/")
}

fn classify_transport(e: reqwest::Error) -> IngestError {
    if e.is_timeout() {
        IngestError::Timeout("Timed out while downloading the image.".into())
    } else if e.is_connect() {
        IngestError::HostUnreachable(
            "Could not reach the host serving the image URL.".into(),
        )
    } else {
        IngestError::Fetch(e.to_string())
    }
}
