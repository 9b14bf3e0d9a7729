use crate::config::{IngestConfig, OutputFormat};
use crate::{IngestError, Result};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::sync::Arc;

/// Auto-optimization directive attached to every upload so the host
/// serves quality- and format-negotiated variants.
const AUTO_TRANSFORMATION: &str = "q_auto,f_auto";

/// Client for the third-party image host. Holds only configuration and
/// the shared HTTP client; safe to clone and share across invocations.
#[derive(Clone)]
pub struct ImageHost {
    client: Client,
    cfg: Arc<IngestConfig>,
}

impl ImageHost {
    pub fn new(client: Client, cfg: Arc<IngestConfig>) -> Self {
        Self { client, cfg }
    }

    /// Pushes optimized bytes to the image host and returns the public URL.
    ///
    /// Builds an unsigned multipart upload: the file bytes, the preset
    /// identifier, a folder derived from the associated product id (or a
    /// temp folder when none is given), and the auto-optimization
    /// directive. Single attempt with a hard timeout; any failure
    /// surfaces as `Upload`, preferring the provider's own error message
    /// when the response carries one.
    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        format: OutputFormat,
        entity_id: Option<&str>,
    ) -> Result<String> {
        let folder = self.cfg.folder_for(entity_id);

        let file_part = Part::bytes(bytes)
            .file_name(format!("upload.{}", format))
            .mime_str(format.content_type())
            .map_err(|e| IngestError::Upload(e.to_string()))?;

        let form = Form::new()
            .part("file", file_part)
            .text("upload_preset", self.cfg.upload_preset.clone())
            .text("folder", folder.clone())
            .text("transformation", AUTO_TRANSFORMATION);

        let resp = self
            .client
            .post(&self.cfg.upload_endpoint)
            .timeout(self.cfg.upload_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    IngestError::Timeout("Timed out while uploading the image.".into())
                } else {
                    IngestError::Upload(e.to_string())
                }
            })?;

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| IngestError::Upload(format!("Unreadable response from image host: {}", e)))?;

        if !status.is_success() {
            return Err(IngestError::Upload(provider_message(&body, status)));
        }

        match body.get("secure_url").and_then(|v| v.as_str()) {
            Some(url) => {
                tracing::info!(folder = %folder, url = %url, "Uploaded image");
                Ok(url.to_string())
            }
            None => Err(IngestError::Upload("Invalid response from image host".into())),
        }
    }

    /// Best-effort destroy of a previously issued public URL.
    ///
    /// Never fails the caller: an unparseable URL shape or a provider
    /// error is logged and reported as `false`. Deleting a stale image
    /// must never block the operation that triggered it.
    pub async fn delete_by_url(&self, url: &str) -> bool {
        let Some(public_id) = extract_public_id(url) else {
            tracing::warn!(url = %url, "Could not extract public id from URL, skipping delete");
            return false;
        };

        let result = self
            .client
            .post(&self.cfg.delete_endpoint)
            .timeout(self.cfg.upload_timeout)
            .form(&[("public_id", public_id.as_str())])
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                let ok = resp
                    .json::<serde_json::Value>()
                    .await
                    .ok()
                    .and_then(|v| v.get("result").and_then(|r| r.as_str()).map(String::from))
                    .map(|r| r == "ok")
                    .unwrap_or(false);
                if !ok {
                    tracing::warn!(public_id = %public_id, "Image host declined delete");
                }
                ok
            }
            Ok(resp) => {
                tracing::warn!(public_id = %public_id, status = %resp.status(), "Delete request failed");
                false
            }
            Err(e) => {
                tracing::warn!(public_id = %public_id, error = %e, "Delete request errored");
                false
            }
        }
    }

    /// True when the URL belongs to this deployment's image host.
    pub fn owns_url(&self, url: &str) -> bool {
        url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
            .map(|host| {
                let domain = self.cfg.host_domain.to_ascii_lowercase();
                host == domain || host.ends_with(&format!(".{}", domain))
            })
            .unwrap_or(false)
    }
}

/// Prefers the provider's nested error message when the response body
/// carries one, else falls back to a generic message with the HTTP status.
fn provider_message(body: &serde_json::Value, status: reqwest::StatusCode) -> String {
    body.pointer("/error/message")
        .and_then(|m| m.as_str())
        .map(String::from)
        .unwrap_or_else(|| format!("Image host returned status {}", status))
}

/// Recovers the opaque public id from a previously issued delivery URL.
///
/// The host guarantees a path of the shape
/// `.../upload/v<digits>/<folder...>/<name>.<ext>`; this takes everything
/// after the `/upload/` marker, drops the version segment when present,
/// and strips the final extension. The version segment may be absent, in
/// which case the whole tail is the public id. A URL with no `/upload/`
/// marker does not belong to the host and yields `None`.
pub fn extract_public_id(url: &str) -> Option<String> {
    let (_, tail) = url.split_once("/upload/")?;
    let tail = tail.split(['?', '#']).next().unwrap_or(tail);

    let mut segments: Vec<&str> = tail.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return None;
    }

    if is_version_segment(segments[0]) {
        segments.remove(0);
    }
    if segments.is_empty() {
        return None;
    }

    let last = segments.len() - 1;
    let stripped = match segments[last].rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => segments[last],
    };
    segments[last] = stripped;

    Some(segments.join("/"))
}

fn is_version_segment(s: &str) -> bool {
    s.len() > 1 && s.starts_with('v') && s[1..].chars().all(|c| c.is_ascii_digit())
}
