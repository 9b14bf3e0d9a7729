use std::time::Duration;
use thiserror::Error;

/// Formats the optimizer is allowed to emit. Every input is normalized to
/// one of these on output, regardless of what the source encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
    Webp,
}

impl OutputFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Webp => "image/webp",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Jpeg => write!(f, "jpeg"),
            OutputFormat::Png => write!(f, "png"),
            OutputFormat::Webp => write!(f, "webp"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Image-host upload endpoint (per-deployment).
    pub upload_endpoint: String,
    /// Image-host destroy endpoint for best-effort deletion.
    pub delete_endpoint: String,
    /// Unsigned upload preset identifier sent with every upload.
    pub upload_preset: String,
    /// Root folder in the host's namespace; uploads land under
    /// `{base_folder}/products/{id}`.
    pub base_folder: String,
    /// Hostname identifying URLs previously issued by the image host.
    pub host_domain: String,
    /// Hard ceiling on downloaded bytes, enforced during transfer.
    pub max_download_bytes: usize,
    /// Hard ceiling on either decoded dimension, in pixels.
    pub max_dimension: u32,
    /// Images wider than this are scaled down to it; narrower ones are left alone.
    pub max_output_width: u32,
    pub fetch_timeout: Duration,
    pub upload_timeout: Duration,
    pub user_agent: String,
    /// Bearer tokens granted the admin role by the static auth provider.
    pub admin_tokens: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            upload_endpoint: String::new(),
            delete_endpoint: String::new(),
            upload_preset: "unsigned_products".into(),
            base_folder: "venkat-express".into(),
            host_domain: "res.cloudinary.com".into(),
            max_download_bytes: 10 * 1024 * 1024,
            max_dimension: 5000,
            max_output_width: 1920,
            fetch_timeout: Duration::from_secs(30),
            upload_timeout: Duration::from_secs(60),
            user_agent: concat!("imageingest/", env!("CARGO_PKG_VERSION")).into(),
            admin_tokens: Vec::new(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Upload endpoint cannot be empty")] EmptyUploadEndpoint,
    #[error("Upload preset cannot be empty")] EmptyUploadPreset,
    #[error("Max download size must be > 0")] InvalidMaxDownload,
    #[error("Max dimension must be > 0")] InvalidMaxDimension,
}

impl IngestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upload_endpoint.trim().is_empty() { return Err(ConfigError::EmptyUploadEndpoint); }
        if self.upload_preset.trim().is_empty() { return Err(ConfigError::EmptyUploadPreset); }
        if self.max_download_bytes == 0 { return Err(ConfigError::InvalidMaxDownload); }
        if self.max_dimension == 0 { return Err(ConfigError::InvalidMaxDimension); }
        Ok(())
    }

    /// Folder path for an upload, keyed by the associated product when known.
    pub fn folder_for(&self, entity_id: Option<&str>) -> String {
        match entity_id {
            Some(id) if !id.trim().is_empty() => format!("{}/products/{}", self.base_folder, id),
            _ => format!("{}/products/temp", self.base_folder),
        }
    }
}
