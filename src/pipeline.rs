use crate::config::IngestConfig;
use crate::fetch::{build_client, fetch_image};
use crate::optimize::{decode_and_validate, optimize};
use crate::upload::ImageHost;
use crate::validate::validate_url;
use crate::{IngestError, Result};
use std::sync::Arc;

/// One ingestion request, created per invocation and immutable.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub source_url: String,
    pub entity_id: Option<String>,
    pub is_primary: bool,
}

/// The ingestion pipeline: validate -> fetch -> decode -> optimize -> upload.
///
/// Holds only configuration and shared clients; every call is
/// independent and stateless with respect to other calls, so a single
/// instance serves concurrent invocations without coordination.
#[derive(Clone)]
pub struct Ingestor {
    cfg: Arc<IngestConfig>,
    client: reqwest::Client,
    host: ImageHost,
}

impl Ingestor {
    pub fn new(cfg: Arc<IngestConfig>) -> Result<Self> {
        let client = build_client(&cfg)?;
        let host = ImageHost::new(client.clone(), cfg.clone());
        Ok(Self { cfg, client, host })
    }

    pub fn host(&self) -> &ImageHost {
        &self.host
    }

    /// Runs the stages strictly in order; the first failure aborts the
    /// invocation and nothing partial is uploaded or kept. Decode and
    /// re-encode run on the blocking pool so CPU work never stalls the
    /// runtime. There is no retry at any stage; dropping the returned
    /// future cancels the invocation at its next await point, before any
    /// bytes have reached the image host.
    pub async fn ingest(&self, req: IngestRequest) -> Result<String> {
        tracing::info!(
            url = %req.source_url,
            entity = ?req.entity_id,
            primary = req.is_primary,
            "Ingesting image"
        );

        let url = validate_url(&req.source_url)?;

        let fetched = fetch_image(&self.client, &url, &self.cfg).await?;
        let declared = fetched.declared_content_type.clone();

        let cfg = self.cfg.clone();
        let optimized = tokio::task::spawn_blocking(move || {
            let (img, meta) = decode_and_validate(&fetched.bytes, &cfg)?;
            tracing::debug!(width = meta.width, height = meta.height, "Decoded image");
            optimize(img, &declared, &cfg)
        })
        .await
        .map_err(|e| IngestError::Optimize(format!("Image processing task failed: {}", e)))??;

        self.host
            .upload(optimized.bytes, optimized.format, req.entity_id.as_deref())
            .await
    }
}
