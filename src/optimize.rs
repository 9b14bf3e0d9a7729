use crate::config::{IngestConfig, OutputFormat};
use crate::{IngestError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::{DynamicImage, ExtendedColorType, GenericImageView, ImageEncoder};

const JPEG_QUALITY: u8 = 85;
const WEBP_QUALITY: f32 = 85.0;

/// Dimensions read off a successful decode; used only to enforce the
/// pixel ceiling, not retained afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageMeta {
    pub width: u32,
    pub height: u32,
}

/// The optimizer's product: a freshly encoded buffer in one of the
/// normalized output formats, ready for upload.
#[derive(Debug)]
pub struct OptimizedImage {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
}

/// Decodes the fetched bytes and enforces the dimension invariants.
///
/// Corrupt or non-image bytes fail with `InvalidImage`; a decode whose
/// dimensions come back zero fails the same way. Width or height above
/// `max_dimension` fails with `ImageTooLarge` — a distinct condition
/// from the byte-size cap the fetcher already enforced.
pub fn decode_and_validate(bytes: &[u8], cfg: &IngestConfig) -> Result<(DynamicImage, ImageMeta)> {
    let format = image::guess_format(bytes)
        .map_err(|e| IngestError::InvalidImage(format!("Unrecognized image data: {}", e)))?;

    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| IngestError::InvalidImage(format!("Failed to decode image: {}", e)))?;

    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(IngestError::InvalidImage(
            "Could not determine image dimensions".into(),
        ));
    }

    if width > cfg.max_dimension || height > cfg.max_dimension {
        return Err(IngestError::ImageTooLarge {
            width,
            height,
            max: cfg.max_dimension,
        });
    }

    Ok((img, ImageMeta { width, height }))
}

/// Resizes oversized images and re-encodes to a web-friendly format.
///
/// Width above `max_output_width` is scaled down to it preserving aspect
/// ratio; smaller images are never enlarged. Output format is driven by
/// the content type the server *declared* during fetch, not re-detected
/// from the decoded pixels: PNG stays PNG at maximum lossless effort,
/// WebP stays WebP at q85, everything else becomes JPEG q85.
pub fn optimize(
    img: DynamicImage,
    declared_content_type: &str,
    cfg: &IngestConfig,
) -> Result<OptimizedImage> {
    let img = resize_to_fit(img, cfg.max_output_width);
    let format = select_output_format(declared_content_type);
    let bytes = encode(&img, format)?;

    tracing::debug!(
        format = %format,
        bytes = bytes.len(),
        width = img.width(),
        "Optimized image"
    );

    Ok(OptimizedImage { bytes, format })
}

/// Scales the image down to `max_width` if it is wider, keeping aspect
/// ratio. A no-op for images already within bounds.
pub fn resize_to_fit(img: DynamicImage, max_width: u32) -> DynamicImage {
    let (w, h) = img.dimensions();
    if w <= max_width {
        return img;
    }
    let target_h = ((h as f32) * (max_width as f32) / (w as f32)).round().max(1.0) as u32;
    // Lanczos3 provides best quality for downsampling
    img.resize_exact(max_width, target_h, image::imageops::FilterType::Lanczos3)
}

/// Output format keyed on the declared content type from the fetch stage.
pub fn select_output_format(declared_content_type: &str) -> OutputFormat {
    let essence = declared_content_type
        .parse::<mime::Mime>()
        .map(|m| m.essence_str().to_ascii_lowercase())
        .unwrap_or_else(|_| declared_content_type.trim().to_ascii_lowercase());

    match essence.as_str() {
        "image/png" => OutputFormat::Png,
        "image/webp" => OutputFormat::Webp,
        _ => OutputFormat::Jpeg,
    }
}

fn encode(img: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>> {
    let mut out = Vec::new();

    match format {
        OutputFormat::Jpeg => {
            let rgb = img.to_rgb8();
            let (w, h) = rgb.dimensions();
            let enc = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
            enc.write_image(rgb.as_raw(), w, h, ExtendedColorType::Rgb8)
                .map_err(|e| IngestError::Optimize(e.to_string()))?;
        }
        OutputFormat::Png => {
            let rgba = img.to_rgba8();
            let (w, h) = rgba.dimensions();
            let enc =
                PngEncoder::new_with_quality(&mut out, CompressionType::Best, PngFilterType::Adaptive);
            enc.write_image(rgba.as_raw(), w, h, ExtendedColorType::Rgba8)
                .map_err(|e| IngestError::Optimize(e.to_string()))?;
        }
        OutputFormat::Webp => {
            let rgb = img.to_rgb8();
            let (w, h) = rgb.dimensions();
            let encoder = webp::Encoder::from_rgb(rgb.as_raw(), w, h);
            let encoded = encoder.encode(WEBP_QUALITY);
            out.extend_from_slice(&encoded);
        }
    }

    Ok(out)
}
