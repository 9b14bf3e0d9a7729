use imageingest::config::{IngestConfig, OutputFormat};
use imageingest::optimize::{decode_and_validate, optimize, resize_to_fit, select_output_format};
use imageingest::IngestError;

fn test_config() -> IngestConfig {
    IngestConfig {
        upload_endpoint: "http://127.0.0.1:1/upload".into(),
        ..IngestConfig::default()
    }
}

fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = image::DynamicImage::new_rgb8(w, h);
    let mut out = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

#[test]
fn decodes_valid_png() {
    let (_, meta) = decode_and_validate(&png_bytes(64, 48), &test_config()).unwrap();
    assert_eq!(meta.width, 64);
    assert_eq!(meta.height, 48);
}

#[test]
fn rejects_non_image_bytes() {
    let err = decode_and_validate(b"definitely not an image", &test_config()).unwrap_err();
    assert!(matches!(err, IngestError::InvalidImage(_)));
}

#[test]
fn rejects_truncated_image() {
    let mut bytes = png_bytes(64, 64);
    bytes.truncate(20); // keep magic bytes, corrupt the rest
    let err = decode_and_validate(&bytes, &test_config()).unwrap_err();
    assert!(matches!(err, IngestError::InvalidImage(_)));
}

#[test]
fn rejects_oversized_dimensions() {
    let err = decode_and_validate(&png_bytes(5001, 10), &test_config()).unwrap_err();
    match err {
        IngestError::ImageTooLarge { width, height, max } => {
            assert_eq!(width, 5001);
            assert_eq!(height, 10);
            assert_eq!(max, 5000);
        }
        other => panic!("expected ImageTooLarge, got {:?}", other),
    }
    assert!(matches!(
        decode_and_validate(&png_bytes(10, 5001), &test_config()).unwrap_err(),
        IngestError::ImageTooLarge { .. }
    ));
}

#[test]
fn boundary_dimension_passes() {
    assert!(decode_and_validate(&png_bytes(5000, 10), &test_config()).is_ok());
}

#[test]
fn never_upscales() {
    let img = image::DynamicImage::new_rgb8(800, 600);
    let out = resize_to_fit(img, 1920);
    assert_eq!(out.width(), 800);
    assert_eq!(out.height(), 600);
}

#[test]
fn downscales_preserving_aspect_ratio() {
    let img = image::DynamicImage::new_rgb8(2400, 1200);
    let out = resize_to_fit(img, 1920);
    assert_eq!(out.width(), 1920);
    assert_eq!(out.height(), 960);

    // aspect within rounding for a non-exact ratio
    let img = image::DynamicImage::new_rgb8(3000, 1999);
    let out = resize_to_fit(img, 1920);
    assert_eq!(out.width(), 1920);
    let expected = (1999.0_f32 * 1920.0 / 3000.0).round() as u32;
    assert_eq!(out.height(), expected);
}

#[test]
fn width_at_limit_is_untouched() {
    let img = image::DynamicImage::new_rgb8(1920, 1080);
    let out = resize_to_fit(img, 1920);
    assert_eq!((out.width(), out.height()), (1920, 1080));
}

#[test]
fn output_format_follows_declared_type() {
    assert_eq!(select_output_format("image/png"), OutputFormat::Png);
    assert_eq!(select_output_format("image/webp"), OutputFormat::Webp);
    assert_eq!(select_output_format("image/jpeg"), OutputFormat::Jpeg);
    assert_eq!(select_output_format("image/gif"), OutputFormat::Jpeg);
    assert_eq!(select_output_format("image/bmp"), OutputFormat::Jpeg);
    assert_eq!(select_output_format(""), OutputFormat::Jpeg);
    // parameters on the header must not change the decision
    assert_eq!(select_output_format("image/png; charset=binary"), OutputFormat::Png);
}

#[test]
fn optimize_reencodes_png_as_png() {
    let img = image::DynamicImage::new_rgba8(100, 50);
    let out = optimize(img, "image/png", &test_config()).unwrap();
    assert_eq!(out.format, OutputFormat::Png);
    assert_eq!(out.format.content_type(), "image/png");
    assert_eq!(image::guess_format(&out.bytes).unwrap(), image::ImageFormat::Png);
}

#[test]
fn optimize_normalizes_gif_to_jpeg() {
    let img = image::DynamicImage::new_rgb8(100, 50);
    let out = optimize(img, "image/gif", &test_config()).unwrap();
    assert_eq!(out.format, OutputFormat::Jpeg);
    assert_eq!(image::guess_format(&out.bytes).unwrap(), image::ImageFormat::Jpeg);
}

#[test]
fn optimize_emits_webp_for_declared_webp() {
    let img = image::DynamicImage::new_rgb8(40, 40);
    let out = optimize(img, "image/webp", &test_config()).unwrap();
    assert_eq!(out.format, OutputFormat::Webp);
    assert_eq!(image::guess_format(&out.bytes).unwrap(), image::ImageFormat::WebP);
}

#[test]
fn optimize_resizes_oversized_input() {
    let img = image::DynamicImage::new_rgb8(2500, 500);
    let out = optimize(img, "image/jpeg", &test_config()).unwrap();
    let decoded = image::load_from_memory(&out.bytes).unwrap();
    assert_eq!(decoded.width(), 1920);
    assert_eq!(decoded.height(), 384);
}
