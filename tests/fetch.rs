use imageingest::fetch::is_accepted_content_type;

#[test]
fn accepts_listed_image_types() {
    for ct in [
        "image/jpeg",
        "image/png",
        "image/gif",
        "image/webp",
        "image/bmp",
        "image/svg+xml",
        "image/tiff",
        "image/avif",
    ] {
        assert!(is_accepted_content_type(ct), "should accept {}", ct);
    }
}

#[test]
fn accepts_any_image_subtype() {
    assert!(is_accepted_content_type("image/x-icon"));
    assert!(is_accepted_content_type("image/heic"));
}

#[test]
fn accepts_types_with_parameters() {
    assert!(is_accepted_content_type("image/png; charset=binary"));
    assert!(is_accepted_content_type("IMAGE/JPEG"));
}

#[test]
fn rejects_non_image_types() {
    assert!(!is_accepted_content_type("text/html"));
    assert!(!is_accepted_content_type("application/octet-stream"));
    assert!(!is_accepted_content_type("application/json"));
    assert!(!is_accepted_content_type(""));
}
