use imageingest::validate::validate_url;
use imageingest::IngestError;

#[test]
fn accepts_known_extension() {
    assert!(validate_url("https://example.com/catalog/item.jpg").is_ok());
    assert!(validate_url("http://example.com/a/b/c.PNG").is_ok());
    assert!(validate_url("https://example.com/x.webp").is_ok());
}

#[test]
fn accepts_known_host_without_extension() {
    assert!(validate_url("https://images.unsplash.com/photo-1").is_ok());
    assert!(validate_url("https://i.imgur.com/abc123").is_ok());
    assert!(validate_url("https://cdn.pexels.com/v2/some-resource").is_ok());
}

#[test]
fn accepts_keyword_hint_in_path_or_query() {
    assert!(validate_url("https://example.com/api/photos/123").is_ok());
    assert!(validate_url("https://example.com/resource?kind=image&id=9").is_ok());
    assert!(validate_url("https://example.com/profile-pic/42").is_ok());
}

#[test]
fn rejects_empty_and_whitespace() {
    assert!(matches!(validate_url(""), Err(IngestError::InvalidUrl(_))));
    assert!(matches!(validate_url("   "), Err(IngestError::InvalidUrl(_))));
}

#[test]
fn rejects_relative_and_malformed() {
    assert!(matches!(
        validate_url("/images/a.jpg"),
        Err(IngestError::InvalidUrl(_))
    ));
    assert!(matches!(
        validate_url("not a url"),
        Err(IngestError::InvalidUrl(_))
    ));
}

#[test]
fn rejects_non_http_schemes() {
    let err = validate_url("ftp://example.com/a.jpg").unwrap_err();
    match err {
        IngestError::InvalidUrl(msg) => assert!(msg.contains("scheme")),
        other => panic!("expected InvalidUrl, got {:?}", other),
    }
    assert!(validate_url("file:///tmp/a.jpg").is_err());
}

#[test]
fn rejects_urls_with_no_image_signal() {
    let err = validate_url("https://example.com/about-us").unwrap_err();
    assert!(matches!(err, IngestError::InvalidUrl(_)));
}

#[test]
fn does_not_match_partial_host_suffixes() {
    // "evilimgur.com" must not pass as a subdomain of imgur.com
    assert!(validate_url("https://evilimgur.com/page").is_err());
    assert!(validate_url("https://my.imgur.com/page").is_ok());
}

#[test]
fn trims_surrounding_whitespace() {
    assert!(validate_url("  https://example.com/a.png  ").is_ok());
}

#[test]
fn is_deterministic() {
    let inputs = [
        "https://example.com/a.jpg",
        "ftp://example.com/a.jpg",
        "",
        "https://example.com/about-us",
    ];
    for input in inputs {
        let first = validate_url(input).map(|u| u.to_string()).map_err(|e| e.to_string());
        let second = validate_url(input).map(|u| u.to_string()).map_err(|e| e.to_string());
        assert_eq!(first, second);
    }
}
