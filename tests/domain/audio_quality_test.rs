use tonearm::domain::AudioQuality;

#[test]
fn given_supported_selectors_when_parsing_then_matching_bitrate() {
    assert_eq!(AudioQuality::from_selector(Some("128")).kbps(), 128);
    assert_eq!(AudioQuality::from_selector(Some("192")).kbps(), 192);
    assert_eq!(AudioQuality::from_selector(Some("256")).kbps(), 256);
    assert_eq!(AudioQuality::from_selector(Some("320")).kbps(), 320);
}

#[test]
fn given_unsupported_selector_when_parsing_then_falls_back_to_192() {
    for selector in ["64", "1000", "high", "", "192k"] {
        assert_eq!(
            AudioQuality::from_selector(Some(selector)),
            AudioQuality::Kbps192,
            "selector {:?}",
            selector
        );
    }
}

#[test]
fn given_no_selector_when_parsing_then_default_is_192() {
    assert_eq!(AudioQuality::from_selector(None), AudioQuality::Kbps192);
    assert_eq!(AudioQuality::default().to_string(), "192");
}

#[test]
fn given_padded_selector_when_parsing_then_whitespace_ignored() {
    assert_eq!(AudioQuality::from_selector(Some(" 256 ")), AudioQuality::Kbps256);
}
