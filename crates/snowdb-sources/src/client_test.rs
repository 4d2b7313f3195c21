use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};

use super::*;

#[test]
fn retry_after_reads_integer_seconds() {
    let mut headers = HeaderMap::new();
    headers.insert(RETRY_AFTER, HeaderValue::from_static("17"));
    assert_eq!(retry_after_secs(&headers), 17);
}

#[test]
fn retry_after_defaults_when_absent() {
    assert_eq!(retry_after_secs(&HeaderMap::new()), DEFAULT_RETRY_AFTER_SECS);
}

#[test]
fn retry_after_defaults_on_http_date() {
    let mut headers = HeaderMap::new();
    headers.insert(
        RETRY_AFTER,
        HeaderValue::from_static("Wed, 21 Oct 2026 07:28:00 GMT"),
    );
    assert_eq!(retry_after_secs(&headers), DEFAULT_RETRY_AFTER_SECS);
}

#[test]
fn display_url_drops_query_string() {
    let url = Url::parse(
        "https://customer-api.open-meteo.com/v1/forecast?latitude=39.6&apikey=secret#frag",
    )
    .unwrap();
    assert_eq!(
        display_url(&url),
        "https://customer-api.open-meteo.com/v1/forecast"
    );
}

#[test]
fn display_url_keeps_path() {
    let url = Url::parse("https://www.onthesnow.com/colorado/vail/skireport").unwrap();
    assert_eq!(
        display_url(&url),
        "https://www.onthesnow.com/colorado/vail/skireport"
    );
}

#[test]
fn client_builds_with_custom_user_agent() {
    assert!(SourceClient::new(5, "snowdb-test/0.1").is_ok());
}
