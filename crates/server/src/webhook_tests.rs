use super::*;
use axum::http::HeaderValue;

fn signed_headers(secret: &str, body: &str) -> HeaderMap {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body.as_bytes());
    let signature = format!("sha256={}", hex::encode(mac.finalize().into_bytes()));

    let mut headers = HeaderMap::new();
    headers.insert("X-Hub-Signature-256", HeaderValue::from_str(&signature).unwrap());
    headers
}

#[test]
fn verify_signature_accepts_a_correctly_signed_body() {
    let body = r#"{"action":"opened"}"#;
    let headers = signed_headers("topsecret", body);

    assert!(verify_signature("topsecret", &headers, body));
}

#[test]
fn verify_signature_rejects_a_body_signed_with_a_different_secret() {
    let body = r#"{"action":"opened"}"#;
    let headers = signed_headers("wrong-secret", body);

    assert!(!verify_signature("topsecret", &headers, body));
}

#[test]
fn verify_signature_rejects_a_tampered_body() {
    let body = r#"{"action":"opened"}"#;
    let headers = signed_headers("topsecret", body);

    assert!(!verify_signature("topsecret", &headers, r#"{"action":"closed"}"#));
}

#[test]
fn verify_signature_rejects_a_missing_header() {
    let headers = HeaderMap::new();

    assert!(!verify_signature("topsecret", &headers, "{}"));
}
