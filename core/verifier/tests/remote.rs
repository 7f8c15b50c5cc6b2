// Copyright jwt-verifier contributors
// SPDX-License-Identifier: Apache-2.0

//! Remote key provisioning against a mock identity API: the verifier is
//! built from a fetched key document and behaves identically to one built
//! from static configuration.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use jsonwebtoken_aws_lc::{Algorithm, EncodingKey, Header, encode};
use openssl::rsa::Rsa;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use jwt_verifier::errors::{KeyFetchError, VerifierError};
use jwt_verifier::{BackoffConfig, JwtVerifierBuilder};

struct TestKey {
    encoding_key: EncodingKey,
    public_b64: String,
}

fn generate_rsa_key() -> TestKey {
    let rsa = Rsa::generate(2048).expect("RSA generation failed");
    let private_pem = rsa.private_key_to_pem().expect("PEM export failed");
    let public_der = rsa.public_key_to_der_pkcs1().expect("DER export failed");

    TestKey {
        encoding_key: EncodingKey::from_rsa_pem(&private_pem).expect("bad private key PEM"),
        public_b64: STANDARD.encode(public_der),
    }
}

fn sign_rs256(key: &TestKey, kid: &str) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    encode(
        &header,
        &json!({
            "exp": now + 600,
            "sub": "user-42",
            "username": "ada@example.com",
        }),
        &key.encoding_key,
    )
    .expect("signing failed")
}

fn fast_backoff() -> BackoffConfig {
    BackoffConfig::new(1, 5, 100)
}

#[tokio::test]
async fn verifier_built_from_remote_keys() {
    let key = generate_rsa_key();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/keys"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "key-1": key.public_b64 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let verifier = JwtVerifierBuilder::new()
        .remote_endpoint(format!("{}/keys", server.uri()))
        .backoff(fast_backoff())
        .build_remote()
        .await
        .unwrap();

    let identity = verifier.verify(&sign_rs256(&key, "key-1")).unwrap();
    assert_eq!(identity.email, "ada@example.com");
    assert_eq!(identity.groups, Vec::<String>::new());
}

#[tokio::test]
async fn remote_fetch_recovers_from_transient_server_errors() {
    let key = generate_rsa_key();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/keys"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/keys"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "key-1": key.public_b64 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let verifier = JwtVerifierBuilder::new()
        .remote_endpoint(format!("{}/keys", server.uri()))
        .backoff(BackoffConfig::new(1, 5, 5_000))
        .build_remote()
        .await
        .unwrap();

    assert!(verifier.verify(&sign_rs256(&key, "key-1")).is_ok());
}

#[tokio::test]
async fn remote_fetch_gives_up_after_budget() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/keys"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = JwtVerifierBuilder::new()
        .remote_endpoint(format!("{}/keys", server.uri()))
        .backoff(fast_backoff())
        .build_remote()
        .await
        .unwrap_err();

    match err {
        VerifierError::KeyFetch(KeyFetchError::BadStatus { status, .. }) => {
            assert_eq!(status, 503)
        }
        other => panic!("expected BadStatus, got {other:?}"),
    }

    let requests = server.received_requests().await.unwrap();
    assert!(requests.len() > 1, "expected retries before giving up");
}

#[tokio::test]
async fn empty_key_document_is_unusable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/keys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let err = JwtVerifierBuilder::new()
        .remote_endpoint(format!("{}/keys", server.uri()))
        .backoff(fast_backoff())
        .build_remote()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        VerifierError::KeyFetch(KeyFetchError::NoKeysFound)
    ));
}

#[tokio::test]
async fn malformed_remote_key_material_fails_construction() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/keys"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "key-1": "!!not-base64!!" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = JwtVerifierBuilder::new()
        .remote_endpoint(format!("{}/keys", server.uri()))
        .backoff(fast_backoff())
        .build_remote()
        .await
        .unwrap_err();

    assert!(matches!(err, VerifierError::Config(_)));
}
