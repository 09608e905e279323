//! Property-based tests for issuance and verification.
//!
//! Property 1: Subject Round-Trip
//! Property 2: Mismatched Key Rejection
//! Property 3: Expired Token Rejection
//! Property 4: Missing Token Is Not Invalid

mod common;

use common::{fixture, issuer_and_verifier, matching_keys, mismatched_keys};
use identity_token_service::TokenError;
use identity_token_service::jwt::{JwtBuilder, JwtSerializer};
use identity_token_service::keys::{FileKeyProvider, StaticKeyProvider};
use identity_token_service::metrics::ServiceMetrics;
use identity_token_service::{TokenIssuer, TokenVerifier};
use jsonwebtoken::EncodingKey;
use proptest::prelude::*;
use std::sync::Arc;

/// Generate arbitrary subject strings, including whitespace and unicode.
fn arb_subject() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9_-]{1,64}",
        "\\PC{1,64}",
        Just(" ".to_string()),
        Just("a.b.c".to_string()),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property 1: Subject Round-Trip
    ///
    /// For any subject, verifying a freshly issued token yields exactly
    /// that subject.
    #[test]
    fn prop_issue_then_verify_recovers_subject(subject in arb_subject()) {
        let rt = runtime();
        let (issuer, verifier, _) = issuer_and_verifier(matching_keys());

        let recovered = rt.block_on(async {
            let issued = issuer.issue(&subject).await.unwrap();
            verifier.verify(Some(&issued.token)).await
        });

        prop_assert_eq!(recovered.unwrap(), subject);
    }

    /// Property 2: Mismatched Key Rejection
    #[test]
    fn prop_mismatched_public_key_rejects(subject in arb_subject()) {
        let rt = runtime();
        let (issuer, verifier, metrics) = issuer_and_verifier(mismatched_keys());

        let result = rt.block_on(async {
            let issued = issuer.issue(&subject).await.unwrap();
            verifier.verify(Some(&issued.token)).await
        });

        prop_assert!(matches!(result, Err(TokenError::TokenInvalid(_))));
        prop_assert_eq!(metrics.verification().count, 0);
    }

    /// Property 3: Expired Token Rejection
    ///
    /// A correctly signed token is rejected once `exp` is reached.
    #[test]
    fn prop_expired_token_rejected(subject in arb_subject(), age in 0i64..86_400) {
        let rt = runtime();
        let (_, verifier, _) = issuer_and_verifier(matching_keys());

        let claims = JwtBuilder::new()
            .subject(subject)
            .ttl_seconds(-age)
            .build()
            .unwrap();
        let key = EncodingKey::from_rsa_pem(&common::read_fixture("private.pem")).unwrap();
        let token = JwtSerializer::rs256().serialize(&claims, &key).unwrap();

        let result = rt.block_on(verifier.verify(Some(&token)));
        prop_assert!(matches!(result, Err(TokenError::TokenInvalid(_))));
    }
}

/// Property 4: Missing Token Is Not Invalid
#[tokio::test]
async fn test_missing_token_is_distinct_from_invalid() {
    let (_, verifier, _) = issuer_and_verifier(matching_keys());

    let missing = verifier.verify(None).await.unwrap_err();
    let invalid = verifier.verify(Some("garbage")).await.unwrap_err();

    assert!(matches!(missing, TokenError::TokenMissing));
    assert!(matches!(invalid, TokenError::TokenInvalid(_)));
    assert_ne!(missing.code(), invalid.code());
    assert_ne!(missing.status_code(), invalid.status_code());
}

#[tokio::test]
async fn test_tampered_claims_rejected() {
    let (issuer, verifier, _) = issuer_and_verifier(matching_keys());
    let issued = issuer.issue("alice").await.unwrap();

    let parts: Vec<&str> = issued.token.split('.').collect();
    let forged_claims = base64::Engine::encode(
        &base64::engine::general_purpose::URL_SAFE_NO_PAD,
        br#"{"sub":"mallory","exp":4102444800}"#,
    );
    let forged = format!("{}.{}.{}", parts[0], forged_claims, parts[2]);

    assert!(matches!(
        verifier.verify(Some(&forged)).await,
        Err(TokenError::TokenInvalid(_))
    ));
}

#[tokio::test]
async fn test_token_issued_with_pkcs8_key_verifies() {
    let keys = Arc::new(FileKeyProvider::new(
        fixture("other_private.pem"),
        fixture("other_public.pem"),
    ));
    let (issuer, verifier, _) = issuer_and_verifier(keys);

    let issued = issuer.issue("dave").await.unwrap();
    assert_eq!(verifier.verify(Some(&issued.token)).await.unwrap(), "dave");
}

#[tokio::test]
async fn test_preloaded_keys_round_trip() {
    let files = FileKeyProvider::new(fixture("private.pem"), fixture("public.pem"));
    let keys = Arc::new(StaticKeyProvider::load(&files).await.unwrap());
    let metrics = Arc::new(ServiceMetrics::new());

    let issuer = TokenIssuer::new(keys.clone(), metrics.clone());
    let verifier = TokenVerifier::new(keys, metrics);

    let issued = issuer.issue("erin").await.unwrap();
    assert_eq!(verifier.verify(Some(&issued.token)).await.unwrap(), "erin");
}

#[tokio::test]
async fn test_issued_token_structure() {
    let (issuer, _, _) = issuer_and_verifier(matching_keys());
    let issued = issuer.issue("frank").await.unwrap();

    let parts: Vec<&str> = issued.token.split('.').collect();
    assert_eq!(parts.len(), 3, "JWT must have 3 parts");

    let decode = |part: &str| -> serde_json::Value {
        let bytes = base64::Engine::decode(
            &base64::engine::general_purpose::URL_SAFE_NO_PAD,
            part,
        )
        .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    };

    let header = decode(parts[0]);
    assert_eq!(header["alg"], "RS256");
    assert_eq!(header["typ"], "JWT");

    let payload = decode(parts[1]);
    assert_eq!(payload["sub"], "frank");
    assert_eq!(payload["jti"], issued.jti.as_str());
    let exp = payload["exp"].as_i64().unwrap();
    let iat = payload["iat"].as_i64().unwrap();
    assert_eq!(exp - iat, 86_400, "tokens live for one day");
}
