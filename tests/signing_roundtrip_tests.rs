//! Key generation, signing and verification through the public API.

use document_signer::services::{SigningService, VerificationService};
use document_signer::{
    compute_digest, embed_signature, extract_signature, generate_key_pair, sign_digest,
    verify_against_content, DocumentId, KeyMaterial, SignatureRecord, SigningError, UserId,
};

fn public_material(pair: &document_signer::KeyPair) -> KeyMaterial {
    KeyMaterial::PublicKey(
        pair.verifying_key()
            .to_public_key_b64()
            .expect("public key export"),
    )
}

#[test]
fn generated_keys_are_rsa_2048() {
    let pair = generate_key_pair().expect("key generation");
    assert_eq!(pair.signing_key().bits(), 2048);
}

#[test]
fn signature_is_one_modulus_long() {
    let pair = generate_key_pair().expect("key generation");
    let signature = sign_digest(&compute_digest(b"abc"), pair.signing_key()).expect("sign");
    assert_eq!(signature.len(), 256);
}

#[test]
fn signing_is_deterministic_for_a_key() {
    let pair = generate_key_pair().expect("key generation");
    let digest = compute_digest(b"same input");
    let first = sign_digest(&digest, pair.signing_key()).expect("sign");
    let second = sign_digest(&digest, pair.signing_key()).expect("sign");
    assert_eq!(first, second);
}

#[test]
fn uppercase_digest_is_rejected() {
    let pair = generate_key_pair().expect("key generation");
    let digest = compute_digest(b"abc").to_uppercase();
    let result = SigningService::new().sign_digest(&digest, pair.signing_key());
    assert!(result.is_err());
}

#[test]
fn envelope_round_trip_verifies() {
    let original = b"Invoice 42\nTotal: 100\n";
    let pair = generate_key_pair().expect("key generation");
    let signature = sign_digest(&compute_digest(original), pair.signing_key()).expect("sign");
    let signed = embed_signature(original, &signature.to_base64());

    let extracted = extract_signature(&signed).expect("extract");
    let report = VerificationService::new().verify_extracted(&extracted, &public_material(&pair));
    assert!(report.verified, "{}", report.reason());
    assert_eq!(report.digest.as_deref(), Some(compute_digest(original).as_str()));
}

#[test]
fn tampered_content_fails_verification() {
    let pair = generate_key_pair().expect("key generation");
    let signature = sign_digest(&compute_digest(b"pay 100"), pair.signing_key()).expect("sign");

    let report = verify_against_content(b"pay 900", &signature.to_base64(), &public_material(&pair));
    assert!(!report.verified);
    assert!(matches!(
        report.failure,
        Some(SigningError::VerificationFailed(_))
    ));
}

#[test]
fn wrong_key_fails_verification() {
    let signer = generate_key_pair().expect("key generation");
    let other = generate_key_pair().expect("key generation");
    let signature = sign_digest(&compute_digest(b"memo"), signer.signing_key()).expect("sign");

    let report = verify_against_content(b"memo", &signature.to_base64(), &public_material(&other));
    assert!(!report.verified);
}

#[test]
fn undecodable_signature_is_reported() {
    let pair = generate_key_pair().expect("key generation");
    let report = verify_against_content(b"memo", "***not base64***", &public_material(&pair));
    assert!(matches!(
        report.failure,
        Some(SigningError::SignatureDecodeFailed(_))
    ));
}

#[test]
fn legacy_record_with_only_private_key_verifies() {
    let pair = generate_key_pair().expect("key generation");
    let signature = sign_digest(&compute_digest(b"legacy"), pair.signing_key()).expect("sign");

    let mut record = SignatureRecord::new(
        DocumentId::new(1),
        UserId::new("alice").expect("user id"),
        signature.to_base64(),
        0,
    );
    record.private_key = Some(
        pair.signing_key()
            .to_private_key_b64()
            .expect("private key export"),
    );

    let material = KeyMaterial::from_record(&record).expect("material on record");
    assert!(matches!(material, KeyMaterial::PrivateKey(_)));
    assert!(verify_against_content(b"legacy", &record.signature_raw, &material).verified);
}

#[test]
fn record_without_keys_has_no_material() {
    let record = SignatureRecord::new(
        DocumentId::new(3),
        UserId::new("alice").expect("user id"),
        "AAAA".to_string(),
        0,
    );
    assert!(matches!(
        KeyMaterial::from_record(&record),
        Err(SigningError::NoSignatureOnRecord(id)) if id == DocumentId::new(3)
    ));
}

#[test]
fn record_survives_json_round_trip() {
    let pair = generate_key_pair().expect("key generation");
    let signature = sign_digest(&compute_digest(b"json"), pair.signing_key()).expect("sign");
    let mut record = SignatureRecord::new(
        DocumentId::new(9),
        UserId::new("bob").expect("user id"),
        signature.to_base64(),
        1_700_000_000,
    );
    record.public_key = Some(pair.verifying_key().to_public_key_b64().expect("export"));

    let json = serde_json::to_string(&record).expect("serialize");
    let parsed: SignatureRecord = serde_json::from_str(&json).expect("deserialize");
    let material = KeyMaterial::from_record(&parsed).expect("material");
    assert!(verify_against_content(b"json", &parsed.signature_raw, &material).verified);
}
