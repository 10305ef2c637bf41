//! Certificate issuance, CSR signing and inspection.

use chrono::{DateTime, Months, Utc};
use document_signer::services::IssuerProfile;
use document_signer::{
    generate_key_pair, inspect_certificate, issue_from_csr, issue_via_ephemeral_ca,
    self_signed_user_certificate, CertificateAuthority, CertificateIssuer, CertificateSummary,
    SerialNumberPolicy, SigningError,
};
use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::rsa::Rsa;
use openssl::x509::{X509NameBuilder, X509ReqBuilder};
use tempfile::TempDir;

fn months_after(summary: &CertificateSummary, months: u32) -> i64 {
    let not_before = DateTime::<Utc>::from_timestamp(summary.not_before, 0).expect("valid time");
    not_before
        .checked_add_months(Months::new(months))
        .expect("in range")
        .timestamp()
}

mod validity_tests {
    use super::*;

    #[test]
    fn user_certificate_is_valid_for_twelve_months() {
        let issued = self_signed_user_certificate("Alice", "alice@example.com").expect("issue");
        let summary = inspect_certificate(&issued.certificate_pem).expect("inspect");
        assert_eq!(summary.not_after, months_after(&summary, 12));
        assert!(!summary.is_ca);
    }

    #[test]
    fn ca_certificate_is_valid_for_ten_years() {
        let ca = CertificateAuthority::generate("Test CA", "Test Org", SerialNumberPolicy::Random)
            .expect("generate CA");
        let summary = inspect_certificate(&ca.certificate_pem().expect("pem")).expect("inspect");
        assert_eq!(summary.not_after, months_after(&summary, 120));
        assert!(summary.is_ca);
        assert!(summary.is_self_issued());
    }

    #[test]
    fn not_before_is_current() {
        let before = Utc::now().timestamp();
        let issued = self_signed_user_certificate("Alice", "alice@example.com").expect("issue");
        let after = Utc::now().timestamp();
        let summary = inspect_certificate(&issued.certificate_pem).expect("inspect");
        assert!(summary.not_before >= before && summary.not_before <= after);
    }
}

mod issuance_tests {
    use super::*;

    #[test]
    fn self_signed_names_user_as_issuer() {
        let issued = self_signed_user_certificate("Alice", "alice@example.com").expect("issue");
        let summary = inspect_certificate(&issued.certificate_pem).expect("inspect");
        assert_eq!(summary.subject_common_name.as_deref(), Some("Alice"));
        assert!(summary.is_self_issued());
        assert!(issued.issuer_certificate_pem.is_none());
        assert!(issued.private_key_pem.contains("PRIVATE KEY"));
        assert!(issued.public_key_pem.contains("PUBLIC KEY"));
    }

    #[test]
    fn ephemeral_ca_certificates_do_not_share_a_root() {
        let first = issue_via_ephemeral_ca("Alice", "alice@example.com").expect("issue");
        let second = issue_via_ephemeral_ca("Alice", "alice@example.com").expect("issue");

        let summary = inspect_certificate(&first.certificate_pem).expect("inspect");
        assert_eq!(summary.issuer_common_name.as_deref(), Some("Document Signing CA"));
        assert!(!summary.is_self_issued());

        let first_ca = first.issuer_certificate_pem.expect("CA certificate returned");
        let second_ca = second.issuer_certificate_pem.expect("CA certificate returned");
        assert_ne!(first_ca, second_ca);
    }

    #[test]
    fn invalid_email_is_rejected() {
        for email in ["", "no-at-sign", "@example.com", "alice@"] {
            let result = self_signed_user_certificate("Alice", email);
            assert!(
                matches!(result, Err(SigningError::ValidationError(_))),
                "email {email:?} should be rejected"
            );
        }
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(self_signed_user_certificate("", "alice@example.com").is_err());
    }

    #[test]
    fn random_serials_are_accepted() {
        let profile = IssuerProfile {
            serial_policy: SerialNumberPolicy::Random,
            ..IssuerProfile::default()
        };
        let issued = CertificateIssuer::new(profile)
            .self_signed_user_certificate("Alice", "alice@example.com")
            .expect("issue");
        let summary = inspect_certificate(&issued.certificate_pem).expect("inspect");
        assert!(!summary.serial_number.is_empty());
    }
}

mod authority_tests {
    use super::*;

    #[test]
    fn persistent_ca_chains_issued_certificates() {
        let dir = TempDir::new().expect("temp dir");
        let cert_path = dir.path().join("ca/ca.pem");
        let key_path = dir.path().join("ca/ca.key");

        let ca = CertificateAuthority::generate("Office CA", "Office", SerialNumberPolicy::Random)
            .expect("generate CA");
        ca.save(&cert_path, &key_path).expect("save CA");

        let loaded = CertificateAuthority::load(&cert_path, &key_path).expect("load CA");
        let issuer = CertificateIssuer::default().with_authority(loaded);

        let first = issuer
            .issue_user_certificate("Alice", "alice@example.com")
            .expect("issue");
        let second = issuer
            .issue_user_certificate("Bob", "bob@example.com")
            .expect("issue");
        assert_eq!(first.issuer_certificate_pem, second.issuer_certificate_pem);

        assert!(ca.verify_issued(&first.certificate_pem).expect("verify"));
        assert!(ca.verify_issued(&second.certificate_pem).expect("verify"));

        let stranger = issue_via_ephemeral_ca("Eve", "eve@example.com").expect("issue");
        assert!(!ca.verify_issued(&stranger.certificate_pem).expect("verify"));
    }

    #[test]
    fn loading_missing_ca_fails() {
        let dir = TempDir::new().expect("temp dir");
        let result = CertificateAuthority::load(dir.path().join("ca.pem"), dir.path().join("ca.key"));
        assert!(matches!(result, Err(SigningError::IoError(_))));
    }

    #[test]
    fn mismatched_ca_key_is_rejected() {
        let ca = CertificateAuthority::generate("A", "Org", SerialNumberPolicy::Random).expect("CA");
        let other = CertificateAuthority::generate("B", "Org", SerialNumberPolicy::Random).expect("CA");
        let result = CertificateAuthority::from_pem(
            &ca.certificate_pem().expect("pem"),
            &other.private_key_pem().expect("pem"),
        );
        assert!(result.is_err());
    }
}

mod csr_tests {
    use super::*;

    fn csr_signed_by_wrong_key() -> String {
        let subject_key = PKey::from_rsa(Rsa::generate(2048).expect("rsa")).expect("pkey");
        let signing_key = PKey::from_rsa(Rsa::generate(2048).expect("rsa")).expect("pkey");

        let mut name = X509NameBuilder::new().expect("name");
        name.append_entry_by_text("CN", "Mallory").expect("cn");
        let name = name.build();

        let mut req = X509ReqBuilder::new().expect("req");
        req.set_subject_name(&name).expect("subject");
        req.set_pubkey(&subject_key).expect("pubkey");
        req.sign(&signing_key, MessageDigest::sha256()).expect("sign");
        String::from_utf8(req.build().to_pem().expect("pem")).expect("utf8")
    }

    #[test]
    fn valid_csr_is_signed_with_request_subject() {
        let issuer = CertificateIssuer::default();
        let pair = generate_key_pair().expect("keys");
        let csr = issuer
            .generate_csr("Carol", "carol@example.com", pair.signing_key())
            .expect("csr");

        let cert = issue_from_csr(&csr).expect("issue");
        let summary = inspect_certificate(&cert).expect("inspect");
        assert_eq!(summary.subject_common_name.as_deref(), Some("Carol"));
        assert_eq!(summary.not_after, months_after(&summary, 12));
    }

    #[test]
    fn csr_with_bad_self_signature_is_rejected() {
        let result = issue_from_csr(&csr_signed_by_wrong_key());
        assert!(matches!(result, Err(SigningError::CsrSignatureInvalid)));
    }

    #[test]
    fn garbage_csr_is_invalid() {
        let result = issue_from_csr("-----BEGIN CERTIFICATE REQUEST-----\nAAAA\n-----END CERTIFICATE REQUEST-----\n");
        assert!(matches!(result, Err(SigningError::InvalidCsr(_))));
        assert!(matches!(issue_from_csr("not pem"), Err(SigningError::InvalidCsr(_))));
    }
}

mod inspection_tests {
    use super::*;

    #[test]
    fn non_certificate_pem_is_rejected() {
        let pair = generate_key_pair().expect("keys");
        let key_pem = pair.signing_key().to_pem().expect("pem");
        assert!(matches!(
            inspect_certificate(&key_pem),
            Err(SigningError::CertificateError(_))
        ));
    }
}
