//! X.509 client certificate issuance.
//!
//! Three paths: self-signed, signed by a CA created for the call, and signed
//! from a caller-supplied CSR. When a long-lived `CertificateAuthority` is
//! attached, `issue_user_certificate` and `issue_from_csr` use it instead of
//! an ephemeral CA so the results chain to a stable root.
//! `issue_via_ephemeral_ca` always creates a fresh CA.

use openssl::x509::X509Req;

use crate::domain::constants::{
    DEFAULT_CA_COMMON_NAME, DEFAULT_ORGANIZATION, PEM_CERTIFICATE_REQUEST,
};
use crate::domain::crypto::{IssuedCertificate, SerialNumberPolicy};
use crate::infra::config::SignerConfiguration;
use crate::infra::error::{SigningError, SigningResult};
use crate::services::authority::CertificateAuthority;
use crate::services::cert_builder::{self, Issuer};
use crate::services::keys::{KeyService, SigningKey};

/// Naming and serial settings applied to every issued certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuerProfile {
    pub organization: String,
    pub ca_common_name: String,
    pub serial_policy: SerialNumberPolicy,
}

impl Default for IssuerProfile {
    fn default() -> Self {
        Self {
            organization: DEFAULT_ORGANIZATION.to_string(),
            ca_common_name: DEFAULT_CA_COMMON_NAME.to_string(),
            serial_policy: SerialNumberPolicy::default(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CertificateIssuer {
    profile: IssuerProfile,
    authority: Option<CertificateAuthority>,
    keys: KeyService,
}

impl CertificateIssuer {
    #[must_use]
    pub fn new(profile: IssuerProfile) -> Self {
        Self {
            profile,
            authority: None,
            keys: KeyService::new(),
        }
    }

    /// Issue through `authority` instead of per-call ephemeral CAs.
    #[must_use]
    pub fn with_authority(mut self, authority: CertificateAuthority) -> Self {
        self.authority = Some(authority);
        self
    }

    /// Profile from configuration; loads the CA when both paths are set.
    pub fn from_config(config: &SignerConfiguration) -> SigningResult<Self> {
        let issuer = Self::new(IssuerProfile {
            organization: config.organization.clone(),
            ca_common_name: config.ca_common_name.clone(),
            serial_policy: config.serial_policy,
        });
        match (&config.ca_cert_path, &config.ca_key_path) {
            (Some(cert), Some(key)) => {
                Ok(issuer.with_authority(CertificateAuthority::load(cert, key)?))
            }
            _ => Ok(issuer),
        }
    }

    #[must_use]
    pub fn profile(&self) -> &IssuerProfile {
        &self.profile
    }

    #[must_use]
    pub fn authority(&self) -> Option<&CertificateAuthority> {
        self.authority.as_ref()
    }

    /// Self-signed one-year client certificate with a fresh key pair.
    pub fn self_signed_user_certificate(
        &self,
        name: &str,
        email: &str,
    ) -> SigningResult<IssuedCertificate> {
        validate_email(email)?;
        let (key, _) = self.keys.generate_key_pair()?.into_parts();
        let subject = cert_builder::subject_name(name, &self.profile.organization, Some(email))?;
        let cert = cert_builder::client_certificate(
            &subject,
            Some(email),
            key.pkey(),
            Issuer::SelfSigned(key.pkey()),
            self.profile.serial_policy,
        )?;
        log::info!("Issued self-signed certificate for {name}");
        bundle(&cert, &key, None)
    }

    /// Fresh CA and fresh user key per call. Certificates from different
    /// calls do not share a root.
    pub fn issue_via_ephemeral_ca(
        &self,
        name: &str,
        email: &str,
    ) -> SigningResult<IssuedCertificate> {
        let ca = self.ephemeral_authority()?;
        self.issue_with(&ca, name, email)
    }

    /// Issue through the attached authority, or an ephemeral one if none.
    pub fn issue_user_certificate(
        &self,
        name: &str,
        email: &str,
    ) -> SigningResult<IssuedCertificate> {
        match &self.authority {
            Some(ca) => self.issue_with(ca, name, email),
            None => self.issue_via_ephemeral_ca(name, email),
        }
    }

    /// Sign a PEM certificate request. Returns the certificate PEM.
    pub fn issue_from_csr(&self, csr_pem: &str) -> SigningResult<String> {
        let req = parse_csr(csr_pem)?;
        let public_key = req
            .public_key()
            .map_err(|e| SigningError::InvalidCsr(format!("unreadable public key: {e}")))?;
        if !req.verify(&public_key).unwrap_or(false) {
            log::warn!("Rejected CSR with invalid self-signature");
            return Err(SigningError::CsrSignatureInvalid);
        }

        let ephemeral;
        let ca = match &self.authority {
            Some(ca) => ca,
            None => {
                ephemeral = self.ephemeral_authority()?;
                &ephemeral
            }
        };
        let cert = cert_builder::client_certificate(
            req.subject_name(),
            None,
            &public_key,
            Issuer::Authority(ca.certificate(), ca.key().pkey()),
            self.profile.serial_policy,
        )?;
        log::info!("Issued certificate from CSR");
        cert_builder::certificate_pem(&cert)
    }

    /// Build a PEM CSR for `name`/`email` signed with `key`.
    pub fn generate_csr(&self, name: &str, email: &str, key: &SigningKey) -> SigningResult<String> {
        validate_email(email)?;
        let subject = cert_builder::subject_name(name, &self.profile.organization, Some(email))?;
        let req = cert_builder::certificate_request(&subject, key.pkey())?;
        let pem = req.to_pem()?;
        String::from_utf8(pem).map_err(|e| SigningError::CertificateError(e.to_string()))
    }

    fn ephemeral_authority(&self) -> SigningResult<CertificateAuthority> {
        CertificateAuthority::generate(
            &self.profile.ca_common_name,
            &self.profile.organization,
            self.profile.serial_policy,
        )
    }

    fn issue_with(
        &self,
        ca: &CertificateAuthority,
        name: &str,
        email: &str,
    ) -> SigningResult<IssuedCertificate> {
        validate_email(email)?;
        let (key, _) = self.keys.generate_key_pair()?.into_parts();
        let subject = cert_builder::subject_name(name, &self.profile.organization, Some(email))?;
        let cert = cert_builder::client_certificate(
            &subject,
            Some(email),
            key.pkey(),
            Issuer::Authority(ca.certificate(), ca.key().pkey()),
            self.profile.serial_policy,
        )?;
        log::info!("Issued CA-signed certificate for {name}");
        bundle(&cert, &key, Some(ca.certificate_pem()?))
    }
}

/// Decode and type-check a CSR. Anything that is not a PEM block labelled
/// `CERTIFICATE REQUEST` holding a parseable request is `InvalidCsr`.
fn parse_csr(csr_pem: &str) -> SigningResult<X509Req> {
    let (label, der_bytes) = der::pem::decode_vec(csr_pem.trim().as_bytes())
        .map_err(|e| SigningError::InvalidCsr(format!("PEM decode failed: {e}")))?;
    if label != PEM_CERTIFICATE_REQUEST {
        return Err(SigningError::InvalidCsr(format!(
            "expected {PEM_CERTIFICATE_REQUEST}, found {label}"
        )));
    }
    X509Req::from_der(&der_bytes)
        .map_err(|e| SigningError::InvalidCsr(format!("malformed request: {e}")))
}

fn validate_email(email: &str) -> SigningResult<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(SigningError::ValidationError(format!(
            "invalid email address '{email}'"
        ))),
    }
}

fn bundle(
    cert: &openssl::x509::X509Ref,
    key: &SigningKey,
    issuer_certificate_pem: Option<String>,
) -> SigningResult<IssuedCertificate> {
    Ok(IssuedCertificate {
        certificate_pem: cert_builder::certificate_pem(cert)?,
        private_key_pem: key.to_pem()?,
        public_key_pem: key.verifying_key()?.to_pem()?,
        issuer_certificate_pem,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use openssl::x509::X509;

    #[test]
    fn self_signed_certificate_is_its_own_issuer() {
        let issued = CertificateIssuer::default()
            .self_signed_user_certificate("Alice", "alice@example.com")
            .unwrap();
        let cert = X509::from_pem(issued.certificate_pem.as_bytes()).unwrap();
        assert_eq!(
            cert.subject_name().try_cmp(cert.issuer_name()).unwrap(),
            std::cmp::Ordering::Equal
        );
        assert!(cert.verify(&cert.public_key().unwrap()).unwrap());
        assert!(issued.private_key_pem.contains("RSA PRIVATE KEY"));
        assert!(issued.public_key_pem.contains("PUBLIC KEY"));
        assert!(issued.issuer_certificate_pem.is_none());
    }

    #[test]
    fn ephemeral_ca_signs_user_certificate() {
        let issued = CertificateIssuer::default()
            .issue_via_ephemeral_ca("Bob", "bob@example.com")
            .unwrap();
        let ca_pem = issued.issuer_certificate_pem.as_deref().unwrap();
        let ca = X509::from_pem(ca_pem.as_bytes()).unwrap();
        let cert = X509::from_pem(issued.certificate_pem.as_bytes()).unwrap();
        assert!(cert.verify(&ca.public_key().unwrap()).unwrap());
    }

    #[test]
    fn attached_authority_is_used() {
        let ca = CertificateAuthority::generate("Stable CA", "Org", SerialNumberPolicy::Random)
            .unwrap();
        let issuer = CertificateIssuer::default().with_authority(ca);
        let issued = issuer
            .issue_user_certificate("Carol", "carol@example.com")
            .unwrap();
        let authority = issuer.authority().unwrap();
        assert!(authority.verify_issued(&issued.certificate_pem).unwrap());
    }

    #[test]
    fn csr_label_must_be_certificate_request() {
        let pem = "-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----\n";
        assert!(matches!(
            CertificateIssuer::default().issue_from_csr(pem),
            Err(SigningError::InvalidCsr(_))
        ));
        assert!(matches!(
            CertificateIssuer::default().issue_from_csr("garbage"),
            Err(SigningError::InvalidCsr(_))
        ));
    }

    #[test]
    fn rejects_bad_email() {
        assert!(matches!(
            CertificateIssuer::default().self_signed_user_certificate("Dan", "not-an-email"),
            Err(SigningError::ValidationError(_))
        ));
    }
}
