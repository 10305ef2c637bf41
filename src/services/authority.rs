//! Long-lived certificate authority.
//!
//! Issued certificates only chain to a stable root when the same authority
//! is reused across calls, so the CA certificate and key can be written to
//! disk and loaded at startup.

use std::fs;
use std::io::Write;
use std::path::Path;

use openssl::x509::{X509Ref, X509};

use crate::domain::crypto::SerialNumberPolicy;
use crate::infra::error::{SigningError, SigningResult};
use crate::services::cert_builder;
use crate::services::keys::{KeyService, SigningKey};

pub struct CertificateAuthority {
    certificate: X509,
    key: SigningKey,
}

impl CertificateAuthority {
    /// Fresh CA key pair and ten-year self-signed CA certificate.
    pub fn generate(
        common_name: &str,
        organization: &str,
        policy: SerialNumberPolicy,
    ) -> SigningResult<Self> {
        let (key, _) = KeyService::new().generate_key_pair()?.into_parts();
        let certificate =
            cert_builder::ca_certificate(common_name, organization, key.pkey(), policy)?;
        log::debug!("Generated CA '{common_name}'");
        Ok(Self { certificate, key })
    }

    pub fn from_pem(certificate_pem: &str, private_key_pem: &str) -> SigningResult<Self> {
        let certificate = X509::from_pem(certificate_pem.as_bytes())
            .map_err(|e| SigningError::CertificateError(format!("invalid CA certificate: {e}")))?;
        let key = SigningKey::from_pem(private_key_pem)?;

        let cert_key = certificate.public_key()?;
        if !cert_key.public_eq(key.pkey()) {
            return Err(SigningError::CertificateError(
                "CA private key does not match CA certificate".to_string(),
            ));
        }
        Ok(Self { certificate, key })
    }

    pub fn certificate_pem(&self) -> SigningResult<String> {
        cert_builder::certificate_pem(&self.certificate)
    }

    pub fn private_key_pem(&self) -> SigningResult<String> {
        self.key.to_pem()
    }

    pub fn save<P: AsRef<Path>, Q: AsRef<Path>>(&self, cert_path: P, key_path: Q) -> SigningResult<()> {
        for path in [cert_path.as_ref(), key_path.as_ref()] {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    SigningError::IoError(format!("Failed to create {}: {e}", parent.display()))
                })?;
            }
        }
        fs::write(cert_path.as_ref(), self.certificate_pem()?)?;
        write_private_key(key_path.as_ref(), &self.private_key_pem()?)?;
        log::info!(
            "Saved CA certificate to {}",
            cert_path.as_ref().display()
        );
        Ok(())
    }

    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(cert_path: P, key_path: Q) -> SigningResult<Self> {
        let read = |path: &Path| {
            fs::read_to_string(path).map_err(|e| {
                SigningError::IoError(format!("Failed to read {}: {e}", path.display()))
            })
        };
        let ca = Self::from_pem(&read(cert_path.as_ref())?, &read(key_path.as_ref())?)?;
        log::info!("Loaded CA from {}", cert_path.as_ref().display());
        Ok(ca)
    }

    /// True if `certificate_pem` was signed by this CA's key and names it
    /// as issuer.
    pub fn verify_issued(&self, certificate_pem: &str) -> SigningResult<bool> {
        let cert = X509::from_pem(certificate_pem.as_bytes())
            .map_err(|e| SigningError::CertificateError(format!("invalid certificate: {e}")))?;
        let issued = self.certificate.issued(&cert) == openssl::x509::X509VerifyResult::OK;
        Ok(issued && cert.verify(self.key.pkey())?)
    }

    pub(crate) fn certificate(&self) -> &X509Ref {
        &self.certificate
    }

    pub(crate) fn key(&self) -> &SigningKey {
        &self.key
    }
}

/// Owner-only on unix, including when an existing key is replaced.
fn write_private_key(path: &Path, pem: &str) -> SigningResult<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(path)
        .map_err(|e| SigningError::IoError(format!("Failed to create {}: {e}", path.display())))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(pem.as_bytes())?;
    Ok(())
}

impl std::fmt::Debug for CertificateAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let subject = self
            .certificate
            .subject_name()
            .entries_by_nid(openssl::nid::Nid::COMMONNAME)
            .next()
            .map(|e| String::from_utf8_lossy(e.data().as_slice()).into_owned())
            .unwrap_or_default();
        write!(f, "CertificateAuthority({subject})")
    }
}
