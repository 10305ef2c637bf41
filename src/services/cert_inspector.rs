//! Certificate inspection service.

use der::oid::{AssociatedOid, ObjectIdentifier};
use der::Decode;
use x509_cert::ext::pkix::BasicConstraints;
use x509_cert::name::Name;
use x509_cert::Certificate;

use crate::domain::constants::PEM_CERTIFICATE;
use crate::domain::crypto::CertificateSummary;
use crate::infra::error::{SigningError, SigningResult};

const COMMON_NAME_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");

pub struct CertificateInspector;

impl CertificateInspector {
    pub fn inspect_pem(pem: &str) -> SigningResult<CertificateSummary> {
        let (label, der_bytes) = der::pem::decode_vec(pem.trim().as_bytes())
            .map_err(|e| SigningError::CertificateError(format!("invalid PEM: {e}")))?;
        if label != PEM_CERTIFICATE {
            return Err(SigningError::CertificateError(format!(
                "expected PEM label {PEM_CERTIFICATE}, found {label}"
            )));
        }
        Self::inspect_der(&der_bytes)
    }

    pub fn inspect_der(der_bytes: &[u8]) -> SigningResult<CertificateSummary> {
        let certificate = Certificate::from_der(der_bytes)?;
        let tbs = &certificate.tbs_certificate;

        let summary = CertificateSummary {
            subject: tbs.subject.to_string(),
            issuer: tbs.issuer.to_string(),
            subject_common_name: Self::common_name(&tbs.subject),
            issuer_common_name: Self::common_name(&tbs.issuer),
            serial_number: hex::encode_upper(tbs.serial_number.as_bytes()),
            not_before: tbs.validity.not_before.to_unix_duration().as_secs() as i64,
            not_after: tbs.validity.not_after.to_unix_duration().as_secs() as i64,
            is_ca: Self::is_ca(&certificate)?,
        };
        log::debug!("Certificate subject: {}", summary.subject);
        log::debug!("Certificate issuer: {}", summary.issuer);
        Ok(summary)
    }

    fn common_name(name: &Name) -> Option<String> {
        name.0
            .iter()
            .flat_map(|rdn| rdn.0.iter())
            .find(|atv| atv.oid == COMMON_NAME_OID)
            .map(|atv| String::from_utf8_lossy(atv.value.value()).into_owned())
    }

    fn is_ca(certificate: &Certificate) -> SigningResult<bool> {
        let Some(extensions) = &certificate.tbs_certificate.extensions else {
            return Ok(false);
        };
        for ext in extensions {
            if ext.extn_id == BasicConstraints::OID {
                let constraints = BasicConstraints::from_der(ext.extn_value.as_bytes())?;
                return Ok(constraints.ca);
            }
        }
        Ok(false)
    }
}
