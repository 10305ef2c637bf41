//! X.509 construction shared by the issuer and the certificate authority.

use chrono::{Months, Utc};
use openssl::asn1::{Asn1Integer, Asn1Time};
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{HasPublic, PKeyRef, Private};
use openssl::x509::extension::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, KeyUsage, SubjectAlternativeName,
    SubjectKeyIdentifier,
};
use openssl::x509::{X509Builder, X509Name, X509NameBuilder, X509NameRef, X509Ref, X509Req, X509ReqBuilder, X509};
use rand::RngCore;

use crate::domain::constants::{
    CA_CERT_VALIDITY_MONTHS, RANDOM_SERIAL_BYTES, USER_CERT_VALIDITY_MONTHS,
};
use crate::domain::crypto::SerialNumberPolicy;
use crate::infra::error::{SigningError, SigningResult};

/// Who signs a certificate being built.
#[derive(Clone, Copy)]
pub(crate) enum Issuer<'a> {
    /// Subject signs its own certificate
    SelfSigned(&'a PKeyRef<Private>),
    /// A CA certificate and its key
    Authority(&'a X509Ref, &'a PKeyRef<Private>),
}

/// `CN`, `O` and optional `emailAddress`.
pub(crate) fn subject_name(
    common_name: &str,
    organization: &str,
    email: Option<&str>,
) -> SigningResult<X509Name> {
    if common_name.trim().is_empty() {
        return Err(SigningError::ValidationError(
            "common name must not be empty".to_string(),
        ));
    }
    let mut name = X509NameBuilder::new()?;
    name.append_entry_by_nid(Nid::COMMONNAME, common_name)?;
    if !organization.is_empty() {
        name.append_entry_by_nid(Nid::ORGANIZATIONNAME, organization)?;
    }
    if let Some(email) = email {
        name.append_entry_by_nid(Nid::PKCS9_EMAILADDRESS, email)?;
    }
    Ok(name.build())
}

pub(crate) fn serial_number(policy: SerialNumberPolicy) -> SigningResult<Asn1Integer> {
    let bn = match policy {
        SerialNumberPolicy::Timestamp => {
            let nanos = Utc::now().timestamp_nanos_opt().ok_or_else(|| {
                SigningError::CertificateError("clock out of range for serial".to_string())
            })?;
            BigNum::from_dec_str(&nanos.to_string())?
        }
        SerialNumberPolicy::Random => {
            let mut bytes = [0u8; RANDOM_SERIAL_BYTES];
            rand::thread_rng().fill_bytes(&mut bytes);
            // Positive and never zero.
            bytes[0] = (bytes[0] & 0x7f) | 0x01;
            BigNum::from_slice(&bytes)?
        }
    };
    Ok(bn.to_asn1_integer()?)
}

/// Now until now plus `months` calendar months.
fn validity_window(months: u32) -> SigningResult<(Asn1Time, Asn1Time)> {
    let now = Utc::now();
    let until = now.checked_add_months(Months::new(months)).ok_or_else(|| {
        SigningError::CertificateError(format!("validity of {months} months overflows"))
    })?;
    Ok((
        Asn1Time::from_unix(now.timestamp())?,
        Asn1Time::from_unix(until.timestamp())?,
    ))
}

/// One-year client certificate: digitalSignature + keyEncipherment, EKU clientAuth.
pub(crate) fn client_certificate<T: HasPublic>(
    subject: &X509NameRef,
    email: Option<&str>,
    public_key: &PKeyRef<T>,
    issuer: Issuer<'_>,
    policy: SerialNumberPolicy,
) -> SigningResult<X509> {
    let (issuer_cert, signer) = match issuer {
        Issuer::SelfSigned(key) => (None, key),
        Issuer::Authority(cert, key) => (Some(cert), key),
    };

    let mut builder = X509Builder::new()?;
    builder.set_version(2)?;
    let serial = serial_number(policy)?;
    builder.set_serial_number(&serial)?;
    builder.set_subject_name(subject)?;
    match issuer_cert {
        Some(cert) => builder.set_issuer_name(cert.subject_name())?,
        None => builder.set_issuer_name(subject)?,
    }
    builder.set_pubkey(public_key)?;

    let (not_before, not_after) = validity_window(USER_CERT_VALIDITY_MONTHS)?;
    builder.set_not_before(&not_before)?;
    builder.set_not_after(&not_after)?;

    builder.append_extension(
        KeyUsage::new()
            .critical()
            .digital_signature()
            .key_encipherment()
            .build()?,
    )?;
    builder.append_extension(ExtendedKeyUsage::new().client_auth().build()?)?;

    if let Some(email) = email {
        let san = {
            let ctx = builder.x509v3_context(issuer_cert, None);
            SubjectAlternativeName::new().email(email).build(&ctx)?
        };
        builder.append_extension(san)?;
    }
    let ski = {
        let ctx = builder.x509v3_context(issuer_cert, None);
        SubjectKeyIdentifier::new().build(&ctx)?
    };
    builder.append_extension(ski)?;
    if issuer_cert.is_some() {
        let aki = {
            let ctx = builder.x509v3_context(issuer_cert, None);
            AuthorityKeyIdentifier::new().keyid(false).build(&ctx)?
        };
        builder.append_extension(aki)?;
    }

    builder.sign(signer, MessageDigest::sha256())?;
    Ok(builder.build())
}

/// Self-signed ten-year CA certificate.
pub(crate) fn ca_certificate(
    common_name: &str,
    organization: &str,
    key: &PKeyRef<Private>,
    policy: SerialNumberPolicy,
) -> SigningResult<X509> {
    let name = subject_name(common_name, organization, None)?;

    let mut builder = X509Builder::new()?;
    builder.set_version(2)?;
    let serial = serial_number(policy)?;
    builder.set_serial_number(&serial)?;
    builder.set_subject_name(&name)?;
    builder.set_issuer_name(&name)?;
    builder.set_pubkey(key)?;

    let (not_before, not_after) = validity_window(CA_CERT_VALIDITY_MONTHS)?;
    builder.set_not_before(&not_before)?;
    builder.set_not_after(&not_after)?;

    builder.append_extension(BasicConstraints::new().critical().ca().build()?)?;
    builder.append_extension(
        KeyUsage::new()
            .critical()
            .key_cert_sign()
            .crl_sign()
            .build()?,
    )?;
    let ski = {
        let ctx = builder.x509v3_context(None, None);
        SubjectKeyIdentifier::new().build(&ctx)?
    };
    builder.append_extension(ski)?;

    builder.sign(key, MessageDigest::sha256())?;
    Ok(builder.build())
}

pub(crate) fn certificate_request(
    subject: &X509NameRef,
    key: &PKeyRef<Private>,
) -> SigningResult<X509Req> {
    let mut builder = X509ReqBuilder::new()?;
    builder.set_version(0)?;
    builder.set_subject_name(subject)?;
    builder.set_pubkey(key)?;
    builder.sign(key, MessageDigest::sha256())?;
    Ok(builder.build())
}

pub(crate) fn certificate_pem(cert: &X509Ref) -> SigningResult<String> {
    let pem = cert.to_pem()?;
    String::from_utf8(pem).map_err(|e| SigningError::CertificateError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::keys::KeyService;

    #[test]
    fn random_serials_are_positive_and_distinct() {
        let a = serial_number(SerialNumberPolicy::Random).unwrap();
        let b = serial_number(SerialNumberPolicy::Random).unwrap();
        let a = a.to_bn().unwrap();
        let b = b.to_bn().unwrap();
        assert!(!a.is_negative());
        assert_ne!(a, b);
        assert!(a.num_bits() <= 127);
    }

    #[test]
    fn timestamp_serial_is_positive() {
        let serial = serial_number(SerialNumberPolicy::Timestamp)
            .unwrap()
            .to_bn()
            .unwrap();
        assert!(!serial.is_negative());
        assert!(serial.num_bits() > 32);
    }

    #[test]
    fn ca_certificate_is_self_issued() {
        let pair = KeyService::new().generate_key_pair().unwrap();
        let ca = ca_certificate("Test CA", "Org", pair.signing_key().pkey(), SerialNumberPolicy::Random)
            .unwrap();
        assert!(ca.verify(pair.signing_key().pkey()).unwrap());
        assert!(certificate_pem(&ca).unwrap().starts_with("-----BEGIN CERTIFICATE-----"));
    }

    #[test]
    fn empty_common_name_is_rejected() {
        assert!(matches!(
            subject_name("  ", "Org", None),
            Err(SigningError::ValidationError(_))
        ));
    }
}
