use std::fmt;

use serde::{Deserialize, Serialize};

use crate::infra::error::SigningError;

/// PEM artifacts produced by one certificate issuance.
///
/// `issuer_certificate_pem` is set when the certificate was signed by a CA
/// (ephemeral or long-lived) rather than self-signed.
#[derive(Clone, Serialize, Deserialize)]
pub struct IssuedCertificate {
    pub certificate_pem: String,
    pub private_key_pem: String,
    pub public_key_pem: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_certificate_pem: Option<String>,
}

impl fmt::Debug for IssuedCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material.
        write!(
            f,
            "IssuedCertificate(cert_len={}, ca_signed={})",
            self.certificate_pem.len(),
            self.issuer_certificate_pem.is_some()
        )
    }
}

/// Fields read back from an issued certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateSummary {
    pub subject: String,
    pub issuer: String,
    pub subject_common_name: Option<String>,
    pub issuer_common_name: Option<String>,
    pub serial_number: String,
    /// Validity start, seconds since the Unix epoch
    pub not_before: i64,
    /// Validity end, seconds since the Unix epoch
    pub not_after: i64,
    pub is_ca: bool,
}

impl CertificateSummary {
    #[must_use]
    pub fn is_self_issued(&self) -> bool {
        self.subject == self.issuer
    }

    #[must_use]
    pub fn validity_seconds(&self) -> i64 {
        self.not_after - self.not_before
    }
}

/// How certificate serial numbers are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerialNumberPolicy {
    /// Nanoseconds since the Unix epoch at issuance
    #[default]
    Timestamp,
    /// 128 random bits, top bit cleared
    Random,
}

impl SerialNumberPolicy {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SerialNumberPolicy::Timestamp => "timestamp",
            SerialNumberPolicy::Random => "random",
        }
    }
}

impl std::str::FromStr for SerialNumberPolicy {
    type Err = SigningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "timestamp" => Ok(SerialNumberPolicy::Timestamp),
            "random" => Ok(SerialNumberPolicy::Random),
            other => Err(SigningError::ValidationError(format!(
                "Unknown serial policy '{other}'. Expected 'timestamp' or 'random'"
            ))),
        }
    }
}

impl fmt::Display for SerialNumberPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_policy_parses_and_defaults_to_timestamp() {
        assert_eq!(SerialNumberPolicy::default(), SerialNumberPolicy::Timestamp);
        assert_eq!(
            "Timestamp".parse::<SerialNumberPolicy>().unwrap(),
            SerialNumberPolicy::Timestamp
        );
        assert!("sequential".parse::<SerialNumberPolicy>().is_err());
    }

    #[test]
    fn summary_helpers() {
        let summary = CertificateSummary {
            subject: "CN=a".into(),
            issuer: "CN=a".into(),
            subject_common_name: Some("a".into()),
            issuer_common_name: Some("a".into()),
            serial_number: "01".into(),
            not_before: 100,
            not_after: 400,
            is_ca: false,
        };
        assert!(summary.is_self_issued());
        assert_eq!(summary.validity_seconds(), 300);
    }
}
