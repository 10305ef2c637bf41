//! `CertificateWorkflow`: issue certificates for known users and optionally
//! store the PEM artifacts on the user record.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::adapters::store::UserStore;
use crate::domain::crypto::IssuedCertificate;
use crate::domain::records::User;
use crate::domain::types::UserId;
use crate::infra::error::{SigningError, SigningResult};
use crate::services::cert_issuer::CertificateIssuer;

/// How a user certificate is signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IssuanceMode {
    #[default]
    SelfSigned,
    /// Always a fresh CA for this one certificate
    EphemeralCa,
    /// The issuer's long-lived CA if one is attached, else ephemeral
    Authority,
}

impl IssuanceMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            IssuanceMode::SelfSigned => "self-signed",
            IssuanceMode::EphemeralCa => "ephemeral",
            IssuanceMode::Authority => "authority",
        }
    }
}

impl FromStr for IssuanceMode {
    type Err = SigningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "self-signed" => Ok(IssuanceMode::SelfSigned),
            "ephemeral" => Ok(IssuanceMode::EphemeralCa),
            "authority" | "ca" => Ok(IssuanceMode::Authority),
            other => Err(SigningError::ValidationError(format!(
                "Unknown issuance mode '{other}'"
            ))),
        }
    }
}

impl fmt::Display for IssuanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct CertificateWorkflow {
    users: Arc<dyn UserStore>,
    issuer: CertificateIssuer,
}

impl CertificateWorkflow {
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>, issuer: CertificateIssuer) -> Self {
        Self { users, issuer }
    }

    #[must_use]
    pub fn issuer(&self) -> &CertificateIssuer {
        &self.issuer
    }

    /// Issue a certificate for `user_id` using the user's name and email.
    /// With `persist` the PEM fields are written back onto the user.
    pub fn create_user_certificate(
        &self,
        user_id: &UserId,
        mode: IssuanceMode,
        persist: bool,
    ) -> SigningResult<IssuedCertificate> {
        let mut user = self.user(user_id)?;
        let issued = match mode {
            IssuanceMode::SelfSigned => self
                .issuer
                .self_signed_user_certificate(&user.name, &user.email)?,
            IssuanceMode::EphemeralCa => self.issuer.issue_via_ephemeral_ca(&user.name, &user.email)?,
            IssuanceMode::Authority => self.issuer.issue_user_certificate(&user.name, &user.email)?,
        };

        if persist {
            user.cert_pem = Some(issued.certificate_pem.clone());
            user.private_key_pem = Some(issued.private_key_pem.clone());
            user.public_key_pem = Some(issued.public_key_pem.clone());
            self.users.update(&user)?;
            log::info!("Stored {mode} certificate on user {user_id}");
        }
        Ok(issued)
    }

    /// Sign a CSR submitted by `user_id`. The certificate is not stored.
    pub fn issue_from_csr(&self, user_id: &UserId, csr_pem: &str) -> SigningResult<String> {
        self.user(user_id)?;
        self.issuer.issue_from_csr(csr_pem)
    }

    fn user(&self, user_id: &UserId) -> SigningResult<User> {
        self.users
            .get_by_id(user_id)?
            .ok_or_else(|| SigningError::UserNotFound(user_id.clone()))
    }
}
