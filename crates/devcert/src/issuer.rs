use std::path::PathBuf;

use devcert_pki::{invalid_domains, CertificateProfile, LeafRequest};
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::authority::{CaStatus, CertAuthority};
use crate::files::write_replacing;
use crate::{DevcertConfig, DevcertError};

/// Paths written by one issuance and the domains the leaf covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCertificate {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
    pub domains: Vec<String>,
}

impl IssuedCertificate {
    /// The user-facing report printed after a successful run.
    pub fn report(&self) -> String {
        let mut report = format!(
            "Generated at:\n  Certificate: {}\n  Private Key: {}\n\nValid for:\n",
            self.cert_path.display(),
            self.key_path.display()
        );
        for (index, domain) in self.domains.iter().enumerate() {
            report.push_str(&format!("  {}. {domain}\n", index + 1));
        }
        report
    }
}

pub struct CertIssuer<'a> {
    authority: &'a CertAuthority,
    profile: CertificateProfile,
}

impl<'a> CertIssuer<'a> {
    pub fn new(authority: &'a CertAuthority, config: &DevcertConfig) -> Self {
        Self {
            authority,
            profile: config.profile(),
        }
    }

    /// Validates the whole batch first; nothing else happens unless every
    /// domain passes. Never creates a CA.
    pub fn issue(&self, domains: &[String]) -> Result<IssuedCertificate, DevcertError> {
        let Some(first_domain) = domains.first() else {
            return Err(DevcertError::NoDomains);
        };
        let rejected = invalid_domains(domains);
        if !rejected.is_empty() {
            return Err(DevcertError::DomainValidation { domains: rejected });
        }

        let now = OffsetDateTime::now_utc();
        let request = LeafRequest::prepare(domains, &self.profile, now)?;
        debug!(domains = ?request.domains(), "prepared leaf certificate");

        let ca = match self.authority.load_at(now)? {
            CaStatus::Valid(material) => material,
            CaStatus::Invalid { reason } => return Err(DevcertError::CaInvalid(reason)),
            CaStatus::Absent => {
                return Err(DevcertError::CaInvalid(
                    "no certificate authority has been created".to_string(),
                ));
            }
        };
        let leaf = request.sign(&ca, now)?;

        let paths = self.authority.paths();
        let cert_path = paths.leaf_cert(first_domain);
        let key_path = paths.leaf_key(first_domain);
        write_replacing(&cert_path, leaf.cert_pem.as_bytes(), false)
            .map_err(|error| DevcertError::file_io("writing", &cert_path, error))?;
        write_replacing(&key_path, leaf.key_pem.as_bytes(), true)
            .map_err(|error| DevcertError::file_io("writing", &key_path, error))?;

        info!(cert = %cert_path.display(), domains = leaf.domains.len(), "issued leaf certificate");
        Ok(IssuedCertificate {
            cert_path,
            key_path,
            domains: leaf.domains,
        })
    }
}
