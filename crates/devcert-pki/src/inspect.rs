use std::fmt;

use time::OffsetDateTime;
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::GeneralName;
use x509_parser::parse_x509_certificate;
use x509_parser::pem::parse_x509_pem;

use crate::{PkiError, CERTIFICATE_PEM_LABEL};

/// Human-readable fields of a PEM certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSummary {
    pub subject_common_name: Option<String>,
    pub issuer_common_name: Option<String>,
    pub serial: String,
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
    pub is_ca: bool,
    pub dns_names: Vec<String>,
}

impl CertificateSummary {
    pub fn from_pem(pem: &[u8]) -> Result<Self, PkiError> {
        let der = decode_certificate_pem(pem)?;
        let (_, cert) = parse_x509_certificate(&der)
            .map_err(|error| PkiError::Parse(format!("certificate: {error}")))?;
        Self::from_certificate(&cert)
    }

    fn from_certificate(cert: &X509Certificate<'_>) -> Result<Self, PkiError> {
        let dns_names = match cert.subject_alternative_name() {
            Ok(Some(san)) => san
                .value
                .general_names
                .iter()
                .filter_map(|name| match name {
                    GeneralName::DNSName(value) => Some(value.to_string()),
                    _ => None,
                })
                .collect(),
            Ok(None) => Vec::new(),
            Err(error) => {
                return Err(PkiError::Parse(format!("subject alternative name: {error}")));
            }
        };

        Ok(Self {
            subject_common_name: first_common_name(cert.subject()),
            issuer_common_name: first_common_name(cert.issuer()),
            serial: cert.raw_serial_as_string(),
            not_before: timestamp(cert.validity().not_before.timestamp())?,
            not_after: timestamp(cert.validity().not_after.timestamp())?,
            is_ca: cert.is_ca(),
            dns_names,
        })
    }

    pub fn is_valid_at(&self, now: OffsetDateTime) -> bool {
        let now = now.unix_timestamp();
        self.not_before.unix_timestamp() <= now && now <= self.not_after.unix_timestamp()
    }
}

impl fmt::Display for CertificateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Subject:     {}",
            self.subject_common_name.as_deref().unwrap_or("-")
        )?;
        writeln!(
            f,
            "Issuer:      {}",
            self.issuer_common_name.as_deref().unwrap_or("-")
        )?;
        writeln!(f, "Serial:      {}", self.serial)?;
        writeln!(f, "Not before:  {}", self.not_before)?;
        writeln!(f, "Not after:   {}", self.not_after)?;
        writeln!(f, "CA:          {}", if self.is_ca { "yes" } else { "no" })?;
        if self.dns_names.is_empty() {
            write!(f, "DNS names:   -")
        } else {
            write!(f, "DNS names:   {}", self.dns_names.join(", "))
        }
    }
}

/// Checks that `leaf_pem` names `ca_pem` as its issuer and carries a
/// signature made by the CA's key.
pub fn verify_issued_by(leaf_pem: &[u8], ca_pem: &[u8]) -> Result<(), PkiError> {
    let leaf_der = decode_certificate_pem(leaf_pem)?;
    let ca_der = decode_certificate_pem(ca_pem)?;
    let (_, leaf) = parse_x509_certificate(&leaf_der)
        .map_err(|error| PkiError::Parse(format!("leaf certificate: {error}")))?;
    let (_, ca) = parse_x509_certificate(&ca_der)
        .map_err(|error| PkiError::Parse(format!("CA certificate: {error}")))?;

    if leaf.issuer().as_raw() != ca.subject().as_raw() {
        return Err(PkiError::Verification(
            "issuer name does not match CA subject".to_string(),
        ));
    }
    leaf.verify_signature(Some(ca.public_key()))
        .map_err(|error| PkiError::Verification(error.to_string()))
}

fn decode_certificate_pem(pem: &[u8]) -> Result<Vec<u8>, PkiError> {
    let (_, pem) =
        parse_x509_pem(pem).map_err(|error| PkiError::Parse(format!("PEM: {error}")))?;
    if pem.label != CERTIFICATE_PEM_LABEL {
        return Err(PkiError::Parse(format!(
            "expected PEM label {CERTIFICATE_PEM_LABEL}, found {}",
            pem.label
        )));
    }
    Ok(pem.contents)
}

fn first_common_name(name: &x509_parser::x509::X509Name<'_>) -> Option<String> {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string)
}

fn timestamp(seconds: i64) -> Result<OffsetDateTime, PkiError> {
    OffsetDateTime::from_unix_timestamp(seconds)
        .map_err(|error| PkiError::Parse(format!("certificate timestamp: {error}")))
}
