use std::fmt;
use std::fs;
use std::path::Path;

use devcert_pki::{verify_issued_by, CertificateSummary};
use time::OffsetDateTime;
use tracing::debug;

use crate::authority::{CaStatus, CertAuthority};
use crate::DevcertError;

/// Whether an inspected certificate chains to the local CA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainStatus {
    /// No valid devcert CA to compare against.
    NoLocalCa,
    IssuedByLocalCa,
    NotIssuedByLocalCa,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateReport {
    pub summary: CertificateSummary,
    pub currently_valid: bool,
    pub chain: ChainStatus,
}

impl fmt::Display for CertificateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary)?;
        writeln!(
            f,
            "Valid now:   {}",
            if self.currently_valid { "yes" } else { "no" }
        )?;
        let chain = match self.chain {
            ChainStatus::NoLocalCa => "unknown (no valid devcert CA)",
            ChainStatus::IssuedByLocalCa => "yes",
            ChainStatus::NotIssuedByLocalCa => "no",
        };
        write!(f, "devcert CA:  {chain}")
    }
}

/// Reads and summarises the PEM certificate at `path`.
pub fn describe_certificate(
    path: &Path,
    authority: &CertAuthority,
) -> Result<CertificateReport, DevcertError> {
    let pem = fs::read(path).map_err(|error| DevcertError::file_io("reading", path, error))?;
    let summary = CertificateSummary::from_pem(&pem)?;
    let now = OffsetDateTime::now_utc();

    let chain = match authority.load_at(now)? {
        CaStatus::Valid(ca) => match verify_issued_by(&pem, ca.cert_pem().as_bytes()) {
            Ok(()) => ChainStatus::IssuedByLocalCa,
            Err(error) => {
                debug!(%error, "certificate does not chain to the devcert CA");
                ChainStatus::NotIssuedByLocalCa
            }
        },
        CaStatus::Absent | CaStatus::Invalid { .. } => ChainStatus::NoLocalCa,
    };

    Ok(CertificateReport {
        currently_valid: summary.is_valid_at(now),
        summary,
        chain,
    })
}
