use std::fs;
use std::io;

use devcert_pki::{generate_ca, parse_ca, CaMaterial, CertificateProfile};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::files::{exists, write_new};
use crate::{DevcertConfig, DevcertError, DevcertPaths};

/// What `load` found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaStatus {
    Absent,
    Invalid { reason: String },
    Valid(Box<CaMaterial>),
}

impl CaStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    AlreadyValid,
    Created,
    Regenerated,
}

/// The CA certificate/key pair kept at the fixed paths.
#[derive(Debug, Clone)]
pub struct CertAuthority {
    paths: DevcertPaths,
    profile: CertificateProfile,
}

impl CertAuthority {
    pub fn new(paths: DevcertPaths, config: &DevcertConfig) -> Self {
        Self {
            paths,
            profile: config.profile(),
        }
    }

    pub fn paths(&self) -> &DevcertPaths {
        &self.paths
    }

    pub fn load(&self) -> Result<CaStatus, DevcertError> {
        self.load_at(OffsetDateTime::now_utc())
    }

    /// Only unexpected stat failures are errors; anything wrong with the
    /// files themselves yields `CaStatus::Invalid`.
    pub fn load_at(&self, now: OffsetDateTime) -> Result<CaStatus, DevcertError> {
        let cert_path = self.paths.ca_cert();
        let key_path = self.paths.ca_key();
        let cert_exists = exists(&cert_path)
            .map_err(|error| DevcertError::file_io("inspecting", &cert_path, error))?;
        let key_exists = exists(&key_path)
            .map_err(|error| DevcertError::file_io("inspecting", &key_path, error))?;

        let status = match (cert_exists, key_exists) {
            (false, false) => CaStatus::Absent,
            (true, false) | (false, true) => CaStatus::Invalid {
                reason: "CA certificate and key must both exist".to_string(),
            },
            (true, true) => {
                let cert_pem = match fs::read_to_string(&cert_path) {
                    Ok(pem) => pem,
                    Err(error) => {
                        return Ok(CaStatus::Invalid {
                            reason: format!("reading {}: {error}", cert_path.display()),
                        });
                    }
                };
                let key_pem = match fs::read_to_string(&key_path) {
                    Ok(pem) => pem,
                    Err(error) => {
                        return Ok(CaStatus::Invalid {
                            reason: format!("reading {}: {error}", key_path.display()),
                        });
                    }
                };
                match parse_ca(&cert_pem, &key_pem) {
                    Err(error) => CaStatus::Invalid {
                        reason: error.to_string(),
                    },
                    Ok(material) if !material.is_valid_at(now) => CaStatus::Invalid {
                        reason: format!(
                            "certificate is only valid from {} to {}",
                            material.not_before(),
                            material.not_after()
                        ),
                    },
                    Ok(material) => CaStatus::Valid(Box::new(material)),
                }
            }
        };
        debug!(dir = %self.paths.dir().display(), valid = status.is_valid(), "loaded CA status");
        Ok(status)
    }

    /// Generates and persists a new CA. Never overwrites existing files; a
    /// failure part-way leaves cleanup to the caller.
    pub fn create(&self) -> Result<CaMaterial, DevcertError> {
        let material = generate_ca(&self.profile, OffsetDateTime::now_utc())?;
        let cert_path = self.paths.ca_cert();
        let key_path = self.paths.ca_key();

        write_new(&cert_path, material.cert_pem().as_bytes(), false)
            .map_err(|error| DevcertError::file_io("writing", &cert_path, error))?;
        write_new(&key_path, material.key_pem().as_bytes(), true)
            .map_err(|error| DevcertError::file_io("writing", &key_path, error))?;

        info!(
            serial = material.serial(),
            cert = %cert_path.display(),
            key = %key_path.display(),
            "created certificate authority"
        );
        Ok(material)
    }

    /// Deletes both CA files. Both must exist.
    pub fn remove(&self) -> Result<(), DevcertError> {
        let cert_path = self.paths.ca_cert();
        let key_path = self.paths.ca_key();
        for path in [&cert_path, &key_path] {
            let present =
                exists(path).map_err(|error| DevcertError::file_io("inspecting", path, error))?;
            if !present {
                return Err(DevcertError::file_io(
                    "removing",
                    path,
                    io::Error::from(io::ErrorKind::NotFound),
                ));
            }
        }
        fs::remove_file(&cert_path)
            .map_err(|error| DevcertError::file_io("removing", &cert_path, error))?;
        fs::remove_file(&key_path)
            .map_err(|error| DevcertError::file_io("removing", &key_path, error))?;
        info!(dir = %self.paths.dir().display(), "removed certificate authority files");
        Ok(())
    }

    /// Leaves a valid CA untouched; otherwise clears stale files and creates
    /// a fresh one.
    pub fn ensure_valid(&self) -> Result<EnsureOutcome, DevcertError> {
        match self.load()? {
            CaStatus::Valid(material) => {
                debug!(serial = material.serial(), "certificate authority already valid");
                Ok(EnsureOutcome::AlreadyValid)
            }
            CaStatus::Invalid { reason } => {
                warn!(%reason, "regenerating invalid certificate authority");
                self.remove_stale()?;
                self.create()?;
                Ok(EnsureOutcome::Regenerated)
            }
            CaStatus::Absent => {
                self.create()?;
                Ok(EnsureOutcome::Created)
            }
        }
    }

    /// Best-effort removal of whatever CA files exist. Errors are dropped.
    pub(crate) fn discard_files(&self) {
        for path in [self.paths.ca_cert(), self.paths.ca_key()] {
            if let Err(error) = fs::remove_file(&path) {
                debug!(path = %path.display(), %error, "ignoring CA cleanup failure");
            }
        }
    }

    fn remove_stale(&self) -> Result<(), DevcertError> {
        for path in [self.paths.ca_cert(), self.paths.ca_key()] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(error) if error.kind() == io::ErrorKind::NotFound => {}
                Err(error) => return Err(DevcertError::file_io("removing", &path, error)),
            }
        }
        Ok(())
    }
}
