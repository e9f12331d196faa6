use std::path::{Path, PathBuf};

use crate::DevcertError;

pub const DEVCERT_DIR_NAME: &str = ".devcert";
pub const CA_CERT_FILE_NAME: &str = "devcert_ca.crt";
pub const CA_KEY_FILE_NAME: &str = "devcert_ca.key";

/// Fixed on-disk layout under `<home>/.devcert`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevcertPaths {
    dir: PathBuf,
}

impl DevcertPaths {
    pub fn from_home(home: impl AsRef<Path>) -> Self {
        Self {
            dir: home.as_ref().join(DEVCERT_DIR_NAME),
        }
    }

    /// Resolves the current user's home directory.
    pub fn resolve() -> Result<Self, DevcertError> {
        let home = dirs::home_dir().ok_or_else(|| {
            DevcertError::PathResolution("unable to determine the home directory".to_string())
        })?;
        Ok(Self::from_home(home))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ca_cert(&self) -> PathBuf {
        self.dir.join(CA_CERT_FILE_NAME)
    }

    pub fn ca_key(&self) -> PathBuf {
        self.dir.join(CA_KEY_FILE_NAME)
    }

    pub fn leaf_cert(&self, first_domain: &str) -> PathBuf {
        self.dir.join(format!("devcert_{first_domain}_multi.crt"))
    }

    pub fn leaf_key(&self, first_domain: &str) -> PathBuf {
        self.dir.join(format!("devcert_{first_domain}_multi.key"))
    }
}
