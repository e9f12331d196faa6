use std::path::Path;

use super::TrustInstaller;
use crate::DevcertError;

/// Stands in on hosts without a trust backend so only installation fails.
#[derive(Debug)]
pub struct UnsupportedTrust {
    reason: String,
}

impl UnsupportedTrust {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl TrustInstaller for UnsupportedTrust {
    fn install(&self, _ca_cert_path: &Path) -> Result<(), DevcertError> {
        Err(DevcertError::PlatformUnsupported(self.reason.clone()))
    }
}
