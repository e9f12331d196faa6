use devcert_pki::{CertificateProfile, SUPPORTED_RSA_KEY_BITS};

use crate::DevcertError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DevcertConfig {
    pub rsa_key_bits: usize,
    pub ca_validity_years: u32,
    pub leaf_validity_months: u32,
}

impl Default for DevcertConfig {
    fn default() -> Self {
        Self {
            rsa_key_bits: 4096,
            ca_validity_years: 5,
            leaf_validity_months: 11,
        }
    }
}

impl DevcertConfig {
    pub fn validate(&self) -> Result<(), DevcertError> {
        if !SUPPORTED_RSA_KEY_BITS.contains(&self.rsa_key_bits) {
            return Err(DevcertError::InvalidConfig(format!(
                "rsa_key_bits must be one of {SUPPORTED_RSA_KEY_BITS:?}, got {}",
                self.rsa_key_bits
            )));
        }
        if self.ca_validity_years == 0 {
            return Err(DevcertError::InvalidConfig(
                "ca_validity_years must be greater than zero".to_string(),
            ));
        }
        if self.ca_validity_years > 100 {
            return Err(DevcertError::InvalidConfig(
                "ca_validity_years must not exceed 100".to_string(),
            ));
        }
        if self.leaf_validity_months == 0 {
            return Err(DevcertError::InvalidConfig(
                "leaf_validity_months must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn profile(&self) -> CertificateProfile {
        CertificateProfile {
            rsa_key_bits: self.rsa_key_bits,
            ca_validity_months: self.ca_validity_years * 12,
            leaf_validity_months: self.leaf_validity_months,
        }
    }
}
