//! Certificate material for the devcert local development CA.
//!
//! This crate knows how to mint RSA keys, build the self-signed CA and the
//! leaf certificates it signs, and encode all of it as PEM. It has no idea
//! where files live or how the host trust store works; see the `devcert`
//! crate for that.

use std::error::Error as StdError;
use std::fmt;

mod ca_material;
mod domain;
mod inspect;
mod key;
mod leaf;
mod validity;

pub use ca_material::{generate_ca, parse_ca, CaMaterial};
pub use domain::{invalid_domains, is_valid_domain};
pub use inspect::{verify_issued_by, CertificateSummary};
pub use key::RsaKeyMaterial;
pub use leaf::{leaf_common_name, LeafMaterial, LeafRequest};
pub use validity::add_months;

pub const CA_COMMON_NAME: &str = "Devcert Certificate Authority (CA)";
pub const LEAF_COMMON_NAME_PREFIX: &str = "Devcert Certificate - ";

/// Subject key identifier stamped on every leaf. It is not derived from the
/// leaf public key.
pub const LEAF_SUBJECT_KEY_ID: [u8; 5] = [1, 2, 3, 4, 6];

pub const CERTIFICATE_PEM_LABEL: &str = "CERTIFICATE";
pub const RSA_PRIVATE_KEY_PEM_LABEL: &str = "RSA PRIVATE KEY";

pub const SUPPORTED_RSA_KEY_BITS: [usize; 3] = [2048, 3072, 4096];

/// Key size and lifetimes used when minting certificates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertificateProfile {
    pub rsa_key_bits: usize,
    pub ca_validity_months: u32,
    pub leaf_validity_months: u32,
}

impl Default for CertificateProfile {
    fn default() -> Self {
        Self {
            rsa_key_bits: 4096,
            ca_validity_months: 5 * 12,
            leaf_validity_months: 11,
        }
    }
}

#[derive(Debug)]
pub enum PkiError {
    KeyGeneration(rsa::Error),
    KeyEncoding(String),
    CertificateGeneration(rcgen::Error),
    Parse(String),
    KeyMismatch,
    CaNotValid,
    InvalidValidity(String),
    Verification(String),
}

impl fmt::Display for PkiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyGeneration(error) => write!(f, "RSA key generation failed: {error}"),
            Self::KeyEncoding(detail) => write!(f, "private key encoding failed: {detail}"),
            Self::CertificateGeneration(error) => {
                write!(f, "certificate generation failed: {error}")
            }
            Self::Parse(detail) => write!(f, "certificate material parse failed: {detail}"),
            Self::KeyMismatch => write!(f, "private key does not match certificate public key"),
            Self::CaNotValid => write!(f, "certificate authority is outside its validity window"),
            Self::InvalidValidity(detail) => write!(f, "invalid validity period: {detail}"),
            Self::Verification(detail) => write!(f, "certificate verification failed: {detail}"),
        }
    }
}

impl StdError for PkiError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::KeyGeneration(error) => Some(error),
            Self::CertificateGeneration(error) => Some(error),
            _ => None,
        }
    }
}

impl From<rcgen::Error> for PkiError {
    fn from(value: rcgen::Error) -> Self {
        Self::CertificateGeneration(value)
    }
}

impl From<rsa::Error> for PkiError {
    fn from(value: rsa::Error) -> Self {
        Self::KeyGeneration(value)
    }
}

impl From<rsa::pkcs1::Error> for PkiError {
    fn from(value: rsa::pkcs1::Error) -> Self {
        Self::KeyEncoding(value.to_string())
    }
}

impl From<rsa::pkcs8::Error> for PkiError {
    fn from(value: rsa::pkcs8::Error) -> Self {
        Self::KeyEncoding(value.to_string())
    }
}
