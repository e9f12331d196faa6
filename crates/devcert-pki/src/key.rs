use rcgen::KeyPair;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey, LineEnding};
use rsa::pkcs8::EncodePrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use rustls_pki_types::PrivatePkcs8KeyDer;

use crate::{PkiError, SUPPORTED_RSA_KEY_BITS};

/// An RSA private key, persisted as PKCS#1 and handed to rcgen as PKCS#8.
#[derive(Clone)]
pub struct RsaKeyMaterial {
    key: RsaPrivateKey,
}

impl RsaKeyMaterial {
    pub fn generate(bits: usize) -> Result<Self, PkiError> {
        if !SUPPORTED_RSA_KEY_BITS.contains(&bits) {
            return Err(PkiError::KeyEncoding(format!(
                "unsupported RSA key size {bits}"
            )));
        }
        let mut rng = rand::thread_rng();
        let key = RsaPrivateKey::new(&mut rng, bits)?;
        Ok(Self { key })
    }

    pub fn from_pkcs1_pem(pem: &str) -> Result<Self, PkiError> {
        let key = RsaPrivateKey::from_pkcs1_pem(pem)?;
        Ok(Self { key })
    }

    pub fn to_pkcs1_pem(&self) -> Result<String, PkiError> {
        let pem = self.key.to_pkcs1_pem(LineEnding::LF)?;
        Ok(pem.as_str().to_owned())
    }

    pub fn to_pkcs1_der(&self) -> Result<Vec<u8>, PkiError> {
        let der = self.key.to_pkcs1_der()?;
        Ok(der.as_bytes().to_vec())
    }

    pub fn bits(&self) -> usize {
        self.key.size() * 8
    }

    /// Big-endian modulus and public exponent, without leading zero bytes.
    pub fn public_components(&self) -> (Vec<u8>, Vec<u8>) {
        (self.key.n().to_bytes_be(), self.key.e().to_bytes_be())
    }

    pub(crate) fn signing_key(&self) -> Result<KeyPair, PkiError> {
        let pkcs8 = self.key.to_pkcs8_der()?;
        let der = PrivatePkcs8KeyDer::from(pkcs8.as_bytes());
        KeyPair::from_pkcs8_der_and_sign_algo(&der, &rcgen::PKCS_RSA_SHA256).map_err(Into::into)
    }
}

impl std::fmt::Debug for RsaKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaKeyMaterial")
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}

impl PartialEq for RsaKeyMaterial {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for RsaKeyMaterial {}

#[cfg(test)]
mod tests {
    use super::RsaKeyMaterial;
    use crate::RSA_PRIVATE_KEY_PEM_LABEL;

    #[test]
    fn pkcs1_pem_round_trip_preserves_key() {
        let key = RsaKeyMaterial::generate(2048).expect("generate key");
        let pem = key.to_pkcs1_pem().expect("encode pem");
        assert!(pem.starts_with(&format!("-----BEGIN {RSA_PRIVATE_KEY_PEM_LABEL}-----")));

        let decoded = RsaKeyMaterial::from_pkcs1_pem(&pem).expect("decode pem");
        assert_eq!(decoded, key);
        assert_eq!(
            decoded.to_pkcs1_der().expect("decoded der"),
            key.to_pkcs1_der().expect("original der")
        );
        assert_eq!(decoded.bits(), 2048);
    }

    #[test]
    fn rejects_unsupported_key_size() {
        let error = RsaKeyMaterial::generate(1024).expect_err("1024-bit keys must be rejected");
        assert!(error.to_string().contains("unsupported RSA key size 1024"));
    }

    #[test]
    fn rejects_garbage_pem() {
        assert!(RsaKeyMaterial::from_pkcs1_pem("not a key").is_err());
    }
}
