use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose, IsCa,
    KeyUsagePurpose, SerialNumber,
};
use time::OffsetDateTime;
use x509_parser::parse_x509_certificate;
use x509_parser::pem::parse_x509_pem;
use x509_parser::public_key::PublicKey;

use crate::validity::add_months;
use crate::{
    CertificateProfile, PkiError, RsaKeyMaterial, CA_COMMON_NAME, CERTIFICATE_PEM_LABEL,
};

/// A parsed CA certificate together with its private key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaMaterial {
    cert_pem: String,
    cert_der: Vec<u8>,
    key_pem: String,
    key: RsaKeyMaterial,
    serial: String,
    not_before: OffsetDateTime,
    not_after: OffsetDateTime,
}

impl CaMaterial {
    pub fn cert_pem(&self) -> &str {
        &self.cert_pem
    }

    pub fn cert_der(&self) -> &[u8] {
        &self.cert_der
    }

    pub fn key_pem(&self) -> &str {
        &self.key_pem
    }

    pub fn key(&self) -> &RsaKeyMaterial {
        &self.key
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn not_before(&self) -> OffsetDateTime {
        self.not_before
    }

    pub fn not_after(&self) -> OffsetDateTime {
        self.not_after
    }

    /// `not_before <= now <= not_after`, at the one-second resolution X.509
    /// timestamps carry.
    pub fn is_valid_at(&self, now: OffsetDateTime) -> bool {
        let now = now.unix_timestamp();
        self.not_before.unix_timestamp() <= now && now <= self.not_after.unix_timestamp()
    }
}

/// Mints a fresh self-signed CA valid from `now` for the profile's CA
/// lifetime.
pub fn generate_ca(
    profile: &CertificateProfile,
    now: OffsetDateTime,
) -> Result<CaMaterial, PkiError> {
    let not_after = add_months(now, profile.ca_validity_months)?;
    generate_ca_with_validity(profile.rsa_key_bits, now, not_after)
}

pub(crate) fn generate_ca_with_validity(
    rsa_key_bits: usize,
    not_before: OffsetDateTime,
    not_after: OffsetDateTime,
) -> Result<CaMaterial, PkiError> {
    if not_after < not_before {
        return Err(PkiError::InvalidValidity(
            "not_after precedes not_before".to_string(),
        ));
    }
    let key = RsaKeyMaterial::generate(rsa_key_bits)?;
    let signing_key = key.signing_key()?;
    let params = build_ca_params(not_before, not_after);
    let cert = params.self_signed(&signing_key)?;
    let key_pem = key.to_pkcs1_pem()?;
    material_from_parts(cert.pem(), key_pem, key)
}

/// Parses a PEM certificate and PKCS#1 PEM key and checks that they belong
/// together. Validity dates are not evaluated here.
pub fn parse_ca(cert_pem: &str, key_pem: &str) -> Result<CaMaterial, PkiError> {
    let key = RsaKeyMaterial::from_pkcs1_pem(key_pem)?;
    validate_ca_material_with_openssl(cert_pem, key_pem)?;
    material_from_parts(cert_pem.to_string(), key_pem.to_string(), key)
}

fn material_from_parts(
    cert_pem: String,
    key_pem: String,
    key: RsaKeyMaterial,
) -> Result<CaMaterial, PkiError> {
    let (_, pem) = parse_x509_pem(cert_pem.as_bytes())
        .map_err(|error| PkiError::Parse(format!("CA certificate PEM: {error}")))?;
    if pem.label != CERTIFICATE_PEM_LABEL {
        return Err(PkiError::Parse(format!(
            "expected PEM label {CERTIFICATE_PEM_LABEL}, found {}",
            pem.label
        )));
    }
    let cert_der = pem.contents;
    let (_, cert) = parse_x509_certificate(&cert_der)
        .map_err(|error| PkiError::Parse(format!("CA certificate: {error}")))?;

    match cert.public_key().parsed() {
        Ok(PublicKey::RSA(rsa)) => {
            let (modulus, exponent) = key.public_components();
            if strip_leading_zeros(rsa.modulus) != modulus.as_slice()
                || strip_leading_zeros(rsa.exponent) != exponent.as_slice()
            {
                return Err(PkiError::KeyMismatch);
            }
        }
        Ok(_) => return Err(PkiError::KeyMismatch),
        Err(error) => {
            return Err(PkiError::Parse(format!("CA public key: {error}")));
        }
    }

    let not_before = timestamp(cert.validity().not_before.timestamp())?;
    let not_after = timestamp(cert.validity().not_after.timestamp())?;
    let serial = cert.raw_serial_as_string();

    Ok(CaMaterial {
        cert_pem,
        key_pem,
        key,
        serial,
        not_before,
        not_after,
        cert_der,
    })
}

fn build_ca_params(not_before: OffsetDateTime, not_after: OffsetDateTime) -> CertificateParams {
    let mut params = CertificateParams::default();
    params.serial_number = Some(random_serial());
    params.not_before = not_before;
    params.not_after = not_after;
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyCertSign,
    ];
    params.extended_key_usages = vec![
        ExtendedKeyUsagePurpose::ClientAuth,
        ExtendedKeyUsagePurpose::ServerAuth,
    ];

    let mut distinguished_name = DistinguishedName::new();
    distinguished_name.push(DnType::CommonName, CA_COMMON_NAME);
    params.distinguished_name = distinguished_name;
    params
}

/// Positive 63-bit serial.
pub(crate) fn random_serial() -> SerialNumber {
    let value = (rand::random::<u64>() >> 1).max(1);
    SerialNumber::from(value)
}

fn timestamp(seconds: i64) -> Result<OffsetDateTime, PkiError> {
    OffsetDateTime::from_unix_timestamp(seconds)
        .map_err(|error| PkiError::Parse(format!("certificate timestamp: {error}")))
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|byte| *byte != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

#[cfg(feature = "openssl-backend")]
fn validate_ca_material_with_openssl(cert_pem: &str, key_pem: &str) -> Result<(), PkiError> {
    use openssl::pkey::PKey;
    use openssl::x509::X509;

    let cert = X509::from_pem(cert_pem.as_bytes())
        .map_err(|error| PkiError::Parse(format!("openssl CA certificate: {error}")))?;
    let key = PKey::private_key_from_pem(key_pem.as_bytes())
        .map_err(|error| PkiError::Parse(format!("openssl CA private key: {error}")))?;
    let public = cert
        .public_key()
        .map_err(|error| PkiError::Parse(format!("openssl CA public key: {error}")))?;
    if !public.public_eq(&key) {
        return Err(PkiError::KeyMismatch);
    }
    Ok(())
}

#[cfg(not(feature = "openssl-backend"))]
fn validate_ca_material_with_openssl(_cert_pem: &str, _key_pem: &str) -> Result<(), PkiError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use time::{Duration, OffsetDateTime};
    use x509_parser::extensions::ParsedExtension;
    use x509_parser::parse_x509_certificate;
    use x509_parser::pem::parse_x509_pem;

    use super::{build_ca_params, generate_ca, generate_ca_with_validity, parse_ca};
    use crate::{CertificateProfile, PkiError, RsaKeyMaterial, CA_COMMON_NAME};

    fn test_profile() -> CertificateProfile {
        CertificateProfile {
            rsa_key_bits: 2048,
            ..CertificateProfile::default()
        }
    }

    #[test]
    fn generated_ca_is_valid_immediately() {
        let now = OffsetDateTime::now_utc();
        let ca = generate_ca(&test_profile(), now).expect("generate ca");
        assert!(ca.is_valid_at(now));
        assert!(ca.is_valid_at(OffsetDateTime::now_utc()));
        assert!(ca.not_before() <= now);
        assert_eq!(ca.not_after().year(), now.year() + 5);
        assert!(!ca.is_valid_at(ca.not_after() + Duration::seconds(1)));
        assert!(!ca.is_valid_at(ca.not_before() - Duration::seconds(1)));
    }

    #[test]
    fn generated_ca_carries_expected_fields() {
        let ca = generate_ca(&test_profile(), OffsetDateTime::now_utc()).expect("generate ca");
        let (_, cert) = parse_x509_certificate(ca.cert_der()).expect("parse x509");

        let cn = cert
            .subject()
            .iter_common_name()
            .next()
            .expect("commonName")
            .as_str()
            .expect("commonName as utf8");
        assert_eq!(cn, CA_COMMON_NAME);
        assert!(cert.is_ca());
        assert_eq!(cert.subject().as_raw(), cert.issuer().as_raw());

        let key_usage = cert.key_usage().expect("key usage").expect("key usage present");
        assert!(key_usage.value.digital_signature());
        assert!(key_usage.value.key_cert_sign());

        let eku = cert
            .extended_key_usage()
            .expect("eku")
            .expect("eku present");
        assert!(eku.value.client_auth);
        assert!(eku.value.server_auth);

        let has_basic_constraints = cert.extensions().iter().any(|extension| {
            matches!(
                extension.parsed_extension(),
                ParsedExtension::BasicConstraints(constraints) if constraints.ca
            )
        });
        assert!(has_basic_constraints);
        assert!(!ca.serial().is_empty());
    }

    #[test]
    fn pem_round_trip_yields_identical_material() {
        let ca = generate_ca(&test_profile(), OffsetDateTime::now_utc()).expect("generate ca");
        let reloaded = parse_ca(ca.cert_pem(), ca.key_pem()).expect("reload ca");

        let (_, pem) = parse_x509_pem(reloaded.cert_pem().as_bytes()).expect("decode pem");
        assert_eq!(pem.contents, ca.cert_der());
        assert_eq!(reloaded.cert_der(), ca.cert_der());
        assert_eq!(
            reloaded.key().to_pkcs1_der().expect("reloaded key der"),
            ca.key().to_pkcs1_der().expect("original key der")
        );
        assert_eq!(reloaded.serial(), ca.serial());
        assert_eq!(reloaded, ca);
    }

    #[test]
    fn parse_rejects_key_from_another_ca() {
        let first = generate_ca(&test_profile(), OffsetDateTime::now_utc()).expect("first ca");
        let second = generate_ca(&test_profile(), OffsetDateTime::now_utc()).expect("second ca");
        let error = parse_ca(first.cert_pem(), second.key_pem()).expect_err("mismatch");
        assert!(matches!(error, PkiError::KeyMismatch), "{error}");
    }

    #[test]
    fn parse_rejects_truncated_certificate() {
        let ca = generate_ca(&test_profile(), OffsetDateTime::now_utc()).expect("generate ca");
        let truncated = &ca.cert_pem()[..ca.cert_pem().len() / 2];
        assert!(parse_ca(truncated, ca.key_pem()).is_err());
    }

    #[test]
    fn expired_ca_reports_invalid() {
        let now = OffsetDateTime::now_utc();
        let ca = generate_ca_with_validity(2048, now - Duration::days(30), now - Duration::days(1))
            .expect("expired ca");
        assert!(!ca.is_valid_at(now));
    }

    #[test]
    fn parse_accepts_an_inverted_window_that_is_never_valid() {
        let now = OffsetDateTime::now_utc();
        let key = RsaKeyMaterial::generate(2048).expect("key");
        let signing_key = key.signing_key().expect("signing key");
        let cert = build_ca_params(now, now - Duration::days(1))
            .self_signed(&signing_key)
            .expect("self-sign");
        let key_pem = key.to_pkcs1_pem().expect("key pem");

        let ca = parse_ca(&cert.pem(), &key_pem).expect("foreign windows still parse");
        assert!(ca.not_before() > ca.not_after());
        assert!(!ca.is_valid_at(now));
        assert!(!ca.is_valid_at(now - Duration::hours(12)));
    }

    #[test]
    fn serials_differ_between_generations() {
        let now = OffsetDateTime::now_utc();
        let first = generate_ca(&test_profile(), now).expect("first ca");
        let second = generate_ca(&test_profile(), now).expect("second ca");
        assert_ne!(first.serial(), second.serial());
    }
}
