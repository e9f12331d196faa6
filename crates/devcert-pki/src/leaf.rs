use rcgen::{
    CertificateParams, CustomExtension, DistinguishedName, DnType, ExtendedKeyUsagePurpose, IsCa,
    Issuer, KeyUsagePurpose, SanType,
};
use rustls_pki_types::CertificateDer;
use time::OffsetDateTime;

use crate::ca_material::random_serial;
use crate::validity::add_months;
use crate::{
    CaMaterial, CertificateProfile, PkiError, RsaKeyMaterial, LEAF_COMMON_NAME_PREFIX,
    LEAF_SUBJECT_KEY_ID,
};

/// The prefix followed by every domain, with no separator.
pub fn leaf_common_name(domains: &[String]) -> String {
    let mut common_name = String::from(LEAF_COMMON_NAME_PREFIX);
    for domain in domains {
        common_name.push_str(domain);
    }
    common_name
}

/// A leaf certificate and its freshly generated key, both PEM encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafMaterial {
    pub cert_pem: String,
    pub key_pem: String,
    pub cert_der: Vec<u8>,
    pub domains: Vec<String>,
}

/// Leaf parameters and key, prepared before the CA is consulted.
pub struct LeafRequest {
    params: CertificateParams,
    key: RsaKeyMaterial,
    domains: Vec<String>,
}

impl LeafRequest {
    /// Builds the leaf fields and generates its key. Domains are assumed to
    /// have passed [`crate::is_valid_domain`] already.
    pub fn prepare(
        domains: &[String],
        profile: &CertificateProfile,
        now: OffsetDateTime,
    ) -> Result<Self, PkiError> {
        let not_after = add_months(now, profile.leaf_validity_months)?;
        let params = build_leaf_params(domains, now, not_after)?;
        let key = RsaKeyMaterial::generate(profile.rsa_key_bits)?;
        Ok(Self {
            params,
            key,
            domains: domains.to_vec(),
        })
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// Signs the leaf with `ca`, which must be inside its validity window at
    /// `now`.
    pub fn sign(self, ca: &CaMaterial, now: OffsetDateTime) -> Result<LeafMaterial, PkiError> {
        if !ca.is_valid_at(now) {
            return Err(PkiError::CaNotValid);
        }
        let ca_cert_der = CertificateDer::from(ca.cert_der());
        let issuer = Issuer::from_ca_cert_der(&ca_cert_der, ca.key().signing_key()?)?;
        let leaf_key = self.key.signing_key()?;
        let cert = self.params.signed_by(&leaf_key, &issuer)?;

        Ok(LeafMaterial {
            cert_pem: cert.pem(),
            key_pem: self.key.to_pkcs1_pem()?,
            cert_der: cert.der().to_vec(),
            domains: self.domains,
        })
    }
}

fn build_leaf_params(
    domains: &[String],
    not_before: OffsetDateTime,
    not_after: OffsetDateTime,
) -> Result<CertificateParams, PkiError> {
    let mut params = CertificateParams::new(Vec::<String>::new())?;
    params.serial_number = Some(random_serial());
    params.not_before = not_before;
    params.not_after = not_after;
    params.is_ca = IsCa::NoCa;
    params.use_authority_key_identifier_extension = true;
    // rcgen only emits a subject key identifier for CA certificates.
    params
        .custom_extensions
        .push(subject_key_identifier(&LEAF_SUBJECT_KEY_ID));
    params.key_usages = vec![KeyUsagePurpose::DigitalSignature];
    params.extended_key_usages = vec![
        ExtendedKeyUsagePurpose::ClientAuth,
        ExtendedKeyUsagePurpose::ServerAuth,
    ];

    let mut distinguished_name = DistinguishedName::new();
    distinguished_name.push(DnType::CommonName, leaf_common_name(domains));
    params.distinguished_name = distinguished_name;

    for domain in domains {
        params
            .subject_alt_names
            .push(SanType::DnsName(domain.clone().try_into()?));
    }
    Ok(params)
}

/// SubjectKeyIdentifier (2.5.29.14) whose value is a DER OCTET STRING.
fn subject_key_identifier(id: &[u8]) -> CustomExtension {
    let mut content = Vec::with_capacity(id.len() + 2);
    content.push(0x04);
    content.push(id.len() as u8);
    content.extend_from_slice(id);
    CustomExtension::from_oid_content(&[2, 5, 29, 14], content)
}
