use std::path::Path;

use tracing::debug;

use crate::info::{describe_certificate, CertificateReport};
use crate::setup::{SetupOrchestrator, SetupPrompt, SetupSummary};
use crate::trust::{system_installer, TrustInstaller};
use crate::{
    CertAuthority, CertIssuer, DevcertConfig, DevcertError, DevcertPaths, IssuedCertificate,
    ResultExt,
};

/// Result of `devcert <domain>...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    /// Present when this run had to perform setup first.
    pub setup: Option<SetupSummary>,
    pub issued: IssuedCertificate,
}

/// Wires the CA, trust installer and issuer for one invocation.
pub struct Devcert {
    config: DevcertConfig,
    authority: CertAuthority,
    installer: Box<dyn TrustInstaller>,
}

impl Devcert {
    pub fn new(
        paths: DevcertPaths,
        config: DevcertConfig,
        installer: Box<dyn TrustInstaller>,
    ) -> Result<Self, DevcertError> {
        config.validate()?;
        Ok(Self {
            authority: CertAuthority::new(paths, &config),
            config,
            installer,
        })
    }

    /// Default configuration in the current user's home, trusting through
    /// the host's native store.
    pub fn for_current_user() -> Result<Self, DevcertError> {
        Self::new(
            DevcertPaths::resolve()?,
            DevcertConfig::default(),
            system_installer(),
        )
    }

    pub fn authority(&self) -> &CertAuthority {
        &self.authority
    }

    /// Runs setup when needed, then issues one leaf for `domains`.
    pub fn generate(
        &self,
        domains: &[String],
        prompt: &mut dyn SetupPrompt,
    ) -> Result<Generated, DevcertError> {
        let orchestrator = SetupOrchestrator::new(&self.authority, self.installer.as_ref());
        let setup = if orchestrator.needs_setup().context("setup failed")? {
            Some(orchestrator.run(prompt)?)
        } else {
            debug!("setup not needed");
            None
        };

        let issued = CertIssuer::new(&self.authority, &self.config)
            .issue(domains)
            .context("generate certificate failed")?;
        Ok(Generated { setup, issued })
    }

    pub fn describe(&self, path: &Path) -> Result<CertificateReport, DevcertError> {
        describe_certificate(path, &self.authority).context("reading certificate failed")
    }
}
