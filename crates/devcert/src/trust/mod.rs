use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::authority::{CaStatus, CertAuthority};
use crate::host::{CommandRunner, HostProbe, SystemCommandRunner, SystemHostProbe};
use crate::DevcertError;

mod linux;
mod macos;
mod unsupported;
mod windows;

pub use linux::{LinuxTrust, LinuxTrustBackend};
pub use macos::MacosTrust;
pub use unsupported::UnsupportedTrust;
pub use windows::WindowsTrust;

/// Adds a CA certificate to a host trust store.
pub trait TrustInstaller {
    fn install(&self, ca_cert_path: &Path) -> Result<(), DevcertError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustPlatform {
    Macos,
    Linux,
    Windows,
}

impl TrustPlatform {
    pub fn current() -> Result<Self, DevcertError> {
        Self::from_os(std::env::consts::OS)
    }

    pub fn from_os(os: &str) -> Result<Self, DevcertError> {
        match os {
            "macos" => Ok(Self::Macos),
            "linux" => Ok(Self::Linux),
            "windows" => Ok(Self::Windows),
            other => Err(DevcertError::PlatformUnsupported(format!(
                "system trust install unsupported on {other}"
            ))),
        }
    }
}

pub fn installer_for(
    platform: TrustPlatform,
    runner: Arc<dyn CommandRunner>,
    probe: Arc<dyn HostProbe>,
) -> Box<dyn TrustInstaller> {
    match platform {
        TrustPlatform::Macos => Box::new(MacosTrust::new(runner, probe)),
        TrustPlatform::Linux => Box::new(LinuxTrust::new(runner, probe)),
        TrustPlatform::Windows => Box::new(WindowsTrust::new(runner)),
    }
}

/// Installer for the running host, backed by real processes.
pub fn system_installer() -> Box<dyn TrustInstaller> {
    match TrustPlatform::current() {
        Ok(platform) => installer_for(
            platform,
            Arc::new(SystemCommandRunner),
            Arc::new(SystemHostProbe),
        ),
        Err(DevcertError::PlatformUnsupported(reason)) => Box::new(UnsupportedTrust::new(reason)),
        Err(other) => Box::new(UnsupportedTrust::new(other.to_string())),
    }
}

/// Trust tools take the certificate path as a plain argument.
fn path_arg(path: &Path) -> Result<String, DevcertError> {
    path.to_str().map(str::to_string).ok_or_else(|| {
        DevcertError::PathResolution(format!(
            "certificate path {} is not valid UTF-8",
            path.display()
        ))
    })
}

/// Installs the CA at its fixed path. Refuses, without touching the host,
/// unless the CA currently loads as valid.
pub fn install_ca(
    authority: &CertAuthority,
    installer: &dyn TrustInstaller,
) -> Result<(), DevcertError> {
    match authority.load()? {
        CaStatus::Valid(_) => {}
        CaStatus::Invalid { reason } => return Err(DevcertError::CaInvalid(reason)),
        CaStatus::Absent => {
            return Err(DevcertError::CaInvalid(
                "no certificate authority to trust".to_string(),
            ));
        }
    }
    let cert_path = authority.paths().ca_cert();
    installer.install(&cert_path)?;
    info!(cert = %cert_path.display(), "certificate authority marked trusted");
    Ok(())
}
