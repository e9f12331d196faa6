use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use super::{path_arg, TrustInstaller};
use crate::host::{elevate, run_checked, CommandRunner, HostProbe};
use crate::DevcertError;

const DEBIAN_ANCHOR_DIR: &str = "/usr/local/share/ca-certificates/";
const RHEL_ANCHOR_DIR: &str = "/etc/pki/ca-trust/source/anchors/";

/// Linux trust mechanism, fingerprinted from anchor directories and refresh
/// binaries rather than distro identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinuxTrustBackend {
    Debian,
    Rhel,
    Arch,
}

impl LinuxTrustBackend {
    pub fn detect(probe: &dyn HostProbe) -> Result<Self, DevcertError> {
        if probe.dir_exists(Path::new(DEBIAN_ANCHOR_DIR))
            && probe.binary_exists("update-ca-certificates")
        {
            return Ok(Self::Debian);
        }
        if probe.dir_exists(Path::new(RHEL_ANCHOR_DIR)) && probe.binary_exists("update-ca-trust") {
            return Ok(Self::Rhel);
        }
        if probe.binary_exists("pacman") && probe.binary_exists("trust") {
            return Ok(Self::Arch);
        }
        Err(DevcertError::PlatformUnsupported(
            "could not detect a supported Linux CA trust mechanism".to_string(),
        ))
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::Debian => "debian",
            Self::Rhel => "rhel",
            Self::Arch => "arch",
        }
    }

    /// Unelevated command lines for trusting `cert`, in execution order.
    fn commands(self, cert: &str) -> Vec<Vec<String>> {
        let argv = |parts: &[&str]| -> Vec<String> {
            parts.iter().map(|part| part.to_string()).collect()
        };
        match self {
            Self::Debian => vec![
                argv(&["cp", cert, DEBIAN_ANCHOR_DIR]),
                argv(&["update-ca-certificates"]),
            ],
            Self::Rhel => vec![
                argv(&["cp", cert, RHEL_ANCHOR_DIR]),
                argv(&["update-ca-trust", "extract"]),
            ],
            Self::Arch => vec![argv(&["trust", "anchor", cert])],
        }
    }
}

pub struct LinuxTrust {
    runner: Arc<dyn CommandRunner>,
    probe: Arc<dyn HostProbe>,
}

impl LinuxTrust {
    pub fn new(runner: Arc<dyn CommandRunner>, probe: Arc<dyn HostProbe>) -> Self {
        Self { runner, probe }
    }
}

impl TrustInstaller for LinuxTrust {
    fn install(&self, ca_cert_path: &Path) -> Result<(), DevcertError> {
        let backend = LinuxTrustBackend::detect(self.probe.as_ref())?;
        debug!(backend = backend.tag(), "detected linux trust backend");
        let cert = path_arg(ca_cert_path)?;
        for argv in backend.commands(&cert) {
            let argv = elevate(self.probe.as_ref(), argv);
            run_checked(self.runner.as_ref(), &argv)?;
        }
        Ok(())
    }
}
