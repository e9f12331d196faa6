use std::path::Path;
use std::sync::Arc;

use super::{path_arg, TrustInstaller};
use crate::host::{elevate, run_checked, CommandRunner, HostProbe};
use crate::DevcertError;

const SYSTEM_KEYCHAIN: &str = "/Library/Keychains/System.keychain";

pub struct MacosTrust {
    runner: Arc<dyn CommandRunner>,
    probe: Arc<dyn HostProbe>,
}

impl MacosTrust {
    pub fn new(runner: Arc<dyn CommandRunner>, probe: Arc<dyn HostProbe>) -> Self {
        Self { runner, probe }
    }
}

impl TrustInstaller for MacosTrust {
    fn install(&self, ca_cert_path: &Path) -> Result<(), DevcertError> {
        let argv = [
            "security",
            "add-trusted-cert",
            "-d",
            "-r",
            "trustRoot",
            "-k",
            SYSTEM_KEYCHAIN,
        ]
        .iter()
        .map(|part| part.to_string())
        .chain(std::iter::once(path_arg(ca_cert_path)?))
        .collect();
        let argv = elevate(self.probe.as_ref(), argv);
        run_checked(self.runner.as_ref(), &argv)
    }
}
