use std::path::Path;
use std::sync::Arc;

use super::{path_arg, TrustInstaller};
use crate::host::{run_checked, CommandRunner};
use crate::DevcertError;

/// Adds the CA to the machine ROOT store through an elevated `certutil`.
/// UAC does the elevation, so no elevation tool is involved.
pub struct WindowsTrust {
    runner: Arc<dyn CommandRunner>,
}

impl WindowsTrust {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

fn certutil_script(cert: &str) -> String {
    // single quotes delimit the PowerShell literal; doubled inside it
    let cert = cert.replace('\'', "''");
    format!(
        "$p = Start-Process -FilePath certutil -ArgumentList '-addstore -f ROOT \"{cert}\"' \
         -Verb RunAs -Wait -PassThru; exit $p.ExitCode"
    )
}

impl TrustInstaller for WindowsTrust {
    fn install(&self, ca_cert_path: &Path) -> Result<(), DevcertError> {
        let script = certutil_script(&path_arg(ca_cert_path)?);
        let argv = vec![
            "powershell".to_string(),
            "-NoProfile".to_string(),
            "-Command".to_string(),
            script,
        ];
        run_checked(self.runner.as_ref(), &argv)
    }
}
