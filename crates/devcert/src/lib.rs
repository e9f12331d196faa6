//! Self-signed, locally trusted certificates for development.
//!
//! A per-user certificate authority lives under `~/.devcert`. The first run
//! creates it and adds it to the host trust store; every run then signs a
//! leaf certificate for the requested domain names.

mod app;
mod authority;
mod config;
mod errors;
mod files;
mod host;
mod info;
mod issuer;
mod paths;
mod prompt;
mod setup;
mod trust;

pub use app::{Devcert, Generated};
pub use authority::{CaStatus, CertAuthority, EnsureOutcome};
pub use config::DevcertConfig;
pub use errors::{DevcertError, ResultExt};
pub use host::{
    elevate, run_checked, CommandOutcome, CommandRunner, HostProbe, SystemCommandRunner,
    SystemHostProbe, ELEVATION_TOOL,
};
pub use info::{describe_certificate, CertificateReport, ChainStatus};
pub use issuer::{CertIssuer, IssuedCertificate};
pub use paths::{DevcertPaths, CA_CERT_FILE_NAME, CA_KEY_FILE_NAME, DEVCERT_DIR_NAME};
pub use prompt::TerminalPrompt;
pub use setup::{
    parse_setup_answer, SetupOrchestrator, SetupPlan, SetupPrompt, SetupSummary, SETUP_QUESTION,
};
pub use trust::{
    install_ca, installer_for, system_installer, LinuxTrust, LinuxTrustBackend, MacosTrust,
    TrustInstaller, TrustPlatform, UnsupportedTrust, WindowsTrust,
};
