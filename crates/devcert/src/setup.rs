use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::authority::{CertAuthority, EnsureOutcome};
use crate::files::exists;
use crate::paths::DevcertPaths;
use crate::trust::{install_ca, TrustInstaller};
use crate::{DevcertError, ResultExt};

pub const SETUP_QUESTION: &str = "Do you want to continue? [Y/n]";

/// What setup is about to do, shown before asking for confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupPlan {
    pub dir: PathBuf,
}

impl fmt::Display for SetupPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "devcert needs to execute the setup process first.")?;
        writeln!(f, "  - It will create {} directory.", self.dir.display())?;
        writeln!(
            f,
            "  - It will create a local certificate authority (CA) to sign future certificates."
        )?;
        write!(f, "  - It will mark the CA as trusted locally.")
    }
}

/// Blocking yes/no confirmation for a [`SetupPlan`].
pub trait SetupPrompt {
    fn confirm(&mut self, plan: &SetupPlan) -> Result<bool, DevcertError>;
}

/// `Some(true)` for y/Y, `Some(false)` for n/N, `None` for anything else.
pub fn parse_setup_answer(input: &str) -> Option<bool> {
    match input {
        "y" | "Y" => Some(true),
        "n" | "N" => Some(false),
        _ => None,
    }
}

/// Artifacts of a completed setup run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupSummary {
    pub created_dir: bool,
    pub ca: EnsureOutcome,
}

impl SetupSummary {
    /// Progress lines printed after setup, before the issuance report.
    pub fn report(&self, paths: &DevcertPaths) -> String {
        let mut report = String::new();
        if self.created_dir {
            report.push_str(&format!("Created {} directory.\n", paths.dir().display()));
        }
        if self.ca != EnsureOutcome::AlreadyValid {
            report.push_str(&format!(
                "Certificate authority (CA) created at:\n  Certificate: {}\n  Private Key: {}\n",
                paths.ca_cert().display(),
                paths.ca_key().display()
            ));
        }
        report.push_str("Certificate authority (CA) marked trusted.\n\n");
        report
    }
}

pub struct SetupOrchestrator<'a> {
    authority: &'a CertAuthority,
    installer: &'a dyn TrustInstaller,
}

impl<'a> SetupOrchestrator<'a> {
    pub fn new(authority: &'a CertAuthority, installer: &'a dyn TrustInstaller) -> Self {
        Self {
            authority,
            installer,
        }
    }

    pub fn plan(&self) -> SetupPlan {
        SetupPlan {
            dir: self.authority.paths().dir().to_path_buf(),
        }
    }

    /// True when the device directory is missing or the CA does not load as
    /// valid.
    pub fn needs_setup(&self) -> Result<bool, DevcertError> {
        let dir = self.authority.paths().dir();
        let present =
            exists(dir).map_err(|error| DevcertError::file_io("inspecting", dir, error))?;
        if !present {
            return Ok(true);
        }
        Ok(!self.authority.load()?.is_valid())
    }

    /// Confirms, then creates the directory, ensures the CA and trusts it.
    /// A failed step rolls back only what this run created.
    pub fn run(&self, prompt: &mut dyn SetupPrompt) -> Result<SetupSummary, DevcertError> {
        if !prompt.confirm(&self.plan())? {
            return Err(DevcertError::UserDeclined);
        }
        self.execute().context("setup failed")
    }

    fn execute(&self) -> Result<SetupSummary, DevcertError> {
        let dir = self.authority.paths().dir();
        let created_dir = create_dir(dir)?;

        let ca = match self.authority.ensure_valid() {
            Ok(outcome) => outcome,
            Err(error) => {
                if created_dir {
                    discard_dir(dir);
                }
                return Err(error);
            }
        };

        if let Err(error) = install_ca(self.authority, self.installer) {
            if ca != EnsureOutcome::AlreadyValid {
                warn!("trusting the new certificate authority failed, removing it");
                self.authority.discard_files();
            }
            return Err(error);
        }

        info!(created_dir, ?ca, "setup completed");
        Ok(SetupSummary { created_dir, ca })
    }
}

/// Returns whether the directory had to be created.
fn create_dir(dir: &Path) -> Result<bool, DevcertError> {
    let present = exists(dir).map_err(|error| DevcertError::file_io("inspecting", dir, error))?;
    if present {
        return Ok(false);
    }
    fs::create_dir_all(dir).map_err(|error| DevcertError::file_io("creating", dir, error))?;
    debug!(dir = %dir.display(), "created devcert directory");
    Ok(true)
}

fn discard_dir(dir: &Path) {
    if let Err(error) = fs::remove_dir_all(dir) {
        debug!(dir = %dir.display(), %error, "ignoring directory cleanup failure");
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use super::{parse_setup_answer, SetupOrchestrator, SetupPlan, SetupPrompt, SetupSummary};
    use crate::authority::EnsureOutcome;
    use crate::trust::TrustInstaller;
    use crate::{CertAuthority, DevcertConfig, DevcertError, DevcertPaths};

    struct ScriptedPrompt {
        answer: bool,
        asked: Vec<SetupPlan>,
    }

    impl ScriptedPrompt {
        fn answering(answer: bool) -> Self {
            Self {
                answer,
                asked: Vec::new(),
            }
        }
    }

    impl SetupPrompt for ScriptedPrompt {
        fn confirm(&mut self, plan: &SetupPlan) -> Result<bool, DevcertError> {
            self.asked.push(plan.clone());
            Ok(self.answer)
        }
    }

    #[derive(Default)]
    struct FakeInstaller {
        fail: bool,
        installed: Mutex<Vec<PathBuf>>,
    }

    impl FakeInstaller {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }
    }

    impl TrustInstaller for FakeInstaller {
        fn install(&self, ca_cert_path: &Path) -> Result<(), DevcertError> {
            self.installed
                .lock()
                .expect("installed lock")
                .push(ca_cert_path.to_path_buf());
            if self.fail {
                return Err(DevcertError::ExternalCommand {
                    program: "update-ca-certificates".to_string(),
                    status: Some(1),
                    output: "permission denied".to_string(),
                });
            }
            Ok(())
        }
    }

    fn test_config() -> DevcertConfig {
        DevcertConfig {
            rsa_key_bits: 2048,
            ..DevcertConfig::default()
        }
    }

    fn authority_in(home: &Path) -> CertAuthority {
        CertAuthority::new(DevcertPaths::from_home(home), &test_config())
    }

    #[test]
    fn answers_are_case_insensitive_single_letters() {
        assert_eq!(parse_setup_answer("y"), Some(true));
        assert_eq!(parse_setup_answer("Y"), Some(true));
        assert_eq!(parse_setup_answer("n"), Some(false));
        assert_eq!(parse_setup_answer("N"), Some(false));
        for rejected in ["", "yes", "no", " y", "x"] {
            assert_eq!(parse_setup_answer(rejected), None, "{rejected:?}");
        }
    }

    #[test]
    fn report_names_the_new_ca_files() {
        let paths = DevcertPaths::from_home(Path::new("/home/dev"));
        let summary = SetupSummary {
            created_dir: true,
            ca: EnsureOutcome::Created,
        };
        let report = summary.report(&paths);
        assert!(report.starts_with(&format!("Created {} directory.\n", paths.dir().display())));
        assert!(report.contains(&format!("  Certificate: {}\n", paths.ca_cert().display())));
        assert!(report.contains(&format!("  Private Key: {}\n", paths.ca_key().display())));
        assert!(report.ends_with("Certificate authority (CA) marked trusted.\n\n"));
    }

    #[test]
    fn report_for_a_kept_ca_only_confirms_trust() {
        let paths = DevcertPaths::from_home(Path::new("/home/dev"));
        let summary = SetupSummary {
            created_dir: false,
            ca: EnsureOutcome::AlreadyValid,
        };
        assert_eq!(
            summary.report(&paths),
            "Certificate authority (CA) marked trusted.\n\n"
        );
    }

    #[test]
    fn plan_lists_the_three_actions() {
        let plan = SetupPlan {
            dir: PathBuf::from("/home/dev/.devcert"),
        };
        let text = plan.to_string();
        assert!(text.contains("create /home/dev/.devcert directory"));
        assert!(text.contains("local certificate authority (CA)"));
        assert!(text.contains("trusted locally"));
    }

    #[test]
    fn fresh_home_needs_setup_and_completes() {
        let home = tempfile::tempdir().expect("tempdir");
        let authority = authority_in(home.path());
        let installer = FakeInstaller::default();
        let orchestrator = SetupOrchestrator::new(&authority, &installer);
        assert!(orchestrator.needs_setup().expect("needs setup"));

        let mut prompt = ScriptedPrompt::answering(true);
        let summary = orchestrator.run(&mut prompt).expect("setup");
        assert!(summary.created_dir);
        assert_eq!(summary.ca, EnsureOutcome::Created);
        assert_eq!(prompt.asked.len(), 1);
        assert_eq!(prompt.asked[0].dir, authority.paths().dir());
        assert_eq!(
            *installer.installed.lock().expect("installed lock"),
            vec![authority.paths().ca_cert()]
        );
        assert!(!orchestrator.needs_setup().expect("needs setup"));
    }

    #[test]
    fn existing_directory_without_ca_needs_setup() {
        let home = tempfile::tempdir().expect("tempdir");
        let authority = authority_in(home.path());
        fs::create_dir_all(authority.paths().dir()).expect("create dir");
        let installer = FakeInstaller::default();
        let orchestrator = SetupOrchestrator::new(&authority, &installer);
        assert!(orchestrator.needs_setup().expect("needs setup"));

        let summary = orchestrator
            .run(&mut ScriptedPrompt::answering(true))
            .expect("setup");
        assert!(!summary.created_dir);
    }

    #[test]
    fn declining_changes_nothing() {
        let home = tempfile::tempdir().expect("tempdir");
        let authority = authority_in(home.path());
        let installer = FakeInstaller::default();
        let orchestrator = SetupOrchestrator::new(&authority, &installer);

        let error = orchestrator
            .run(&mut ScriptedPrompt::answering(false))
            .expect_err("declined");
        assert!(error.is_user_declined());
        assert!(!authority.paths().dir().exists());
        assert!(installer.installed.lock().expect("installed lock").is_empty());
    }

    #[test]
    fn trust_failure_removes_the_new_ca_files() {
        let home = tempfile::tempdir().expect("tempdir");
        let authority = authority_in(home.path());
        let installer = FakeInstaller::failing();
        let orchestrator = SetupOrchestrator::new(&authority, &installer);

        let error = orchestrator
            .run(&mut ScriptedPrompt::answering(true))
            .expect_err("trust failure");
        assert!(error.to_string().starts_with("setup failed: "), "{error}");
        assert!(
            matches!(error.root(), DevcertError::ExternalCommand { .. }),
            "{error}"
        );
        assert!(!authority.paths().ca_cert().exists());
        assert!(!authority.paths().ca_key().exists());
    }

    #[test]
    fn trust_failure_keeps_a_previously_valid_ca() {
        let home = tempfile::tempdir().expect("tempdir");
        let authority = authority_in(home.path());
        fs::create_dir_all(authority.paths().dir()).expect("create dir");
        authority.create().expect("create ca");
        let before = fs::read(authority.paths().ca_cert()).expect("read cert");

        let installer = FakeInstaller::failing();
        let orchestrator = SetupOrchestrator::new(&authority, &installer);
        orchestrator
            .run(&mut ScriptedPrompt::answering(true))
            .expect_err("trust failure");

        assert_eq!(fs::read(authority.paths().ca_cert()).expect("read cert"), before);
        assert!(authority.paths().ca_key().exists());
    }

    #[test]
    fn ca_failure_removes_the_directory_this_run_created() {
        let home = tempfile::tempdir().expect("tempdir");
        let unsupported = DevcertConfig {
            rsa_key_bits: 1024,
            ..DevcertConfig::default()
        };
        let authority = CertAuthority::new(DevcertPaths::from_home(home.path()), &unsupported);
        let installer = FakeInstaller::default();
        let orchestrator = SetupOrchestrator::new(&authority, &installer);

        let error = orchestrator
            .run(&mut ScriptedPrompt::answering(true))
            .expect_err("ca failure");
        assert!(error.to_string().starts_with("setup failed: "), "{error}");
        assert!(!authority.paths().dir().exists());
        assert!(installer.installed.lock().expect("installed lock").is_empty());
    }

    #[test]
    fn ca_failure_keeps_a_directory_that_already_existed() {
        let home = tempfile::tempdir().expect("tempdir");
        let unsupported = DevcertConfig {
            rsa_key_bits: 1024,
            ..DevcertConfig::default()
        };
        let authority = CertAuthority::new(DevcertPaths::from_home(home.path()), &unsupported);
        fs::create_dir_all(authority.paths().dir()).expect("create dir");
        fs::write(authority.paths().dir().join("notes.txt"), "keep").expect("write");
        let installer = FakeInstaller::default();

        SetupOrchestrator::new(&authority, &installer)
            .run(&mut ScriptedPrompt::answering(true))
            .expect_err("ca failure");
        assert!(authority.paths().dir().join("notes.txt").exists());
    }
}
