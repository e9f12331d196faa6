use std::env;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use crate::DevcertError;

pub const ELEVATION_TOOL: &str = "sudo";
const ELEVATION_PROMPT: &str = "--prompt=Enter your sudo password:";

/// Exit status and output (stdout followed by stderr) of a finished child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub status: Option<i32>,
    pub success: bool,
    pub output: String,
}

/// Runs an external program to completion. No timeout is applied.
pub trait CommandRunner: Send + Sync {
    fn run(&self, argv: &[String]) -> Result<CommandOutcome, DevcertError>;
}

/// Filesystem and `PATH` lookups used to fingerprint the host.
pub trait HostProbe: Send + Sync {
    fn dir_exists(&self, path: &Path) -> bool;
    fn binary_exists(&self, name: &str) -> bool;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, argv: &[String]) -> Result<CommandOutcome, DevcertError> {
        let Some((program, args)) = argv.split_first() else {
            return Err(DevcertError::ExternalCommand {
                program: String::new(),
                status: None,
                output: "empty command line".to_string(),
            });
        };
        debug!(?argv, "running external command");
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .output()
            .map_err(|error| {
                let detail = if error.kind() == io::ErrorKind::NotFound {
                    format!("command '{program}' not found")
                } else {
                    error.to_string()
                };
                DevcertError::ExternalCommand {
                    program: program.clone(),
                    status: None,
                    output: detail,
                }
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(CommandOutcome {
            status: output.status.code(),
            success: output.status.success(),
            output: combined.trim().to_string(),
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHostProbe;

impl HostProbe for SystemHostProbe {
    fn dir_exists(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn binary_exists(&self, name: &str) -> bool {
        let Some(search_path) = env::var_os("PATH") else {
            return false;
        };
        env::split_paths(&search_path).any(|dir| {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return true;
            }
            cfg!(windows) && dir.join(format!("{name}.exe")).is_file()
        })
    }
}

/// Prefixes `argv` with the elevation tool when it is installed. Without it
/// the command runs as-is after a warning.
pub fn elevate(probe: &dyn HostProbe, argv: Vec<String>) -> Vec<String> {
    if !probe.binary_exists(ELEVATION_TOOL) {
        warn!(
            command = ?argv,
            "'{ELEVATION_TOOL}' is not installed on the system, devcert might fail"
        );
        return argv;
    }
    let mut elevated = Vec::with_capacity(argv.len() + 3);
    elevated.push(ELEVATION_TOOL.to_string());
    elevated.push(ELEVATION_PROMPT.to_string());
    elevated.push("--".to_string());
    elevated.extend(argv);
    elevated
}

/// Runs `argv` and turns a non-zero exit into `ExternalCommand`.
pub fn run_checked(runner: &dyn CommandRunner, argv: &[String]) -> Result<(), DevcertError> {
    let outcome = runner.run(argv)?;
    if outcome.success {
        return Ok(());
    }
    Err(DevcertError::ExternalCommand {
        program: argv.first().cloned().unwrap_or_default(),
        status: outcome.status,
        output: outcome.output,
    })
}
