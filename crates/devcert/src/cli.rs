use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};

/// Generate self-signed, trusted certificates for local development.
///
/// The first run creates a local certificate authority (CA) and marks it as
/// trusted; every run then issues one certificate covering all DOMAINs.
#[derive(Debug, Parser)]
#[command(name = "devcert", version, arg_required_else_help = true)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Domain names the certificate is valid for
    #[arg(value_name = "DOMAIN")]
    pub domains: Vec<String>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the fields of a PEM certificate
    Info {
        /// Certificate file to inspect
        file: PathBuf,
    },
}

impl Cli {
    /// Rejects domain arguments mixed with a subcommand, so `info` never
    /// reaches setup or issuance.
    pub fn checked(self) -> Result<Self, clap::Error> {
        if self.command.is_some() && !self.domains.is_empty() {
            return Err(Self::command().error(
                ErrorKind::ArgumentConflict,
                format!(
                    "domain names cannot be combined with a subcommand: {}",
                    self.domains.join(", ")
                ),
            ));
        }
        Ok(self)
    }

    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
