use std::path::PathBuf;

use devcert_pki::PkiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DevcertError {
    #[error("resolving devcert paths failed: {0}")]
    PathResolution(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("{operation} {} failed: {source}", .path.display())]
    FileIo {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("certificate authority is invalid: {0}")]
    CaInvalid(String),
    #[error("at least one domain name is required")]
    NoDomains,
    #[error("the following domain names are invalid: {}", domains.join(", "))]
    DomainValidation { domains: Vec<String> },
    #[error("certificate signing failed: {0}")]
    Signing(#[from] PkiError),
    #[error("`{program}` {}: {output}", describe_status(.status))]
    ExternalCommand {
        program: String,
        status: Option<i32>,
        output: String,
    },
    #[error("unsupported platform: {0}")]
    PlatformUnsupported(String),
    #[error("setup declined by user")]
    UserDeclined,
    #[error("interactive prompt failed: {0}")]
    Prompt(String),
    #[error("{context}: {source}")]
    Context {
        context: &'static str,
        #[source]
        source: Box<DevcertError>,
    },
}

impl DevcertError {
    pub(crate) fn file_io(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FileIo {
            operation,
            path: path.into(),
            source,
        }
    }

    /// The innermost error beneath any context layers.
    pub fn root(&self) -> &DevcertError {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_user_declined(&self) -> bool {
        matches!(self.root(), Self::UserDeclined)
    }
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exited with status {code}"),
        None => "was terminated or could not be started".to_string(),
    }
}

pub trait ResultExt<T> {
    fn context(self, context: &'static str) -> Result<T, DevcertError>;
}

impl<T> ResultExt<T> for Result<T, DevcertError> {
    fn context(self, context: &'static str) -> Result<T, DevcertError> {
        self.map_err(|source| DevcertError::Context {
            context,
            source: Box::new(source),
        })
    }
}
