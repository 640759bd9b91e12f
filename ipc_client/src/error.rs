use std::path::PathBuf;

/// Message returned when the CLI binary cannot be located on the execution
/// path.
pub const CLI_NOT_FOUND_MESSAGE: &str = "akavecli not found. Install it or run via Docker image \
                                         which includes it. Set AKAVECLI_PATH to its absolute \
                                         path if installed.";

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum IpcError {
    #[error("{}", CLI_NOT_FOUND_MESSAGE)]
    CliNotFound,

    #[error(transparent)]
    Spawn { source: std::io::Error },

    /// The CLI ran but did not exit with 0. `output` is the combined
    /// stdout and stderr text, untouched.
    #[error("{}", failure_message(*.code, .output))]
    CommandFailed { code: Option<i32>, output: String },

    #[error("{0}")]
    Parse(String),

    #[error("File download failed or file is not readable")]
    DownloadMissing { path: PathBuf },

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error(transparent)]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl IpcError {
    pub(crate) fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}

fn failure_message(code: Option<i32>, output: &str) -> String {
    if !output.is_empty() {
        return output.to_string();
    }
    match code {
        Some(code) => format!("CLI exited with {}", code),
        None => "CLI terminated by signal".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, IpcError>;
