//! Client for the Akave storage network that drives the `akavecli` binary.
//!
//! [`IpcClient`] maps each bucket/file operation onto an `akavecli ipc`
//! invocation ([`command`]), runs it as a child process ([`runner`]) and
//! decodes the console output into records ([`parser`]).

pub mod client;
pub mod command;
pub mod credentials;
pub mod error;
pub mod parser;
pub mod runner;

#[cfg(all(unix, any(test, feature = "test-support")))]
pub mod test_support;

pub use client::{normalize_file_name, IpcClient};
pub use credentials::{mask_address, Credentials};
pub use error::{IpcError, Result};
pub use parser::{parse, CommandOutput, ParserKind, Record};
pub use runner::{CliRunner, ExecResult, DEFAULT_CLI_PATH};
