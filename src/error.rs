//! Error taxonomy for discovery, resolution and dispatch.
//!
//! Every variant is terminal for the current invocation; nothing retries.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by a single `grpc-ctl` command invocation.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A resolution step produced zero candidates.
    #[error("{0} is not found.")]
    NotFound(String),

    /// A resolution step produced two or more candidates.
    #[error("{0} is ambiguous.")]
    Ambiguous(String),

    /// Wrong number of positional arguments for the chosen command.
    #[error("{command}: {message}")]
    ArgumentCount {
        command: &'static str,
        message: &'static str,
    },

    /// Command token not present in the dispatch table.
    #[error("{0} isn't supported")]
    UnsupportedCommand(String),

    /// The reflection tool exited non-zero, could not be spawned, or timed out.
    #[error("gRPC command failed: {diagnostic}")]
    ToolFailure { diagnostic: String },

    /// The socket directory could not be read.
    #[error("failed to read socket directory {}: {io}", path.display())]
    Discovery { path: PathBuf, io: std::io::Error },

    /// The tool answered, but not in the shape we parse.
    #[error("unexpected output from reflection tool: {0}")]
    UnexpectedOutput(String),
}

impl DispatchError {
    pub(crate) fn tool(diagnostic: impl Into<String>) -> Self {
        DispatchError::ToolFailure {
            diagnostic: diagnostic.into(),
        }
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;
