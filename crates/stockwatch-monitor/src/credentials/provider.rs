//! Token providers that delegate token capture to something outside the
//! process, typically a browser automation script.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::TokenProvider;
use crate::error::ProviderError;

/// Longest stderr excerpt kept in a [`ProviderError::CommandFailed`].
const MAX_STDERR_CHARS: usize = 500;

/// Runs a shell command and uses its trimmed stdout as the token.
///
/// The command is expected to print a ready-to-send `Cookie` header value,
/// e.g. `dssid2=...; as_sfa=...`. The child is killed if the refresh is
/// abandoned (for instance on timeout).
#[derive(Debug, Clone)]
pub struct CommandTokenProvider {
    command: String,
}

impl CommandTokenProvider {
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for CommandTokenProvider {
    async fn obtain(&self) -> Result<String, ProviderError> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(ProviderError::Spawn)?;

        if !output.status.success() {
            let stderr: String = String::from_utf8_lossy(&output.stderr)
                .trim()
                .chars()
                .take(MAX_STDERR_CHARS)
                .collect();
            return Err(ProviderError::CommandFailed {
                status: output.status.to_string(),
                stderr,
            });
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_owned();
        if token.is_empty() {
            return Err(ProviderError::Empty);
        }
        Ok(token)
    }
}

/// Reads the token from a file on every refresh.
#[derive(Debug, Clone)]
pub struct FileTokenProvider {
    path: PathBuf,
}

impl FileTokenProvider {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TokenProvider for FileTokenProvider {
    async fn obtain(&self) -> Result<String, ProviderError> {
        let contents =
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|source| ProviderError::ReadFile {
                    path: self.path.display().to_string(),
                    source,
                })?;
        let token = contents.trim();
        if token.is_empty() {
            return Err(ProviderError::Empty);
        }
        Ok(token.to_owned())
    }
}
