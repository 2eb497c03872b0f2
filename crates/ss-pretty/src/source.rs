use crate::config::SessionConfig;
use std::{io, process::Stdio};
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum PollError {
    #[error("'{program}' not found")]
    Missing { program: String },
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("'{program}' exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}

/// Producer of one polling cycle's raw statistics text.
pub trait StatsSource {
    async fn poll(&mut self) -> Result<String, PollError>;
}

/// Runs `ss <flags> <filter>` and captures its whole stdout.
#[derive(Debug, Clone)]
pub struct SsCommand {
    program: String,
    flags: String,
    filter: String,
}

impl SsCommand {
    pub fn new(program: impl Into<String>, flags: impl Into<String>, filter: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            flags: flags.into(),
            filter: filter.into(),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(&config.ss_path, &config.ss_flags, &config.filter)
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args([self.flags.as_str(), self.filter.as_str()])
            .stdin(Stdio::null())
            .kill_on_drop(true);
        // Keep the operator's Ctrl-C away from ss so the cycle in flight completes.
        #[cfg(unix)]
        command.process_group(0);
        command
    }
}

impl StatsSource for SsCommand {
    async fn poll(&mut self) -> Result<String, PollError> {
        let output = self.command().output().await.map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                PollError::Missing {
                    program: self.program.clone(),
                }
            } else {
                PollError::Spawn {
                    program: self.program.clone(),
                    source: err,
                }
            }
        })?;
        if !output.status.success() {
            return Err(PollError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
