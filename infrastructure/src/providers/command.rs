//! Command-backed model client.
//!
//! Runs a local command per call (e.g. `ollama run {model}`), writes the
//! prompt to its stdin and takes trimmed stdout as the completion.

use async_trait::async_trait;
use conclave_application::{ClientError, ModelClient};
use conclave_domain::Completion;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

const MODEL_PLACEHOLDER: &str = "{model}";

pub struct CommandModelClient {
    provider: String,
    command: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandModelClient {
    pub fn new(provider: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            command: command.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    fn args_for(&self, model: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace(MODEL_PLACEHOLDER, model))
            .collect()
    }

    async fn run(&self, prompt: &str, model: &str) -> Result<Completion, ClientError> {
        let mut child = Command::new(&self.command)
            .args(self.args_for(model))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ClientError::ConnectionError(format!("{}: {}", self.command, e)))?;

        // Feed stdin from its own task so a command echoing a large prompt
        // cannot block on a full stdout pipe.
        let writer = child.stdin.take().map(|mut stdin| {
            let prompt = prompt.to_string();
            tokio::spawn(async move { stdin.write_all(prompt.as_bytes()).await })
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ClientError::RequestFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.trim();
            return Err(ClientError::RequestFailed(if detail.is_empty() {
                format!("{} exited with {}", self.command, output.status)
            } else {
                format!("{} exited with {}: {}", self.command, output.status, detail)
            }));
        }

        // A command that exits without reading stdin closes the pipe early
        if let Some(writer) = writer {
            match writer.await {
                Ok(Err(e)) if e.kind() != std::io::ErrorKind::BrokenPipe => {
                    return Err(ClientError::RequestFailed(format!("writing prompt: {}", e)));
                }
                Err(e) => {
                    return Err(ClientError::RequestFailed(format!("writing prompt: {}", e)));
                }
                Ok(_) => {}
            }
        }

        let content = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(
            "{} answered for {} ({} bytes)",
            self.provider,
            model,
            content.len()
        );
        Ok(Completion::new(content))
    }
}

#[async_trait]
impl ModelClient for CommandModelClient {
    fn provider(&self) -> &str {
        &self.provider
    }

    async fn complete(&self, prompt: &str, model: &str) -> Result<Completion, ClientError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.run(prompt, model))
                .await
                .map_err(|_| ClientError::Timeout(limit))?,
            None => self.run(prompt, model).await,
        }
    }
}
