//! Post-update triggers

use async_trait::async_trait;
use loader_core::{LoaderError, Result};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Action run once after a batch of files has been replaced, typically to
/// tell the running agent to restart.
#[async_trait]
pub trait Trigger: Send + Sync {
    async fn fire(&self) -> Result<()>;

    fn describe(&self) -> String;
}

#[async_trait]
impl<T: Trigger + ?Sized> Trigger for Arc<T> {
    async fn fire(&self) -> Result<()> {
        (**self).fire().await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Does nothing. Used when no trigger is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTrigger;

#[async_trait]
impl Trigger for NoopTrigger {
    async fn fire(&self) -> Result<()> {
        Ok(())
    }

    fn describe(&self) -> String {
        "no trigger".to_string()
    }
}

/// Runs an external program; a non-zero exit status is a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTrigger {
    program: String,
    args: Vec<String>,
}

impl CommandTrigger {
    /// Build from an argv list: program first, then its arguments.
    pub fn from_argv(argv: &[String]) -> Result<Self> {
        let (program, args) = argv.split_first().ok_or_else(|| LoaderError::InvalidConfig {
            reason: "trigger command is empty".to_string(),
        })?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

#[async_trait]
impl Trigger for CommandTrigger {
    #[instrument(skip(self), fields(program = %self.program))]
    async fn fire(&self) -> Result<()> {
        let status = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .status()
            .await
            .map_err(|e| LoaderError::Trigger {
                reason: format!("cannot run {}: {}", self.program, e),
            })?;
        debug!(%status, "trigger command exited");
        if !status.success() {
            return Err(LoaderError::Trigger {
                reason: format!("{} exited with {}", self.program, status),
            });
        }
        Ok(())
    }

    fn describe(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Wraps a plain function or closure.
pub struct FnTrigger<F> {
    name: String,
    action: F,
}

impl<F> FnTrigger<F>
where
    F: Fn() -> Result<()> + Send + Sync,
{
    pub fn new(name: impl Into<String>, action: F) -> Self {
        Self {
            name: name.into(),
            action,
        }
    }
}

#[async_trait]
impl<F> Trigger for FnTrigger<F>
where
    F: Fn() -> Result<()> + Send + Sync,
{
    async fn fire(&self) -> Result<()> {
        (self.action)()
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loader_core::ErrorKind;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_command_rejected() {
        let err = CommandTrigger::from_argv(&[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_describe_joins_argv() {
        let trigger = CommandTrigger::from_argv(&argv(&["systemctl", "restart", "fleet-agent"])).unwrap();
        assert_eq!(trigger.describe(), "systemctl restart fleet-agent");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_exit_status() {
        let ok = CommandTrigger::from_argv(&argv(&["sh", "-c", "exit 0"])).unwrap();
        let failing = CommandTrigger::from_argv(&argv(&["sh", "-c", "exit 3"])).unwrap();

        tokio_test::assert_ok!(ok.fire().await);
        let err = failing.fire().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Trigger);
    }

    #[tokio::test]
    async fn test_missing_program_is_trigger_error() {
        let trigger = CommandTrigger::from_argv(&argv(&["/nonexistent/restart-agent"])).unwrap();
        let err = trigger.fire().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Trigger);
        assert!(err.to_string().contains("cannot run /nonexistent/restart-agent"));
    }
}
