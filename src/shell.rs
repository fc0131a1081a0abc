//! Guarded command execution
//!
//! Commands extracted from model replies are spawned detached through
//! the OS shell: launch success or failure is recorded, exit status is
//! not awaited. Execution is an explicit opt-in (`exec.enabled`) and
//! each command asks for confirmation unless that was switched off.

use dialoguer::Confirm;

use crate::config::ExecConfig;

/// Outcome of one command launch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecStatus {
    /// Spawned successfully (exit status not tracked)
    Launched,
    /// The spawn itself failed
    Failed(String),
    /// The user declined the confirmation prompt
    Declined,
    /// Execution is disabled by configuration
    Disabled,
}

/// One command and what happened to it
#[derive(Debug, Clone)]
pub struct ExecReport {
    pub command: String,
    pub status: ExecStatus,
}

impl ExecReport {
    /// Render the report as a history line
    #[must_use]
    pub fn describe(&self) -> String {
        match &self.status {
            ExecStatus::Launched => format!("executed command: {}", self.command),
            ExecStatus::Failed(err) => {
                format!("failed to execute command: {}: {err}", self.command)
            }
            ExecStatus::Declined => format!("declined command: {}", self.command),
            ExecStatus::Disabled => {
                format!("command not executed (exec disabled): {}", self.command)
            }
        }
    }
}

/// Runs extracted command blocks under the configured policy
pub struct CommandRunner {
    policy: ExecConfig,
}

impl CommandRunner {
    /// Create a runner with the given policy
    #[must_use]
    pub const fn new(policy: ExecConfig) -> Self {
        Self { policy }
    }

    /// Split a block into individual commands
    ///
    /// The prompt convention is semicolon-separated commands in one
    /// block; newlines are honored as separators too.
    #[must_use]
    pub fn split_commands(block: &str) -> Vec<String> {
        block
            .split(['\n', ';'])
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(ToString::to_string)
            .collect()
    }

    /// Execute every command in a block, one report per command
    ///
    /// A failed launch does not stop the remaining commands.
    #[must_use]
    pub fn execute_block(&self, block: &str) -> Vec<ExecReport> {
        Self::split_commands(block)
            .into_iter()
            .map(|command| {
                let status = self.launch(&command);
                tracing::info!(command = %command, ?status, "command processed");
                ExecReport { command, status }
            })
            .collect()
    }

    fn launch(&self, command: &str) -> ExecStatus {
        if !self.policy.enabled {
            return ExecStatus::Disabled;
        }

        if self.policy.confirm && !confirm(command) {
            return ExecStatus::Declined;
        }

        match spawn_detached(command) {
            Ok(pid) => {
                tracing::debug!(pid, command, "spawned");
                ExecStatus::Launched
            }
            Err(e) => ExecStatus::Failed(e.to_string()),
        }
    }
}

/// Ask before running; a non-interactive terminal counts as a decline
fn confirm(command: &str) -> bool {
    Confirm::new()
        .with_prompt(format!("Execute `{command}`?"))
        .default(false)
        .interact()
        .unwrap_or(false)
}

/// Spawn a command through the OS shell without waiting on it
fn spawn_detached(command: &str) -> std::io::Result<u32> {
    #[cfg(windows)]
    let child = std::process::Command::new("cmd").args(["/C", command]).spawn()?;

    #[cfg(not(windows))]
    let child = std::process::Command::new("sh").args(["-c", command]).spawn()?;

    Ok(child.id())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_split_on_semicolons_and_newlines() {
        let commands = CommandRunner::split_commands("ls -la; pwd\nuptime;  ");
        assert_eq!(commands, vec!["ls -la", "pwd", "uptime"]);
    }

    #[test]
    fn empty_block_yields_no_commands() {
        assert!(CommandRunner::split_commands("  \n ; ").is_empty());
    }

    #[test]
    fn disabled_policy_never_spawns() {
        let runner = CommandRunner::new(ExecConfig {
            enabled: false,
            confirm: true,
        });
        let reports = runner.execute_block("ls; pwd");
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.status == ExecStatus::Disabled));
    }

    #[test]
    fn reports_render_history_lines() {
        let report = ExecReport {
            command: "ls".to_string(),
            status: ExecStatus::Failed("no such shell".to_string()),
        };
        assert_eq!(
            report.describe(),
            "failed to execute command: ls: no such shell"
        );
    }
}
