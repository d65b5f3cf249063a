//! Process-backed runner (tokio::process)

use std::process::Stdio;
use std::time::Instant;

use contracts::ToolExit;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use crate::error::{Result, ToolchainError};
use crate::runner::{StdoutTarget, ToolInvocation, ToolRun, ToolRunner};

/// Runs tools as child processes.
///
/// Children are killed (SIGKILL) when their future is dropped, which covers
/// both timeouts and cancellation. On unix each child gets its own process
/// group, so a terminal Ctrl+C reaches only the orchestrator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    fn command(invocation: &ToolInvocation) -> Result<Command> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        match &invocation.stdout {
            StdoutTarget::Inherit => {
                cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
            StdoutTarget::Discard => {
                cmd.stdout(Stdio::null()).stderr(Stdio::null());
            }
            StdoutTarget::Capture => {
                cmd.stdout(Stdio::piped()).stderr(Stdio::inherit());
            }
            StdoutTarget::File(path) => {
                let file =
                    std::fs::File::create(path).map_err(|source| ToolchainError::Redirect {
                        tool: invocation.tool,
                        path: path.clone(),
                        source,
                    })?;
                cmd.stdout(Stdio::from(file)).stderr(Stdio::inherit());
            }
        }
        Ok(cmd)
    }
}

impl ToolRunner for ProcessRunner {
    #[instrument(
        name = "process_runner_run",
        skip(self, invocation),
        fields(tool = %invocation.tool, timeout = ?invocation.timeout)
    )]
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolRun> {
        debug!(command = %invocation.command_line(), "spawning tool");

        let mut cmd = Self::command(invocation)?;
        let started = Instant::now();
        let child = cmd
            .spawn()
            .map_err(|source| ToolchainError::launch(invocation.tool, &invocation.program, source))?;

        // The child is owned by the wait future; dropping it on timeout kills the tool.
        let waited = match invocation.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .ok(),
            None => Some(child.wait_with_output().await),
        };
        let elapsed = started.elapsed();

        let Some(result) = waited else {
            warn!(
                elapsed_secs = elapsed.as_secs_f64(),
                "tool exceeded its timeout and was killed"
            );
            return Ok(ToolRun {
                exit: ToolExit::TimedOut,
                stdout: Vec::new(),
                elapsed,
            });
        };

        let output = result.map_err(|source| ToolchainError::Wait {
            tool: invocation.tool,
            source,
        })?;
        let exit = match output.status.code() {
            Some(code) => ToolExit::Code(code),
            None => ToolExit::Terminated,
        };
        debug!(%exit, elapsed_ms = elapsed.as_millis() as u64, "tool finished");

        Ok(ToolRun {
            exit,
            stdout: output.stdout,
            elapsed,
        })
    }
}
