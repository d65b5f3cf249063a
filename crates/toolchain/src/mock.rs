//! Mock tool runner
//!
//! Scripted per-tool behaviour for tests, with failure injection and a record
//! of every invocation.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use contracts::{
    ToolExit, ToolId, EXIT_SATISFIABLE, EXIT_UNSATISFIABLE, TRACE_CHECK_SUCCESS,
};
use tracing::instrument;

use crate::error::{Result, ToolchainError};
use crate::runner::{StdoutTarget, ToolInvocation, ToolRun, ToolRunner};

/// How a mocked tool behaves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockBehavior {
    pub exit: ToolExit,
    /// Returned when captured, written when redirected to a file
    pub stdout: Vec<u8>,
    /// Write placeholder files for the invocation's declared outputs
    pub produce_outputs: bool,
    /// Simulated run time
    pub delay: Option<Duration>,
    /// Fail to launch instead of running
    pub launch_error: bool,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self::exit_code(0)
    }
}

impl MockBehavior {
    pub fn exit_code(code: i32) -> Self {
        Self {
            exit: ToolExit::Code(code),
            stdout: Vec::new(),
            produce_outputs: true,
            delay: None,
            launch_error: false,
        }
    }

    pub fn terminated() -> Self {
        Self {
            exit: ToolExit::Terminated,
            ..Self::default()
        }
    }

    pub fn launch_failure() -> Self {
        Self {
            launch_error: true,
            produce_outputs: false,
            ..Self::default()
        }
    }

    pub fn with_stdout(mut self, stdout: impl Into<Vec<u8>>) -> Self {
        self.stdout = stdout.into();
        self
    }

    pub fn without_outputs(mut self) -> Self {
        self.produce_outputs = false;
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Mock runner
pub struct MockToolRunner {
    behaviors: HashMap<ToolId, MockBehavior>,
    invocations: Mutex<Vec<ToolInvocation>>,
}

impl MockToolRunner {
    /// Every tool exits 0 and writes its outputs
    pub fn new() -> Self {
        Self {
            behaviors: HashMap::new(),
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// Every stage answers with its "continue" result, ending in a certificate
    pub fn certifying() -> Self {
        Self::new()
            .with_behavior(ToolId::QbfSolver, MockBehavior::exit_code(EXIT_UNSATISFIABLE))
            .with_behavior(
                ToolId::ProofSatSolver,
                MockBehavior::exit_code(EXIT_UNSATISFIABLE),
            )
            .with_behavior(
                ToolId::TraceChecker,
                MockBehavior::exit_code(0).with_stdout(format!("{TRACE_CHECK_SUCCESS}\n")),
            )
            .with_behavior(
                ToolId::CertificateMerger,
                MockBehavior::exit_code(0).with_stdout("p cnf 0 0\n"),
            )
            .with_behavior(
                ToolId::CertificateSatSolver,
                MockBehavior::exit_code(EXIT_UNSATISFIABLE),
            )
    }

    /// The QBF solver reports the formula true
    pub fn proving_true() -> Self {
        Self::certifying()
            .with_behavior(ToolId::QbfSolver, MockBehavior::exit_code(EXIT_SATISFIABLE))
    }

    pub fn with_behavior(mut self, tool: ToolId, behavior: MockBehavior) -> Self {
        self.behaviors.insert(tool, behavior);
        self
    }

    /// All invocations so far, in order
    pub fn invocations(&self) -> Vec<ToolInvocation> {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn invoked_tools(&self) -> Vec<ToolId> {
        self.invocations().iter().map(|inv| inv.tool).collect()
    }

    fn record(&self, invocation: &ToolInvocation) {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(invocation.clone());
    }

    fn write_outputs(invocation: &ToolInvocation, behavior: &MockBehavior) -> std::io::Result<()> {
        if behavior.produce_outputs {
            for path in &invocation.outputs {
                std::fs::write(path, format!("{} output\n", invocation.tool))?;
            }
        }
        if let StdoutTarget::File(path) = &invocation.stdout {
            std::fs::write(path, &behavior.stdout)?;
        }
        Ok(())
    }
}

impl Default for MockToolRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRunner for MockToolRunner {
    #[instrument(name = "mock_runner_run", skip(self, invocation), fields(tool = %invocation.tool))]
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolRun> {
        self.record(invocation);
        let behavior = self
            .behaviors
            .get(&invocation.tool)
            .cloned()
            .unwrap_or_default();

        if behavior.launch_error {
            return Err(ToolchainError::launch(
                invocation.tool,
                &invocation.program,
                std::io::Error::from(std::io::ErrorKind::NotFound),
            ));
        }

        if let Some(delay) = behavior.delay {
            match invocation.timeout {
                Some(limit) if limit < delay => {
                    tokio::time::sleep(limit).await;
                    return Ok(ToolRun {
                        exit: ToolExit::TimedOut,
                        stdout: Vec::new(),
                        elapsed: limit,
                    });
                }
                _ => tokio::time::sleep(delay).await,
            }
        }

        Self::write_outputs(invocation, &behavior).map_err(|source| ToolchainError::Wait {
            tool: invocation.tool,
            source,
        })?;

        let stdout = match invocation.stdout {
            StdoutTarget::Capture => behavior.stdout.clone(),
            _ => Vec::new(),
        };
        Ok(ToolRun {
            exit: behavior.exit,
            stdout,
            elapsed: behavior.delay.unwrap_or_default(),
        })
    }
}
