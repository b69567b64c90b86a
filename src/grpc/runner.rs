//! Subprocess runner for the reflection tool.
//!
//! Each call spawns a fresh child with its own argv, so no flag state can
//! leak between calls. Calls run one at a time on a current-thread runtime.

use anyhow::{Context, Result};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::{ReflectionTool, ToolSpec};
use crate::error::{DispatchError, DispatchResult};
use crate::log_debug;

pub struct GrpcCli {
    spec: ToolSpec,
    timeout: Option<Duration>,
    rt: tokio::runtime::Runtime,
}

impl GrpcCli {
    /// `timeout` bounds each call; `None` waits forever.
    pub fn new(spec: ToolSpec, timeout: Option<Duration>) -> Result<Self> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to create Tokio runtime")?;
        log_debug!("reflection tool: {spec}");
        Ok(Self { spec, timeout, rt })
    }

    async fn run_async(&self, argv: &[String]) -> DispatchResult<String> {
        let mut cmd = Command::new(&self.spec.program);
        cmd.args(&self.spec.args)
            .args(argv)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let spawned = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, cmd.output())
                .await
                .map_err(|_| {
                    DispatchError::tool(format!(
                        "{} timed out after {}s",
                        self.spec.program,
                        limit.as_secs_f64()
                    ))
                })?,
            None => cmd.output().await,
        };
        let output = spawned.map_err(|e| {
            DispatchError::tool(format!("failed to launch {}: {e}", self.spec.program))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let diagnostic = match stderr.trim() {
                "" => format!("{} exited with {}", self.spec.program, output.status),
                msg => msg.to_string(),
            };
            return Err(DispatchError::tool(diagnostic));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl ReflectionTool for GrpcCli {
    fn run(&self, argv: &[String]) -> DispatchResult<String> {
        self.rt.block_on(self.run_async(argv))
    }
}
