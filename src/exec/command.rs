// src/exec/command.rs

//! Production backend: run each workflow as a shell command.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{Instrument, debug, info, warn};

use crate::dag::Inputs;
use crate::exec::backend::{WorkflowRun, WorkflowRunner};

/// Runs `workflow` through the platform shell.
///
/// Every input is exported to the child as `INPUT_<NAME>`: the name is
/// uppercased and anything outside `[A-Z0-9_]` becomes `_`. String values are
/// passed verbatim, other values in TOML syntax.
#[derive(Debug, Clone, Default)]
pub struct CommandRunner;

/// How long output readers may keep draining after the shell has exited.
/// A background process that inherited the pipes can hold them open
/// indefinitely; the call ends with the shell, not with its children.
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_millis(200);

impl CommandRunner {
    pub fn new() -> Self {
        Self
    }
}

impl WorkflowRunner for CommandRunner {
    fn run<'a>(&'a self, workflow: &'a str, inputs: &'a Inputs) -> WorkflowRun<'a> {
        Box::pin(run_command(workflow, inputs))
    }
}

/// Environment variable name used for an input.
pub fn input_env_name(name: &str) -> String {
    let mut env = String::with_capacity(name.len() + 6);
    env.push_str("INPUT_");
    env.extend(name.chars().map(|c| {
        if c.is_ascii_alphanumeric() {
            c.to_ascii_uppercase()
        } else {
            '_'
        }
    }));
    env
}

/// Render an input value for the environment.
pub fn input_env_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

async fn run_command(workflow: &str, inputs: &Inputs) -> Result<()> {
    info!(workflow = %workflow, inputs = inputs.len(), "starting workflow process");

    // Build a shell command appropriate for the platform.
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(workflow);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(workflow);
        c
    };

    for (name, value) in inputs {
        cmd.env(input_env_name(name), input_env_value(value));
    }

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for workflow '{workflow}'"))?;

    // Always consume both pipes so buffers don't fill; log at debug.
    let stdout = child.stdout.take().map(|out| {
        tokio::spawn(forward_lines(workflow.to_string(), "stdout", out).in_current_span())
    });
    let stderr = child.stderr.take().map(|err| {
        tokio::spawn(forward_lines(workflow.to_string(), "stderr", err).in_current_span())
    });

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of workflow '{workflow}'"))?;

    for reader in [stdout, stderr].into_iter().flatten() {
        finish_reader(workflow, reader).await;
    }

    let code = status.code().unwrap_or(-1);
    info!(
        workflow = %workflow,
        exit_code = code,
        success = status.success(),
        "workflow process exited"
    );

    if !status.success() {
        bail!("workflow '{workflow}' exited with code {code}");
    }

    Ok(())
}

async fn finish_reader(workflow: &str, mut reader: JoinHandle<()>) {
    match timeout(OUTPUT_DRAIN_GRACE, &mut reader).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(workflow = %workflow, error = %e, "output reader task failed"),
        Err(_) => {
            debug!(workflow = %workflow, "output still open after exit; detaching reader");
            reader.abort();
        }
    }
}

/// Log each output line at debug. Lines are read as raw bytes so that
/// non-UTF-8 output never stops the pipe from being drained.
async fn forward_lines<R>(workflow: String, stream: &'static str, reader: R)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                debug!(workflow = %workflow, stream, "{}", line.trim_end_matches(['\r', '\n']));
            }
            Err(e) => {
                warn!(workflow = %workflow, stream, error = %e, "reading workflow output failed");
                break;
            }
        }
    }
}
