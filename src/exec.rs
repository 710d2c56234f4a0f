use std::fmt::{Display, Formatter};
use std::io;
use std::os::fd::OwnedFd;
use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use nix::sys::signal::Signal;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::net::unix::pipe;
use tokio::process::{Child, Command};
use tokio::signal::unix::{SignalKind, signal};
use tracing::{debug, warn};

use crate::buffer::ByteBuffer;

const READ_CHUNK_SIZE: usize = 4096;

/// A program name plus literal arguments. Nothing is interpreted by a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

impl Display for Invocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecPhase {
    Spawning,
    Draining,
    Waiting,
}

impl Display for ExecPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Spawning => "spawning",
            Self::Draining => "draining output of",
            Self::Waiting => "waiting for",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("i/o error while {phase} `{program}`: {source}")]
    Io {
        program: String,
        phase: ExecPhase,
        #[source]
        source: io::Error,
    },
}

impl ExecError {
    fn io(program: &str, phase: ExecPhase, source: io::Error) -> Self {
        Self::Io {
            program: program.to_string(),
            phase,
            source,
        }
    }
}

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    Success,
    Failed(i32),
    Signaled(i32),
    TimedOut(Duration),
}

impl ExitKind {
    pub fn from_status(status: ExitStatus) -> Self {
        match (status.code(), status.signal()) {
            (Some(0), _) => Self::Success,
            (Some(code), _) => Self::Failed(code),
            (None, Some(signal)) => Self::Signaled(signal),
            (None, None) => Self::Failed(-1),
        }
    }

    pub fn success(self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn describe(self, program: &str) -> String {
        match self {
            Self::Success => format!("{program} finished"),
            Self::Failed(code) => format!("{program} exited with status {code}"),
            Self::Signaled(number) => match Signal::try_from(number) {
                Ok(name) => format!("{program} terminated by signal {number} ({name})"),
                Err(_) => format!("{program} terminated by signal {number}"),
            },
            Self::TimedOut(limit) => format!(
                "{program} timed out after {}s and was killed",
                limit.as_secs_f32()
            ),
        }
    }
}

#[derive(Debug)]
pub struct CaptureReport {
    pub invocation: Invocation,
    pub output: ByteBuffer,
    pub exit: ExitKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffReport {
    pub query: ExitKind,
    pub pager: ExitKind,
}

/// Runs `invocation` with stdout and stderr merged into one pipe and collects
/// everything it writes. With a `limit`, a child still running when it
/// expires is killed and reaped, and its partial output is kept.
pub async fn capture_output(
    invocation: &Invocation,
    limit: Option<Duration>,
) -> Result<CaptureReport, ExecError> {
    let program = invocation.program.as_str();
    debug!(phase = ?ExecPhase::Spawning, "capture: {invocation}");

    let (reader, writer) =
        io::pipe().map_err(|error| ExecError::io(program, ExecPhase::Spawning, error))?;
    let stderr_writer = writer
        .try_clone()
        .map_err(|error| ExecError::io(program, ExecPhase::Spawning, error))?;

    let mut command = invocation.command();
    command
        .stdin(Stdio::null())
        .stdout(writer)
        .stderr(stderr_writer)
        .kill_on_drop(true);
    let mut child = command.spawn().map_err(|source| ExecError::Launch {
        program: program.to_string(),
        source,
    })?;
    // The command still holds both write ends; the reader only sees EOF once
    // they are gone.
    drop(command);

    let mut receiver = pipe::Receiver::from_owned_fd(OwnedFd::from(reader))
        .map_err(|error| ExecError::io(program, ExecPhase::Spawning, error))?;
    let mut output = ByteBuffer::with_capacity(READ_CHUNK_SIZE);

    let drained = drain_and_wait(program, &mut child, &mut receiver, &mut output);
    let exit = match limit {
        Some(limit) => {
            let outcome = tokio::time::timeout(limit, drained).await;
            match outcome {
                Ok(status) => ExitKind::from_status(status?),
                Err(_) => {
                    warn!("{program} exceeded {limit:?}, killing it");
                    if let Err(error) = child.start_kill() {
                        warn!("failed to kill {program}: {error}");
                    }
                    child
                        .wait()
                        .await
                        .map_err(|error| ExecError::io(program, ExecPhase::Waiting, error))?;
                    ExitKind::TimedOut(limit)
                }
            }
        }
        None => ExitKind::from_status(drained.await?),
    };

    debug!(
        exit = ?exit,
        bytes = output.len(),
        capacity = output.capacity(),
        "capture done: {program}"
    );
    Ok(CaptureReport {
        invocation: invocation.clone(),
        output,
        exit,
    })
}

async fn drain_and_wait(
    program: &str,
    child: &mut Child,
    receiver: &mut pipe::Receiver,
    output: &mut ByteBuffer,
) -> Result<ExitStatus, ExecError> {
    debug!(phase = ?ExecPhase::Draining, "{program}");
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    loop {
        let read = receiver
            .read(&mut chunk)
            .await
            .map_err(|error| ExecError::io(program, ExecPhase::Draining, error))?;
        if read == 0 {
            break;
        }
        output.append(&chunk[..read]);
    }

    debug!(phase = ?ExecPhase::Waiting, "{program}");
    child
        .wait()
        .await
        .map_err(|error| ExecError::io(program, ExecPhase::Waiting, error))
}

/// Runs `query` with its output piped into `pager`, which keeps the real
/// terminal for its own input and output. Returns once both have exited.
///
/// The caller owns the terminal state: it must leave raw mode before calling
/// and restore its UI afterwards.
pub async fn run_with_pager(
    query: &Invocation,
    pager: &Invocation,
) -> Result<HandoffReport, ExecError> {
    debug!(phase = ?ExecPhase::Spawning, "handoff: {query} | {pager}");

    // Ctrl+C inside the pager reaches the whole foreground group; keep the
    // shell alive while the chain runs.
    let _interrupts = signal(SignalKind::interrupt())
        .map_err(|error| ExecError::io(&pager.program, ExecPhase::Spawning, error))?;

    let (reader, writer) =
        io::pipe().map_err(|error| ExecError::io(&query.program, ExecPhase::Spawning, error))?;
    let stderr_writer = writer
        .try_clone()
        .map_err(|error| ExecError::io(&query.program, ExecPhase::Spawning, error))?;

    let mut query_command = query.command();
    query_command
        .stdin(Stdio::null())
        .stdout(writer)
        .stderr(stderr_writer);
    let spawned = query_command.spawn();
    drop(query_command);
    let mut query_child = match spawned {
        Ok(child) => child,
        Err(source) => {
            return Err(ExecError::Launch {
                program: query.program.clone(),
                source,
            });
        }
    };

    let mut pager_command = pager.command();
    pager_command
        .stdin(reader)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    let spawned = pager_command.spawn();
    drop(pager_command);
    let mut pager_child = match spawned {
        Ok(child) => child,
        Err(source) => {
            if let Err(error) = query_child.start_kill() {
                warn!("failed to kill {}: {error}", query.program);
            }
            let _ = query_child.wait().await;
            return Err(ExecError::Launch {
                program: pager.program.clone(),
                source,
            });
        }
    };

    debug!(phase = ?ExecPhase::Waiting, "handoff: {query} | {pager}");
    let (query_status, pager_status) = tokio::join!(query_child.wait(), pager_child.wait());
    let query_exit = query_status
        .map(ExitKind::from_status)
        .map_err(|error| ExecError::io(&query.program, ExecPhase::Waiting, error))?;
    let pager_exit = pager_status
        .map(ExitKind::from_status)
        .map_err(|error| ExecError::io(&pager.program, ExecPhase::Waiting, error))?;

    debug!(query = ?query_exit, pager = ?pager_exit, "handoff done");
    Ok(HandoffReport {
        query: query_exit,
        pager: pager_exit,
    })
}
