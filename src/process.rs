//! Rulefile subprocess plumbing: spawning a phase, streaming its output,
//! waiting with cancellation, and mapping exit statuses to errors.
//!
//! Waiting polls `try_wait` so cancellation is observed while the child
//! runs; a cancelled child gets SIGTERM and, after a short grace, SIGKILL.
//! Pipe-close alone is not relied on to stop children.

use crate::cancel::Cancel;
use anyhow::{bail, Context};
use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[cfg(unix)]
use std::os::unix::process::ExitStatusExt;

/// Output sink owned by one target.  The mutex lets the reader thread of
/// the live subprocess borrow the writer; it is never shared across targets.
pub type Sink = Mutex<Box<dyn Write + Send>>;

const POLL_INTERVAL: Duration = Duration::from_millis(25);
const TERM_GRACE: Duration = Duration::from_millis(500);

/// Run `cmd` to completion, streaming its stdout and stderr into the given
/// sinks.  A missing sink discards that stream.
pub fn run(
    mut cmd: Command,
    stdout: Option<&Sink>,
    stderr: Option<&Sink>,
    cancel: &Cancel,
) -> anyhow::Result<()> {
    if cancel.is_cancelled() {
        bail!("cancelled");
    }
    let program = cmd.get_program().to_string_lossy().into_owned();
    cmd.stdin(Stdio::null());
    cmd.stdout(if stdout.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    });
    cmd.stderr(if stderr.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    });

    let mut child = cmd.spawn().with_context(|| format!("exec {}", program))?;
    let out_pipe = child.stdout.take();
    let err_pipe = child.stderr.take();

    let status = std::thread::scope(|s| -> anyhow::Result<ExitStatus> {
        let mut readers = Vec::new();
        if let (Some(pipe), Some(sink)) = (out_pipe, stdout) {
            readers.push(s.spawn(move || copy_to_sink(pipe, sink)));
        }
        if let (Some(pipe), Some(sink)) = (err_pipe, stderr) {
            readers.push(s.spawn(move || copy_to_sink(pipe, sink)));
        }
        let status = wait(&mut child, cancel)?;
        for reader in readers {
            reader.join().unwrap().context("copy output")?;
        }
        Ok(status)
    })?;

    status_error(status)
}

/// Run `cmd` to completion, capturing its stdout; stderr still streams to
/// its sink.  The captured bytes are returned only on a zero exit.
pub fn capture(
    mut cmd: Command,
    stderr: Option<&Sink>,
    cancel: &Cancel,
) -> anyhow::Result<Vec<u8>> {
    if cancel.is_cancelled() {
        bail!("cancelled");
    }
    let program = cmd.get_program().to_string_lossy().into_owned();
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(if stderr.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    });

    let mut child = cmd.spawn().with_context(|| format!("exec {}", program))?;
    let mut out_pipe = child.stdout.take().expect("stdout is piped");
    let err_pipe = child.stderr.take();

    let (status, output) = std::thread::scope(|s| -> anyhow::Result<(ExitStatus, Vec<u8>)> {
        let reader = s.spawn(move || {
            let mut buf = Vec::new();
            out_pipe.read_to_end(&mut buf).map(|_| buf)
        });
        let mut err_reader = None;
        if let (Some(pipe), Some(sink)) = (err_pipe, stderr) {
            err_reader = Some(s.spawn(move || copy_to_sink(pipe, sink)));
        }
        let status = wait(&mut child, cancel)?;
        let output = reader.join().unwrap().context("read output")?;
        if let Some(reader) = err_reader {
            reader.join().unwrap().context("copy output")?;
        }
        Ok((status, output))
    })?;

    status_error(status)?;
    Ok(output)
}

fn copy_to_sink(mut pipe: impl Read, sink: &Sink) -> std::io::Result<()> {
    let mut buf = [0u8; 4096];
    loop {
        let n = pipe.read(&mut buf)?;
        if n == 0 {
            return Ok(());
        }
        sink.lock().unwrap().write_all(&buf[..n])?;
    }
}

fn wait(child: &mut Child, cancel: &Cancel) -> anyhow::Result<ExitStatus> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if cancel.is_cancelled() {
            return kill(child);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Terminate a cancelled child: SIGTERM, a short grace, then SIGKILL.
fn kill(child: &mut Child) -> anyhow::Result<ExitStatus> {
    terminate(child);
    let deadline = Instant::now() + TERM_GRACE;
    while Instant::now() < deadline {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
    child.kill()?;
    Ok(child.wait()?)
}

#[cfg(unix)]
fn terminate(child: &Child) {
    unsafe {
        libc::kill(child.id() as libc::pid_t, libc::SIGTERM);
    }
}

#[cfg(not(unix))]
fn terminate(_child: &Child) {
    // No graceful step; the caller escalates to kill().
}

/// Map a non-zero exit status to an error describing it the way a shell
/// would: `exit status 1`, `signal: killed`.
fn status_error(status: ExitStatus) -> anyhow::Result<()> {
    if status.success() {
        return Ok(());
    }
    #[cfg(unix)]
    if let Some(sig) = status.signal() {
        bail!("signal: {}", signal_name(sig));
    }
    match status.code() {
        Some(code) => bail!("exit status {}", code),
        None => bail!("{}", status),
    }
}

#[cfg(unix)]
fn signal_name(sig: i32) -> String {
    match sig {
        libc::SIGHUP => "hangup".to_string(),
        libc::SIGINT => "interrupt".to_string(),
        libc::SIGQUIT => "quit".to_string(),
        libc::SIGKILL => "killed".to_string(),
        libc::SIGTERM => "terminated".to_string(),
        _ => format!("{}", sig),
    }
}
