use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader};
use std::process::{Child, ChildStderr, ChildStdout, Command, Stdio};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::error::ProbeError;
use super::ProbeRecord;

/// Lines of probe stderr kept for error messages.
pub const STDERR_TAIL_LINES: usize = 20;
const MAX_LINE_CHARS: usize = 512;
const POLL_INTERVAL: Duration = Duration::from_millis(20);
/// How long stdout may stay open after the process exits.
const EXIT_GRACE: Duration = Duration::from_secs(5);

type Tail = Arc<Mutex<VecDeque<String>>>;

fn snapshot(tail: &Tail) -> String {
    match tail.lock() {
        Ok(lines) => lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n"),
        Err(poisoned) => poisoned
            .into_inner()
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Log every stderr line and keep the last few.
fn drain_stderr(stderr: ChildStderr, tail: Tail, done: mpsc::Sender<()>) {
    let mut reader = BufReader::new(stderr);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']);
                debug!(target: "routedoc::probe::child", "{line}");
                let mut kept: String = line.chars().take(MAX_LINE_CHARS).collect();
                if kept.len() < line.len() {
                    kept.push_str("...");
                }
                if let Ok(mut lines) = tail.lock() {
                    if lines.len() == STDERR_TAIL_LINES {
                        lines.pop_front();
                    }
                    lines.push_back(kept);
                }
            }
            Err(e) => {
                debug!(error = %e, "Probe stderr read failed");
                break;
            }
        }
    }
    // The receiver may be gone after a timeout
    done.send(()).ok();
}

/// Decode the record array, then read stdout to EOF so the child never
/// blocks on a full pipe.
fn decode_stdout(stdout: ChildStdout) -> serde_json::Result<Vec<ProbeRecord>> {
    let mut reader = BufReader::new(stdout);
    let decoded = serde_json::from_reader::<_, Vec<ProbeRecord>>(&mut reader);
    if let Err(e) = io::copy(&mut reader, &mut io::sink()) {
        debug!(error = %e, "Probe stdout drain failed");
    }
    decoded
}

fn validate(records: &[ProbeRecord]) -> Result<(), ProbeError> {
    for (index, record) in records.iter().enumerate() {
        let missing = if record.method.is_empty() {
            Some("Method")
        } else if record.url.is_empty() {
            Some("URL")
        } else if record.func.is_empty() {
            Some("Func")
        } else {
            None
        };
        if let Some(field) = missing {
            return Err(ProbeError::Protocol {
                index,
                reason: format!("empty {field}"),
            });
        }
    }
    Ok(())
}

fn kill(child: &mut Child) {
    if let Err(e) = child.kill() {
        warn!(error = %e, "Failed to kill probe process");
    }
    if let Err(e) = child.wait() {
        warn!(error = %e, "Failed to reap probe process");
    }
}

fn take_pipe<T>(pipe: Option<T>, child: &mut Child, stream: &'static str) -> Result<T, ProbeError> {
    match pipe {
        Some(p) => Ok(p),
        None => {
            kill(child);
            Err(ProbeError::Drain { stream })
        }
    }
}

/// Run a probe command and decode its record array.
///
/// stdin is closed. stderr is drained on its own thread (logged at debug,
/// last lines kept for errors) while stdout is decoded on another, so
/// neither pipe can fill up and stall the child. The child is killed once
/// `timeout` elapses.
///
/// Failures are reported in this order: timeout, unsuccessful exit, decode
/// failure, protocol violation.
///
/// # Errors
///
/// Returns the [`ProbeError`] for the first failing stage.
pub fn run_probe(mut command: Command, timeout: Duration) -> Result<Vec<ProbeRecord>, ProbeError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let program = command.get_program().to_string_lossy().into_owned();
    debug!(program = %program, timeout_secs = timeout.as_secs(), "Launching probe");

    let mut child = command
        .spawn()
        .map_err(|source| ProbeError::Launch {
            program: program.clone(),
            source,
        })?;

    let stdout = child.stdout.take();
    let stdout = take_pipe(stdout, &mut child, "stdout")?;
    let stderr = child.stderr.take();
    let stderr = take_pipe(stderr, &mut child, "stderr")?;

    let tail: Tail = Arc::new(Mutex::new(VecDeque::with_capacity(STDERR_TAIL_LINES)));
    let (err_done_tx, err_done_rx) = mpsc::channel();
    let (out_tx, out_rx) = mpsc::channel();

    let stderr_tail = Arc::clone(&tail);
    let err_thread = thread::Builder::new()
        .name("probe-stderr".into())
        .spawn(move || drain_stderr(stderr, stderr_tail, err_done_tx));
    let out_thread = thread::Builder::new()
        .name("probe-stdout".into())
        .spawn(move || {
            out_tx.send(decode_stdout(stdout)).ok();
        });
    if err_thread.is_err() || out_thread.is_err() {
        kill(&mut child);
        return Err(ProbeError::Drain {
            stream: if err_thread.is_err() { "stderr" } else { "stdout" },
        });
    }

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                kill(&mut child);
                warn!(timeout_secs = timeout.as_secs(), "Probe timed out, killed");
                // Reader threads are left to finish on their own; a
                // grandchild may still hold the pipes open.
                return Err(ProbeError::Timeout {
                    after: timeout,
                    stderr: snapshot(&tail),
                });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                kill(&mut child);
                return Err(ProbeError::Launch { program, source: e });
            }
        }
    };

    // Let stderr finish so the tail is complete
    if err_done_rx.recv_timeout(EXIT_GRACE).is_err() {
        debug!("Probe stderr still open after exit");
    }
    let stderr_text = snapshot(&tail);

    if !status.success() {
        return Err(ProbeError::Exit {
            status,
            stderr: stderr_text,
        });
    }

    let decoded = out_rx
        .recv_timeout(EXIT_GRACE)
        .map_err(|_| ProbeError::Drain { stream: "stdout" })?;
    let records = decoded.map_err(|source| ProbeError::Decode {
        source,
        stderr: stderr_text,
    })?;
    validate(&records)?;
    debug!(records = records.len(), "Probe finished");
    Ok(records)
}
