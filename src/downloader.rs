use std::{
    io,
    path::{Path, PathBuf},
    process::{ExitStatus, Stdio},
};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::{Child, Command},
    runtime::Handle,
    sync::{
        mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender},
        oneshot,
    },
};
use tracing::{debug, info, warn};
use crate::error::{DownloadError, DownloadResult};
use crate::model::{DownloadEvent, Outcome};
use crate::progress::parse_progress_from_line;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x08000000;

/// The display thread's grip on one running download: a cancel hook and the
/// worker's event stream. The worker keeps running if this is dropped.
pub struct DownloadHandle {
    cancel: Option<oneshot::Sender<()>>,
    events: UnboundedReceiver<DownloadEvent>,
}

impl DownloadHandle {
    /// Asks the worker to terminate the child. Only the first call does anything.
    pub fn cancel(&mut self) {
        if let Some(tx) = self.cancel.take() {
            // Worker already gone means the run finished on its own.
            let _ = tx.send(());
        }
    }

    pub fn is_cancelling(&self) -> bool {
        self.cancel.is_none()
    }

    /// Next queued event without blocking. A worker that vanished without
    /// its `Finished` event (panic, runtime shutdown) ends the run as an error.
    pub fn try_recv(&mut self) -> Option<DownloadEvent> {
        match self.events.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                warn!("download worker stopped without reporting an outcome");
                Some(DownloadEvent::Finished(Outcome::Error(
                    "download worker stopped".to_owned(),
                )))
            }
        }
    }

    #[cfg(test)]
    pub async fn recv(&mut self) -> Option<DownloadEvent> {
        self.events.recv().await
    }
}

/// Spawns the worker task on `runtime`. Its last event is always `Finished`.
pub fn start(runtime: &Handle, program: PathBuf, args: Vec<String>) -> DownloadHandle {
    let (event_tx, events) = mpsc::unbounded_channel();
    let (cancel_tx, cancel_rx) = oneshot::channel();

    runtime.spawn(async move {
        let outcome = supervise(&program, &args, &event_tx, cancel_rx).await;
        let _ = event_tx.send(DownloadEvent::Finished(outcome));
    });

    DownloadHandle {
        cancel: Some(cancel_tx),
        events,
    }
}

/// Runs `program` to completion or cancellation, streaming its output as events.
pub async fn supervise(
    program: &Path,
    args: &[String],
    events: &UnboundedSender<DownloadEvent>,
    cancel: oneshot::Receiver<()>,
) -> Outcome {
    match run(program, args, events, cancel).await {
        Ok(outcome) => {
            info!(?outcome, "download finished");
            outcome
        }
        Err(DownloadError::ToolMissing(tool)) => {
            warn!(%tool, "download tool not found");
            Outcome::ToolMissing
        }
        Err(e) => {
            warn!(error = %e, "download aborted");
            Outcome::Error(e.to_string())
        }
    }
}

async fn run(
    program: &Path,
    args: &[String],
    events: &UnboundedSender<DownloadEvent>,
    mut cancel: oneshot::Receiver<()>,
) -> DownloadResult<Outcome> {
    let mut child = spawn(program, args)?;
    info!(pid = ?child.id(), program = %program.display(), "download started");

    // stdout and stderr share one line stream
    let (line_tx, mut lines) = mpsc::unbounded_channel();
    if let Some(out) = child.stdout.take() {
        tokio::spawn(forward_lines(out, line_tx.clone()));
    }
    if let Some(err) = child.stderr.take() {
        tokio::spawn(forward_lines(err, line_tx.clone()));
    }
    drop(line_tx);

    // A dropped handle disarms cancellation instead of triggering it.
    let mut armed = true;

    loop {
        tokio::select! {
            biased;
            res = &mut cancel, if armed => {
                if res.is_ok() {
                    return terminate(&mut child).await;
                }
                armed = false;
            }
            line = lines.recv() => match line {
                Some(Ok(line)) => report_line(events, line),
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
        }
    }

    let status = loop {
        tokio::select! {
            biased;
            res = &mut cancel, if armed => {
                if res.is_ok() {
                    return terminate(&mut child).await;
                }
                armed = false;
            }
            status = child.wait() => break status?,
        }
    };

    exit_outcome(program, status)
}

fn spawn(program: &Path, args: &[String]) -> DownloadResult<Child> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    #[cfg(windows)]
    cmd.creation_flags(CREATE_NO_WINDOW);

    cmd.spawn().map_err(|source| match source.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
            DownloadError::ToolMissing(program.display().to_string())
        }
        _ => DownloadError::Spawn {
            program: program.display().to_string(),
            source,
        },
    })
}

fn report_line(events: &UnboundedSender<DownloadEvent>, line: String) {
    debug!(target: "yt_dlp", "{line}");
    let progress = parse_progress_from_line(&line);
    let _ = events.send(DownloadEvent::Log(line));
    if let Some(pct) = progress {
        let _ = events.send(DownloadEvent::Progress(pct));
    }
}

/// Reads `reader` to EOF, sending every non-blank line. yt-dlp redraws its
/// progress with bare `\r`, so that counts as a line break too.
async fn forward_lines<R>(reader: R, tx: UnboundedSender<io::Result<String>>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut pending = Vec::new();

    loop {
        let chunk = match reader.fill_buf().await {
            Ok(chunk) => chunk,
            Err(e) => {
                let _ = tx.send(Err(e));
                return;
            }
        };
        if chunk.is_empty() {
            break;
        }

        let len = chunk.len();
        for &byte in chunk {
            if byte == b'\n' || byte == b'\r' {
                if !send_line(&tx, &mut pending) {
                    return;
                }
            } else {
                pending.push(byte);
            }
        }
        reader.consume(len);
    }

    send_line(&tx, &mut pending);
}

/// Returns false once the receiver is gone.
fn send_line(tx: &UnboundedSender<io::Result<String>>, pending: &mut Vec<u8>) -> bool {
    let line = String::from_utf8_lossy(pending).into_owned();
    pending.clear();
    if line.trim().is_empty() {
        return true;
    }
    tx.send(Ok(line)).is_ok()
}

async fn terminate(child: &mut Child) -> DownloadResult<Outcome> {
    info!(pid = ?child.id(), "cancelling download");
    request_termination(child).map_err(DownloadError::Terminate)?;
    let status = child.wait().await?;
    debug!(%status, "download tool exited after termination request");
    Ok(Outcome::Cancelled)
}

#[cfg(unix)]
fn request_termination(child: &mut Child) -> io::Result<()> {
    // No pid means the child was already reaped.
    let Some(pid) = child.id() else {
        return Ok(());
    };
    let pid = libc::pid_t::try_from(pid).map_err(io::Error::other)?;
    // SAFETY: kill(2) takes plain integers; pid is our own unreaped child.
    if unsafe { libc::kill(pid, libc::SIGTERM) } == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn request_termination(child: &mut Child) -> io::Result<()> {
    child.start_kill()
}

fn exit_outcome(program: &Path, status: ExitStatus) -> DownloadResult<Outcome> {
    match status.code() {
        Some(0) => Ok(Outcome::Succeeded),
        Some(code) => Ok(Outcome::Failed(code)),
        None => Err(DownloadError::Signalled(program.display().to_string())),
    }
}
